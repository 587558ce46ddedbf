#[cfg(feature = "defmt_logger")]
#[cfg(not(feature = "null_logger"))]
pub mod defmt_logger;

#[cfg(feature = "null_logger")]
#[cfg(not(feature = "defmt_logger"))]
pub mod null_logger;

pub use log::Level;

/// Routes the `log` records of the control crates to whichever backend is built in.
pub fn init(level: Level) {
    #[cfg(feature = "defmt_logger")]
    #[cfg(not(feature = "null_logger"))]
    defmt_logger::init(level);

    #[cfg(feature = "null_logger")]
    #[cfg(not(feature = "defmt_logger"))]
    null_logger::init(level);
}
