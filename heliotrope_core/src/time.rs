use fugit::{TimerDurationU32, TimerInstantU32};

/// Tick rate of the monotonic the firmware hands to the controllers.
pub const TICK_HZ: u32 = 1_000;

pub type Instant = TimerInstantU32<TICK_HZ>;
pub type Duration = TimerDurationU32<TICK_HZ>;

pub const fn dur_from_millis(millis: u32) -> Duration {
    Duration::millis(millis)
}

pub const fn instant_from_millis(millis: u32) -> Instant {
    Instant::from_ticks(millis)
}

/// Time elapsed between `earlier` and `now`. Tick counts wrap, so the result is
/// only meaningful for gaps shorter than the full `u32` range.
pub fn elapsed_since(now: Instant, earlier: Instant) -> Duration {
    Duration::from_ticks(now.ticks().wrapping_sub(earlier.ticks()))
}
