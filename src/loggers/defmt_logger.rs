use defmt::{debug, error, info, trace, warn, Display2Format};
use log::{Level, Metadata, Record};

pub struct LoggerType;

static DEFMT_LOGGER: LoggerType = LoggerType;

pub fn init(level: Level) {
    if log::set_logger(&DEFMT_LOGGER).is_ok() {
        log::set_max_level(level.to_level_filter());
    }
}

impl log::Log for LoggerType {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let target = record.target();
            let args = Display2Format(record.args());
            match record.metadata().level() {
                Level::Trace => trace!("{}: {}", target, args),
                Level::Debug => debug!("{}: {}", target, args),
                Level::Info => info!("{}: {}", target, args),
                Level::Warn => warn!("{}: {}", target, args),
                Level::Error => error!("{}: {}", target, args),
            }
        }
    }

    fn flush(&self) {}
}
