//! Logging backend which writes timestamped lines to stderr or to a file.

use std::{
    fs::File,
    io::{self, Write},
    sync::Mutex,
};

use chrono::Local;
use eyre::{Result, WrapErr};
use log::{Level, LevelFilter, Metadata, Record};
use once_cell::sync::OnceCell;

use crate::meta::settings::Options;

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "error",
        Level::Warn => "warning",
        Level::Info => "info",
        Level::Debug | Level::Trace => "debug",
    }
}

/// Formats a record as `[date time] [module] [level] Text`.
fn format_line(time: &str, record: &Record) -> String {
    let module = record
        .module_path()
        .and_then(|path| path.split("::").last())
        .unwrap_or("unknown");

    format!(
        "[{}] [{}] [{}] {}",
        time,
        module,
        level_name(record.level()),
        record.args()
    )
}

pub struct Logger {
    level: LevelFilter,
    sink: Mutex<Box<dyn Write + Send>>,
}

impl Logger {
    fn new(level: LevelFilter, sink: Box<dyn Write + Send>) -> Logger {
        Logger {
            level,
            sink: Mutex::new(sink),
        }
    }

    fn from_options(options: &Options) -> Result<Logger> {
        let sink: Box<dyn Write + Send> = match &options.log_file {
            Some(path) => Box::new(
                File::create(path)
                    .wrap_err_with(|| format!("Failed to create log file '{}'", path.display()))?,
            ),

            None => Box::new(io::stderr()),
        };

        Ok(Logger::new(options.log_level, sink))
    }

    pub fn commit(&self, record: &Record) {
        let time = Local::now().format("%Y-%m-%d %H:%M:%S%.3f").to_string();
        let line = format_line(&time, record);

        // A poisoned sink still works for our purposes.
        let mut sink = self
            .sink
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        let _ = writeln!(sink, "{line}");
    }
}

impl log::Log for Logger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.commit(record);
        }
    }

    fn flush(&self) {
        if let Ok(mut sink) = self.sink.lock() {
            let _ = sink.flush();
        }
    }
}

static LOGGER: OnceCell<Logger> = OnceCell::new();

fn install_panic_hook() {
    let previous = std::panic::take_hook();

    // Log the panic before the default handling, so it ends up wherever the log goes.
    std::panic::set_hook(Box::new(move |info| {
        let payload = info.payload();
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "no message".to_string());

        match info.location() {
            Some(location) => log::error!("Panic at {location}: {message}"),
            None => log::error!("Panic: {message}"),
        }

        previous(info);
    }));
}

/// Installs the logger. Only the first call has any effect.
pub fn init(options: &Options) -> Result<()> {
    let mut installed = false;

    let logger = LOGGER.get_or_try_init(|| {
        installed = true;
        Logger::from_options(options)
    })?;

    if installed {
        log::set_logger(logger)
            .map_err(|err| eyre::eyre!("Another logger is already installed: {err}"))?;
        log::set_max_level(logger.level);
        install_panic_hook();
    }

    Ok(())
}
