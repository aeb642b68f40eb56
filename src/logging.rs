//! Logging bootstrap, mirroring `trix::util::init_logging`'s
//! `log4rs::init_file` call but falling back to a bundled, programmatically
//! built config so the crate works without an external `log4rs.yml` when
//! embedded as a library.

use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;

fn default_config() -> Config {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new("{d(%Y-%m-%dT%H:%M:%S)} {l} [{T}] {m}{n}")))
        .build();

    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(log::LevelFilter::Info))
        .expect("bundled default logging config is valid")
}

/// Initializes logging from `path` if given and present on disk, otherwise
/// from the bundled default. Safe to call once per process; a second call
/// logs a warning and is otherwise a no-op (matches `log4rs::init_config`'s
/// own behavior of refusing to re-initialize the global logger).
pub fn init_logging(path: Option<&str>) {
    let result = match path {
        Some(path) if std::path::Path::new(path).exists() => log4rs::init_file(path, Default::default()).map_err(|e| e.to_string()),
        _ => log4rs::init_config(default_config()).map(|_| ()).map_err(|e| e.to_string()),
    };
    if let Err(err) = result {
        eprintln!("failed to initialize logging: {err}");
    }
}
