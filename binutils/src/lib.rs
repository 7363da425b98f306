//! Command line plumbing shared by the simulator binaries.
use std::sync::Mutex;

pub use clap;
pub use clap_verbosity_flag as verbose;

pub fn get_styles() -> clap::builder::Styles {
    use clap::builder::styling::{AnsiColor, Effects, Styles};
    Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Cyan.on_default())
        .error(AnsiColor::Red.on_default() | Effects::BOLD)
}

/// Install the global subscriber. Logs go to stderr, or as JSON lines to
/// `log_file` when one is given.
pub fn logging_setup<W>(level: &tracing::Level, log_file: Option<W>)
where
    W: std::io::Write + Send + 'static,
{
    let builder = tracing_subscriber::fmt().with_max_level(*level);
    let result = match log_file {
        Some(file) => builder.json().with_writer(Mutex::new(file)).try_init(),
        None => builder
            .without_time()
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if let Err(err) = result {
        eprintln!("logging is already set up: {err}");
    }
}

/// Errors are always shown; each `-v` adds one level.
pub fn verbose_level_to_trace(level: Option<verbose::Level>) -> &'static tracing::Level {
    match level {
        Some(verbose::Level::Error) => &tracing::Level::WARN,
        Some(verbose::Level::Warn) => &tracing::Level::INFO,
        Some(verbose::Level::Info) => &tracing::Level::DEBUG,
        Some(verbose::Level::Debug) => &tracing::Level::TRACE,
        Some(verbose::Level::Trace) => &tracing::Level::TRACE,
        None => &tracing::Level::ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_mapping() {
        assert_eq!(verbose_level_to_trace(None), &tracing::Level::ERROR);
        assert_eq!(
            verbose_level_to_trace(Some(verbose::Level::Info)),
            &tracing::Level::DEBUG
        );
    }

    #[test]
    fn test_json_log_file() {
        let file = tempfile::tempfile().unwrap();
        logging_setup(&tracing::Level::INFO, Some(file));
        tracing::info!("hello");
        // a second subscriber is refused without panicking
        logging_setup(&tracing::Level::INFO, None::<&std::fs::File>);
    }
}
