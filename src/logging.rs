use std::error::Error;
use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, TermLogger, TerminalMode, WriteLogger};

/// Installs the global logger. `RUST_LOG` is honoured; the default level is
/// `info`. With a log file, output goes to both the terminal and the file.
pub fn init(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Info)
            .parse_env("RUST_LOG")
            .init();
        return Ok(());
    };

    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|v| v.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    CombinedLogger::init(vec![
        TermLogger::new(
            level,
            simplelog::Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ),
        WriteLogger::new(level, simplelog::Config::default(), File::create(path)?),
    ])?;
    Ok(())
}
