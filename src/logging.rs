use std::error::Error;
use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{ColorChoice, CombinedLogger, ConfigBuilder, TermLogger, TerminalMode, WriteLogger};

/// `RUST_LOG`-driven stderr logging, or terminal plus file when `log_file`
/// is given.
pub fn init(log_file: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let Some(path) = log_file else {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Info)
            .parse_env("RUST_LOG")
            .init();
        return Ok(());
    };
    let cfg = ConfigBuilder::new()
        .set_time_offset_to_local()
        .unwrap_or_else(|c| c)
        .build();
    CombinedLogger::init(vec![
        TermLogger::new(LevelFilter::Info, cfg.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Debug, cfg, File::create(path)?),
    ])?;
    Ok(())
}
