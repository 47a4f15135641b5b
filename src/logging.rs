// The TUI owns the terminal, so log lines go to a file instead of stderr.
use std::fs::File;
use std::path::Path;

use anyhow::Context;

pub fn init(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialized")?;
    log::info!("orchestty {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}
