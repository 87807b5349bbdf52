use anyhow::Result;
use tracing_subscriber::fmt;

pub fn init(verbosity: u8) -> Result<()> {
    if verbosity == 0 {
        return Ok(());
    }
    let level = if verbosity > 1 {
        tracing::Level::TRACE
    } else {
        tracing::Level::DEBUG
    };
    let _ = fmt()
        .with_target(false)
        .with_level(true)
        .with_max_level(level)
        .try_init();
    Ok(())
}
