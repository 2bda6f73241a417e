use anyhow::Context;
use tracing::Level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    #[cfg(debug_assertions)]
    let level = Some(Level::DEBUG);
    #[cfg(not(debug_assertions))]
    let level = Some(Level::INFO);

    let db = classmonitor_backend::create(level)
        .await
        .context("unable to prepare classroom storage")?;

    tracing::info!("Storage '{}' is ready.", db.name());
    Ok(())
}
