use anyhow::{Context, Result};
use std::path::Path;
use tokio::fs;

pub async fn ensure_output_dir(output_dir: &Path) -> Result<()> {
    if fs::metadata(output_dir).await.map(|m| m.is_dir()).unwrap_or(false) {
        return Ok(());
    }
    fs::create_dir_all(output_dir)
        .await
        .with_context(|| format!("Failed to create output dir {}", output_dir.display()))?;
    tracing::info!("Created directory: {}", output_dir.display());
    Ok(())
}
