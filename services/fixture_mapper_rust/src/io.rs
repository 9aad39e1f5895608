use anyhow::{Context, Result};
use fixture_linker_core::{ApiBatch, CrownBatch, MappingDocument};
use std::path::Path;

pub async fn read_crown(path: &Path) -> Result<CrownBatch> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read Crown fixtures from {}", path.display()))?;
    CrownBatch::from_json(&content)
        .with_context(|| format!("Malformed Crown fixtures in {}", path.display()))
}

pub async fn read_api(path: &Path) -> Result<ApiBatch> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read API fixtures from {}", path.display()))?;
    ApiBatch::from_json(&content)
        .with_context(|| format!("Malformed API fixtures in {}", path.display()))
}

/// Write the document next to its destination, then rename over it so readers
/// never see a partial file.
pub async fn write_document(path: &Path, document: &MappingDocument) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(document)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    tokio::fs::rename(&tmp, path)
        .await
        .with_context(|| format!("Failed to move mapping into {}", path.display()))?;
    Ok(())
}
