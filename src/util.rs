use anyhow::Context;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Replace characters that are illegal in file names on common platforms
pub fn sanitize_filename(name: &str) -> String {
    let illegal = ['<', '>', '/', '\\', '|', '?', '*', ':', '"'];
    name.chars()
        .map(|c| if illegal.contains(&c) || c.is_control() { '_' } else { c })
        .collect()
}

/// Where the features for (dataset, featurizer) live: `<root>/<dataset>/<featurizer>.csv`
pub fn feature_set_location(root: &Path, dataset_name: &str, featurizer_name: &str) -> PathBuf {
    root.join(sanitize_filename(dataset_name))
        .join(format!("{}.csv", sanitize_filename(featurizer_name)))
}

/// Write `content` to `path` via a sibling temp file and a rename, so readers
/// never observe a half-written file. Concurrent writers of one path each get
/// their own temp file; the last rename wins.
pub async fn write_artifact(path: &Path, content: &[u8]) -> anyhow::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {:?}", dir))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let tmp = dir.join(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

    tokio::fs::write(&tmp, content)
        .await
        .with_context(|| format!("failed to write {:?}", tmp))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(e).with_context(|| format!("failed to move artifact into {:?}", path));
    }
    Ok(())
}
