//! Writing synthesized audio to disk.

use crate::Result;
use std::path::{Path, PathBuf};
use tracing::info;

/// File name every conversion writes to inside the output directory.
pub const DEFAULT_OUTPUT_FILE: &str = "output.wav";

/// Write `content` to `dir/file_name`, creating `dir` if needed.
///
/// An existing file is overwritten. The write is not atomic.
pub async fn save_to_file(
    content: &[u8],
    dir: impl AsRef<Path>,
    file_name: &str,
) -> Result<PathBuf> {
    let dir = dir.as_ref();
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(file_name);
    tokio::fs::write(&path, content).await?;
    info!(path = %path.display(), bytes = content.len(), "audio saved");
    Ok(path)
}
