//! Writing generated scripts to scratch files

use std::path::PathBuf;

use tracing::info;

/// File name of every saved script; each one gets its own directory
pub const SCRIPT_FILE_NAME: &str = "generated_code.py";

/// Save script text to a new file in a freshly created temp directory
///
/// The directory is kept on disk (the execution step reads it later) and is
/// left to the host's temp cleanup.
pub fn save_generated_code(code: &str) -> std::io::Result<PathBuf> {
    let dir = tempfile::Builder::new()
        .prefix("generated-code-")
        .tempdir()?
        .keep();
    let path = dir.join(SCRIPT_FILE_NAME);
    std::fs::write(&path, code)?;

    info!(path = %path.display(), bytes = code.len(), "Code saved");
    Ok(path)
}
