use std::path::Path;
use tracing::debug;

use posterfin_core::types::MediaFolder;

// NAS metadata and trash directories that never hold a movie.
static JUNK_DIRS: &[&str] = &["@eaDir", "#recycle", "$RECYCLE.BIN", "lost+found"];

/// List the media folders directly under `root`, sorted by name.
///
/// Files, hidden entries and known junk directories are skipped.
pub fn list_media_folders(root: &Path) -> std::io::Result<Vec<MediaFolder>> {
    let mut folders = Vec::new();

    for entry in std::fs::read_dir(root)?.flatten() {
        let path = entry.path();
        let file_name = entry.file_name();
        let name = file_name.to_string_lossy();

        if name.starts_with('.') || JUNK_DIRS.iter().any(|junk| name == *junk) {
            debug!(path = %path.display(), "skipping ignored entry");
            continue;
        }
        if !path.is_dir() {
            continue;
        }
        if let Some(folder) = MediaFolder::from_path(path) {
            folders.push(folder);
        }
    }

    folders.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(folders)
}
