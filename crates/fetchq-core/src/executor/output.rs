//! Locate the file a successful attempt produced.
//!
//! Picks the most recently modified regular file in the download directory,
//! skipping partial-download artifacts. Only sound because downloads are
//! serialized: no other attempt writes there at the same time.

use std::io;
use std::path::Path;
use std::time::SystemTime;

const PARTIAL_SUFFIXES: &[&str] = &[".part", ".ytdl", ".temp", ".tmp", ".frag"];

pub(super) fn is_partial(name: &str) -> bool {
    name.starts_with('.')
        || name.contains(".part-Frag")
        || PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix))
}

/// File name (not path) of the newest finished file in `dir`, if any.
pub(super) async fn newest_output(dir: &Path) -> io::Result<Option<String>> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    let mut newest: Option<(SystemTime, String)> = None;
    while let Some(entry) = entries.next_entry().await? {
        let meta = entry.metadata().await?;
        if !meta.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if is_partial(&name) {
            continue;
        }
        let modified = meta.modified()?;
        if newest.as_ref().map_or(true, |(t, _)| modified > *t) {
            newest = Some((modified, name));
        }
    }
    Ok(newest.map(|(_, name)| name))
}
