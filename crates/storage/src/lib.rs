//! Flat-file persistence for the pipeline outputs: the labeled RFM table
//! (CSV) and the product similarity table (bincode). Both are replaced
//! wholesale on every write.

pub mod rfm_table;
pub mod similarity_store;

pub use rfm_table::{read_rfm_table, write_rfm_table, RFM_HEADERS};
pub use similarity_store::{load_similarity, save_similarity};

use std::path::{Path, PathBuf};

/// Create the parent directory of `path` if it does not exist yet.
fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

/// Sibling path used to stage a write before renaming it over the target,
/// so readers never observe a half-written table.
fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
