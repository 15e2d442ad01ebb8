use shopper_core::types::SimilarityTable;
use shopper_core::{ShopperError, ShopperResult};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::{ensure_parent, staging_path};

/// Serialize the similarity table to `path` with bincode.
pub fn save_similarity(path: impl AsRef<Path>, table: &SimilarityTable) -> ShopperResult<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let staging = staging_path(path);

    let mut writer = BufWriter::new(File::create(&staging)?);
    bincode::serialize_into(&mut writer, table)?;
    writer.flush()?;
    drop(writer);

    std::fs::rename(&staging, path)?;
    info!(path = %path.display(), products = table.len(), "Similarity table written");
    Ok(())
}

/// Load a similarity table and check its shape before handing it out.
pub fn load_similarity(path: impl AsRef<Path>) -> ShopperResult<SimilarityTable> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let table: SimilarityTable = bincode::deserialize_from(reader)?;
    table
        .validate()
        .map_err(|e| ShopperError::Data(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), products = table.len(), "Similarity table loaded");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;

    fn table() -> SimilarityTable {
        SimilarityTable::from_parts(
            vec!["ALARM CLOCK".to_string(), "JUMBO BAG".into(), "TEA SET".into()],
            vec![1.0, 0.25, 0.5, 0.25, 1.0, 0.0, 0.5, 0.0, 1.0],
        )
        .unwrap()
    }

    #[test]
    fn round_trips_through_bincode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("models").join("similarity.bin");
        save_similarity(&path, &table()).unwrap();
        let loaded = load_similarity(&path).unwrap();
        assert_eq!(loaded, table());
        assert_eq!(loaded.score("ALARM CLOCK", "TEA SET"), Some(0.5));
    }

    #[test]
    fn empty_table_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");
        save_similarity(&path, &SimilarityTable::empty()).unwrap();
        assert!(load_similarity(&path).unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_similarity(dir.path().join("absent.bin")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn rejects_table_with_wrong_shape() {
        // Same field layout as SimilarityTable, without its invariants.
        #[derive(Serialize)]
        struct Unchecked {
            products: Vec<String>,
            scores: Vec<f64>,
        }

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");
        let bad = Unchecked {
            products: vec!["A".into(), "B".into()],
            scores: vec![1.0, 0.0, 1.0],
        };
        std::fs::write(&path, bincode::serialize(&bad).unwrap()).unwrap();

        let err = load_similarity(&path).unwrap_err();
        assert!(matches!(err, ShopperError::Data(_)), "got {err:?}");
    }

    #[test]
    fn rejects_garbage_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("similarity.bin");
        std::fs::write(&path, b"not a table").unwrap();
        assert!(load_similarity(&path).is_err());
    }
}
