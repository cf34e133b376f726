use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ArtifactError;

/// `gk_meta.json`: `{ num_rows, cols_per_row, k_bytes, rows_sha256 }`.
///
/// Naming note: this sidecar's `rows_sha256` hashes `gk_table.bin`, not a
/// GDFA rows buffer; kept as-is to match the on-disk key the spec names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GkTableMeta {
    pub num_rows: u32,
    pub cols_per_row: Vec<u32>,
    pub k_bytes: u32,
    pub rows_sha256: String,
}

/// A persisted group-key table: `table[r]` is the row's keys, one
/// `k_bytes`-length key per active column.
#[derive(Clone, Debug, PartialEq)]
pub struct GkTable {
    pub k_bytes: usize,
    pub table: Vec<Vec<Vec<u8>>>,
}

impl GkTable {
    pub fn encode(&self) -> Vec<u8> {
        self.table.iter().flatten().flat_map(|k| k.iter().copied()).collect()
    }

    pub fn meta(&self) -> GkTableMeta {
        let cols_per_row = self.table.iter().map(|row| row.len() as u32).collect();
        let blob = self.encode();
        GkTableMeta {
            num_rows: self.table.len() as u32,
            cols_per_row,
            k_bytes: self.k_bytes as u32,
            rows_sha256: hex::encode(Sha256::digest(&blob)),
        }
    }

    pub fn write<P: AsRef<Path>>(&self, dir: P) -> Result<(), ArtifactError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        std::fs::write(dir.join("gk_meta.json"), serde_json::to_vec_pretty(&self.meta())?)?;
        std::fs::write(dir.join("gk_table.bin"), self.encode())?;
        Ok(())
    }

    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref();
        let meta: GkTableMeta = serde_json::from_slice(&std::fs::read(dir.join("gk_meta.json"))?)?;
        if meta.cols_per_row.len() != meta.num_rows as usize {
            return Err(ArtifactError::MalformedHeader(
                "gk_meta cols_per_row length mismatch".into(),
            ));
        }
        let blob = std::fs::read(dir.join("gk_table.bin"))?;

        let expected_digest = hex::decode(&meta.rows_sha256)?;
        let actual_digest: [u8; 32] = Sha256::digest(&blob).into();
        if actual_digest.as_slice() != expected_digest.as_slice() {
            return Err(ArtifactError::RowsHashMismatch);
        }

        let k_bytes = meta.k_bytes as usize;
        let mut table = Vec::with_capacity(meta.num_rows as usize);
        let mut offset = 0usize;
        for (row, &cols) in meta.cols_per_row.iter().enumerate() {
            let mut row_keys = Vec::with_capacity(cols as usize);
            for _ in 0..cols {
                let end = offset + k_bytes;
                if end > blob.len() {
                    return Err(ArtifactError::GkRowLenMismatch {
                        row: row as u32,
                        expected: cols as usize,
                        actual: row_keys.len(),
                    });
                }
                row_keys.push(blob[offset..end].to_vec());
                offset = end;
            }
            table.push(row_keys);
        }
        if offset != blob.len() {
            return Err(ArtifactError::MalformedHeader(
                "gk_table.bin has trailing bytes past the declared cols_per_row".into(),
            ));
        }
        Ok(Self { k_bytes, table })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let table = GkTable {
            k_bytes: 4,
            table: vec![vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]], vec![vec![9, 9, 9, 9]]],
        };
        table.write(dir.path()).unwrap();
        let loaded = GkTable::load(dir.path()).unwrap();
        assert_eq!(loaded, table);
    }

    #[test]
    fn rejects_tampered_table_blob() {
        let dir = tempfile::tempdir().unwrap();
        let table = GkTable {
            k_bytes: 4,
            table: vec![vec![vec![1, 2, 3, 4]]],
        };
        table.write(dir.path()).unwrap();
        std::fs::write(dir.path().join("gk_table.bin"), vec![0u8; 4]).unwrap();
        assert!(matches!(GkTable::load(dir.path()), Err(ArtifactError::RowsHashMismatch)));
    }
}
