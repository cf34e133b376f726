use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

/// `row_alph.json` sidecar: `{ num_rows, cols_per_row, format }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RowAlphabetMeta {
    pub num_rows: u32,
    pub cols_per_row: Vec<u32>,
    pub format: String,
}

/// Per-row mapping from input byte to logical column, loaded from the flat
/// `num_rows * 256` "single8" table.
///
/// The API returns a `Vec<u16>` of candidates rather than a single column so
/// a future multi-map layout can return more than one without changing
/// callers (spec §4.4); "single8" always yields exactly one.
#[derive(Debug)]
pub struct RowAlphabetMap {
    cols_per_row: Vec<u32>,
    table: Vec<u8>,
}

const ALPHABET_SIZE: usize = 256;

impl RowAlphabetMap {
    pub fn new(meta: RowAlphabetMeta, table: Vec<u8>) -> Result<Self, ArtifactError> {
        if meta.format != "single8" {
            return Err(ArtifactError::MalformedHeader(format!(
                "unsupported row-alphabet format {:?}",
                meta.format
            )));
        }
        if meta.cols_per_row.len() != meta.num_rows as usize {
            return Err(ArtifactError::MalformedHeader(format!(
                "cols_per_row has {} entries, num_rows={}",
                meta.cols_per_row.len(),
                meta.num_rows
            )));
        }
        let expected = meta.num_rows as usize * ALPHABET_SIZE;
        if table.len() != expected {
            return Err(ArtifactError::RowAlphabetSizeMismatch {
                expected,
                actual: table.len(),
            });
        }
        for (row, &cols) in meta.cols_per_row.iter().enumerate() {
            if cols == 0 || cols > ALPHABET_SIZE as u32 {
                return Err(ArtifactError::BadColsPerRow {
                    row: row as u32,
                    value: cols,
                });
            }
        }
        for row in 0..meta.num_rows as usize {
            let limit = meta.cols_per_row[row] as u16;
            let base = row * ALPHABET_SIZE;
            for b in 0..ALPHABET_SIZE {
                let col = table[base + b];
                if col as u16 >= limit {
                    return Err(ArtifactError::RowAlphabetColOutOfRange {
                        row: row as u32,
                        col,
                        limit,
                    });
                }
            }
        }
        Ok(Self {
            cols_per_row: meta.cols_per_row,
            table,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.cols_per_row.len()
    }

    pub fn num_cols(&self, row: u32) -> Result<u32, ArtifactError> {
        self.cols_per_row
            .get(row as usize)
            .copied()
            .ok_or(ArtifactError::RowOutOfRange {
                row,
                num_states: self.cols_per_row.len(),
            })
    }

    /// Candidate columns for `(row, byte)`. Length 1 under "single8".
    pub fn cols_candidates(&self, row: u32, byte: u8) -> Result<Vec<u16>, ArtifactError> {
        let num_rows = self.cols_per_row.len();
        if row as usize >= num_rows {
            return Err(ArtifactError::RowOutOfRange { row, num_states: num_rows });
        }
        let idx = row as usize * ALPHABET_SIZE + byte as usize;
        Ok(vec![self.table[idx] as u16])
    }

    fn meta(&self) -> RowAlphabetMeta {
        RowAlphabetMeta {
            num_rows: self.cols_per_row.len() as u32,
            cols_per_row: self.cols_per_row.clone(),
            format: "single8".into(),
        }
    }

    /// Writes `row_alph.json` and `row_alph.bin` to the given paths (spec
    /// §6's row-alphabet partition external interface).
    pub fn write<P: AsRef<Path>>(&self, meta_path: P, table_path: P) -> Result<(), ArtifactError> {
        write_row_alphabet(meta_path, table_path, &self.meta(), &self.table)
    }

    /// Loads a `RowAlphabetMap` from a `row_alph.json`/`row_alph.bin` pair,
    /// applying the same validation as [`Self::new`] (spec §9 supplemented
    /// feature 4: strict field checks on load).
    pub fn load<P: AsRef<Path>>(meta_path: P, table_path: P) -> Result<Self, ArtifactError> {
        load_row_alphabet(meta_path, table_path)
    }
}

/// Writes a row-alphabet partition's `row_alph.json` sidecar and
/// `row_alph.bin` flat table to the given paths.
pub fn write_row_alphabet<P: AsRef<Path>>(
    meta_path: P,
    table_path: P,
    meta: &RowAlphabetMeta,
    table: &[u8],
) -> Result<(), ArtifactError> {
    std::fs::write(meta_path, serde_json::to_vec_pretty(meta)?)?;
    std::fs::write(table_path, table)?;
    Ok(())
}

/// Loads and validates a row-alphabet partition from a `row_alph.json`/
/// `row_alph.bin` pair (spec §9 supplemented feature 4: strict field
/// checks — `cols_per_row` range and table length are verified by
/// [`RowAlphabetMap::new`] before any lookup is trusted).
pub fn load_row_alphabet<P: AsRef<Path>>(meta_path: P, table_path: P) -> Result<RowAlphabetMap, ArtifactError> {
    let meta: RowAlphabetMeta = serde_json::from_slice(&std::fs::read(meta_path)?)?;
    let table = std::fs::read(table_path)?;
    RowAlphabetMap::new(meta, table)
}
