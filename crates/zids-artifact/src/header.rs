use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;

/// The public header shared by both on-disk forms (container and directory).
///
/// `rows_sha256` is only present in the directory form's `header.json`; the
/// container form carries the digest as a trailing 32-byte field instead, so
/// it is modeled as `#[serde(skip_serializing_if = "Option::is_none")]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GdfaHeader {
    pub alphabet_size: u32,
    pub outmax: u32,
    pub cmax: u32,
    pub num_states: u32,
    pub start_row: u32,
    pub permutation: Vec<u32>,
    pub cell_bytes: u32,
    pub row_bytes: u32,
    pub aid_bits: u32,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub rows_sha256: Option<String>,
}

impl GdfaHeader {
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.alphabet_size != 256 {
            return Err(ArtifactError::BadAlphabetSize(self.alphabet_size));
        }
        if self.cmax != 1 {
            return Err(ArtifactError::BadCmax(self.cmax));
        }
        let row_bytes = self.row_bytes as usize;
        let cell_bytes = self.cell_bytes as usize;
        if cell_bytes == 0 || row_bytes % cell_bytes != 0 {
            return Err(ArtifactError::RowBytesNotMultiple { row_bytes, cell_bytes });
        }
        if self.permutation.len() != self.num_states as usize {
            return Err(ArtifactError::InvalidPermutation {
                num_states: self.num_states as usize,
            });
        }
        let mut seen = vec![false; self.num_states as usize];
        for &old_state in &self.permutation {
            let idx = old_state as usize;
            if idx >= seen.len() || seen[idx] {
                return Err(ArtifactError::InvalidPermutation {
                    num_states: self.num_states as usize,
                });
            }
            seen[idx] = true;
        }
        if self.start_row >= self.num_states {
            return Err(ArtifactError::RowOutOfRange {
                row: self.start_row,
                num_states: self.num_states as usize,
            });
        }
        Ok(())
    }

    pub fn expected_rows_len(&self) -> usize {
        self.num_states as usize * self.row_bytes as usize
    }
}
