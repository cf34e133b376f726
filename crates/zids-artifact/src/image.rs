use crate::error::ArtifactError;
use crate::header::GdfaHeader;

/// An immutable, loaded GDFA artifact: the public header plus the encrypted
/// rows buffer and an optional row-accept table.
///
/// Ownership: the rows buffer is exclusively owned here (§3 "ownership
/// summary" — "the artifact buffer is exclusively owned by the loader").
/// Nothing downstream mutates it.
#[derive(Debug)]
pub struct GdfaImage {
    header: GdfaHeader,
    rows: Vec<u8>,
    row_aids: Option<Vec<u32>>,
    inv_permutation: Vec<u32>,
}

impl GdfaImage {
    /// Builds an image from an already-validated header and matching rows
    /// buffer. Used by both the container and directory loaders after they've
    /// independently verified the digest.
    pub fn new(header: GdfaHeader, rows: Vec<u8>, row_aids: Option<Vec<u32>>) -> Result<Self, ArtifactError> {
        header.validate()?;
        let expected = header.expected_rows_len();
        if rows.len() != expected {
            return Err(ArtifactError::RowsSizeMismatch {
                expected,
                actual: rows.len(),
            });
        }
        if let Some(aids) = &row_aids {
            let expected_aids = header.num_states as usize;
            if aids.len() != expected_aids {
                return Err(ArtifactError::RowAidsSizeMismatch {
                    expected: expected_aids * 4,
                    actual: aids.len() * 4,
                });
            }
        }
        let inv_permutation = invert_permutation(&header.permutation);
        Ok(Self {
            header,
            rows,
            row_aids,
            inv_permutation,
        })
    }

    pub fn header(&self) -> &GdfaHeader {
        &self.header
    }

    pub fn start_row(&self) -> u32 {
        self.header.start_row
    }

    pub fn num_states(&self) -> u32 {
        self.header.num_states
    }

    pub fn cell_bytes(&self) -> usize {
        self.header.cell_bytes as usize
    }

    pub fn row_bytes(&self) -> usize {
        self.header.row_bytes as usize
    }

    pub fn aid_bits(&self) -> u32 {
        self.header.aid_bits
    }

    pub fn outmax(&self) -> u32 {
        self.header.outmax
    }

    /// The entire encrypted row for `r`, without copying.
    pub fn row_slice(&self, r: u32) -> Result<&[u8], ArtifactError> {
        let num_states = self.header.num_states as usize;
        if r as usize >= num_states {
            return Err(ArtifactError::RowOutOfRange { row: r, num_states });
        }
        let row_bytes = self.row_bytes();
        let start = r as usize * row_bytes;
        Ok(&self.rows[start..start + row_bytes])
    }

    /// One ciphertext cell `(r, c)`.
    pub fn get_cell(&self, r: u32, c: u16) -> Result<&[u8], ArtifactError> {
        let row = self.row_slice(r)?;
        let cell_bytes = self.cell_bytes();
        let num_cols = (row.len() / cell_bytes) as u16;
        if c >= num_cols {
            return Err(ArtifactError::ColOutOfRange {
                row: r,
                col: c,
                num_cols: num_cols as usize,
            });
        }
        let start = c as usize * cell_bytes;
        Ok(&row[start..start + cell_bytes])
    }

    /// `old_state` for a physical (permuted) `new_row`. Identity if the
    /// header's permutation is the identity permutation.
    ///
    /// `header.permutation` is defined new_row→old_state (spec §3), so this
    /// is a direct lookup; [`Self::new_row_of`] holds the precomputed
    /// opposite direction for callers that need old_state→new_row.
    pub fn inv_permute(&self, new_row: u32) -> Result<u32, ArtifactError> {
        let num_states = self.header.num_states as usize;
        if new_row as usize >= num_states {
            return Err(ArtifactError::RowOutOfRange { row: new_row, num_states });
        }
        Ok(self.header.permutation[new_row as usize])
    }

    /// `new_row` for a logical `old_state` — the inverse direction of
    /// [`Self::inv_permute`].
    pub fn new_row_of(&self, old_state: u32) -> Result<u32, ArtifactError> {
        let num_states = self.header.num_states as usize;
        if old_state as usize >= num_states {
            return Err(ArtifactError::RowOutOfRange { row: old_state, num_states });
        }
        Ok(self.inv_permutation[old_state as usize])
    }

    /// The accept id for row `r` from the optional `row_aids` table, or 0 if
    /// the table is absent or the row is non-accepting.
    pub fn row_aid(&self, r: u32) -> u32 {
        self.row_aids
            .as_ref()
            .and_then(|aids| aids.get(r as usize).copied())
            .unwrap_or(0)
    }
}

fn invert_permutation(permutation: &[u32]) -> Vec<u32> {
    let mut inv = vec![0u32; permutation.len()];
    for (new_row, &old_state) in permutation.iter().enumerate() {
        inv[old_state as usize] = new_row as u32;
    }
    inv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(num_states: u32, cell_bytes: u32, outmax: u32) -> GdfaHeader {
        GdfaHeader {
            alphabet_size: 256,
            outmax,
            cmax: 1,
            num_states,
            start_row: 0,
            permutation: (0..num_states).collect(),
            cell_bytes,
            row_bytes: cell_bytes * outmax,
            aid_bits: 8,
            rows_sha256: None,
        }
    }

    #[test]
    fn row_slice_and_get_cell_roundtrip() {
        let h = header(2, 2, 2);
        let rows = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let img = GdfaImage::new(h, rows, None).unwrap();
        assert_eq!(img.row_slice(0).unwrap(), &[1, 2, 3, 4]);
        assert_eq!(img.get_cell(1, 1).unwrap(), &[7, 8]);
    }

    #[test]
    fn rejects_out_of_range_row() {
        let h = header(2, 2, 2);
        let rows = vec![0u8; 8];
        let img = GdfaImage::new(h, rows, None).unwrap();
        assert!(matches!(img.row_slice(5), Err(ArtifactError::RowOutOfRange { .. })));
    }

    #[test]
    fn inv_permute_and_new_row_of_round_trip() {
        let mut h = header(3, 1, 1);
        h.row_bytes = 1;
        h.permutation = vec![2, 0, 1];
        let img = GdfaImage::new(h, vec![0u8; 3], None).unwrap();
        for new_row in 0..3u32 {
            let old_state = img.inv_permute(new_row).unwrap();
            assert_eq!(img.new_row_of(old_state).unwrap(), new_row);
        }
    }

    #[test]
    fn row_aid_falls_back_to_zero() {
        let h = header(2, 1, 1);
        let img = GdfaImage::new(h.clone(), vec![0u8; 2], None).unwrap();
        assert_eq!(img.row_aid(0), 0);
        let img_with_aids = GdfaImage::new(h, vec![0u8; 2], Some(vec![0, 42])).unwrap();
        assert_eq!(img_with_aids.row_aid(1), 42);
    }
}
