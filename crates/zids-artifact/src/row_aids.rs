use std::path::Path;

use crate::error::ArtifactError;

/// Reads `row_aids.bin`: `num_states` little-endian `u32`s, zero meaning
/// "non-accepting".
pub fn read_row_aids<P: AsRef<Path>>(path: P, num_states: u32) -> Result<Vec<u32>, ArtifactError> {
    let bytes = std::fs::read(path)?;
    decode_row_aids(&bytes, num_states)
}

pub fn decode_row_aids(bytes: &[u8], num_states: u32) -> Result<Vec<u32>, ArtifactError> {
    let expected = num_states as usize * 4;
    if bytes.len() != expected {
        return Err(ArtifactError::RowAidsSizeMismatch {
            expected,
            actual: bytes.len(),
        });
    }
    Ok(bytes
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect())
}

/// Serializes a row-accept table to its on-disk little-endian `u32` layout.
pub fn encode_row_aids(aids: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(aids.len() * 4);
    for &aid in aids {
        out.extend_from_slice(&aid.to_le_bytes());
    }
    out
}

pub fn write_row_aids<P: AsRef<Path>>(path: P, aids: &[u32]) -> Result<(), ArtifactError> {
    std::fs::write(path, encode_row_aids(aids))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_row_aids() {
        let aids = vec![0, 7, 0, 42];
        let bytes = encode_row_aids(&aids);
        assert_eq!(decode_row_aids(&bytes, 4).unwrap(), aids);
    }

    #[test]
    fn rejects_size_mismatch() {
        assert!(matches!(
            decode_row_aids(&[0, 0, 0], 1),
            Err(ArtifactError::RowAidsSizeMismatch { .. })
        ));
    }

    #[test]
    fn writes_and_reads_a_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("row_aids.bin");
        write_row_aids(&path, &[0, 5, 9]).unwrap();
        assert_eq!(read_row_aids(&path, 3).unwrap(), vec![0, 5, 9]);
    }
}
