use std::io::{Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use crate::error::ArtifactError;
use crate::header::GdfaHeader;
use crate::image::GdfaImage;

const MAGIC: &[u8; 7] = b"ZIDSv1\0";

/// Writes the single-file container form: magic, big-endian header length,
/// JSON header, rows, trailing SHA-256 digest of the rows buffer, and an
/// optional row-accept table (a presence flag byte, then `num_states`
/// little-endian `u32`s when `row_aids` is `Some`).
pub fn write_container<P: AsRef<Path>>(
    path: P,
    header: &GdfaHeader,
    rows: &[u8],
    row_aids: Option<&[u32]>,
) -> Result<(), ArtifactError> {
    let expected = header.expected_rows_len();
    if rows.len() != expected {
        return Err(ArtifactError::RowsSizeMismatch {
            expected,
            actual: rows.len(),
        });
    }
    // The container's header never carries rows_sha256; that digest is the
    // trailing field instead.
    let mut header = header.clone();
    header.rows_sha256 = None;
    let header_bytes = serde_json::to_vec(&header)?;
    let digest = Sha256::digest(rows);

    let mut f = std::fs::File::create(path)?;
    f.write_all(MAGIC)?;
    f.write_all(&(header_bytes.len() as u32).to_be_bytes())?;
    f.write_all(&header_bytes)?;
    f.write_all(rows)?;
    f.write_all(&digest)?;
    match row_aids {
        Some(aids) => {
            f.write_all(&[1u8])?;
            f.write_all(&crate::row_aids::encode_row_aids(aids))?;
        }
        None => f.write_all(&[0u8])?,
    }
    Ok(())
}

/// Loads and fully validates a container file, verifying magic, header
/// parse, total size, and the rows digest before returning an image. The
/// row-accept table is threaded through when the file carries one.
pub fn load_container<P: AsRef<Path>>(path: P) -> Result<GdfaImage, ArtifactError> {
    let mut f = std::fs::File::open(path)?;
    let mut magic = [0u8; 7];
    f.read_exact(&mut magic)?;
    if &magic != MAGIC {
        return Err(ArtifactError::BadMagic);
    }

    let mut hlen_bytes = [0u8; 4];
    f.read_exact(&mut hlen_bytes)?;
    let hlen = u32::from_be_bytes(hlen_bytes) as usize;

    let mut header_bytes = vec![0u8; hlen];
    f.read_exact(&mut header_bytes)?;
    let header: GdfaHeader = serde_json::from_slice(&header_bytes)?;
    header.validate()?;

    let rows_len = header.expected_rows_len();
    let mut rows = vec![0u8; rows_len];
    f.read_exact(&mut rows)?;

    let mut digest = [0u8; 32];
    f.read_exact(&mut digest)?;
    let actual_digest: [u8; 32] = Sha256::digest(&rows).into();
    if actual_digest != digest {
        return Err(ArtifactError::RowsHashMismatch);
    }

    let mut has_row_aids = [0u8; 1];
    f.read_exact(&mut has_row_aids)?;
    let row_aids = if has_row_aids[0] != 0 {
        let mut buf = vec![0u8; header.num_states as usize * 4];
        f.read_exact(&mut buf)?;
        Some(crate::row_aids::decode_row_aids(&buf, header.num_states)?)
    } else {
        None
    };

    GdfaImage::new(header, rows, row_aids)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_header() -> GdfaHeader {
        GdfaHeader {
            alphabet_size: 256,
            outmax: 2,
            cmax: 1,
            num_states: 2,
            start_row: 0,
            permutation: vec![0, 1],
            cell_bytes: 2,
            row_bytes: 4,
            aid_bits: 8,
            rows_sha256: None,
        }
    }

    #[test]
    fn round_trips_through_a_container_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.zids");
        let header = sample_header();
        let rows = vec![1, 2, 3, 4, 5, 6, 7, 8];
        write_container(&path, &header, &rows, None).unwrap();

        let img = load_container(&path).unwrap();
        assert_eq!(img.num_states(), 2);
        assert_eq!(img.row_slice(0).unwrap(), &[1, 2, 3, 4]);
    }

    #[test]
    fn round_trips_row_aids_through_a_container_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact.zids");
        let header = sample_header();
        let rows = vec![1, 2, 3, 4, 5, 6, 7, 8];
        write_container(&path, &header, &rows, Some(&[0, 9])).unwrap();

        let img = load_container(&path).unwrap();
        assert_eq!(img.row_aid(0), 0);
        assert_eq!(img.row_aid(1), 9);
    }

    #[test]
    fn rejects_bad_magic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.zids");
        std::fs::write(&path, b"NOTZIDS").unwrap();
        assert!(matches!(load_container(&path), Err(ArtifactError::BadMagic)));
    }

    #[test]
    fn rejects_tampered_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tampered.zids");
        let header = sample_header();
        let rows = vec![1, 2, 3, 4, 5, 6, 7, 8];
        write_container(&path, &header, &rows, None).unwrap();

        let mut bytes = std::fs::read(&path).unwrap();
        let last = bytes.len() - 41; // flip a byte inside the rows region (32B digest + 1B row_aids flag trail)
        bytes[last] ^= 0xff;
        std::fs::write(&path, bytes).unwrap();

        assert!(matches!(load_container(&path), Err(ArtifactError::RowsHashMismatch)));
    }
}
