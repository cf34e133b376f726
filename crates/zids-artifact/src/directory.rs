use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use sha2::{Digest, Sha256};

use crate::error::ArtifactError;
use crate::header::GdfaHeader;
use crate::image::GdfaImage;

/// Writes the directory form: `header.json`[`.gz`] plus `rows.bin`, with
/// `rows_sha256` embedded in the header (unlike the container form, which
/// carries the digest as a trailing binary field instead). Also writes
/// `row_aids.bin` alongside them when `row_aids` is `Some`.
pub fn write_directory<P: AsRef<Path>>(
    dir: P,
    header: &GdfaHeader,
    rows: &[u8],
    row_aids: Option<&[u32]>,
    gzip_header: bool,
) -> Result<(), ArtifactError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    let expected = header.expected_rows_len();
    if rows.len() != expected {
        return Err(ArtifactError::RowsSizeMismatch {
            expected,
            actual: rows.len(),
        });
    }

    let mut header = header.clone();
    header.rows_sha256 = Some(hex::encode(Sha256::digest(rows)));
    let header_bytes = serde_json::to_vec_pretty(&header)?;

    if gzip_header {
        let f = std::fs::File::create(dir.join("header.json.gz"))?;
        let mut enc = GzEncoder::new(f, Compression::default());
        std::io::Write::write_all(&mut enc, &header_bytes)?;
        enc.finish()?;
    } else {
        std::fs::write(dir.join("header.json"), &header_bytes)?;
    }

    std::fs::write(dir.join("rows.bin"), rows)?;
    if let Some(aids) = row_aids {
        crate::row_aids::write_row_aids(dir.join("row_aids.bin"), aids)?;
    }
    Ok(())
}

/// Loads the directory form, auto-detecting a gzipped header, and verifies
/// `rows_sha256` against the loaded rows buffer. `row_aids.bin` is loaded
/// and threaded through when present.
pub fn load_directory<P: AsRef<Path>>(dir: P) -> Result<GdfaImage, ArtifactError> {
    let dir = dir.as_ref();
    let gz_path = dir.join("header.json.gz");
    let plain_path = dir.join("header.json");

    let header_bytes = if gz_path.exists() {
        let f = std::fs::File::open(&gz_path)?;
        let mut dec = GzDecoder::new(f);
        let mut buf = Vec::new();
        dec.read_to_end(&mut buf)?;
        buf
    } else {
        std::fs::read(&plain_path)?
    };

    let header: GdfaHeader = serde_json::from_slice(&header_bytes)?;
    header.validate()?;

    let rows = std::fs::read(dir.join("rows.bin"))?;
    if let Some(expected_hex) = &header.rows_sha256 {
        let expected = hex::decode(expected_hex)?;
        let actual: [u8; 32] = Sha256::digest(&rows).into();
        if actual.as_slice() != expected.as_slice() {
            return Err(ArtifactError::RowsHashMismatch);
        }
    }

    let row_aids_path = dir.join("row_aids.bin");
    let row_aids = if row_aids_path.exists() {
        Some(crate::row_aids::read_row_aids(&row_aids_path, header.num_states)?)
    } else {
        None
    };

    GdfaImage::new(header, rows, row_aids)
}
