//! Ties the container, row-alphabet partition, row-accept table, and
//! (optional) group-key table into the single on-disk package spec
//! component 8 ("Packager") describes: one directory, one `manifest.json`
//! naming every other file in it.

use std::path::Path;

use crate::container::{load_container, write_container};
use crate::error::ArtifactError;
use crate::gk_table::GkTable;
use crate::header::GdfaHeader;
use crate::image::GdfaImage;
use crate::manifest::{CryptoParams, Manifest};
use crate::partition::{load_row_alphabet, write_row_alphabet, RowAlphabetMap, RowAlphabetMeta};

const ARTIFACT_FILE_NAME: &str = "artifact.zids";
const ROW_ALPH_META_NAME: &str = "row_alph.json";
const ROW_ALPH_TABLE_NAME: &str = "row_alph.bin";
const GK_TABLE_DIR_NAME: &str = "gk_table";
const MANIFEST_NAME: &str = "manifest.json";

/// Everything a freshly built artifact needs on disk: the GDFA image and
/// its row-accept table, the row-alphabet partition, and an optional
/// group-key table (present only when the builder was run with
/// `persist_gk_table = true`).
pub struct Package<'a> {
    pub header: &'a GdfaHeader,
    pub rows: &'a [u8],
    pub row_aids: Option<&'a [u32]>,
    pub row_alphabet_meta: &'a RowAlphabetMeta,
    pub row_alphabet_table: &'a [u8],
    pub gk_table: Option<&'a GkTable>,
    pub crypto_params: CryptoParams,
}

/// Writes every file of `package` under `dir`, including `manifest.json`,
/// and returns the manifest that was written.
pub fn write_package<P: AsRef<Path>>(dir: P, package: &Package<'_>) -> Result<Manifest, ArtifactError> {
    let dir = dir.as_ref();
    std::fs::create_dir_all(dir)?;

    write_container(dir.join(ARTIFACT_FILE_NAME), package.header, package.rows, package.row_aids)?;
    write_row_alphabet(
        dir.join(ROW_ALPH_META_NAME),
        dir.join(ROW_ALPH_TABLE_NAME),
        package.row_alphabet_meta,
        package.row_alphabet_table,
    )?;

    let gk_table_dir = if let Some(gk_table) = package.gk_table {
        gk_table.write(dir.join(GK_TABLE_DIR_NAME))?;
        Some(GK_TABLE_DIR_NAME.to_string())
    } else {
        None
    };

    let manifest = Manifest {
        artifact_path: ARTIFACT_FILE_NAME.to_string(),
        row_alph_meta_path: ROW_ALPH_META_NAME.to_string(),
        row_alph_table_path: ROW_ALPH_TABLE_NAME.to_string(),
        // Row-accept ids ride inside the container file itself (a presence
        // flag plus the encoded table); there is no separate file to name.
        row_aids_path: None,
        gk_table_dir,
        crypto_params: package.crypto_params.clone(),
    };
    manifest.write(dir.join(MANIFEST_NAME))?;
    Ok(manifest)
}

/// Loads a package written by [`write_package`]: the manifest, the GDFA
/// image (row_aids threaded through automatically since the container form
/// carries them inline), the row-alphabet partition, and the group-key
/// table if the manifest names one.
pub fn load_package<P: AsRef<Path>>(
    dir: P,
) -> Result<(Manifest, GdfaImage, RowAlphabetMap, Option<GkTable>), ArtifactError> {
    let dir = dir.as_ref();
    let manifest = Manifest::load(dir.join(MANIFEST_NAME))?;

    let image = load_container(dir.join(&manifest.artifact_path))?;
    let row_alphabet = load_row_alphabet(dir.join(&manifest.row_alph_meta_path), dir.join(&manifest.row_alph_table_path))?;
    let gk_table = manifest
        .gk_table_dir
        .as_ref()
        .map(|gk_dir| GkTable::load(dir.join(gk_dir)))
        .transpose()?;

    Ok((manifest, image, row_alphabet, gk_table))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::ManifestSeedMode;

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

    fn sample_row_alphabet() -> (RowAlphabetMeta, Vec<u8>) {
        let meta = RowAlphabetMeta {
            num_rows: 2,
            cols_per_row: vec![2, 1],
            format: "single8".into(),
        };
        (meta, vec![0u8; 2 * 256])
    }

    fn crypto_params() -> CryptoParams {
        CryptoParams {
            k: 128,
            gk_bytes: 32,
            aid_bits: 8,
            seed_mode: ManifestSeedMode::MasterToGk,
            prg_label: "ZIDS|CELL".into(),
        }
    }

    #[test]
    fn round_trips_a_full_package_without_a_gk_table() {
        let header = sample_header();
        let rows = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let row_aids = [0u32, 9];
        let (row_alph_meta, row_alph_table) = sample_row_alphabet();

        let package = Package {
            header: &header,
            rows: &rows,
            row_aids: Some(&row_aids),
            row_alphabet_meta: &row_alph_meta,
            row_alphabet_table: &row_alph_table,
            gk_table: None,
            crypto_params: crypto_params(),
        };

        let dir = tempfile::tempdir().unwrap();
        let manifest = write_package(dir.path(), &package).unwrap();
        assert!(manifest.gk_table_dir.is_none());

        let (loaded_manifest, image, row_alphabet, gk_table) = load_package(dir.path()).unwrap();
        assert_eq!(loaded_manifest, manifest);
        assert_eq!(image.row_aid(1), 9);
        assert_eq!(row_alphabet.num_cols(0).unwrap(), 2);
        assert!(gk_table.is_none());
    }

    #[test]
    fn round_trips_a_full_package_with_a_gk_table() {
        let header = sample_header();
        let rows = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let (row_alph_meta, row_alph_table) = sample_row_alphabet();
        let gk_table = GkTable {
            k_bytes: 4,
            table: vec![vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8]], vec![vec![9, 9, 9, 9]]],
        };

        let package = Package {
            header: &header,
            rows: &rows,
            row_aids: None,
            row_alphabet_meta: &row_alph_meta,
            row_alphabet_table: &row_alph_table,
            gk_table: Some(&gk_table),
            crypto_params: crypto_params(),
        };

        let dir = tempfile::tempdir().unwrap();
        let manifest = write_package(dir.path(), &package).unwrap();
        assert_eq!(manifest.gk_table_dir.as_deref(), Some(GK_TABLE_DIR_NAME));
        assert!(manifest.row_aids_path.is_none());

        let (_, _, _, loaded_gk_table) = load_package(dir.path()).unwrap();
        assert_eq!(loaded_gk_table.unwrap(), gk_table);
    }
}
