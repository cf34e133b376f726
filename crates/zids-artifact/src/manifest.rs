use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ArtifactError;
use zids_codec::SeedMode;

/// Which seed-derivation mode an artifact was built under, as recorded in
/// the manifest. `"random"` parses successfully (the manifest is someone
/// else's artifact we still want to *describe*) but every consumer that
/// needs to decrypt must reject it; see [`SeedMode`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ManifestSeedMode {
    #[serde(rename = "master→seed")]
    MasterToSeed,
    #[serde(rename = "master→GK→seed")]
    MasterToGk,
    #[serde(rename = "random")]
    Random,
}

impl ManifestSeedMode {
    pub fn to_seed_mode(self) -> Result<SeedMode, ArtifactError> {
        match self {
            ManifestSeedMode::MasterToSeed => Ok(SeedMode::MasterToSeed),
            ManifestSeedMode::MasterToGk => Ok(SeedMode::MasterToGk),
            ManifestSeedMode::Random => Err(ArtifactError::MalformedHeader(
                "seed_mode \"random\" is a configuration error: seeds are not persisted and the \
                 artifact cannot be decrypted online"
                    .into(),
            )),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CryptoParams {
    pub k: u32,
    pub gk_bytes: u32,
    pub aid_bits: u32,
    pub seed_mode: ManifestSeedMode,
    pub prg_label: String,
}

/// The single JSON file pointing at all other on-disk artifacts.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub artifact_path: String,
    pub row_alph_meta_path: String,
    pub row_alph_table_path: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub row_aids_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub gk_table_dir: Option<String>,
    pub crypto_params: CryptoParams,
}

impl Manifest {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ArtifactError> {
        Ok(serde_json::from_slice(&std::fs::read(path)?)?)
    }

    pub fn write<P: AsRef<Path>>(&self, path: P) -> Result<(), ArtifactError> {
        std::fs::write(path, serde_json::to_vec_pretty(self)?)?;
        Ok(())
    }
}
