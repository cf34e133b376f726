use serde::{Deserialize, Serialize};
use zids_codec::SeedMode;

/// Security and sparsity parameters for a build, loaded from TOML the way
/// the rest of the workspace loads configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// Seed length in bits (`k_bits/8 = k_bytes`).
    pub k_bits: u32,
    pub aid_bits: u32,
    pub outmax: u32,
    pub gk_bytes: u32,
    #[serde(rename = "seed_mode")]
    pub seed_mode_name: SeedModeName,
    /// RNG seed for the row permutation; fixed so builds are reproducible.
    pub permutation_seed: u64,
    /// Persist the row-level GK table alongside the artifact. Only
    /// meaningful under `MasterToGk`.
    #[serde(default)]
    pub persist_gk_table: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedModeName {
    MasterToSeed,
    MasterToGk,
}

impl SeedModeName {
    pub fn to_seed_mode(self) -> SeedMode {
        match self {
            SeedModeName::MasterToSeed => SeedMode::MasterToSeed,
            SeedModeName::MasterToGk => SeedMode::MasterToGk,
        }
    }
}

impl BuilderConfig {
    pub fn k_bytes(&self) -> usize {
        (self.k_bits / 8) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_from_toml() {
        let toml_str = r#"
            k_bits = 128
            aid_bits = 16
            outmax = 64
            gk_bytes = 32
            seed_mode = "master_to_gk"
            permutation_seed = 42
            persist_gk_table = true
        "#;
        let config: BuilderConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.k_bytes(), 16);
        assert_eq!(config.seed_mode_name, SeedModeName::MasterToGk);
    }
}
