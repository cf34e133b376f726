//! Top-level orchestration tying config loading, `build`, and packaging
//! into the single call a CLI or test harness makes (spec §9 supplemented
//! feature: the offline pipeline's external entry point).

use std::path::Path;

use anyhow::{Context, Result};
use zids_artifact::{CryptoParams, Manifest, ManifestSeedMode, Package};

use crate::config::{BuilderConfig, SeedModeName};
use crate::pipeline::{build, CompiledDfa};

/// Loads a `BuilderConfig` from `config_path`, runs `build`, and writes the
/// resulting artifact, row-alphabet partition, and (if persisted) GK table
/// to `out_dir` as a packager directory. Returns the manifest written.
///
/// Mixes `BuilderError`/`ArtifactError`/`io::Error` under one
/// `anyhow::Result`, since at this layer the caller only cares that the
/// whole pipeline succeeded, not which stage failed.
pub fn build_and_package(dfa: &CompiledDfa, config_path: &Path, master: &[u8], out_dir: &Path) -> Result<Manifest> {
    let config_text = std::fs::read_to_string(config_path)
        .with_context(|| format!("reading builder config from {}", config_path.display()))?;
    let config: BuilderConfig = toml::from_str(&config_text).context("parsing builder config toml")?;

    log::debug!(
        "starting build: num_states={} outmax={} seed_mode={:?}",
        dfa.num_states,
        config.outmax,
        config.seed_mode_name
    );

    let out = build(dfa, &config, master).context("building gdfa artifact")?;

    let crypto_params = CryptoParams {
        k: config.k_bits,
        gk_bytes: config.gk_bytes,
        aid_bits: config.aid_bits,
        seed_mode: manifest_seed_mode(config.seed_mode_name),
        prg_label: "ZIDS|CELL".into(),
    };
    let package = Package {
        header: &out.header,
        rows: &out.rows,
        row_aids: Some(&out.row_aids),
        row_alphabet_meta: &out.row_alphabet_meta,
        row_alphabet_table: &out.row_alphabet_table,
        gk_table: out.gk_table.as_ref(),
        crypto_params,
    };

    let manifest = zids_artifact::write_package(out_dir, &package)
        .with_context(|| format!("writing package to {}", out_dir.display()))?;

    log::info!(
        "wrote package to {}: {} states, gk_table={}",
        out_dir.display(),
        out.header.num_states,
        manifest.gk_table_dir.is_some()
    );

    Ok(manifest)
}

fn manifest_seed_mode(name: SeedModeName) -> ManifestSeedMode {
    match name {
        SeedModeName::MasterToSeed => ManifestSeedMode::MasterToSeed,
        SeedModeName::MasterToGk => ManifestSeedMode::MasterToGk,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn tiny_dfa() -> CompiledDfa {
        let mut s0 = HashMap::new();
        let mut s1 = HashMap::new();
        for b in 0u16..256 {
            let b = b as u8;
            s0.insert(b, if b == b'a' { 1 } else { 0 });
            s1.insert(b, 1);
        }
        CompiledDfa {
            num_states: 2,
            trans: vec![s0, s1],
            accept_ids: vec![0, 7],
            start_state: 0,
        }
    }

    #[test]
    fn loads_config_builds_and_writes_a_package() {
        let config_dir = tempfile::tempdir().unwrap();
        let config_path = config_dir.path().join("builder.toml");
        std::fs::write(
            &config_path,
            r#"
                k_bits = 128
                aid_bits = 16
                outmax = 4
                gk_bytes = 32
                seed_mode = "master_to_gk"
                permutation_seed = 1
                persist_gk_table = true
            "#,
        )
        .unwrap();

        let out_dir = tempfile::tempdir().unwrap();
        let manifest = build_and_package(&tiny_dfa(), &config_path, &[2u8; 16], out_dir.path()).unwrap();
        assert!(manifest.gk_table_dir.is_some());

        let (loaded_manifest, image, row_alphabet, gk_table) = zids_artifact::load_package(out_dir.path()).unwrap();
        assert_eq!(loaded_manifest, manifest);
        assert_eq!(image.num_states(), 2);
        assert_eq!(row_alphabet.num_rows(), 2);
        assert!(gk_table.is_some());
    }

    #[test]
    fn reports_context_when_the_config_file_is_missing() {
        let out_dir = tempfile::tempdir().unwrap();
        let err = build_and_package(&tiny_dfa(), Path::new("/nonexistent/builder.toml"), &[0u8; 16], out_dir.path())
            .unwrap_err();
        assert!(format!("{err:#}").contains("reading builder config"));
    }
}
