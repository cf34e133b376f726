use std::collections::HashMap;

use tracing::instrument;
use zids_artifact::{GdfaHeader, GkTable, RowAlphabetMeta};
use zids_codec::{gk_from_master, prg, seed_from_gk, seed_from_master, SeedMode};

use crate::cell_layout::CellLayout;
use crate::config::BuilderConfig;
use crate::error::BuilderError;
use crate::permutation::sample_permutation;
use crate::row_alphabet::{build_row_alphabets, flatten_row_alphabets};

const GK_UNUSED_PREFIX: &[u8] = b"ZIDS|GK|unused|";

/// A compiled automaton in logical (pre-permutation) state space: a total
/// transition function per state and an optional accept id per state.
pub struct CompiledDfa {
    pub num_states: usize,
    pub trans: Vec<HashMap<u8, u32>>,
    pub accept_ids: Vec<u32>,
    pub start_state: u32,
}

/// Everything the builder produces for one artifact.
pub struct BuildOutput {
    pub header: GdfaHeader,
    pub rows: Vec<u8>,
    pub row_aids: Vec<u32>,
    pub gk_table: Option<GkTable>,
    pub row_alphabet_meta: RowAlphabetMeta,
    pub row_alphabet_table: Vec<u8>,
}

/// Consumes a compiled DFA and security/sparsity parameters to produce an
/// encrypted, permuted GDFA artifact (spec §4.5).
#[instrument(skip_all, fields(num_states = dfa.num_states, outmax = config.outmax))]
pub fn build(dfa: &CompiledDfa, config: &BuilderConfig, master: &[u8]) -> Result<BuildOutput, BuilderError> {
    if dfa.num_states == 0 {
        return Err(BuilderError::EmptyAutomaton);
    }

    let row_alphabets = build_row_alphabets(&dfa.trans, config.outmax)?;
    let layout = CellLayout::plan(dfa.num_states, config.aid_bits)?;
    // `permutation[new_row] = old_state` (spec §3); `inverse_permutation[old_state] = new_row`
    // is its mathematical inverse, needed below to place a transition's destination state
    // into the right physical row.
    let (permutation, inverse_permutation) = sample_permutation(dfa.num_states, config.permutation_seed);

    let seed_mode = config.seed_mode_name.to_seed_mode();
    let k_bytes = config.k_bytes();
    let gk_bytes = config.gk_bytes as usize;

    let mut gk_table_rows: Vec<Vec<Vec<u8>>> = Vec::new();
    if matches!(seed_mode, SeedMode::MasterToGk) && config.persist_gk_table {
        gk_table_rows.reserve(dfa.num_states);
    }

    let mut rows = vec![0u8; dfa.num_states * layout.cell_bytes * config.outmax as usize];
    let row_bytes = layout.cell_bytes * config.outmax as usize;

    for new_row in 0..dfa.num_states as u32 {
        let old_state = permutation[new_row as usize];
        let alphabet = &row_alphabets[old_state as usize];
        let aid = dfa.accept_ids.get(old_state as usize).copied().unwrap_or(0);

        let mut gk_row = Vec::with_capacity(config.outmax as usize);

        for col in 0..config.outmax {
            let cell_offset = new_row as usize * row_bytes + col as usize * layout.cell_bytes;
            let cell_slot = &mut rows[cell_offset..cell_offset + layout.cell_bytes];

            if (col as usize) < alphabet.num_cols() {
                let dest_old_state = alphabet.dest_state[col as usize];
                let dest_new_row = inverse_permutation[dest_old_state as usize];
                let plain = pack_real_cell(&layout, dest_new_row, aid)?;
                let seed = derive_real_seed(master, seed_mode, new_row, col as u16, k_bytes, gk_bytes, &mut gk_row)?;
                xor_pad_into(cell_slot, &seed, layout.cell_bytes)?;
                xor_into(cell_slot, &plain);
            } else {
                let dummy_seed = derive_dummy_seed(master, new_row, col as u16, k_bytes, gk_bytes)?;
                xor_pad_into(cell_slot, &dummy_seed, layout.cell_bytes)?;
            }
        }

        if matches!(seed_mode, SeedMode::MasterToGk) && config.persist_gk_table {
            gk_table_rows.push(gk_row);
        }
    }

    let row_aids = aggregate_row_aids(dfa, &permutation);

    // Row-alphabet rows must be reordered into the same new-row space as
    // the rows buffer, since the online engine indexes both by new_row.
    let row_alphabets_new_row_order: Vec<_> = (0..dfa.num_states)
        .map(|new_row| row_alphabets[permutation[new_row] as usize].clone())
        .collect();
    let (cols_per_row, row_alphabet_table) = flatten_row_alphabets(&row_alphabets_new_row_order);
    let row_alphabet_meta = RowAlphabetMeta {
        num_rows: dfa.num_states as u32,
        cols_per_row,
        format: "single8".into(),
    };

    let header = GdfaHeader {
        alphabet_size: 256,
        outmax: config.outmax,
        cmax: 1,
        num_states: dfa.num_states as u32,
        start_row: inverse_permutation[dfa.start_state as usize],
        permutation,
        cell_bytes: layout.cell_bytes as u32,
        row_bytes: row_bytes as u32,
        aid_bits: config.aid_bits,
        rows_sha256: None,
    };

    let gk_table = if gk_table_rows.is_empty() {
        None
    } else {
        log::debug!("persisting gk table: {} rows, {} bytes/key", gk_table_rows.len(), gk_bytes);
        Some(GkTable {
            k_bytes: gk_bytes,
            table: gk_table_rows,
        })
    };

    Ok(BuildOutput {
        header,
        rows,
        row_aids,
        gk_table,
        row_alphabet_meta,
        row_alphabet_table,
    })
}

fn pack_real_cell(layout: &CellLayout, next_row: u32, aid: u32) -> Result<Vec<u8>, BuilderError> {
    layout.pack(next_row, aid)
}

fn derive_real_seed(
    master: &[u8],
    seed_mode: SeedMode,
    row: u32,
    col: u16,
    k_bytes: usize,
    gk_bytes: usize,
    gk_row: &mut Vec<Vec<u8>>,
) -> Result<Vec<u8>, BuilderError> {
    match seed_mode {
        SeedMode::MasterToSeed => Ok(seed_from_master(master, row, col, k_bytes)?),
        SeedMode::MasterToGk => {
            let gk = gk_from_master(master, row, col, gk_bytes)?;
            let seed = seed_from_gk(&gk, row, col, k_bytes)?;
            gk_row.push(gk);
            Ok(seed)
        }
        SeedMode::Random => unreachable!("SeedModeName excludes Random at the config layer"),
    }
}

/// Unused (padding) columns get a seed derived under a distinct PRF domain
/// (`"ZIDS|GK|unused|"`) so their ciphertext is indistinguishable from real
/// cells but never collides with a real column's key schedule.
fn derive_dummy_seed(master: &[u8], row: u32, col: u16, k_bytes: usize, gk_bytes: usize) -> Result<Vec<u8>, BuilderError> {
    use zids_codec::{i2osp, prf};
    let mut label = GK_UNUSED_PREFIX.to_vec();
    label.extend_from_slice(&i2osp(row as u64, 4)?);
    label.push(b'|');
    label.extend_from_slice(&i2osp(col as u64, 2)?);
    let dummy_gk = prf(master, &label, gk_bytes)?;
    Ok(seed_from_gk(&dummy_gk, row, col, k_bytes)?)
}

fn xor_pad_into(cell_slot: &mut [u8], seed: &[u8], cell_bytes: usize) -> Result<(), BuilderError> {
    let pad = prg(seed, zids_codec::PRG_LABEL_CELL, cell_bytes)?;
    cell_slot.copy_from_slice(&pad);
    Ok(())
}

fn xor_into(cell_slot: &mut [u8], plain: &[u8]) {
    for (slot_byte, &plain_byte) in cell_slot.iter_mut().zip(plain.iter()) {
        *slot_byte ^= plain_byte;
    }
}

fn aggregate_row_aids(dfa: &CompiledDfa, permutation: &[u32]) -> Vec<u32> {
    let mut row_aids = vec![0u32; dfa.num_states];
    for new_row in 0..dfa.num_states {
        let old_state = permutation[new_row];
        row_aids[new_row] = dfa.accept_ids.get(old_state as usize).copied().unwrap_or(0);
    }
    row_aids
}
