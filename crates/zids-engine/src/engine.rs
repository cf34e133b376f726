use std::collections::HashMap;

use tracing::instrument;
use zids_artifact::{GdfaImage, RowAlphabetMap};
use zids_codec::{prg, seed_from_gk, PRG_LABEL_CELL};

use crate::chooser::{aad_for_row, Chooser};
use crate::error::EngineError;

#[derive(Clone, Debug)]
pub struct EngineConfig {
    pub session_id: String,
    /// Seed length in bytes (`k_bits/8`); independent of the artifact's
    /// `cell_bytes`.
    pub k_bytes: usize,
    /// Expected group-key length in bytes. Every `gk` a chooser returns is
    /// checked against this before being handed to `seed_from_gk` (spec §7:
    /// "the chooser returns a key of the wrong length" is a `ProtocolError`).
    pub gk_bytes: usize,
    /// Cache `(row, col) -> GK` within one engine instance to skip repeat
    /// OT round trips across the same input. Off by default for strict
    /// remote OT; local testing choosers may enable it.
    pub enable_gk_cache: bool,
    /// Accept the legacy `[aid][next_row]` cell layout as a fallback when
    /// the canonical layout fails to decode. Off by default (spec §9
    /// REDESIGN FLAGS: canonical layout only unless explicitly enabled).
    pub allow_legacy_layout: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            session_id: String::new(),
            k_bytes: 16,
            gk_bytes: 32,
            enable_gk_cache: false,
            allow_legacy_layout: false,
        }
    }
}

/// The per-byte matching state machine (spec §4.6, §4.8). Holds no global
/// state; construct one per scan.
pub struct Engine<'a, C: Chooser> {
    image: &'a GdfaImage,
    row_alphabet: &'a RowAlphabetMap,
    chooser: C,
    config: EngineConfig,
    row: u32,
    row_bits: u32,
    gk_cache: HashMap<(u32, u16), Vec<u8>>,
}

impl<'a, C: Chooser> Engine<'a, C> {
    pub fn new(image: &'a GdfaImage, row_alphabet: &'a RowAlphabetMap, chooser: C, config: EngineConfig) -> Self {
        let row_bits = bits_needed(image.num_states().saturating_sub(1) as u64);
        let row = image.start_row();
        Self {
            image,
            row_alphabet,
            chooser,
            config,
            row,
            row_bits,
            gk_cache: HashMap::new(),
        }
    }

    pub fn current_row(&self) -> u32 {
        self.row
    }

    /// Runs the whole input and returns `(offset, attack_id)` hits in
    /// input-byte order.
    #[instrument(skip(self, data), fields(session_id = %self.config.session_id, len = data.len()))]
    pub fn run(&mut self, data: &[u8]) -> Result<Vec<(usize, u32)>, EngineError> {
        let mut hits = Vec::new();
        for (offset, &byte) in data.iter().enumerate() {
            if let Some(aid) = self.step(offset, byte)? {
                hits.push((offset, aid));
            }
        }
        Ok(hits)
    }

    /// One decrypt-and-decode cycle for a single input byte. Returns
    /// `Some(aid)` if the post-transition row is accepting.
    fn step(&mut self, offset: usize, byte: u8) -> Result<Option<u32>, EngineError> {
        let row = self.row;
        let candidates = self.row_alphabet.cols_candidates(row, byte)?;
        if candidates.is_empty() {
            return Err(EngineError::NoCandidates { row, byte });
        }

        self.chooser.ensure_row_cached(row)?;

        let num_cols = self.row_alphabet.num_cols(row)?;
        for &col in &candidates {
            if col as u32 >= num_cols {
                return Err(EngineError::CandidateOutOfRange { row, col, num_cols });
            }
            if let Some((next_row, cell_aid)) = self.try_candidate(row, col, num_cols)? {
                self.row = next_row;
                // row_aids[r] takes priority over the cell's own aid (spec §4.6 step 4).
                let row_aid = self.image.row_aid(next_row);
                let aid = if row_aid > 0 { row_aid } else { cell_aid };
                return Ok(if aid > 0 { Some(aid) } else { None });
            }
        }

        Err(EngineError::AllCandidatesFailed { row, offset })
    }

    fn try_candidate(&mut self, row: u32, col: u16, num_cols: u32) -> Result<Option<(u32, u32)>, EngineError> {
        let gk = self.get_gk(row, col, num_cols)?;
        let cell_bytes = self.image.cell_bytes();
        let seed = seed_from_gk(&gk, row, col, self.config.k_bytes)?;
        let pad = prg(&seed, PRG_LABEL_CELL, cell_bytes)?;

        let cipher = self.image.get_cell(row, col)?;
        let mut plain = vec![0u8; cell_bytes];
        for i in 0..cell_bytes {
            plain[i] = cipher[i] ^ pad[i];
        }

        let num_states = self.image.num_states();
        let aid_bits = self.image.aid_bits();

        if let Some(decoded) = decode_canonical(&plain, self.row_bits, aid_bits, num_states) {
            return Ok(Some(decoded));
        }
        if self.config.allow_legacy_layout {
            if let Some(decoded) = decode_legacy(&plain, self.row_bits, aid_bits, num_states) {
                log::debug!("row {row} col {col}: canonical layout failed to decode, legacy layout matched");
                return Ok(Some(decoded));
            }
        }
        log::warn!("row {row} col {col}: candidate decoded to no valid next_row under any known cell layout");
        Ok(None)
    }

    fn get_gk(&mut self, row: u32, col: u16, num_cols: u32) -> Result<Vec<u8>, EngineError> {
        if self.config.enable_gk_cache {
            if let Some(gk) = self.gk_cache.get(&(row, col)) {
                return Ok(gk.clone());
            }
        }
        let gk = if self.chooser.supports_choose_one() {
            match self.chooser.choose_one(row, col) {
                Ok(gk) => gk,
                Err(EngineError::ChooserMethodUnsupported(_)) => {
                    log::debug!("chooser has no choose_one fast path for row {row}, falling back to acquire_gk");
                    let aad = aad_for_row(&self.config.session_id, row);
                    self.chooser.acquire_gk(row, num_cols, col, &aad)?
                }
                Err(e) => return Err(e),
            }
        } else {
            let aad = aad_for_row(&self.config.session_id, row);
            self.chooser.acquire_gk(row, num_cols, col, &aad)?
        };
        if gk.len() != self.config.gk_bytes {
            log::error!("chooser returned a {}-byte gk, expected {}", gk.len(), self.config.gk_bytes);
            return Err(EngineError::BadGkLength {
                expected: self.config.gk_bytes,
                actual: gk.len(),
            });
        }
        if self.config.enable_gk_cache {
            self.gk_cache.insert((row, col), gk.clone());
        }
        Ok(gk)
    }

}

/// `[next_row : row_bits][attack_id : aid_bits]`, little-endian.
fn decode_canonical(plain: &[u8], row_bits: u32, aid_bits: u32, num_states: u32) -> Option<(u32, u32)> {
    let value = le_to_u64(plain);
    let row_mask = mask(row_bits);
    let aid_mask = mask(aid_bits);
    let next_row = (value & row_mask) as u32;
    let aid = ((value >> row_bits) & aid_mask) as u32;
    (next_row < num_states).then_some((next_row, aid))
}

/// Compatibility fallback: `[attack_id : aid_bits][next_row : row_bits]`.
fn decode_legacy(plain: &[u8], row_bits: u32, aid_bits: u32, num_states: u32) -> Option<(u32, u32)> {
    let value = le_to_u64(plain);
    let row_mask = mask(row_bits);
    let aid_mask = mask(aid_bits);
    let next_row = ((value >> aid_bits) & row_mask) as u32;
    let aid = (value & aid_mask) as u32;
    (next_row < num_states).then_some((next_row, aid))
}

fn le_to_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    let n = bytes.len().min(8);
    buf[..n].copy_from_slice(&bytes[..n]);
    u64::from_le_bytes(buf)
}

fn mask(bits: u32) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1u64 << bits) - 1
    }
}

fn bits_needed(max_value: u64) -> u32 {
    if max_value == 0 {
        1
    } else {
        64 - max_value.leading_zeros()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap as StdHashMap;
    use zids_artifact::{GdfaHeader, RowAlphabetMeta};
    use zids_codec::{gk_from_master, prg as codec_prg, seed_from_gk};

    /// Local chooser that simply looks GKs up from an in-memory table; used
    /// to exercise the engine without a real session boundary.
    struct TableChooser {
        table: StdHashMap<(u32, u16), Vec<u8>>,
    }

    impl Chooser for TableChooser {
        fn choose_one(&mut self, row: u32, col: u16) -> Result<Vec<u8>, EngineError> {
            self.table
                .get(&(row, col))
                .cloned()
                .ok_or(EngineError::CandidateOutOfRange { row, col, num_cols: 0 })
        }
    }

    fn build_two_state_loop(master: &[u8]) -> (GdfaHeader, Vec<u8>, RowAlphabetMeta, Vec<u8>, StdHashMap<(u32, u16), Vec<u8>>) {
        // 2 states, outmax=2, cell_bytes big enough for row_bits=1, aid_bits=8 -> 9 bits -> 2 bytes.
        // row 0: byte 'a' (97) -> col 0 -> state1 (aid 7); everything else -> col1 -> state0 (aid 0)
        // row 1: everything -> col0 -> state1 (aid 7, self-loop)
        let cell_bytes = 2usize;
        let outmax = 2u32;
        let row_bytes = cell_bytes * outmax as usize;
        let mut rows = vec![0u8; 2 * row_bytes];
        let mut gk_table = StdHashMap::new();

        let mut alph_table = vec![0u8; 2 * 256];
        for b in 0..256usize {
            alph_table[b] = if b == b'a' as usize { 0 } else { 1 };
        }
        for b in 0..256usize {
            alph_table[256 + b] = 0;
        }

        let plans = [
            // (row, col, next_row, aid)
            (0u32, 0u16, 1u32, 7u32),
            (0u32, 1u16, 0u32, 0u32),
            (1u32, 0u16, 1u32, 7u32),
        ];
        for &(row, col, next_row, aid) in &plans {
            let gk = gk_from_master(master, row, col, 32).unwrap();
            let seed = seed_from_gk(&gk, row, col, 16).unwrap();
            let pad = codec_prg(&seed, PRG_LABEL_CELL, cell_bytes).unwrap();
            let value: u64 = (next_row as u64) | ((aid as u64) << 1);
            let plain = value.to_le_bytes();
            let mut cipher = [0u8; 2];
            for i in 0..cell_bytes {
                cipher[i] = plain[i] ^ pad[i];
            }
            let offset = row as usize * row_bytes + col as usize * cell_bytes;
            rows[offset..offset + cell_bytes].copy_from_slice(&cipher);
            gk_table.insert((row, col), gk);
        }

        let header = GdfaHeader {
            alphabet_size: 256,
            outmax,
            cmax: 1,
            num_states: 2,
            start_row: 0,
            permutation: vec![0, 1],
            cell_bytes: cell_bytes as u32,
            row_bytes: row_bytes as u32,
            aid_bits: 8,
            rows_sha256: None,
        };
        let meta = RowAlphabetMeta {
            num_rows: 2,
            cols_per_row: vec![2, 1],
            format: "single8".into(),
        };
        (header, rows, meta, alph_table, gk_table)
    }

    #[test]
    fn walks_a_small_automaton_and_reports_hits() {
        let master = [7u8; 16];
        let (header, rows, meta, alph_table, gk_table) = build_two_state_loop(&master);
        let image = GdfaImage::new(header, rows, None).unwrap();
        let row_alphabet = RowAlphabetMap::new(meta, alph_table).unwrap();
        let chooser = TableChooser { table: gk_table };
        let config = EngineConfig {
            session_id: "s1".into(),
            k_bytes: 16,
            gk_bytes: 32,
            enable_gk_cache: true,
            allow_legacy_layout: false,
        };
        let mut engine = Engine::new(&image, &row_alphabet, chooser, config);

        let hits = engine.run(b"xax").unwrap();
        // byte 'x' (not 'a') keeps row 0 -> no hit; 'a' -> row1 (aid 7) -> hit;
        // second 'x' stays at row1 (self-loop, aid 7 again).
        assert_eq!(hits, vec![(1, 7), (2, 7)]);
    }

    #[test]
    fn row_aids_table_takes_priority_over_a_zero_cell_aid() {
        // Same automaton, but every cell is packed with aid=0; row 1 is marked
        // accepting (aid=9) only via the row_aids side table.
        let master = [3u8; 16];
        let (header, mut rows, meta, alph_table, mut gk_table_inputs) = build_two_state_loop(&master);
        let cell_bytes = header.cell_bytes as usize;
        let row_bytes = header.row_bytes as usize;
        for &(row, col, next_row) in &[(0u32, 0u16, 1u32), (0u32, 1u16, 0u32), (1u32, 0u16, 1u32)] {
            let gk = gk_table_inputs.remove(&(row, col)).unwrap();
            let seed = seed_from_gk(&gk, row, col, 16).unwrap();
            let pad = codec_prg(&seed, PRG_LABEL_CELL, cell_bytes).unwrap();
            let value: u64 = next_row as u64; // aid=0 in the cell itself
            let plain = value.to_le_bytes();
            let mut cipher = [0u8; 2];
            for i in 0..cell_bytes {
                cipher[i] = plain[i] ^ pad[i];
            }
            let offset = row as usize * row_bytes + col as usize * cell_bytes;
            rows[offset..offset + cell_bytes].copy_from_slice(&cipher);
            gk_table_inputs.insert((row, col), gk);
        }

        let image = GdfaImage::new(header, rows, Some(vec![0, 9])).unwrap();
        let row_alphabet = RowAlphabetMap::new(meta, alph_table).unwrap();
        let chooser = TableChooser { table: gk_table_inputs };
        let config = EngineConfig {
            session_id: "s1".into(),
            k_bytes: 16,
            gk_bytes: 32,
            enable_gk_cache: false,
            allow_legacy_layout: false,
        };
        let mut engine = Engine::new(&image, &row_alphabet, chooser, config);

        let hits = engine.run(b"a").unwrap();
        assert_eq!(hits, vec![(0, 9)]);
    }
}
