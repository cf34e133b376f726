use std::collections::HashMap;

use crate::error::BuilderError;

const ALPHABET_SIZE: usize = 256;

/// One row's byte→column partition plus, for each column, which logical
/// (pre-permutation) state it transitions to.
#[derive(Clone, Debug)]
pub struct RowAlphabetBuild {
    pub byte_to_col: [u8; ALPHABET_SIZE],
    pub dest_state: Vec<u32>,
}

impl RowAlphabetBuild {
    pub fn num_cols(&self) -> usize {
        self.dest_state.len()
    }
}

/// Rejects any state whose transition map is not total over `0..256`.
pub fn check_total_transitions(trans: &[HashMap<u8, u32>]) -> Result<(), BuilderError> {
    for (state, mp) in trans.iter().enumerate() {
        if mp.len() != ALPHABET_SIZE {
            let missing: Vec<u8> = (0u8..=255).filter(|b| !mp.contains_key(b)).take(8).collect();
            let more = if mp.len() + 8 < ALPHABET_SIZE { ", ..." } else { "" };
            return Err(BuilderError::NonTotalTransitions { state, missing, more });
        }
    }
    Ok(())
}

/// Groups bytes of row `state` by destination state, one column per group,
/// columns ordered by ascending minimum byte in the group. Rejects rows
/// whose group count exceeds `outmax`.
pub fn build_row_alphabets(
    trans: &[HashMap<u8, u32>],
    outmax: u32,
) -> Result<Vec<RowAlphabetBuild>, BuilderError> {
    check_total_transitions(trans)?;

    let mut rows = Vec::with_capacity(trans.len());
    for (state, mp) in trans.iter().enumerate() {
        let mut next_to_bytes: std::collections::BTreeMap<u32, Vec<u8>> = std::collections::BTreeMap::new();
        for b in 0..ALPHABET_SIZE {
            next_to_bytes.entry(mp[&(b as u8)]).or_default().push(b as u8);
        }

        let mut groups: Vec<(u32, Vec<u8>)> = next_to_bytes.into_iter().collect();
        groups.sort_by_key(|(_, bytes)| bytes[0]);

        if groups.len() > outmax as usize {
            return Err(BuilderError::OutdegreeExceedsOutmax {
                row: state,
                num_groups: groups.len(),
                outmax,
            });
        }

        let mut byte_to_col = [0u8; ALPHABET_SIZE];
        let mut dest_state = Vec::with_capacity(groups.len());
        for (col_idx, (next_state, bytes)) in groups.into_iter().enumerate() {
            for b in bytes {
                byte_to_col[b as usize] = col_idx as u8;
            }
            dest_state.push(next_state);
        }

        rows.push(RowAlphabetBuild { byte_to_col, dest_state });
    }
    Ok(rows)
}

/// Flattens `rows` into the "single8" on-disk layout the loader expects
/// (spec §4.4, §6): `table[r*256 + b] = column`, plus the `cols_per_row`
/// metadata recorded alongside it.
pub fn flatten_row_alphabets(rows: &[RowAlphabetBuild]) -> (Vec<u32>, Vec<u8>) {
    let cols_per_row = rows.iter().map(|r| r.num_cols() as u32).collect();
    let mut table = Vec::with_capacity(rows.len() * ALPHABET_SIZE);
    for row in rows {
        table.extend_from_slice(&row.byte_to_col);
    }
    (cols_per_row, table)
}
