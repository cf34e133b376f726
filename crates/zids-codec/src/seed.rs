//! Deterministic derivation of group keys and per-cell seeds (spec §4.2).

use crate::error::CodecError;
use crate::i2osp::i2osp;
use crate::prf::prf;

/// PRG label used to expand a seed into a one-time pad for a cell.
pub const PRG_LABEL_CELL: &[u8] = b"ZIDS|CELL";

/// How a session's group keys (and hence per-cell seeds) are derived.
///
/// `Random` is accepted here only so on-disk manifests that name it can be
/// rejected with a clear [`CodecError`]-shaped error higher up the stack
/// (spec §9: "treat this as a configuration error"); this crate never
/// implements it.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum SeedMode {
    /// `seed(r,c) = PRF(master, seed_info(r,c), k_bytes)`; no GK table is
    /// ever materialized.
    MasterToSeed,
    /// `GK[r][c] = PRF(master, gk_info(r,c), gk_bytes)`, then
    /// `seed(r,c) = PRF(GK[r][c], seed_info(r,c), k_bytes)`.
    MasterToGk,
    /// Random per-cell seeds. Disallowed in production; see spec §9.
    Random,
}

/// `"ZIDS|SEED|row=" ‖ I2OSP(row,4) ‖ "|col=" ‖ I2OSP(col,2)"`.
///
/// Fixed once an artifact is built: changing this breaks every artifact
/// built under the old label.
pub fn seed_info(row: u32, col: u16) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(32);
    out.extend_from_slice(b"ZIDS|SEED|row=");
    out.extend_from_slice(&i2osp(row as u64, 4)?);
    out.extend_from_slice(b"|col=");
    out.extend_from_slice(&i2osp(col as u64, 2)?);
    Ok(out)
}

/// `"ZIDS|GK|row=" ‖ I2OSP(row,4) ‖ "|col=" ‖ I2OSP(col,2)"`.
pub fn gk_info(row: u32, col: u16) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::with_capacity(30);
    out.extend_from_slice(b"ZIDS|GK|row=");
    out.extend_from_slice(&i2osp(row as u64, 4)?);
    out.extend_from_slice(b"|col=");
    out.extend_from_slice(&i2osp(col as u64, 2)?);
    Ok(out)
}

/// Derive `GK[row][col]` from a master key (`master→GK→seed` mode).
pub fn gk_from_master(master: &[u8], row: u32, col: u16, gk_bytes: usize) -> Result<Vec<u8>, CodecError> {
    prf(master, &gk_info(row, col)?, gk_bytes)
}

/// Derive the per-cell seed from a group key, regardless of how the group
/// key itself was obtained (table lookup, OT, or just derived in-process).
pub fn seed_from_gk(gk: &[u8], row: u32, col: u16, k_bytes: usize) -> Result<Vec<u8>, CodecError> {
    prf(gk, &seed_info(row, col)?, k_bytes)
}

/// Derive the per-cell seed directly from a master key (`master→seed` mode).
pub fn seed_from_master(master: &[u8], row: u32, col: u16, k_bytes: usize) -> Result<Vec<u8>, CodecError> {
    prf(master, &seed_info(row, col)?, k_bytes)
}
