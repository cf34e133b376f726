use crate::error::EngineError;

/// Client-side abstraction over a 1-of-m oblivious transfer (spec §4.7).
///
/// Implementors need only provide one of [`Self::choose_one`] (local/direct
/// modes) or [`Self::acquire_gk`] (the true OT round trip); the engine
/// prefers `choose_one` when it's overridden and falls back to
/// `acquire_gk` otherwise. Leaving both at their default produces a
/// [`EngineError::ChooserMethodUnsupported`] the first time the engine asks.
pub trait Chooser {
    /// Hint that row `row` will be scanned soon, so a remote chooser may
    /// batch-fetch the server's per-row payload ahead of the oblivious
    /// selection. Local choosers can ignore this.
    fn ensure_row_cached(&mut self, _row: u32) -> Result<(), EngineError> {
        Ok(())
    }

    /// Local/direct selection: returns `GK[row][col]` without an AAD round
    /// trip. Overridden by every chooser in this workspace except the
    /// purely remote one.
    fn choose_one(&mut self, _row: u32, _col: u16) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::ChooserMethodUnsupported("choose_one"))
    }

    /// True 1-of-`m` OT: `aad` binds the request to `(session, row)` per
    /// the fixed AAD format (spec §4.6); `col` is hidden from the callee's
    /// transport by construction, not by this trait.
    fn acquire_gk(&mut self, _row: u32, _m: u32, _col: u16, _aad: &[u8]) -> Result<Vec<u8>, EngineError> {
        Err(EngineError::ChooserMethodUnsupported("acquire_gk"))
    }

    /// Whether `choose_one` is meaningfully implemented; lets the engine
    /// skip straight to `acquire_gk` without paying for a guaranteed-to-fail
    /// call first.
    fn supports_choose_one(&self) -> bool {
        true
    }
}

/// `"ZIDS|GK|sid=" ‖ session_id_ascii ‖ "|row=" ‖ I2OSP(row,4)"` (spec §4.6).
pub fn aad_for_row(session_id: &str, row: u32) -> Vec<u8> {
    let mut out = Vec::with_capacity(16 + session_id.len());
    out.extend_from_slice(b"ZIDS|GK|sid=");
    out.extend_from_slice(session_id.as_bytes());
    out.extend_from_slice(b"|row=");
    out.extend_from_slice(&zids_codec::i2osp(row as u64, 4).expect("row fits in 4 bytes"));
    out
}
