use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CodecError;
use crate::i2osp::i2osp;

type HmacSha256 = Hmac<Sha256>;

/// Seed-expanded PRG. `PRG(seed, label, out_len)` always counter-mode
/// expands (unlike [`crate::prf::prf`], which shortcuts a single HMAC call
/// for short outputs) so that pad material for large cells is generated
/// the same way regardless of `cell_bytes`.
///
/// Each block is `HMAC(seed, "PRG|" ‖ label ‖ "|ctr=" ‖ I2OSP(i,4) ‖
/// "|len=" ‖ I2OSP(out_len,4))`, `i = 1, 2, ...`, concatenated and
/// truncated to `out_len`.
pub fn prg(seed: &[u8], label: &[u8], out_len: usize) -> Result<Vec<u8>, CodecError> {
    if seed.is_empty() {
        return Err(CodecError::EmptyKey);
    }
    let out_len_u64 = out_len as u64;
    let mut out = Vec::with_capacity(out_len);
    let mut counter: u64 = 1;
    while out.len() < out_len {
        let mut mac = HmacSha256::new_from_slice(seed).expect("HMAC accepts any key length");
        mac.update(b"PRG|");
        mac.update(label);
        mac.update(b"|ctr=");
        mac.update(&i2osp(counter, 4)?);
        mac.update(b"|len=");
        mac.update(&i2osp(out_len_u64, 4)?);
        out.extend_from_slice(&mac.finalize().into_bytes());
        counter += 1;
    }
    out.truncate(out_len);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_seed() {
        assert_eq!(prg(b"", b"label", 16), Err(CodecError::EmptyKey));
    }

    #[test]
    fn is_deterministic_and_label_separated() {
        let a = prg(b"seed", b"ZIDS|CELL", 48).unwrap();
        let b = prg(b"seed", b"ZIDS|CELL", 48).unwrap();
        assert_eq!(a, b);
        let c = prg(b"seed", b"other-label", 48).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn exact_length() {
        for len in [0usize, 1, 31, 32, 33, 200] {
            assert_eq!(prg(b"seed", b"ZIDS|CELL", len).unwrap().len(), len);
        }
    }
}
