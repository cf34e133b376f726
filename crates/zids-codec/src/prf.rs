use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::CodecError;
use crate::i2osp::i2osp;

type HmacSha256 = Hmac<Sha256>;

const DIGEST_LEN: usize = 32;

/// HMAC-SHA256-based PRF. Emits exactly `out_len` bytes, counter-mode
/// expanding past one digest's worth of output.
///
/// `PRF(key, msg, out_len)`: for `out_len <= 32` this is a single HMAC
/// call truncated to `out_len`; for longer outputs, blocks
/// `HMAC(key, msg ‖ "|ctr=" ‖ I2OSP(i,4) ‖ "|len=" ‖ I2OSP(out_len,4))`,
/// `i = 1, 2, ...`, are concatenated and truncated to `out_len`.
pub fn prf(key: &[u8], msg: &[u8], out_len: usize) -> Result<Vec<u8>, CodecError> {
    if key.is_empty() {
        return Err(CodecError::EmptyKey);
    }
    if out_len <= DIGEST_LEN {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(msg);
        let digest = mac.finalize().into_bytes();
        return Ok(digest[..out_len].to_vec());
    }

    let out_len_u64 = out_len as u64;
    let mut out = Vec::with_capacity(out_len);
    let mut counter: u64 = 1;
    while out.len() < out_len {
        let mut mac = HmacSha256::new_from_slice(key).expect("HMAC accepts any key length");
        mac.update(msg);
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
