//! Fixed-width object hash helpers
//!
//! Hashes travel as 40-character lowercase hex strings in rows and keys and
//! as 20 raw bytes inside the encoded key.

use data_encoding::HEXLOWER;

use crate::error::EncodingError;

/// Width of a raw SHA-1 object id
pub const HASH_LEN: usize = 20;

/// Width of a hex-encoded object id
pub const HASH_HEX_LEN: usize = HASH_LEN * 2;

/// Hex form of the all-zero hash, the "absent" sentinel (e.g. loose objects have no pack)
pub const ZERO_HASH: &str = "0000000000000000000000000000000000000000";

/// Parses a hex hash into raw bytes. `field` names the key field for error reporting.
pub fn parse_hash(field: &'static str, hex: &str) -> Result<[u8; HASH_LEN], EncodingError> {
    let invalid = || EncodingError::InvalidHash {
        field,
        value: hex.to_string(),
    };

    if hex.len() != HASH_HEX_LEN {
        return Err(invalid());
    }
    let raw = HEXLOWER.decode(hex.as_bytes()).map_err(|_| invalid())?;

    let mut out = [0u8; HASH_LEN];
    out.copy_from_slice(&raw);
    Ok(out)
}

/// Renders raw hash bytes as lowercase hex
pub fn hash_hex(raw: &[u8; HASH_LEN]) -> String {
    HEXLOWER.encode(raw)
}

/// Whether `hex` is a well-formed lowercase hex hash
pub fn is_hash(hex: &str) -> bool {
    hex.len() == HASH_HEX_LEN && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}
