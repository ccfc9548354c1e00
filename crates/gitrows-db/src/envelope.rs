//! Outer envelope around stored index values
//!
//! Every stored value starts with a one byte tag naming how the payload is
//! wrapped. The envelope in use is a value handed to whoever seals or opens
//! index values; the store records the one it was created with.

use gitrows_core::{DecodingError, EncodingError};

const TAG_PLAIN: u8 = 0;
const TAG_ZSTD: u8 = 1;

/// Default zstd level for new stores
pub const DEFAULT_LEVEL: i32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Envelope {
    Plain,
    Zstd { level: i32 },
}

impl Default for Envelope {
    fn default() -> Self {
        Envelope::Zstd {
            level: DEFAULT_LEVEL,
        }
    }
}

impl Envelope {
    fn tag(&self) -> u8 {
        match self {
            Envelope::Plain => TAG_PLAIN,
            Envelope::Zstd { .. } => TAG_ZSTD,
        }
    }

    /// Wraps an encoded key into a stored value
    pub fn seal(&self, payload: &[u8]) -> Result<Vec<u8>, EncodingError> {
        let mut out = vec![self.tag()];
        match self {
            Envelope::Plain => out.extend_from_slice(payload),
            Envelope::Zstd { level } => {
                let compressed = zstd::encode_all(payload, *level)
                    .map_err(|e| EncodingError::Envelope(e.to_string()))?;
                out.extend_from_slice(&compressed);
            }
        }
        Ok(out)
    }

    /// Unwraps a stored value produced by [`Envelope::seal`] of the same kind
    pub fn open(&self, value: &[u8]) -> Result<Vec<u8>, DecodingError> {
        let (&tag, payload) = value
            .split_first()
            .ok_or_else(|| DecodingError::Envelope("empty value".to_string()))?;

        if tag != self.tag() {
            return Err(DecodingError::Envelope(format!(
                "value tagged {} does not match {} envelope",
                tag,
                self.name()
            )));
        }

        match self {
            Envelope::Plain => Ok(payload.to_vec()),
            Envelope::Zstd { .. } => {
                zstd::decode_all(payload).map_err(|e| DecodingError::Envelope(e.to_string()))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Envelope::Plain => "plain",
            Envelope::Zstd { .. } => "zstd",
        }
    }

    /// Metadata form: tag followed by the little-endian level
    pub(crate) fn to_meta(self) -> Vec<u8> {
        let level = match self {
            Envelope::Plain => 0,
            Envelope::Zstd { level } => level,
        };
        let mut out = vec![self.tag()];
        out.extend_from_slice(&level.to_le_bytes());
        out
    }

    pub(crate) fn from_meta(bytes: &[u8]) -> Option<Self> {
        let (&tag, level) = bytes.split_first()?;
        let level = i32::from_le_bytes(level.try_into().ok()?);
        match tag {
            TAG_PLAIN => Some(Envelope::Plain),
            TAG_ZSTD => Some(Envelope::Zstd { level }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seal_open_plain() {
        let env = Envelope::Plain;
        let sealed = env.seal(b"payload").unwrap();
        assert_eq!(sealed[0], TAG_PLAIN);
        assert_eq!(env.open(&sealed).unwrap(), b"payload");
    }

    #[test]
    fn test_seal_open_zstd() {
        let env = Envelope::default();
        let payload = b"commit-file key ".repeat(20);
        let sealed = env.seal(&payload).unwrap();
        assert_eq!(sealed[0], TAG_ZSTD);
        assert!(sealed.len() < payload.len());
        assert_eq!(env.open(&sealed).unwrap(), payload);
    }

    #[test]
    fn test_open_rejects_other_kind() {
        let sealed = Envelope::Plain.seal(b"x").unwrap();
        assert!(matches!(
            Envelope::default().open(&sealed),
            Err(DecodingError::Envelope(_))
        ));
    }

    #[test]
    fn test_open_rejects_empty_and_garbage() {
        assert!(Envelope::Plain.open(&[]).is_err());
        assert!(Envelope::default().open(&[TAG_ZSTD, 1, 2, 3]).is_err());
    }

    #[test]
    fn test_meta_roundtrip() {
        for env in [Envelope::Plain, Envelope::Zstd { level: 7 }] {
            assert_eq!(Envelope::from_meta(&env.to_meta()), Some(env));
        }
        assert_eq!(Envelope::from_meta(&[9, 0, 0, 0, 0]), None);
    }
}
