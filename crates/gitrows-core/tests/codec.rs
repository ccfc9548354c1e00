//! Property tests for the index key codec

use gitrows_core::{DecodingError, IndexKey, HASH_HEX_LEN, ZERO_HASH};
use proptest::prelude::*;

// ── strategies ───────────────────────────────────────────────────────────────

fn arb_hash() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(ZERO_HASH.to_string()),
        proptest::string::string_regex("[0-9a-f]{40}").unwrap(),
    ]
}

fn arb_key() -> impl Strategy<Value = IndexKey> {
    (
        "[a-z0-9_-]{0,16}",
        arb_hash(),
        any::<u64>(),
        arb_hash(),
        "\\PC{0,48}",
        any::<u32>(),
        arb_hash(),
        arb_hash(),
    )
        .prop_map(|(repository, packfile, offset, hash, name, mode, tree, commit)| IndexKey {
            repository,
            packfile,
            offset,
            hash,
            name,
            mode,
            tree,
            commit,
        })
}

// ── round trip ───────────────────────────────────────────────────────────────

proptest! {
    #[test]
    fn decode_inverts_encode(key in arb_key()) {
        let bytes = key.encode().unwrap();
        prop_assert_eq!(IndexKey::decode(&bytes).unwrap(), key);
    }

    #[test]
    fn every_strict_prefix_is_truncated(key in arb_key(), cut in any::<prop::sample::Index>()) {
        let bytes = key.encode().unwrap();
        let cut = cut.index(bytes.len());
        prop_assert!(matches!(IndexKey::decode(&bytes[..cut]), Err(DecodingError::Truncated)));
    }

    #[test]
    fn encoded_size_is_fixed_plus_strings(key in arb_key()) {
        let bytes = key.encode().unwrap();
        // 2 length prefixes + 4 hashes + offset + mode
        let fixed = 2 * 8 + 4 * (HASH_HEX_LEN / 2) + 8 + 4;
        prop_assert_eq!(bytes.len(), fixed + key.repository.len() + key.name.len());
    }
}

// ── malformed input ──────────────────────────────────────────────────────────

#[test]
fn test_invalid_utf8_name_is_malformed() {
    let key = IndexKey {
        repository: "r".to_string(),
        packfile: ZERO_HASH.to_string(),
        offset: 0,
        hash: ZERO_HASH.to_string(),
        name: "ab".to_string(),
        mode: 0,
        tree: ZERO_HASH.to_string(),
        commit: ZERO_HASH.to_string(),
    };
    let mut bytes = key.encode().unwrap();
    // name bytes start after: len(8) + "r"(1) + pack(20) + offset(8) + hash(20) + len(8)
    let name_at = 8 + 1 + 20 + 8 + 20 + 8;
    bytes[name_at] = 0xff;
    assert!(matches!(IndexKey::decode(&bytes), Err(DecodingError::Malformed(_))));
}

#[test]
fn test_empty_input_is_truncated() {
    assert!(matches!(IndexKey::decode(&[]), Err(DecodingError::Truncated)));
}
