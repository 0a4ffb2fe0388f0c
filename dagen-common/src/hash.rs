//! FNV-1a hashing for semantic keys, batch keys and shard selection
//!
//! Every identity in the service reduces to this one hash: record semantic
//! keys, (batch, provider) version-table keys, and file-to-shard assignment.
//! FNV-1a is deterministic across runs, so a file name always lands on the
//! same shard within a round and across rounds.

/// FNV-1a 32-bit hash
pub fn fnv1a_32(data: &[u8]) -> u32 {
    let mut h: u32 = 0x811c_9dc5;
    for &b in data {
        h ^= b as u32;
        h = h.wrapping_mul(0x0100_0193);
    }
    h
}

/// Hash a string with FNV-1a
pub fn hash_str(s: &str) -> u32 {
    fnv1a_32(s.as_bytes())
}

/// Version-table key for a (batch name, provider) pair
pub fn batch_key_hash(batch_name: &str, provider: &str) -> u32 {
    hash_str(&format!("{batch_name}|{provider}"))
}

/// Shard index for a file name, given the worker count
pub fn shard_of(file_name: &str, shards: usize) -> usize {
    hash_str(file_name) as usize % shards
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_fnv1a_vectors() {
        // Offset basis for the empty input, reference value for "a".
        assert_eq!(fnv1a_32(b""), 0x811c_9dc5);
        assert_eq!(fnv1a_32(b"a"), 0xe40c_292c);
    }

    #[test]
    fn hash_is_deterministic() {
        assert_eq!(hash_str("batch-0001|providerX"), hash_str("batch-0001|providerX"));
    }

    #[test]
    fn batch_key_separates_name_and_provider() {
        // The separator keeps ("ab", "c") and ("a", "bc") apart.
        assert_ne!(batch_key_hash("ab", "c"), batch_key_hash("a", "bc"));
    }

    #[test]
    fn shard_assignment_is_stable_and_in_range() {
        for shards in 1..8 {
            let s = shard_of("20260101-0001.aac", shards);
            assert!(s < shards);
            assert_eq!(s, shard_of("20260101-0001.aac", shards));
        }
    }

    #[test]
    fn different_names_spread_over_shards() {
        let a = shard_of("20260101-0001.aac", 4);
        let b = shard_of("20260101-0002.aac", 4);
        let c = shard_of("20260101-0003.aac", 4);
        // Not a distribution guarantee, just a sanity check that the hash
        // actually varies with the input.
        assert!(a != b || b != c || a != c);
    }
}
