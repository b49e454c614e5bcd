// FNV-1a, 32-bit. Stable across process restarts and platforms, unlike
// `std`'s default hasher, which is what makes it usable for shard selection
// and feed-URL topic derivation.

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

pub fn fnv1a32(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &b in bytes {
        hash ^= b as u32;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Lowercase, zero-padded 8-digit hex rendering used by `topic_for_feed`.
pub fn fnv1a32_hex(bytes: &[u8]) -> String {
    format!("{:08x}", fnv1a32(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_the_offset_basis() {
        assert_eq!(fnv1a32(b""), FNV_OFFSET_BASIS);
    }

    #[test]
    fn known_vector_matches_reference_fnv1a32() {
        // "a" -> 0xe40c292c is a widely published FNV-1a 32-bit test vector.
        assert_eq!(fnv1a32(b"a"), 0xe40c_292c);
    }

    #[test]
    fn hex_rendering_is_lowercase_and_zero_padded() {
        let hex = fnv1a32_hex(b"https://example.com/feed.xml");
        assert_eq!(hex.len(), 8);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn same_input_is_deterministic() {
        let url = "https://example.com/feed.xml";
        assert_eq!(fnv1a32_hex(url.as_bytes()), fnv1a32_hex(url.as_bytes()));
    }
}
