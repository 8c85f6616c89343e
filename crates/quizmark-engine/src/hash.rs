use std::fmt;

/// A 32-byte BLAKE3 digest used as the identity of quiz entities.
///
/// Identity is content-derived: the same rendered content always yields the
/// same hash, independent of parse order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentHash([u8; 32]);

impl ContentHash {
    /// Hashes content on its own.
    pub fn of(content: &str) -> Self {
        Self(*blake3::hash(content.as_bytes()).as_bytes())
    }

    /// Hashes child content keyed by its parent's digest, so identical
    /// content under different parents gets different identities.
    pub fn keyed(key: &ContentHash, content: &str) -> Self {
        Self(*blake3::keyed_hash(&key.0, content.as_bytes()).as_bytes())
    }

    /// Hashes a set of digests independent of the order they were supplied in.
    pub fn of_sorted(digests: impl IntoIterator<Item = ContentHash>) -> Self {
        let mut digests: Vec<ContentHash> = digests.into_iter().collect();
        digests.sort();
        let mut hasher = blake3::Hasher::new();
        for digest in &digests {
            hasher.update(&digest.0);
        }
        Self(*hasher.finalize().as_bytes())
    }

    /// Hashes an ordered sequence of byte fields, each length-prefixed so that
    /// field boundaries are part of the identity.
    pub fn of_fields<'a>(fields: impl IntoIterator<Item = &'a [u8]>) -> Self {
        let mut hasher = blake3::Hasher::new();
        for field in fields {
            hasher.update(&(field.len() as u64).to_le_bytes());
            hasher.update(field);
        }
        Self(*hasher.finalize().as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex form, used as the entity `id`.
    pub fn to_hex(&self) -> String {
        blake3::Hash::from(self.0).to_hex().to_string()
    }
}

impl fmt::Display for ContentHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_content_same_hash() {
        assert_eq!(ContentHash::of("<p>2+2</p>"), ContentHash::of("<p>2+2</p>"));
        assert_ne!(ContentHash::of("<p>2+2</p>"), ContentHash::of("<p>2+3</p>"));
    }

    #[test]
    fn keyed_hash_depends_on_parent() {
        let q1 = ContentHash::of("question one");
        let q2 = ContentHash::of("question two");
        assert_ne!(ContentHash::keyed(&q1, "4"), ContentHash::keyed(&q2, "4"));
        assert_eq!(ContentHash::keyed(&q1, "4"), ContentHash::keyed(&q1, "4"));
    }

    #[test]
    fn keyed_hash_is_not_a_plain_hash() {
        let parent = ContentHash::of("parent");
        assert_ne!(ContentHash::keyed(&parent, "child"), ContentHash::of("child"));
    }

    #[test]
    fn sorted_hash_ignores_order() {
        let a = ContentHash::of("a");
        let b = ContentHash::of("b");
        let c = ContentHash::of("c");
        assert_eq!(
            ContentHash::of_sorted([a, b, c]),
            ContentHash::of_sorted([c, a, b])
        );
        assert_ne!(ContentHash::of_sorted([a, b]), ContentHash::of_sorted([a, c]));
    }

    #[test]
    fn field_boundaries_matter() {
        let left = ContentHash::of_fields([b"ab".as_slice(), b"c".as_slice()]);
        let right = ContentHash::of_fields([b"a".as_slice(), b"bc".as_slice()]);
        assert_ne!(left, right);
    }

    #[test]
    fn hex_is_64_lowercase_chars() {
        let hex = ContentHash::of("x").to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
