//! Content integrity digests.

use sha2::{Digest, Sha256};

/// Computes the integrity digest stored with version content.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContentHasher;

impl ContentHasher {
    /// Lowercase hex SHA-256 of the UTF-8 bytes of `content`, or `None` when
    /// there is no content.
    ///
    /// ```
    /// use ccg_catalog::ContentHasher;
    ///
    /// assert_eq!(
    ///     ContentHasher::hash(Some("hello")).as_deref(),
    ///     Some("2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824")
    /// );
    /// assert_eq!(ContentHasher::hash(None), None);
    /// ```
    pub fn hash(content: Option<&str>) -> Option<String> {
        content.map(|c| hex::encode(Sha256::digest(c.as_bytes())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        assert_eq!(
            ContentHasher::hash(Some("hello")).unwrap(),
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_empty_string_is_hashed() {
        assert_eq!(
            ContentHasher::hash(Some("")).unwrap(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_deterministic_and_lowercase() {
        let a = ContentHasher::hash(Some("You are a helpful assistant.")).unwrap();
        let b = ContentHasher::hash(Some("You are a helpful assistant.")).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }
}
