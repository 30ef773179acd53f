//! BLAKE3 hashing and context-bound key derivation.

/// BLAKE3 hash output (32 bytes).
pub type HashOutput = [u8; 32];

/// Compute BLAKE3 hash of input data.
#[must_use]
pub fn hash(data: &[u8]) -> HashOutput {
    *blake3::hash(data).as_bytes()
}

/// BLAKE3 Key Derivation Function with context.
pub struct Kdf {
    context: &'static str,
}

impl Kdf {
    /// Create a KDF with a specific context string.
    ///
    /// # Example
    ///
    /// ```
    /// use shallot_crypto::hash::Kdf;
    ///
    /// let kdf = Kdf::new("shallot-example");
    /// let key = kdf.derive_key(b"input key material");
    /// assert_eq!(key.len(), 32);
    /// ```
    #[must_use]
    pub fn new(context: &'static str) -> Self {
        Self { context }
    }

    /// Derive output from input key material.
    pub fn derive(&self, ikm: &[u8], output: &mut [u8]) {
        let key_hash = hash(ikm);
        let mut hasher = blake3::Hasher::new_keyed(&key_hash);
        hasher.update(self.context.as_bytes());

        let mut reader = hasher.finalize_xof();
        reader.fill(output);
    }

    /// Derive a 32-byte key.
    #[must_use]
    pub fn derive_key(&self, ikm: &[u8]) -> [u8; 32] {
        let mut output = [0u8; 32];
        self.derive(ikm, &mut output);
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(hash(b"shallot"), hash(b"shallot"));
        assert_ne!(hash(b"shallot"), hash(b"onion"));
    }

    #[test]
    fn test_kdf_context_separation() {
        let ikm = [0x11u8; 32];
        let a = Kdf::new("context-a").derive_key(&ikm);
        let b = Kdf::new("context-b").derive_key(&ikm);
        assert_ne!(a, b);
    }

    #[test]
    fn test_kdf_prefix_consistency() {
        let kdf = Kdf::new("shallot-test");
        let mut long = [0u8; 56];
        kdf.derive(b"ikm", &mut long);

        assert_eq!(&long[..32], &kdf.derive_key(b"ikm"));
    }
}
