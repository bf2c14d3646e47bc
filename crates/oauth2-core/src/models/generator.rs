use rand::Rng;

/// Source of opaque token values.
pub trait TokenValueGenerator: Send + Sync {
    fn generate(&self) -> String;
}

/// Hex-encoded random bytes from the thread-local CSPRNG.
#[derive(Debug, Clone)]
pub struct RandomTokenGenerator {
    len: usize,
}

impl RandomTokenGenerator {
    pub const DEFAULT_LEN: usize = 32;

    /// `len` is the number of random bytes; the token is twice as many hex characters.
    pub fn new(len: usize) -> Self {
        Self { len }
    }
}

impl Default for RandomTokenGenerator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEN)
    }
}

impl TokenValueGenerator for RandomTokenGenerator {
    fn generate(&self) -> String {
        let mut bytes = vec![0u8; self.len];
        rand::rng().fill(bytes.as_mut_slice());
        hex::encode(bytes)
    }
}
