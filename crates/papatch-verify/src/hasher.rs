use sha1::Digest;

pub trait Hasher: Send {
    fn update(&mut self, data: &[u8]);
    fn finalize(self) -> Vec<u8>;

    /// Lowercase hex rendering of the final digest.
    fn finalize_hex(self) -> String
    where
        Self: Sized,
    {
        hex::encode(self.finalize())
    }
}

/// SHA-1, the digest bundles are addressed by.
pub struct Sha1Hasher(sha1::Sha1);

impl Hasher for Sha1Hasher {
    fn update(&mut self, data: &[u8]) { self.0.update(data); }
    fn finalize(self) -> Vec<u8> { self.0.finalize().to_vec() }
}

impl Default for Sha1Hasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Sha1Hasher {
    pub fn new() -> Self { Self(sha1::Sha1::new()) }

    pub fn digest(data: &[u8]) -> Vec<u8> { sha1::Sha1::digest(data).to_vec() }

    pub fn digest_hex(data: &[u8]) -> String { hex::encode(Self::digest(data)) }
}
