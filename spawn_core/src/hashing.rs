use std::hash::Hasher;

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// FNV-1a over the salt followed by whatever is written.
///
/// Daily weather rolls must repeat across restarts, which rules out the
/// per-process random keys of `DefaultHasher`.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl FnvHasher {
    pub fn new(salt: u64) -> Self {
        let mut hasher = Self(FNV_OFFSET);
        hasher.write_u64(salt);
        hasher
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        self.0 = bytes
            .iter()
            .fold(self.0, |state, &byte| (state ^ u64::from(byte)).wrapping_mul(FNV_PRIME));
    }
}

pub fn stable_seed(key: &str, salt: u64) -> u64 {
    let mut hasher = FnvHasher::new(salt);
    hasher.write(key.as_bytes());
    hasher.finish()
}
