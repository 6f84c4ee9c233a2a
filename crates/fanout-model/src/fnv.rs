//! Deterministic FNV-1a hashing.
//!
//! The std `RandomState` seeds per process; FNV-1a hashes the same key to the same
//! value in every run, which keeps container behaviour reproducible in tests and logs.

use std::hash::{BuildHasherDefault, Hasher};

const OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const PRIME: u64 = 0x0100_0000_01b3;

/// FNV-1a 64-bit hasher with the standard offset basis.
#[derive(Debug, Clone, Copy)]
pub struct FnvHasher(u64);

impl FnvHasher {
    pub fn new() -> Self {
        Self(OFFSET_BASIS)
    }
}

impl Default for FnvHasher {
    fn default() -> Self {
        Self::new()
    }
}

impl Hasher for FnvHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.0
    }

    #[inline]
    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(PRIME);
        }
    }
}

/// `BuildHasher` producing [`FnvHasher`]; the default hasher of every container here.
pub type FnvBuildHasher = BuildHasherDefault<FnvHasher>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::hash::BuildHasher;

    #[test]
    fn empty_input_is_offset_basis() {
        assert_eq!(FnvHasher::new().finish(), OFFSET_BASIS);
    }

    #[test]
    fn known_vector() {
        // FNV-1a("a")
        let mut h = FnvHasher::new();
        h.write(b"a");
        assert_eq!(h.finish(), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn stable_across_builders() {
        let a = FnvBuildHasher::default().hash_one("fanout");
        let b = FnvBuildHasher::default().hash_one("fanout");
        assert_eq!(a, b);
    }
}
