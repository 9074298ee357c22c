//! 64-bit FNV accumulator.

pub(crate) const OFFSET_BASIS: u64 = 14695981039346656037;
pub(crate) const PRIME: u64 = 1099511628211;

/// Running digest. Each byte is folded as `h = (h * PRIME) ^ byte`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Fnv(u64);

impl Default for Fnv {
    fn default() -> Self {
        Fnv(OFFSET_BASIS)
    }
}

impl Fnv {
    #[inline]
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn write_u8(&mut self, b: u8) {
        self.0 = self.0.wrapping_mul(PRIME) ^ u64::from(b);
    }

    #[inline]
    pub(crate) fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.write_u8(b);
        }
    }

    #[inline]
    pub(crate) fn write_u16(&mut self, v: u16) {
        self.write(&v.to_le_bytes());
    }

    #[inline]
    pub(crate) fn write_u32(&mut self, v: u32) {
        self.write(&v.to_le_bytes());
    }

    #[inline]
    pub(crate) fn write_u64(&mut self, v: u64) {
        self.write(&v.to_le_bytes());
    }

    /// Lengths are folded as 64-bit values on every platform.
    #[inline]
    pub(crate) fn write_len(&mut self, len: usize) {
        self.write_u64(len as u64);
    }

    #[inline]
    pub(crate) fn finish(self) -> u64 {
        self.0
    }
}

/// Digest of a byte string from a fresh accumulator.
pub(crate) fn digest(bytes: &[u8]) -> u64 {
    let mut h = Fnv::new();
    h.write(bytes);
    h.finish()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_offset_basis() {
        assert_eq!(digest(b""), OFFSET_BASIS);
    }

    #[test]
    fn test_multiply_then_xor() {
        let expected = OFFSET_BASIS.wrapping_mul(PRIME) ^ u64::from(b'a');
        assert_eq!(digest(b"a"), expected);
    }

    #[test]
    fn test_words_fold_little_endian() {
        let mut a = Fnv::new();
        a.write_u32(0x0403_0201);
        assert_eq!(a.finish(), digest(&[1, 2, 3, 4]));

        let mut b = Fnv::new();
        b.write_u16(0x0201);
        assert_eq!(b.finish(), digest(&[1, 2]));
    }
}
