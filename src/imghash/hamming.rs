pub type Distance = u32;
pub type Container = u64;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Ord, PartialOrd, Hash)]
pub struct Hamming(pub Container);

impl Hamming {
    pub const BITS: u32 = Container::BITS;
    pub const BYTES: usize = std::mem::size_of::<Container>();
    pub const MIN_DIST: Distance = 0;
    pub const MAX_DIST: Distance = Hamming::BITS;

    pub fn from_slice(bytes: &[u8]) -> Self {
        assert_eq!(Hamming::BYTES, bytes.len());
        let array: [u8; Hamming::BYTES] = bytes
            .try_into()
            .expect("the slice is of the incorrect length");
        Self(Container::from_ne_bytes(array))
    }

    pub fn from_hash(hash: image_hasher::ImageHash<[u8; Hamming::BYTES]>) -> Self {
        Self::from_slice(hash.as_bytes())
    }

    pub fn to_base64(self) -> String {
        base64::Engine::encode(
            &base64::prelude::BASE64_STANDARD_NO_PAD,
            self.0.to_ne_bytes(),
        )
    }

    pub fn distance_to(self, other: Self) -> Distance {
        (self.0 ^ other.0).count_ones()
    }
}

impl std::fmt::Display for Hamming {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.to_base64().fmt(f)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn distance() {
        assert_eq!(0, Hamming(0).distance_to(Hamming(0)));
        assert_eq!(1, Hamming(0).distance_to(Hamming(1)));
        assert_eq!(2, Hamming(0b101).distance_to(Hamming(0b000)));
        assert_eq!(Hamming::MAX_DIST, Hamming(0).distance_to(Hamming(!0)));
    }

    #[test]
    fn slice_roundtrip() {
        let h = Hamming(0xdeadbeef);
        assert_eq!(h, Hamming::from_slice(&h.0.to_ne_bytes()));
    }

    #[test]
    fn base64_is_short() {
        // 8 bytes without padding
        assert_eq!(11, Hamming(12345).to_base64().len());
    }
}
