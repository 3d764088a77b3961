use std::{cell::OnceCell, path::Path};

use self::hamming::{Distance, Hamming};

pub mod hamming;

/// Only identical perceptual hashes count as duplicates, like the original tool. Bump
/// this from the CLI to also catch slightly re-encoded copies.
pub const DEFAULT_SIMILARITY_THRESHOLD: Distance = 0;

thread_local! {
    static HASHER: OnceCell<Hasher> = OnceCell::new();
}

pub struct Hasher {
    hasher: image_hasher::Hasher<[u8; Hamming::BYTES]>,
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            // An 8x8 gradient hash, 64 bits fit exactly in the Hamming container.
            // The DCT mean hash throws away everything but the lowest frequencies,
            // which maps whole groups of distinct busy images onto one hash.
            hasher: image_hasher::HasherConfig::with_bytes_type::<[u8; Hamming::BYTES]>()
                .hash_alg(image_hasher::HashAlg::Gradient)
                .hash_size(8, 8)
                .to_hasher(),
        }
    }

    pub fn hash<I>(&self, img: &I) -> Hamming
    where
        I: image_hasher::Image,
    {
        let hash = self.hasher.hash_image(img);
        Hamming::from_hash(hash)
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

pub fn hash<I>(img: &I) -> Hamming
where
    I: image_hasher::Image,
{
    HASHER.with(|h| h.get_or_init(Hasher::new).hash(img))
}

pub fn hash_from_path(path: &Path) -> image::ImageResult<Hamming> {
    let img = image::open(path)?;
    Ok(hash(&img))
}

#[cfg(test)]
mod test {
    use crate::utils::imgutils::{filled, noise};

    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let hasher = Hasher::new();
        let img = noise(64, 64, 123);
        assert_eq!(hasher.hash(&img), hasher.hash(&img.clone()));
    }

    #[test]
    fn busy_images_hash_apart() {
        let hasher = Hasher::new();
        let a = hasher.hash(&noise(64, 64, 1));
        let b = hasher.hash(&noise(64, 64, 2));
        assert!(a.distance_to(b) > 0, "{a} and {b} collided");
    }

    #[test]
    fn flat_images_dont_panic() {
        let hasher = Hasher::new();
        let black = hasher.hash(&filled(300, 300, 0, 0, 0));
        let white = hasher.hash(&filled(300, 300, 255, 255, 255));
        // NOTE: flat images all hash to the same thing, so there is nothing
        // useful to assert beyond not crashing.
        println!("black: {black}, white: {white}");
    }

    #[test]
    fn empty() {
        let hash = Hasher::new().hash(&filled(0, 0, 0, 0, 0));
        println!("empty: {hash}");
    }
}
