use image::imageops::{self, FilterType};
use image::{DynamicImage, ImageBuffer, Rgb, RgbImage};
use rand::{rngs::SmallRng, Rng, SeedableRng};

/// Blends any transparency onto an opaque white background. Images that are
/// already RGB pass through unchanged.
pub fn flatten_onto_white(img: &DynamicImage) -> RgbImage {
    match img {
        DynamicImage::ImageRgb8(rgb) => rgb.clone(),
        img => {
            let rgba = img.to_rgba8();
            let mut out = RgbImage::new(rgba.width(), rgba.height());
            for (x, y, pixel) in rgba.enumerate_pixels() {
                let alpha = pixel[3] as u32;
                let blend =
                    |c: u8| ((c as u32 * alpha + 255 * (255 - alpha)) / 255) as u8;
                out.put_pixel(
                    x,
                    y,
                    Rgb([blend(pixel[0]), blend(pixel[1]), blend(pixel[2])]),
                );
            }
            out
        }
    }
}

/// Shrinks the image to fit within `max_width` x `max_height`, keeping the aspect
/// ratio. Images that already fit are returned as-is, never upscaled.
pub fn fit_within(img: &RgbImage, max_width: u32, max_height: u32) -> RgbImage {
    let (width, height) = img.dimensions();
    if width <= max_width && height <= max_height {
        return img.clone();
    }

    let ratio = f64::min(
        max_width as f64 / width as f64,
        max_height as f64 / height as f64,
    );
    let new_width = ((width as f64 * ratio).round() as u32).max(1);
    let new_height = ((height as f64 * ratio).round() as u32).max(1);
    imageops::resize(img, new_width, new_height, FilterType::Lanczos3)
}

pub fn filled(width: u32, height: u32, red: u8, green: u8, blue: u8) -> RgbImage {
    let mut buf = ImageBuffer::new(width, height);
    buf.enumerate_pixels_mut()
        .for_each(|(_, _, pixel)| *pixel = Rgb([red, green, blue]));
    buf
}

/// A reproducible image of random pixels. Unlike flat colors these get distinct
/// perceptual hashes, which makes them useful in tests.
pub fn noise(width: u32, height: u32, seed: u64) -> RgbImage {
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut buf = ImageBuffer::new(width, height);
    buf.enumerate_pixels_mut()
        .for_each(|(_, _, pixel)| *pixel = Rgb([rng.gen(), rng.gen(), rng.gen()]));
    buf
}
