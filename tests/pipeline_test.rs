use std::fs;
use std::path::Path;

use bingogen::{
    convert, deck, dedup,
    render::{pdf, raster},
    report,
    utils::imgutils::noise,
};
use rand::{rngs::SmallRng, SeedableRng};

fn write_noise_webp(path: &Path, seed: u64) {
    let img = noise(64, 64, seed);
    let file = fs::File::create(path).unwrap();
    image::codecs::webp::WebPEncoder::new_lossless(file)
        .encode(
            img.as_raw(),
            img.width(),
            img.height(),
            image::ExtendedColorType::Rgb8,
        )
        .unwrap();
}

#[test]
fn convert_dedup_report() {
    let tmp = tempfile::tempdir().unwrap();
    let webp_dir = tmp.path().join("webp");
    let converted_dir = tmp.path().join("converted");
    fs::create_dir(&webp_dir).unwrap();

    for i in 0..10 {
        write_noise_webp(&webp_dir.join(format!("img_{i:02}.webp")), i);
    }
    // a byte-identical copy, sorted last so img_00 wins
    fs::copy(
        webp_dir.join("img_00.webp"),
        webp_dir.join("zz_copy.webp"),
    )
    .unwrap();

    let converted = convert::convert_dir(&webp_dir, &converted_dir).unwrap();
    assert_eq!(11, converted.len());

    let outcome = dedup::dedup_dir(&converted_dir, 0).unwrap();
    assert_eq!(10, outcome.unique.len());
    assert_eq!(1, outcome.duplicates.len());

    let dup = &outcome.duplicates[0];
    assert_eq!(converted_dir.join("zz_copy.png"), dup.file);
    assert_eq!(converted_dir.join("img_00.png"), dup.duplicate_of);
    assert_eq!(dedup::DupKind::Exact, dup.kind);
    assert!(!dup.file.exists());

    let report_path = tmp.path().join("report.txt");
    report::write_report(
        &report_path,
        &report::ReportStats {
            originals: 11,
            duplicates: &outcome.duplicates,
            unique: outcome.unique.len(),
        },
    )
    .unwrap();

    let text = fs::read_to_string(&report_path).unwrap();
    assert!(text.contains("Duplicados eliminados: 1"));
    assert!(text.contains("1. zz_copy.png"));
    assert!(text.contains("Duplicado de: img_00.png"));
}

#[test]
fn reencoded_copies_are_perceptual_duplicates() {
    use image::codecs::png::{CompressionType, FilterType, PngEncoder};
    use image::ImageEncoder;

    let tmp = tempfile::tempdir().unwrap();
    let img = noise(64, 64, 42);

    // the same pixels compressed two different ways
    let first = tmp.path().join("photo_a.png");
    let second = tmp.path().join("photo_b.png");
    PngEncoder::new_with_quality(
        fs::File::create(&first).unwrap(),
        CompressionType::Fast,
        FilterType::NoFilter,
    )
    .write_image(img.as_raw(), 64, 64, image::ExtendedColorType::Rgb8)
    .unwrap();
    PngEncoder::new_with_quality(
        fs::File::create(&second).unwrap(),
        CompressionType::Best,
        FilterType::Paeth,
    )
    .write_image(img.as_raw(), 64, 64, image::ExtendedColorType::Rgb8)
    .unwrap();
    assert_ne!(fs::read(&first).unwrap(), fs::read(&second).unwrap());

    let outcome = dedup::dedup_dir(tmp.path(), 0).unwrap();
    assert_eq!(vec![first.clone()], outcome.unique);

    let dup = &outcome.duplicates[0];
    assert_eq!(second, dup.file);
    assert_eq!(first, dup.duplicate_of);
    assert_eq!(dedup::DupKind::Perceptual, dup.kind);
    assert!(!second.exists());
}

#[test]
fn pdf_deck_from_unique_images() {
    let tmp = tempfile::tempdir().unwrap();
    let images_dir = tmp.path().join("images");
    fs::create_dir(&images_dir).unwrap();

    let mut images = Vec::new();
    for i in 0..30 {
        let path = images_dir.join(format!("img_{i:02}.png"));
        noise(48, 48, 1000 + i).save(&path).unwrap();
        images.push(path);
    }

    let mut rng = SmallRng::seed_from_u64(7);
    let cards = deck::deal(&mut rng, &images, pdf::IMAGES_PER_CARD, 3).unwrap();
    assert_eq!(3, cards.len());

    let pdf_path = tmp.path().join("cartillas.pdf");
    pdf::render_pdf(&cards, &pdf_path).unwrap();

    let bytes = fs::read(&pdf_path).unwrap();
    assert!(bytes.starts_with(b"%PDF"));
    // one page per card
    let reloaded = lopdf::Document::load(&pdf_path).unwrap();
    assert_eq!(3, reloaded.get_pages().len());
}

#[test]
fn raster_deck_from_unique_images() {
    let tmp = tempfile::tempdir().unwrap();
    let images_dir = tmp.path().join("images");
    let cards_dir = tmp.path().join("cartillas");
    fs::create_dir(&images_dir).unwrap();

    let mut images = Vec::new();
    for i in 0..12 {
        let path = images_dir.join(format!("img_{i:02}.png"));
        noise(48, 48, 2000 + i).save(&path).unwrap();
        images.push(path);
    }

    let mut rng = SmallRng::seed_from_u64(8);
    let cards = deck::deal(&mut rng, &images, raster::IMAGES_PER_CARD, 4).unwrap();

    let style = raster::CardStyle::with_system_font();
    raster::render_deck(&cards, &cards_dir, &style).unwrap();

    for number in 1..=4 {
        let path = cards_dir.join(format!("cartilla_{number:02}.png"));
        let card = image::open(&path).unwrap();
        assert_eq!((900, 1100), (card.width(), card.height()));
    }
}
