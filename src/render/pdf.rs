//! Renders a deck of cards as one multi-page PDF: US letter pages with a 5x5
//! grid, a gold FREE cell in the middle and one image in every other cell. The
//! PDF is built by hand with lopdf, images are embedded once as DCTDecode
//! XObjects and shared by all pages.

use std::{
    collections::HashMap,
    io,
    path::{Path, PathBuf},
};

use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, ObjectId, Stream, StringFormat,
};

use crate::deck::Card;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const INCH: f32 = 72.0;

const GRID_SIZE: usize = 5;
const CELL_SIZE: f32 = 1.3 * INCH;
const CELL_PADDING: f32 = 4.0;
const FREE_ROW: usize = 2;
const FREE_COL: usize = 2;

const JPEG_QUALITY: u8 = 90;

const GOLD: [f32; 3] = [1.0, 0.843, 0.0];
const PLACEHOLDER_GREY: [f32; 3] = [0.827, 0.827, 0.827];

/// 25 cells minus the FREE one.
pub const IMAGES_PER_CARD: usize = GRID_SIZE * GRID_SIZE - 1;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("pdf: {0}")]
    Pdf(#[from] lopdf::Error),
}

/// An image embedded in the document, ready to be painted.
struct EmbeddedImage {
    name: String,
    id: ObjectId,
    width: u32,
    height: u32,
}

/// Renders all cards into a single PDF at `out`.
pub fn render_pdf(cards: &[Card], out: &Path) -> Result<()> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let embedded = embed_images(&mut doc, cards)?;

    let font_regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let font_bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
        "Encoding" => "WinAnsiEncoding",
    });

    let mut xobjects = lopdf::Dictionary::new();
    for img in embedded.values().flatten() {
        xobjects.set(img.name.clone(), img.id);
    }
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_regular,
            "F2" => font_bold,
        },
        "XObject" => Object::Dictionary(xobjects),
    });

    let mut page_ids: Vec<Object> = Vec::with_capacity(cards.len());
    for card in cards {
        let content = card_page(card, cards.len(), &embedded);
        let content_id =
            doc.add_object(Stream::new(lopdf::Dictionary::new(), content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        page_ids.push(page_id.into());

        if card.number % 10 == 0 {
            log::debug!("Rendered {}/{} pages", card.number, cards.len());
        }
    }

    let count = page_ids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => page_ids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![
                0.into(),
                0.into(),
                PAGE_WIDTH.into(),
                PAGE_HEIGHT.into(),
            ],
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    doc.save(out)?;
    log::info!("Wrote {} cards to {}", cards.len(), out.display());
    Ok(())
}

/// Re-encodes every distinct image as a baseline JPEG and adds it to the
/// document once. Unloadable images map to None and get a placeholder later.
fn embed_images(
    doc: &mut Document,
    cards: &[Card],
) -> Result<HashMap<PathBuf, Option<EmbeddedImage>>> {
    let mut embedded = HashMap::new();

    for path in cards.iter().flat_map(|card| card.images.iter()) {
        if embedded.contains_key(path) {
            continue;
        }

        let rgb = match image::open(path) {
            Ok(img) => img.to_rgb8(),
            Err(e) => {
                log::warn!("Could not load {}, using a placeholder: {e}", path.display());
                embedded.insert(path.clone(), None);
                continue;
            }
        };

        let mut jpeg = Vec::new();
        image::codecs::jpeg::JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY)
            .encode_image(&rgb)?;

        let id = doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => rgb.width() as i64,
                "Height" => rgb.height() as i64,
                "ColorSpace" => "DeviceRGB",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            jpeg,
        ));

        embedded.insert(
            path.clone(),
            Some(EmbeddedImage {
                name: format!("Im{}", id.0),
                id,
                width: rgb.width(),
                height: rgb.height(),
            }),
        );
    }

    Ok(embedded)
}

/// The content stream of one card page.
fn card_page(
    card: &Card,
    total_cards: usize,
    embedded: &HashMap<PathBuf, Option<EmbeddedImage>>,
) -> Content {
    let grid_span = GRID_SIZE as f32 * CELL_SIZE;
    let start_x = (PAGE_WIDTH - grid_span) / 2.0;
    let start_y = (PAGE_HEIGHT - grid_span) / 2.0 - 0.5 * INCH;

    let mut ops = Vec::new();

    centered_text(
        &mut ops,
        "F2",
        &helvetica::BOLD,
        24.0,
        PAGE_WIDTH / 2.0,
        PAGE_HEIGHT - 0.8 * INCH,
        &format!("CARTILLA {}", card.number),
    );

    // Black strokes, 2pt, for the whole grid
    ops.push(Operation::new("RG", vec![0.into(), 0.into(), 0.into()]));
    ops.push(Operation::new("w", vec![2.into()]));

    let mut img_iter = card.images.iter();
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let x = start_x + col as f32 * CELL_SIZE;
            let y = start_y + (GRID_SIZE - 1 - row) as f32 * CELL_SIZE;

            if row == FREE_ROW && col == FREE_COL {
                free_cell(&mut ops, x, y);
            } else if let Some(path) = img_iter.next() {
                match embedded.get(path).and_then(Option::as_ref) {
                    Some(img) => image_cell(&mut ops, x, y, img),
                    None => placeholder_cell(&mut ops, x, y),
                }
            }

            ops.push(Operation::new(
                "re",
                vec![x.into(), y.into(), CELL_SIZE.into(), CELL_SIZE.into()],
            ));
            ops.push(Operation::new("S", vec![]));
        }
    }

    // the fill color may still be the gold or grey of some cell
    ops.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
    centered_text(
        &mut ops,
        "F1",
        &helvetica::REGULAR,
        10.0,
        PAGE_WIDTH / 2.0,
        0.5 * INCH,
        &format!("Página {} de {total_cards}", card.number),
    );

    Content { operations: ops }
}

fn free_cell(ops: &mut Vec<Operation>, x: f32, y: f32) {
    let cx = x + CELL_SIZE / 2.0;
    let cy = y + CELL_SIZE / 2.0;

    ops.push(Operation::new(
        "rg",
        vec![GOLD[0].into(), GOLD[1].into(), GOLD[2].into()],
    ));
    ops.push(Operation::new(
        "re",
        vec![x.into(), y.into(), CELL_SIZE.into(), CELL_SIZE.into()],
    ));
    ops.push(Operation::new("f", vec![]));

    ops.push(Operation::new("rg", vec![0.into(), 0.into(), 0.into()]));
    centered_text(ops, "F2", &helvetica::BOLD, 16.0, cx, cy - 6.0, "FREE");
    star(ops, cx, cy - 17.0, 7.0);
}

fn image_cell(ops: &mut Vec<Operation>, x: f32, y: f32, img: &EmbeddedImage) {
    let avail = CELL_SIZE - 2.0 * CELL_PADDING;
    let scale = f32::min(avail / img.width as f32, avail / img.height as f32);
    let draw_width = img.width as f32 * scale;
    let draw_height = img.height as f32 * scale;
    let img_x = x + (CELL_SIZE - draw_width) / 2.0;
    let img_y = y + (CELL_SIZE - draw_height) / 2.0;

    ops.push(Operation::new("q", vec![]));
    ops.push(Operation::new(
        "cm",
        vec![
            draw_width.into(),
            0.into(),
            0.into(),
            draw_height.into(),
            img_x.into(),
            img_y.into(),
        ],
    ));
    ops.push(Operation::new("Do", vec![img.name.as_str().into()]));
    ops.push(Operation::new("Q", vec![]));
}

fn placeholder_cell(ops: &mut Vec<Operation>, x: f32, y: f32) {
    ops.push(Operation::new(
        "rg",
        vec![
            PLACEHOLDER_GREY[0].into(),
            PLACEHOLDER_GREY[1].into(),
            PLACEHOLDER_GREY[2].into(),
        ],
    ));
    ops.push(Operation::new(
        "re",
        vec![
            (x + 2.0).into(),
            (y + 2.0).into(),
            (CELL_SIZE - 4.0).into(),
            (CELL_SIZE - 4.0).into(),
        ],
    ));
    ops.push(Operation::new("f", vec![]));
}

/// A filled five pointed star, centered at (cx, cy), using the current fill
/// color.
fn star(ops: &mut Vec<Operation>, cx: f32, cy: f32, outer: f32) {
    let inner = outer * 0.4;
    let mut points = (0..10).map(|i| {
        // start at the top, go clockwise
        let angle = std::f32::consts::FRAC_PI_2 - i as f32 * std::f32::consts::PI / 5.0;
        let radius = if i % 2 == 0 { outer } else { inner };
        (cx + radius * angle.cos(), cy + radius * angle.sin())
    });

    let (first_x, first_y) = points.next().expect("the star has ten points");
    ops.push(Operation::new("m", vec![first_x.into(), first_y.into()]));
    for (px, py) in points {
        ops.push(Operation::new("l", vec![px.into(), py.into()]));
    }
    ops.push(Operation::new("f", vec![]));
}

/// Emits `text` horizontally centered on `center_x` with its baseline at `y`,
/// using real Helvetica advance widths for the measurement.
fn centered_text(
    ops: &mut Vec<Operation>,
    font_name: &str,
    widths: &[u16; 95],
    size: f32,
    center_x: f32,
    y: f32,
    text: &str,
) {
    let bytes = winansi(text);
    let width = text_width(&bytes, widths, size);

    ops.push(Operation::new("BT", vec![]));
    ops.push(Operation::new("Tf", vec![font_name.into(), size.into()]));
    ops.push(Operation::new(
        "Td",
        vec![(center_x - width / 2.0).into(), y.into()],
    ));
    ops.push(Operation::new(
        "Tj",
        vec![Object::String(bytes, StringFormat::Literal)],
    ));
    ops.push(Operation::new("ET", vec![]));
}

/// WinAnsi is Latin-1 for everything the card texts use; anything outside
/// becomes '?'.
fn winansi(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| {
            let code = c as u32;
            if code <= 0xFF {
                code as u8
            } else {
                b'?'
            }
        })
        .collect()
}

fn text_width(bytes: &[u8], widths: &[u16; 95], size: f32) -> f32 {
    let millis: u32 = bytes
        .iter()
        .map(|&b| match b {
            0x20..=0x7E => widths[(b - 0x20) as usize] as u32,
            // accented latin letters are all lowercase-ish in the strings we
            // draw, 556 is close enough
            _ => 556,
        })
        .sum();
    millis as f32 / 1000.0 * size
}

/// AFM advance widths for chars 0x20..=0x7E, in 1/1000 of the font size.
mod helvetica {
    pub const REGULAR: [u16; 95] = [
        278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333,
        278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278,
        584, 584, 584, 556, 1015, 667, 667, 722, 722, 667, 611, 778, 722, 278,
        500, 667, 556, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
        667, 667, 611, 278, 278, 278, 469, 556, 333, 556, 556, 500, 556, 556,
        278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
        278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
    ];

    pub const BOLD: [u16; 95] = [
        278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333,
        278, 278, 556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333,
        584, 584, 584, 611, 975, 722, 722, 722, 722, 667, 611, 778, 722, 278,
        556, 722, 611, 833, 722, 778, 667, 778, 722, 667, 611, 722, 667, 944,
        667, 667, 611, 333, 278, 333, 584, 556, 333, 556, 611, 556, 611, 556,
        333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
        333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
    ];
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn digits_are_556_millis_wide() {
        let bytes = winansi("2025");
        let width = text_width(&bytes, &helvetica::REGULAR, 10.0);
        assert!((width - 22.24).abs() < 1e-3, "width was {width}");
    }

    #[test]
    fn winansi_maps_latin1() {
        assert_eq!(vec![0x50, 0xE1, 0x67], winansi("Pág"));
        assert_eq!(vec![b'?'], winansi("★"));
    }

    #[test]
    fn star_is_a_closed_fill() {
        let mut ops = Vec::new();
        star(&mut ops, 0.0, 0.0, 10.0);
        assert_eq!("m", ops.first().unwrap().operator);
        assert_eq!("f", ops.last().unwrap().operator);
        // one moveto, nine linetos, one fill
        assert_eq!(11, ops.len());
    }

    #[test]
    fn card_needs_24_images() {
        assert_eq!(24, IMAGES_PER_CARD);
    }

    fn dummy_card(n: usize) -> Card {
        Card {
            number: 1,
            images: (0..n)
                .map(|i| PathBuf::from(format!("missing_{i}.png")))
                .collect(),
        }
    }

    #[test]
    fn missing_images_get_placeholders() {
        let card = dummy_card(IMAGES_PER_CARD);
        let embedded = HashMap::from_iter(
            card.images.iter().map(|p| (p.clone(), None)),
        );
        let content = card_page(&card, 1, &embedded);

        let fills = content
            .operations
            .iter()
            .filter(|op| op.operator == "f")
            .count();
        // 24 placeholders + the gold FREE cell + the star
        assert_eq!(26, fills);
    }
}
