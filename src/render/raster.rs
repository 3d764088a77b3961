//! Renders cards as individual PNG files: a 3x3 grid with a B-I-N header row,
//! drawn with imageproc. Fonts are optional, a card without any usable system
//! font simply has no header letters or footer text.

use std::{io, path::Path};

use ab_glyph::{Font, FontVec, PxScale, ScaleFont};
use image::{imageops, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::deck::Card;
use crate::utils::{fsutils, imgutils};

const CARD_WIDTH: u32 = 900;
const CARD_HEIGHT: u32 = 1100;
const GRID_SIZE: usize = 3;
const CELL_PADDING: u32 = 8;
const HEADER_HEIGHT: u32 = 100;
const MARGIN: u32 = 50;

const HEADER_LETTERS: [&str; GRID_SIZE] = ["B", "I", "N"];

const BACKGROUND: Rgb<u8> = Rgb([0xF8, 0xFA, 0xFC]);
const HEADER_BG: Rgb<u8> = Rgb([0x63, 0x66, 0xF1]);
const HEADER_TEXT: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
const CELL_BG: Rgb<u8> = Rgb([0xFF, 0xFF, 0xFF]);
const CELL_BORDER: Rgb<u8> = Rgb([0xCB, 0xD5, 0xE1]);
const CARD_NUMBER: Rgb<u8> = Rgb([0x64, 0x74, 0x8B]);
const ACCENT: Rgb<u8> = Rgb([0x8B, 0x5C, 0xF6]);

pub const IMAGES_PER_CARD: usize = GRID_SIZE * GRID_SIZE;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("image: {0}")]
    Image(#[from] image::ImageError),
    #[error("could not parse the font at {0}")]
    BadFont(String),
}

/// How to draw text on the cards. Without a font all text is skipped.
#[derive(Default)]
pub struct CardStyle {
    pub font: Option<FontVec>,
}

impl CardStyle {
    const FONT_PATHS: [&'static str; 4] = [
        "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Bold.ttf",
        "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    ];

    pub fn from_font_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        let font = FontVec::try_from_vec(data)
            .map_err(|_| Error::BadFont(path.display().to_string()))?;
        Ok(Self { font: Some(font) })
    }

    /// Probes a few well known font locations. Falls back to no font at all,
    /// which only disables the text on the cards.
    pub fn with_system_font() -> Self {
        for path in Self::FONT_PATHS {
            if let Ok(style) = Self::from_font_path(Path::new(path)) {
                log::debug!("Using the font at {path}");
                return style;
            }
        }
        log::warn!("No usable system font found, cards will have no text");
        Self::default()
    }
}

/// Renders one card. Images that fail to load leave their cell empty, which
/// matches how the original tool shrugged those off.
pub fn render_card(card: &Card, style: &CardStyle) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(CARD_WIDTH, CARD_HEIGHT, BACKGROUND);

    // Fit the grid under the header, centered horizontally
    let grid_start_y = MARGIN + HEADER_HEIGHT + 15;
    let grid_width = CARD_WIDTH - 2 * MARGIN;
    let grid_height = CARD_HEIGHT - grid_start_y - MARGIN - 50;
    let cell_size = u32::min(
        grid_width / GRID_SIZE as u32,
        grid_height / GRID_SIZE as u32,
    );
    let grid_start_x = (CARD_WIDTH - cell_size * GRID_SIZE as u32) / 2;

    for (col, letter) in HEADER_LETTERS.iter().enumerate() {
        let x = grid_start_x + col as u32 * cell_size;
        draw_filled_rect_mut(
            &mut canvas,
            Rect::at(x as i32 + 2, MARGIN as i32)
                .of_size(cell_size - 4, HEADER_HEIGHT),
            HEADER_BG,
        );
        if let Some(font) = &style.font {
            let scale = PxScale::from(70.0);
            let (tw, th) = (text_width(font, scale, letter), scaled_height(font, scale));
            draw_text_mut(
                &mut canvas,
                HEADER_TEXT,
                (x as f32 + (cell_size as f32 - tw) / 2.0) as i32,
                (MARGIN as f32 + (HEADER_HEIGHT as f32 - th) / 2.0) as i32,
                scale,
                font,
                letter,
            );
        }
    }

    let mut img_iter = card.images.iter();
    for row in 0..GRID_SIZE {
        for col in 0..GRID_SIZE {
            let cell_x = grid_start_x + col as u32 * cell_size;
            let cell_y = grid_start_y + row as u32 * cell_size;

            draw_filled_rect_mut(
                &mut canvas,
                Rect::at(cell_x as i32 + 2, cell_y as i32 + 2)
                    .of_size(cell_size - 4, cell_size - 4),
                CELL_BG,
            );
            for thickness in 0..2 {
                draw_hollow_rect_mut(
                    &mut canvas,
                    Rect::at(cell_x as i32 + 2 + thickness, cell_y as i32 + 2 + thickness)
                        .of_size(
                            cell_size - 4 - 2 * thickness as u32,
                            cell_size - 4 - 2 * thickness as u32,
                        ),
                    CELL_BORDER,
                );
            }

            let Some(path) = img_iter.next() else {
                continue;
            };
            let img = match image::open(path) {
                Ok(img) => img.to_rgb8(),
                Err(e) => {
                    log::warn!(
                        "Could not load {}, leaving the cell empty: {e}",
                        path.display()
                    );
                    continue;
                }
            };

            let target = cell_size - 2 * CELL_PADDING;
            let fitted = imgutils::fit_within(&img, target, target);
            let img_x = cell_x + (cell_size - fitted.width()) / 2;
            let img_y = cell_y + (cell_size - fitted.height()) / 2;
            imageops::overlay(&mut canvas, &fitted, img_x as i64, img_y as i64);
        }
    }

    footer(&mut canvas, card.number, style);

    canvas
}

/// Renders every card into `out_dir` as `cartilla_NN.png`.
pub fn render_deck(cards: &[Card], out_dir: &Path, style: &CardStyle) -> Result<()> {
    fsutils::ensure_dir(out_dir)?;

    for card in cards {
        let canvas = render_card(card, style);
        let out = out_dir.join(format!("cartilla_{:02}.png", card.number));
        canvas.save(&out)?;

        if card.number % 10 == 0 || card.number == 1 {
            log::info!("Rendered {}/{} cards", card.number, cards.len());
        }
    }

    log::info!("Wrote {} cards to {}", cards.len(), out_dir.display());
    Ok(())
}

fn footer(canvas: &mut RgbImage, card_number: usize, style: &CardStyle) {
    let footer_y = CARD_HEIGHT - MARGIN + 5;

    // The little accent rule above the number
    draw_filled_rect_mut(
        canvas,
        Rect::at(((CARD_WIDTH - 80) / 2) as i32, (footer_y - 12) as i32).of_size(80, 3),
        ACCENT,
    );

    if let Some(font) = &style.font {
        let scale = PxScale::from(24.0);
        let text = format!("Cartilla #{card_number:02}");
        let tw = text_width(font, scale, &text);
        draw_text_mut(
            canvas,
            CARD_NUMBER,
            ((CARD_WIDTH as f32 - tw) / 2.0) as i32,
            footer_y as i32,
            scale,
            font,
            &text,
        );
    }
}

fn text_width(font: &FontVec, scale: PxScale, text: &str) -> f32 {
    let scaled = font.as_scaled(scale);
    text.chars()
        .map(|c| scaled.h_advance(font.glyph_id(c)))
        .sum()
}

fn scaled_height(font: &FontVec, scale: PxScale) -> f32 {
    let scaled = font.as_scaled(scale);
    scaled.ascent() - scaled.descent()
}
