use std::{ffi::OsString, path::PathBuf};

use bingogen::{
    bin_common::init::{init_eyre, init_logger},
    deck,
    render::raster::{self, CardStyle},
    utils::fsutils,
};
use clap::Parser;
use color_eyre::eyre::{self, Context};

#[derive(Parser, Debug)]
#[command()]
/// Renders bingo cards as individual PNG files from a folder of converted
/// images
struct Cli {
    /// Folder with the converted PNG images
    #[arg(long, short = 's', default_value = "./images_converted")]
    images_dir: PathBuf,

    /// Where to place the rendered cards
    #[arg(long, short = 'd', default_value = "./cartillas")]
    out_dir: PathBuf,

    /// How many cards to generate
    #[arg(long, short = 'n', default_value_t = 50)]
    num_cards: usize,

    /// A ttf file to draw the card texts with, instead of probing for a system
    /// font
    #[arg(long)]
    font: Option<PathBuf>,

    /// A file to additionally write the logs to
    #[arg(long)]
    logfile: Option<PathBuf>,
}

fn cli_arguments() -> eyre::Result<Cli> {
    const ARGS_FILE: &str = ".bingogenrc";
    let mut args: Vec<OsString> = std::env::args_os().collect();

    if args.len() == 1 {
        if let Some(flags) = fsutils::read_optional_file(ARGS_FILE)
            .wrap_err_with(|| format!("Could not read config file at: {ARGS_FILE}"))?
        {
            args.extend(
                flags
                    .split_whitespace()
                    .map(|s| std::ffi::OsStr::new(s).to_owned()),
            );
        }
    }

    Ok(Cli::parse_from(args))
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = cli_arguments()?;
    init_logger(cli.logfile.as_deref())?;

    let images = fsutils::files_with_ext(&cli.images_dir, "png")
        .wrap_err_with(|| format!("failed to list {}", cli.images_dir.display()))?;
    log::info!("Found {} images in {}", images.len(), cli.images_dir.display());

    let style = match &cli.font {
        Some(path) => CardStyle::from_font_path(path)
            .wrap_err_with(|| format!("failed to load the font at {}", path.display()))?,
        None => CardStyle::with_system_font(),
    };

    let cards = deck::deal(
        &mut rand::thread_rng(),
        &images,
        raster::IMAGES_PER_CARD,
        cli.num_cards,
    )?;
    raster::render_deck(&cards, &cli.out_dir, &style)
        .wrap_err("failed to render the cards")?;

    Ok(())
}
