use std::{ffi::OsString, path::PathBuf};

use bingogen::{
    bin_common::init::{init_eyre, init_logger},
    convert, deck, dedup,
    imghash::{self, hamming::Distance},
    render::pdf,
    report,
    utils::fsutils,
};
use clap::Parser;
use color_eyre::eyre::{self, Context};

#[derive(Parser, Debug)]
#[command()]
/// Converts WEBP images to PNG, removes duplicates and renders bingo cards as
/// a multi-page PDF
struct Cli {
    /// Folder with the source WEBP images
    #[arg(long, short = 's', default_value = "./images")]
    webp_dir: PathBuf,

    /// Where to place the converted PNG images
    #[arg(long, default_value = "./images_converted")]
    converted_dir: PathBuf,

    /// Where to write the PDF
    #[arg(long, default_value = "./cartillas_bingo.pdf")]
    pdf_out: PathBuf,

    /// Where to write the duplicates report
    #[arg(long, default_value = "./duplicates_report.txt")]
    report_out: PathBuf,

    /// How many cards to generate
    #[arg(long, short = 'n', default_value_t = 50)]
    num_cards: usize,

    /// Maximum hamming distance for two images to be considered equal
    #[arg(long, default_value_t = imghash::DEFAULT_SIMILARITY_THRESHOLD)]
    similarity_threshold: Distance,

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

    let originals = fsutils::files_with_ext(&cli.webp_dir, "webp")
        .wrap_err_with(|| format!("failed to list {}", cli.webp_dir.display()))?
        .len();

    convert::convert_dir(&cli.webp_dir, &cli.converted_dir)
        .wrap_err("failed to convert the images")?;

    let outcome = dedup::dedup_dir(&cli.converted_dir, cli.similarity_threshold)
        .wrap_err("failed to remove duplicates")?;

    report::write_report(
        &cli.report_out,
        &report::ReportStats {
            originals,
            duplicates: &outcome.duplicates,
            unique: outcome.unique.len(),
        },
    )
    .wrap_err_with(|| format!("failed to write {}", cli.report_out.display()))?;

    if outcome.unique.len() < pdf::IMAGES_PER_CARD {
        log::error!(
            "A card needs {} unique images but only {} are left, not rendering any \
             cards",
            pdf::IMAGES_PER_CARD,
            outcome.unique.len()
        );
        return Ok(());
    }

    let cards = deck::deal(
        &mut rand::thread_rng(),
        &outcome.unique,
        pdf::IMAGES_PER_CARD,
        cli.num_cards,
    )?;
    pdf::render_pdf(&cards, &cli.pdf_out).wrap_err("failed to render the PDF")?;

    Ok(())
}
