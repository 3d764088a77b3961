use std::{
    io,
    path::{Path, PathBuf},
};

use image::ImageError;

use crate::utils::{fsutils, imgutils};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("Error when '{context}', apparently: {kind}")]
pub struct Error {
    context: String,
    kind: ErrorKind,
}

#[derive(Debug, thiserror::Error)]
enum ErrorKind {
    #[error("io: {0}")]
    Io(#[from] io::Error),
    #[error("image: {0}")]
    Image(#[from] ImageError),
}

trait ErrContext<T> {
    fn context<S: ToString, F: FnOnce() -> S>(self, provider: F) -> Result<T>;
}

impl<T, E> ErrContext<T> for std::result::Result<T, E>
where
    E: Into<ErrorKind>,
{
    fn context<S: ToString, F: FnOnce() -> S>(self, provider: F) -> Result<T> {
        self.map_err(|e| Error {
            context: provider().to_string(),
            kind: e.into(),
        })
    }
}

/// Converts every WEBP image in `webp_dir` to a PNG with the same stem in
/// `out_dir`, flattening transparency onto white. Files that fail to decode are
/// logged and skipped. Returns the paths of the PNG files that were written.
pub fn convert_dir(webp_dir: &Path, out_dir: &Path) -> Result<Vec<PathBuf>> {
    fsutils::ensure_dir(out_dir).context(|| format!("creating {}", out_dir.display()))?;

    let webp_files = fsutils::files_with_ext(webp_dir, "webp")
        .context(|| format!("listing {}", webp_dir.display()))?;

    let mut converted = Vec::new();
    for webp_file in webp_files {
        let Some(stem) = webp_file.file_stem() else {
            continue;
        };
        // with_extension would eat everything after the first dot in the stem
        let png_path = out_dir.join(format!("{}.png", stem.to_string_lossy()));

        let img = match image::open(&webp_file) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Skipping {}: {e}", webp_file.display());
                continue;
            }
        };

        let flat = imgutils::flatten_onto_white(&img);
        flat.save(&png_path)
            .context(|| format!("saving {}", png_path.display()))?;
        log::info!(
            "Converted {:?} -> {:?}",
            webp_file.file_name().unwrap_or_default(),
            png_path.file_name().unwrap_or_default()
        );
        converted.push(png_path);
    }

    log::info!("Converted {} images in total", converted.len());
    Ok(converted)
}
