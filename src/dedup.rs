use std::{
    collections::HashMap,
    fmt, fs, io,
    path::{Path, PathBuf},
};

use crate::imghash::{
    self,
    hamming::{Distance, Hamming},
};
use crate::utils::fsutils;

/// Fingerprint of the exact file contents.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct ContentDigest([u8; blake3::OUT_LEN]);

impl ContentDigest {
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(*blake3::hash(bytes).as_bytes())
    }
}

impl fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{byte:02x}")?;
        }
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DupKind {
    /// The file contents are byte-identical.
    Exact,
    /// The images look the same, judged by their perceptual hashes.
    Perceptual,
}

impl fmt::Display for DupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DupKind::Exact => "Contenido exacto".fmt(f),
            DupKind::Perceptual => "Hash perceptual".fmt(f),
        }
    }
}

#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Duplicate {
    pub file: PathBuf,
    pub duplicate_of: PathBuf,
    pub kind: DupKind,
}

#[derive(Default, Debug)]
pub struct DedupOutcome {
    pub unique: Vec<PathBuf>,
    pub duplicates: Vec<Duplicate>,
    /// Files that couldn't be read or decoded and were left alone.
    pub failed: usize,
}

/// Remembers everything it has been shown and classifies each new image as a
/// duplicate of something older, or as new.
pub struct Deduper {
    threshold: Distance,
    digests: HashMap<ContentDigest, PathBuf>,
    hashes: Vec<(Hamming, PathBuf)>,
}

impl Deduper {
    pub fn new(threshold: Distance) -> Self {
        Self {
            threshold,
            digests: HashMap::new(),
            hashes: Vec::new(),
        }
    }

    /// Returns which older file `path` duplicates, if any. New images are
    /// remembered, duplicates are not.
    pub fn classify(
        &mut self,
        digest: ContentDigest,
        hash: Hamming,
        path: &Path,
    ) -> Option<(PathBuf, DupKind)> {
        if let Some(kept) = self.digests.get(&digest) {
            return Some((kept.clone(), DupKind::Exact));
        }

        if let Some((_, kept)) = self
            .hashes
            .iter()
            .find(|(kept_hash, _)| hash.distance_to(*kept_hash) <= self.threshold)
        {
            return Some((kept.clone(), DupKind::Perceptual));
        }

        self.digests.insert(digest, path.to_path_buf());
        self.hashes.push((hash, path.to_path_buf()));
        None
    }
}

/// Scans `*.png` in `dir` in sorted filename order and deletes every file that
/// duplicates an earlier one, so the lexicographically first file of a group is
/// the one that survives.
pub fn dedup_dir(dir: &Path, threshold: Distance) -> io::Result<DedupOutcome> {
    let png_files = fsutils::files_with_ext(dir, "png")?;

    let mut deduper = Deduper::new(threshold);
    let mut outcome = DedupOutcome::default();

    for png_file in png_files {
        let bytes = match fs::read(&png_file) {
            Ok(bytes) => bytes,
            Err(e) => {
                log::warn!("Could not read {}: {e}", png_file.display());
                outcome.failed += 1;
                continue;
            }
        };
        let digest = ContentDigest::of_bytes(&bytes);

        let img = match image::load_from_memory(&bytes) {
            Ok(img) => img,
            Err(e) => {
                log::warn!("Could not decode {}: {e}", png_file.display());
                outcome.failed += 1;
                continue;
            }
        };
        let hash = imghash::hash(&img);

        match deduper.classify(digest, hash, &png_file) {
            Some((duplicate_of, kind)) => {
                log::info!(
                    "Removing {:?}, a duplicate of {:?} ({kind})",
                    png_file.file_name().unwrap_or_default(),
                    duplicate_of.file_name().unwrap_or_default(),
                );
                fs::remove_file(&png_file)?;
                outcome.duplicates.push(Duplicate {
                    file: png_file,
                    duplicate_of,
                    kind,
                });
            }
            None => outcome.unique.push(png_file),
        }
    }

    log::info!(
        "Removed {} duplicates, {} unique images remain ({} could not be read)",
        outcome.duplicates.len(),
        outcome.unique.len(),
        outcome.failed
    );
    Ok(outcome)
}
