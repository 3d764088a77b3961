use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::Path,
};

use crate::dedup::Duplicate;

/// The numbers that go into the duplicates report.
pub struct ReportStats<'a> {
    /// How many WEBP files the run started from.
    pub originals: usize,
    pub duplicates: &'a [Duplicate],
    pub unique: usize,
}

/// Writes the plain text report of everything that was discarded. The layout
/// (and language) matches the report the original tool produced.
pub fn write_report(path: &Path, stats: &ReportStats<'_>) -> io::Result<()> {
    let mut out = BufWriter::new(File::create(path)?);

    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out, "REPORTE DE DUPLICADOS - BINGO IMAGES")?;
    writeln!(out, "{}", "=".repeat(60))?;
    writeln!(out)?;

    writeln!(
        out,
        "Total de imágenes originales (WEBP): {}",
        stats.originals
    )?;
    writeln!(out, "Duplicados eliminados: {}", stats.duplicates.len())?;
    writeln!(out, "Imágenes únicas finales: {}", stats.unique)?;
    writeln!(out)?;

    if stats.duplicates.is_empty() {
        writeln!(out, "No se encontraron duplicados.")?;
    } else {
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out, "DETALLE DE DUPLICADOS ELIMINADOS:")?;
        writeln!(out, "{}", "-".repeat(60))?;
        writeln!(out)?;

        for (i, dup) in stats.duplicates.iter().enumerate() {
            writeln!(out, "{}. {}", i + 1, filename(&dup.file))?;
            writeln!(out, "   Duplicado de: {}", filename(&dup.duplicate_of))?;
            writeln!(out, "   Método de detección: {}", dup.kind)?;
            writeln!(out)?;
        }
    }

    out.flush()?;
    log::info!("Wrote the duplicates report to {}", path.display());
    Ok(())
}

fn filename(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod test {
    use std::{fs, path::PathBuf};

    use super::*;
    use crate::dedup::DupKind;

    #[test]
    fn report_with_duplicates() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let report_path = tmp.path().join("report.txt");

        let duplicates = vec![Duplicate {
            file: PathBuf::from("some/dir/copy.png"),
            duplicate_of: PathBuf::from("some/dir/first.png"),
            kind: DupKind::Exact,
        }];
        write_report(
            &report_path,
            &ReportStats {
                originals: 10,
                duplicates: &duplicates,
                unique: 9,
            },
        )?;

        let text = fs::read_to_string(&report_path)?;
        assert!(text.contains("Total de imágenes originales (WEBP): 10"));
        assert!(text.contains("Duplicados eliminados: 1"));
        assert!(text.contains("Imágenes únicas finales: 9"));
        assert!(text.contains("1. copy.png"));
        assert!(text.contains("Duplicado de: first.png"));
        assert!(text.contains("Método de detección: Contenido exacto"));
        Ok(())
    }

    #[test]
    fn report_without_duplicates() -> io::Result<()> {
        let tmp = tempfile::tempdir()?;
        let report_path = tmp.path().join("report.txt");

        write_report(
            &report_path,
            &ReportStats {
                originals: 3,
                duplicates: &[],
                unique: 3,
            },
        )?;

        let text = fs::read_to_string(&report_path)?;
        assert!(text.contains("No se encontraron duplicados."));
        assert!(!text.contains("DETALLE"));
        Ok(())
    }
}
