//! Recorrido del árbol, filtros de exclusión y escritura del reporte.

use crate::config::{ScanConfig, is_hidden_name, is_ignored_dir, is_ignored_file};
use crate::console::Console;
use crate::error::ScanError;
use crate::metadata::collect_metadata;
use crate::report::ReportWriter;
use std::cmp::Ordering;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use walkdir::{DirEntry, WalkDir};

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ScanSummary {
    pub total_files: usize,
    pub files_with_metadata: usize,
    pub report_path: PathBuf,
}

pub struct Scanner {
    config: ScanConfig,
    interrupt: Arc<AtomicBool>,
}

impl Scanner {
    pub fn new(config: ScanConfig) -> Self {
        Self::with_interrupt(config, Arc::new(AtomicBool::new(false)))
    }

    /// `interrupt` se consulta entre entradas; al activarse el escaneo termina con `Interrupted`.
    ///
    /// Un decodificador en curso no se cancela: la salida espera a que termine ese archivo.
    pub fn with_interrupt(config: ScanConfig, interrupt: Arc<AtomicBool>) -> Self {
        Self { config, interrupt }
    }

    /// Comprueba que el objetivo exista y sea un directorio, y lo devuelve canónico.
    pub fn resolve_root(&self) -> Result<PathBuf, ScanError> {
        let root = &self.config.root;
        let metadata = fs::metadata(root).map_err(|error| ScanError::io(root, error))?;
        if !metadata.is_dir() {
            return Err(ScanError::NotADirectory { path: root.clone() });
        }
        fs::canonicalize(root).map_err(|error| ScanError::io(root, error))
    }

    pub fn run<R: Write, C: Write>(
        &self,
        report: &mut ReportWriter<R>,
        console: &mut Console<C>,
    ) -> Result<ScanSummary, ScanError> {
        let root = self.resolve_root()?;
        let report_path = self.config.report_path.clone();

        console
            .info(format!("Starting deep exploration of: {}", root.display()))
            .map_err(ScanError::Console)?;
        console
            .info(format!(
                "Metadata report will be saved to: {}",
                report_path.display()
            ))
            .map_err(ScanError::Console)?;

        let mut summary = ScanSummary {
            report_path,
            ..ScanSummary::default()
        };

        if root_is_excluded(&root) {
            tracing::debug!(root = %root.display(), "root directory is hidden or ignored");
        } else {
            self.walk(&root, report, &mut summary)?;
        }
        report.flush().map_err(ScanError::Report)?;

        write_summary(console, &summary).map_err(ScanError::Console)?;
        Ok(summary)
    }

    fn walk<R: Write>(
        &self,
        root: &Path,
        report: &mut ReportWriter<R>,
        summary: &mut ScanSummary,
    ) -> Result<(), ScanError> {
        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by(files_first)
            .into_iter()
            .filter_entry(|entry| !is_pruned_dir(entry));
        let report_suffix = self.config.report_suffix();

        for entry in walker {
            if self.interrupt.load(AtomicOrdering::SeqCst) {
                return Err(ScanError::Interrupted);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(error) => {
                    tracing::debug!(%error, "skipping unreadable entry");
                    continue;
                }
            };

            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());

            if entry.file_type().is_dir() {
                if entry.depth() > 0 {
                    report
                        .directory_header(&relative.display().to_string())
                        .map_err(ScanError::Report)?;
                }
                continue;
            }

            if is_symlink_to_dir(&entry) {
                continue;
            }

            summary.total_files += 1;

            let name = entry.file_name().to_string_lossy();
            if self.is_skipped_file(&name, report_suffix.as_deref()) {
                tracing::debug!(path = %entry.path().display(), "skipping file");
                continue;
            }

            let record = collect_metadata(entry.path());
            if !record.is_empty() {
                summary.files_with_metadata += 1;
            }
            report
                .file_block(&name, &relative.display().to_string(), &record)
                .map_err(ScanError::Report)?;
        }

        Ok(())
    }

    fn is_skipped_file(&self, name: &str, report_suffix: Option<&str>) -> bool {
        is_ignored_file(name)
            || is_hidden_name(name)
            || self.config.is_self(name)
            || report_suffix.is_some_and(|suffix| name.ends_with(suffix))
    }
}

pub fn write_summary<W: Write>(
    console: &mut Console<W>,
    summary: &ScanSummary,
) -> std::io::Result<()> {
    console.rule()?;
    console.info("SCAN COMPLETE")?;
    console.rule()?;
    console.info(format!("Total files scanned: {}", summary.total_files))?;
    console.info(format!(
        "Files with metadata extracted: {}",
        summary.files_with_metadata
    ))?;
    console.info(format!(
        "Metadata report saved to: {}",
        summary.report_path.display()
    ))
}

/// Archivos antes que subdirectorios; dentro de cada grupo, por nombre.
fn files_first(a: &DirEntry, b: &DirEntry) -> Ordering {
    a.file_type()
        .is_dir()
        .cmp(&b.file_type().is_dir())
        .then_with(|| a.file_name().cmp(b.file_name()))
}

fn is_pruned_dir(entry: &DirEntry) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    is_hidden_name(&name) || is_ignored_dir(&name)
}

fn root_is_excluded(root: &Path) -> bool {
    root.file_name()
        .map(|name| name.to_string_lossy())
        .is_some_and(|name| is_hidden_name(&name) || is_ignored_dir(&name))
}

fn is_symlink_to_dir(entry: &DirEntry) -> bool {
    entry.path_is_symlink() && fs::metadata(entry.path()).is_ok_and(|metadata| metadata.is_dir())
}
