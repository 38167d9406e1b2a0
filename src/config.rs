//! Configuración del escaneo y conjuntos fijos de exclusión.

use std::ffi::OsString;
use std::path::PathBuf;

/// Nombre por defecto del reporte, creado en el directorio de trabajo.
pub const DEFAULT_REPORT_NAME: &str = "metadata_report.log";

pub const IGNORED_DIRS: [&str; 4] = [".git", "__pycache__", ".venv", "node_modules"];

pub const IGNORED_FILES: [&str; 3] = [".DS_Store", "Thumbs.db", "desktop.ini"];

pub const HIDDEN_MARKER: char = '.';

#[derive(Clone, Debug)]
pub struct ScanConfig {
    pub root: PathBuf,
    pub report_path: PathBuf,
    /// Nombre del ejecutable en curso; nunca se reporta a sí mismo.
    pub self_name: Option<OsString>,
}

impl ScanConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            report_path: PathBuf::from(DEFAULT_REPORT_NAME),
            self_name: None,
        }
    }

    pub fn with_report_path(mut self, report_path: impl Into<PathBuf>) -> Self {
        self.report_path = report_path.into();
        self
    }

    pub fn with_self_name(mut self, self_name: Option<OsString>) -> Self {
        self.self_name = self_name;
        self
    }

    /// Sufijo de los archivos que se omiten para no releer reportes previos.
    pub fn report_suffix(&self) -> Option<String> {
        self.report_path
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
    }

    pub fn is_self(&self, name: &str) -> bool {
        self.self_name
            .as_deref()
            .is_some_and(|self_name| self_name == name)
    }
}

pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with(HIDDEN_MARKER)
}

pub fn is_ignored_dir(name: &str) -> bool {
    IGNORED_DIRS.contains(&name)
}

pub fn is_ignored_file(name: &str) -> bool {
    IGNORED_FILES.contains(&name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_suffix_follows_report_extension() {
        let config = ScanConfig::new("/data");
        assert_eq!(config.report_suffix().as_deref(), Some(".log"));

        let config = config.with_report_path("out/scan.txt");
        assert_eq!(config.report_suffix().as_deref(), Some(".txt"));

        let config = ScanConfig::new("/data").with_report_path("report");
        assert_eq!(config.report_suffix(), None);
    }

    #[test]
    fn hidden_rule_checks_leading_dot() {
        assert!(is_hidden_name(".cache"));
        assert!(is_hidden_name(".DS_Store"));
        assert!(!is_hidden_name("photos"));
        assert!(!is_hidden_name("archive.tar.gz"));
    }

    #[test]
    fn ignore_sets_match_exact_names() {
        assert!(is_ignored_dir("node_modules"));
        assert!(is_ignored_dir("__pycache__"));
        assert!(!is_ignored_dir("node_modules_backup"));
        assert!(is_ignored_file("Thumbs.db"));
        assert!(!is_ignored_file("thumbs.db"));
    }

    #[test]
    fn self_name_is_optional() {
        let config = ScanConfig::new(".");
        assert!(!config.is_self("metascan"));

        let config = config.with_self_name(Some(OsString::from("metascan")));
        assert!(config.is_self("metascan"));
        assert!(!config.is_self("metascan.exe"));
    }
}
