//! Reporte de texto plano: cabeceras de directorio y bloques por archivo.

use crate::formatting::truncate_value;
use crate::metadata::MetadataRecord;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

const HEADER_WIDTH: usize = 80;
const BULLET: &str = "  •";

pub struct ReportWriter<W: Write> {
    out: W,
}

impl ReportWriter<BufWriter<File>> {
    /// Crea o trunca el archivo de reporte.
    pub fn create(path: &Path) -> io::Result<Self> {
        Ok(Self::new(BufWriter::new(File::create(path)?)))
    }
}

impl<W: Write> ReportWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn directory_header(&mut self, relative: &str) -> io::Result<()> {
        let rule = "=".repeat(HEADER_WIDTH);
        writeln!(self.out)?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "DIRECTORY: {relative}")?;
        writeln!(self.out, "{rule}")
    }

    pub fn file_block(
        &mut self,
        name: &str,
        relative_path: &str,
        record: &MetadataRecord,
    ) -> io::Result<()> {
        writeln!(self.out)?;
        writeln!(self.out, "FILE: {name}")?;
        writeln!(self.out, "PATH: {relative_path}")?;

        if record.is_empty() {
            return writeln!(self.out, "{BULLET} No extractable metadata found");
        }

        writeln!(self.out, "METADATA:")?;
        for (key, value) in record {
            writeln!(self.out, "{BULLET} {key}: {}", truncate_value(value))?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(write: impl FnOnce(&mut ReportWriter<Vec<u8>>) -> io::Result<()>) -> String {
        let mut report = ReportWriter::new(Vec::new());
        write(&mut report).unwrap();
        String::from_utf8(report.into_inner()).unwrap()
    }

    #[test]
    fn directory_header_layout() {
        let output = render(|report| report.directory_header("photos/2024"));
        let rule = "=".repeat(80);
        assert_eq!(
            output,
            format!("\n{rule}\nDIRECTORY: photos/2024\n{rule}\n")
        );
    }

    #[test]
    fn file_block_lists_sorted_keys() {
        let mut record = MetadataRecord::new();
        record.insert("MODIFIED".into(), "1700000000.0".into());
        record.insert("FILE_SIZE".into(), "3 bytes".into());

        let output = render(|report| report.file_block("a.txt", "docs/a.txt", &record));
        assert_eq!(
            output,
            "\nFILE: a.txt\nPATH: docs/a.txt\nMETADATA:\n  • FILE_SIZE: 3 bytes\n  • MODIFIED: 1700000000.0\n"
        );
    }

    #[test]
    fn empty_record_has_placeholder() {
        let output = render(|report| report.file_block("x", "x", &MetadataRecord::new()));
        assert!(output.ends_with("PATH: x\n  • No extractable metadata found\n"));
        assert!(!output.contains("METADATA:"));
    }

    #[test]
    fn long_values_are_truncated() {
        let mut record = MetadataRecord::new();
        record.insert("IMG_Image UserComment".into(), "x".repeat(600));

        let output = render(|report| report.file_block("a.jpg", "a.jpg", &record));
        let line = output
            .lines()
            .find(|line| line.contains("UserComment"))
            .unwrap();
        let value = line.split_once(": ").unwrap().1;
        assert_eq!(value.chars().count(), 500);
        assert!(value.ends_with("..."));
    }
}
