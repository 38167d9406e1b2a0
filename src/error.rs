//! Tipos de error del escaneo y de la extracción por archivo.

use std::path::PathBuf;

use thiserror::Error;

/// Errores que abortan la ejecución completa.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Directory does not exist: {path}")]
    NotFound { path: PathBuf },

    #[error("Path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write metadata report: {0}")]
    Report(#[source] std::io::Error),

    #[error("Could not write to console: {0}")]
    Console(#[source] std::io::Error),

    #[error("Process interrupted by user")]
    Interrupted,
}

impl ScanError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Interrupted => 130,
            _ => 1,
        }
    }
}

/// Fallos de un decodificador sobre un único archivo. Nunca salen del despachador.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("EXIF error: {0}")]
    Exif(#[from] exif::Error),

    #[error("audio decoder error: {0}")]
    Audio(#[from] symphonia::core::errors::Error),

    #[error("container error: {0}")]
    Container(String),
}
