//! Escaneo recursivo de directorios con extracción de metadata de imágenes, audio y video.

pub mod config;
pub mod console;
pub mod container;
pub mod error;
pub mod extractors;
pub mod formatting;
pub mod metadata;
pub mod report;
pub mod scanner;
