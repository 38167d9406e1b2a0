//! Salida de proceso: líneas con marca de tiempo y nivel hacia un flujo explícito.

use chrono::Local;
use console::style;
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Level {
    Info,
    Error,
}

impl Level {
    fn label(self) -> &'static str {
        match self {
            Level::Info => "INFO",
            Level::Error => "ERROR",
        }
    }
}

pub struct Console<W: Write> {
    out: W,
    colored: bool,
}

impl Console<io::Stderr> {
    pub fn stderr() -> Self {
        let colored = console::Term::stderr().features().colors_supported();
        Self {
            out: io::stderr(),
            colored,
        }
    }
}

impl<W: Write> Console<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            colored: false,
        }
    }

    pub fn info(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        self.line(Level::Info, message.as_ref())
    }

    pub fn error(&mut self, message: impl AsRef<str>) -> io::Result<()> {
        self.line(Level::Error, message.as_ref())
    }

    pub fn rule(&mut self) -> io::Result<()> {
        self.info("=".repeat(RULE_WIDTH))
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn line(&mut self, level: Level, message: &str) -> io::Result<()> {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        let label = if self.colored {
            match level {
                Level::Info => style(level.label()).for_stderr().cyan().to_string(),
                Level::Error => style(level.label()).for_stderr().red().bold().to_string(),
            }
        } else {
            level.label().to_string()
        };

        writeln!(self.out, "{timestamp} - {label} - {message}")?;
        self.out.flush()
    }
}
