use clap::Parser;
use metascan::config::{DEFAULT_REPORT_NAME, ScanConfig};
use metascan::console::Console;
use metascan::error::ScanError;
use metascan::report::ReportWriter;
use metascan::scanner::Scanner;
use std::io;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "metascan",
    version,
    about = "Recursively extract image, audio and video metadata into a report"
)]
struct Cli {
    /// Directory to scan (defaults to current directory)
    #[arg(default_value = ".")]
    target: PathBuf,

    /// Where to write the metadata report
    #[arg(long, default_value = DEFAULT_REPORT_NAME)]
    report: PathBuf,

    /// Log per-file decoder failures
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let interrupt = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupt);
    if let Err(error) = ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst)) {
        tracing::warn!(%error, "could not install interrupt handler");
    }

    let mut console = Console::stderr();
    let code = match run(&cli, interrupt, &mut console) {
        Ok(()) => {
            let _ = console.info("✅ Process completed successfully!");
            0
        }
        Err(error @ (ScanError::NotFound { .. } | ScanError::NotADirectory { .. })) => {
            let _ = console.error(error.to_string());
            error.exit_code()
        }
        Err(ScanError::Interrupted) => {
            let _ = console.info("⚠️  Process interrupted by user");
            ScanError::Interrupted.exit_code()
        }
        Err(error) => {
            let _ = console.error(format!("❌ Error during execution: {error}"));
            error.exit_code()
        }
    };

    process::exit(code);
}

fn run(
    cli: &Cli,
    interrupt: Arc<AtomicBool>,
    console: &mut Console<io::Stderr>,
) -> Result<(), ScanError> {
    // El reporte se trunca antes de validar el objetivo.
    let mut report = ReportWriter::create(&cli.report).map_err(ScanError::Report)?;

    let config = ScanConfig::new(&cli.target)
        .with_report_path(&cli.report)
        .with_self_name(current_exe_name());
    let scanner = Scanner::with_interrupt(config, interrupt);

    let summary = scanner.run(&mut report, console)?;
    tracing::debug!(
        total = summary.total_files,
        with_metadata = summary.files_with_metadata,
        "scan finished"
    );
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(console::Term::stderr().is_term())
        .init();
}

fn current_exe_name() -> Option<std::ffi::OsString> {
    std::env::current_exe()
        .ok()
        .and_then(|path| path.file_name().map(|name| name.to_os_string()))
}
