use anyhow::Result;
use clap::Parser;
use rowtally::{
    logging,
    select::default_selector,
    session::{Outcome, Session},
    DEFAULT_WORK_DIR,
};
use std::{io, path::PathBuf};
use tracing::info;

/// Quick row count: first column of the first sheet, header excluded.
#[derive(Parser)]
#[command(author, version, about = "Count rows of CSV/XLS/XLSX/XLSB files into a running report")]
struct Args {
    /// Folder holding the report workbook.
    #[arg(long, default_value = DEFAULT_WORK_DIR)]
    report_dir: PathBuf,
    /// Input files. When omitted the files are picked interactively.
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    let mut selector = default_selector(args.files);
    let mut session = Session::new(args.report_dir, io::stdout(), rand::thread_rng());
    if let Outcome::Saved { path, stats, .. } = session.run_quick(selector.as_mut())? {
        info!("{} files → {}", stats.len(), path.display());
    }
    Ok(())
}
