use anyhow::Result;
use clap::Parser;
use rowtally::{
    logging,
    select::default_selector,
    session::{prompt_line, Outcome, Session, RANGE_PROMPT},
    DEFAULT_WORK_DIR,
};
use std::{io, path::PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Count non-empty rows per sheet over a column range and append them to a running report"
)]
struct Args {
    /// Columns to look at, 1-based: `3` or `2-4`. Asked for when omitted.
    #[arg(short, long)]
    range: Option<String>,
    /// Folder holding the report workbook.
    #[arg(long, default_value = DEFAULT_WORK_DIR)]
    report_dir: PathBuf,
    /// Input files. When omitted the files are picked interactively.
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    logging::init();
    let args = Args::parse();
    info!("startup");

    // ─── 2) column range ────────────────────────────────────────────
    let range = match args.range {
        Some(r) => r,
        None => prompt_line(&mut io::stdin().lock(), &mut io::stdout(), RANGE_PROMPT)?,
    };

    // ─── 3) select, count, report ────────────────────────────────────
    let mut selector = default_selector(args.files);
    let mut session = Session::new(args.report_dir, io::stdout(), rand::thread_rng());
    match session.run_column_range(&range, selector.as_mut())? {
        Outcome::Saved { path, stats, .. } => {
            info!("{} records → {}", stats.len(), path.display())
        }
        other => info!(?other, "nothing written"),
    }
    Ok(())
}
