use anyhow::{bail, Result};
use clap::Parser;
use rowtally::{
    logging,
    split::{split_folder, SplitLayout},
    DEFAULT_WORK_DIR,
};
use std::{io, path::PathBuf};
use tracing::{info, warn};

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Convert every CSV in a folder into a two-sheet XLSX (KPI,MR处理 / 数据处理)"
)]
struct Args {
    /// Folder whose `*.csv` files are converted; outputs land beside them.
    #[arg(long, default_value = DEFAULT_WORK_DIR)]
    dir: PathBuf,
}

fn main() -> Result<()> {
    logging::init();
    let args = Args::parse();

    if !args.dir.is_dir() {
        bail!("folder {} not found", args.dir.display());
    }

    let summary = split_folder(&args.dir, &SplitLayout::default(), &mut io::stdout())?;
    for (path, reason) in &summary.failed {
        warn!("skipped {}: {}", path.display(), reason);
    }
    info!(
        converted = summary.converted.len(),
        failed = summary.failed.len(),
        "all done"
    );
    Ok(())
}
