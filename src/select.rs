use anyhow::{Context, Result};
use std::{
    io::{BufRead, Write},
    path::PathBuf,
};

/// Title and filter shown when asking for input files.
pub const DIALOG_TITLE: &str = "选择文件";
pub const FILTER_NAME: &str = "Excel or CSV Files";

/// Where the list of input files comes from.
pub trait FileSelector {
    /// The files the user picked; empty means nothing was chosen.
    fn select_files(&mut self, extensions: &[&str]) -> Result<Vec<PathBuf>>;
}

/// Files fixed up front, e.g. given on the command line.
#[derive(Debug, Clone, Default)]
pub struct ListSelector(pub Vec<PathBuf>);

impl FileSelector for ListSelector {
    fn select_files(&mut self, _extensions: &[&str]) -> Result<Vec<PathBuf>> {
        Ok(std::mem::take(&mut self.0))
    }
}

/// Reads one path per line until a blank line or end of input.
pub struct PromptSelector<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> PromptSelector<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }
}

impl<R: BufRead, W: Write> FileSelector for PromptSelector<R, W> {
    fn select_files(&mut self, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        writeln!(
            self.output,
            "{}（{}: {}），每行一个路径，空行结束：",
            DIALOG_TITLE,
            FILTER_NAME,
            extensions
                .iter()
                .map(|e| format!("*.{}", e))
                .collect::<Vec<_>>()
                .join(" ")
        )?;
        self.output.flush()?;

        let mut paths = Vec::new();
        let mut line = String::new();
        loop {
            line.clear();
            if self.input.read_line(&mut line).context("reading file path")? == 0 {
                break;
            }
            // paths pasted from Explorer come quoted
            let trimmed = line.trim().trim_matches('"');
            if trimmed.is_empty() {
                break;
            }
            paths.push(PathBuf::from(trimmed));
        }
        Ok(paths)
    }
}

/// Native multi-select file dialog.
#[cfg(feature = "dialog")]
#[derive(Debug, Clone, Copy, Default)]
pub struct DialogSelector;

#[cfg(feature = "dialog")]
impl FileSelector for DialogSelector {
    fn select_files(&mut self, extensions: &[&str]) -> Result<Vec<PathBuf>> {
        Ok(rfd::FileDialog::new()
            .set_title(DIALOG_TITLE)
            .add_filter(FILTER_NAME, extensions)
            .pick_files()
            .unwrap_or_default())
    }
}

/// Pick how the binaries get their files: paths given on the command line
/// win, then the native dialog when built with it, then a stdin prompt.
pub fn default_selector(files: Vec<PathBuf>) -> Box<dyn FileSelector> {
    if !files.is_empty() {
        return Box::new(ListSelector(files));
    }
    #[cfg(feature = "dialog")]
    {
        Box::new(DialogSelector)
    }
    #[cfg(not(feature = "dialog"))]
    {
        Box::new(PromptSelector::new(std::io::stdin().lock(), std::io::stdout()))
    }
}
