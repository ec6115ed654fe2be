pub mod count;
pub mod decode;
pub mod error;
pub mod logging;
pub mod range;
pub mod report;
pub mod select;
pub mod session;
pub mod split;

/// Folder the tools read from and write their reports to when nothing else is given.
pub const DEFAULT_WORK_DIR: &str = if cfg!(windows) { r"C:\excel" } else { "excel" };
