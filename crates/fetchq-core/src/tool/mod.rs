//! External extraction tool boundary.
//!
//! The tool is a black box: it takes a locator, a format selector, a client
//! identity and a handful of flags, prints progress on stdout, diagnostics on
//! stderr, and its exit code is the only authoritative success signal. This
//! module builds its argument lists and interprets what it prints.

mod args;
mod classify;
mod identity;
mod progress;

pub use args::{download_args, title_args, OUTPUT_TEMPLATE};
pub use classify::{classify_stderr, Rejection};
pub use identity::{ClientIdentity, DEFAULT_IDENTITIES};
pub use progress::{parse_line, ToolLine};
