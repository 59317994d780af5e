//! # Command-Line Interface
//!
//! User-facing CLI commands and output formatting.
//!
//! ## Commands
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Workspace management | `init`, `status` |
//! | Change | Single change validation | `install`, `uninstall`, `configure`, `unconfigure` |
//! | Snapshot | Whole-configuration validation | `revert`, `delta`, `batch` |
//! | Inspect | Include tree | `graph` |
//!
//! ## Output Formats
//!
//! All commands support `--format` flag:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! A valid change prints `OK` and exits with success. An invalid one
//! prints the diagnostic tree and exits with failure.
//!
//! ## Verbose Mode
//!
//! Use `--verbose` (or `-v`) for debug logging, or set `RUST_LOG`:
//! ```bash
//! update-guard --verbose install com.acme.tool@1.0.0
//! ```
//!
//! ## Entry Point
//!
//! Call [`run()`] to parse arguments and execute the appropriate command.

mod app;
mod check;
mod graph_cmd;
mod output;

pub use app::{run, Cli, Commands, PlatformArgs};
pub use output::{Output, OutputFormat};
