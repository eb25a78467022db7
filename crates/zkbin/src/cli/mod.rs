//! # CLI Behavior
//!
//! Every subcommand works on one data directory, resolved in this order:
//!
//! 1. `--data-dir <dir>`
//! 2. `ZKBIN_DATA_DIR`
//! 3. `dir` in the config file (`--config <file>`, or `zkbin.toml` in the
//!    OS config directory)
//! 4. `data` in the working directory
//!
//! Logs go to stderr, filtered by `RUST_LOG`; `-v` lowers the default level
//! from `warn` to `debug`.
//!
//! ## Module Structure
//!
//! - `setup`: Argument parsing via clap
//! - `commands`: Context setup and dispatch
//! - `handlers`: Per-command logic, returning the text to print

mod commands;
mod handlers;
pub mod setup;

pub use commands::run;
