//! # zkbin CLI
//!
//! Operator tool for a zkbin data directory. The binary is intentionally thin:
//! the CLI lives in `src/cli/`, while this file only invokes `cli::run()` and
//! handles process termination.
//!
//! ## Workspace Structure
//!
//! - `crates/zkbinapp/`: storage and request-routing core, no terminal I/O
//! - `crates/zkbin/`: this CLI tool, depends on the `zkbinapp` library
//!
//! ## Layering
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (crates/zkbin/src/cli/)                          │
//! │  - clap argument parsing (setup.rs)                         │
//! │  - Config, logging and store wiring (commands.rs)           │
//! │  - One handler per subcommand (handlers.rs)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Library (crates/zkbinapp)                                  │
//! │  - DataStore over the data directory                        │
//! │  - Request classifier                                       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Handlers return the text to print; only `commands.rs` writes to stdout and
//! only this file decides the exit code.

mod cli;

fn main() {
    if let Err(e) = cli::run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
