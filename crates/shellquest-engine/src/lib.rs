//! Virtual shell engine for shellquest exercise levels.
//!
//! The engine emulates a POSIX-like command-line session over an
//! in-memory VFS. It is a registry-based dispatch system: commands
//! implement the [`Command`] trait and are registered by name; the
//! interpreter parses a submitted line into pipeline stages, threads
//! output between them, applies trailing redirection, and scans the
//! final output for completion flags.
//!
//! Level-specific behavior is configuration: a [`ShellSession`] is
//! built from a level descriptor (filesystem literal, starting path,
//! environment) plus optional extra builtins, replacing the per-level
//! interpreter copies this engine was designed to unify.

mod codec_commands;
mod commands;
mod env_commands;
mod flag;
mod interpreter;
mod session;
mod text_commands;

pub use commands::register_builtins;
pub use flag::{scan_flags, FLAG_PREFIX};
pub use interpreter::{
    resolve_path, Command, CommandOutput, CommandRegistry, EnvVars, Environment,
};
pub use session::{RecallDirection, ShellSession, SubmitResult};
