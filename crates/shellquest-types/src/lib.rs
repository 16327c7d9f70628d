//! Foundation types for the shellquest virtual shell engine.
//!
//! This crate contains the types shared by the VFS and engine crates:
//! the error enum, the transcript line model rendered by presentation
//! adapters, and the serde model of the externally-authored level
//! descriptor format.

pub mod error;
pub mod level;
pub mod transcript;

pub use error::{Result, ShellError};
pub use level::{LevelDescriptor, NodeSpec};
pub use transcript::{TranscriptKind, TranscriptLine};
