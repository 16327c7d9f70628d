//! Transcript line model.
//!
//! The transcript is the ordered log of rendered terminal lines. The
//! engine appends to it; the presentation adapter owns rendering. The
//! `kind` tag drives color/styling only and carries no further state.

use serde::{Deserialize, Serialize};

/// Semantic tag for a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranscriptKind {
    /// Echo of a submitted command line (with prompt).
    Input,
    /// Normal command output.
    Output,
    /// A recovered error condition.
    Error,
    /// Positive feedback from level-specific commands.
    Success,
    /// Engine-generated informational text (banners, hints).
    System,
}

/// One rendered line of terminal scrollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptLine {
    pub text: String,
    pub kind: TranscriptKind,
}

impl TranscriptLine {
    pub fn new(text: impl Into<String>, kind: TranscriptKind) -> Self {
        Self {
            text: text.into(),
            kind,
        }
    }

    pub fn input(text: impl Into<String>) -> Self {
        Self::new(text, TranscriptKind::Input)
    }

    pub fn output(text: impl Into<String>) -> Self {
        Self::new(text, TranscriptKind::Output)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(text, TranscriptKind::Error)
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self::new(text, TranscriptKind::Success)
    }
}
