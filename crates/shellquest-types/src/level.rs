//! Level descriptor format.
//!
//! Levels are authored as static JSON data: a filesystem tree literal
//! plus the session's starting point and environment. The engine
//! consumes a descriptor read-only at session construction; nothing is
//! persisted back.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default mode bits for files created from a descriptor (rw-r--r--).
pub const DEFAULT_FILE_MODE: u16 = 0o644;

/// Default mode bits for directories (rwxr-xr-x).
pub const DEFAULT_DIR_MODE: u16 = 0o755;

/// One node of a level's filesystem literal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeSpec {
    File {
        content: String,
        /// Octal permission bits; gates `cat` in permission-themed levels.
        #[serde(default = "default_file_mode")]
        mode: u16,
    },
    Directory {
        #[serde(default)]
        children: BTreeMap<String, NodeSpec>,
    },
}

fn default_file_mode() -> u16 {
    DEFAULT_FILE_MODE
}

impl NodeSpec {
    pub fn is_directory(&self) -> bool {
        matches!(self, NodeSpec::Directory { .. })
    }

    /// Shorthand for a file node with default permissions.
    pub fn file(content: impl Into<String>) -> Self {
        NodeSpec::File {
            content: content.into(),
            mode: DEFAULT_FILE_MODE,
        }
    }

    /// Shorthand for a directory node.
    pub fn dir(children: BTreeMap<String, NodeSpec>) -> Self {
        NodeSpec::Directory { children }
    }
}

/// A complete level: filesystem, starting path, and environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelDescriptor {
    /// Root of the filesystem literal; must be a directory.
    pub filesystem: NodeSpec,
    /// Absolute path the session starts in.
    pub initial_path: String,
    /// Target of `cd` with no arguments.
    pub home_path: String,
    /// Starting environment variables.
    #[serde(default)]
    pub initial_env: BTreeMap<String, String>,
}

impl LevelDescriptor {
    /// Parse a descriptor from its JSON source.
    pub fn from_json(source: &str) -> Result<Self> {
        Ok(serde_json::from_str(source)?)
    }
}
