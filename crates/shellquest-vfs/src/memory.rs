//! In-memory VFS implementation.
//!
//! The entire file tree lives in a `BTreeMap<String, Node>` where keys
//! are normalized absolute paths, so lexicographic listing order falls
//! out of map iteration. One instance is built per session from a
//! level descriptor.

use std::borrow::Cow;
use std::collections::BTreeMap;

use shellquest_types::error::{Result, ShellError};
use shellquest_types::level::{NodeSpec, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE};

use crate::{EntryKind, Vfs, VfsEntry, VfsMetadata};

/// Owner-read permission bit.
const MODE_READ: u16 = 0o400;

#[derive(Debug, Clone)]
enum Node {
    File { data: Vec<u8>, mode: u16 },
    Dir { mode: u16 },
}

/// A fully in-memory virtual file system with per-node permission bits.
#[derive(Debug)]
pub struct MemoryVfs {
    /// Map of normalized paths to file/directory nodes.
    nodes: BTreeMap<String, Node>,
}

impl MemoryVfs {
    /// Create a new in-memory VFS with only the root directory.
    pub fn new() -> Self {
        let mut nodes = BTreeMap::new();
        nodes.insert(
            "/".to_string(),
            Node::Dir {
                mode: DEFAULT_DIR_MODE,
            },
        );
        Self { nodes }
    }

    /// Build a VFS from a level descriptor's filesystem literal.
    ///
    /// The root spec must be a directory.
    pub fn from_descriptor(root: &NodeSpec) -> Result<Self> {
        let NodeSpec::Directory { children } = root else {
            return Err(ShellError::NotADirectory(
                "level filesystem root must be a directory".to_string(),
            ));
        };
        let mut vfs = Self::new();
        for (name, spec) in children {
            vfs.mount(&format!("/{name}"), spec);
        }
        Ok(vfs)
    }

    fn mount(&mut self, path: &str, spec: &NodeSpec) {
        match spec {
            NodeSpec::File { content, mode } => {
                self.nodes.insert(
                    path.to_string(),
                    Node::File {
                        data: content.as_bytes().to_vec(),
                        mode: *mode,
                    },
                );
            },
            NodeSpec::Directory { children } => {
                self.nodes.insert(
                    path.to_string(),
                    Node::Dir {
                        mode: DEFAULT_DIR_MODE,
                    },
                );
                for (name, child) in children {
                    self.mount(&format!("{path}/{name}"), child);
                }
            },
        }
    }
}

impl Default for MemoryVfs {
    fn default() -> Self {
        Self::new()
    }
}

/// Check whether a path is already in normal form (starts with `/`, no
/// `//`, no trailing `/` unless root).
fn is_normalized(path: &str) -> bool {
    if !path.starts_with('/') {
        return false;
    }
    if path.len() > 1 && path.ends_with('/') {
        return false;
    }
    !path.contains("//")
}

/// Normalize a path: ensure leading `/`, collapse `//`, strip trailing
/// `/` (except for root). Returns the input unchanged (zero-alloc) when
/// already in normal form. `.` and `..` segments are not interpreted
/// here; the engine resolves those against the working directory before
/// any VFS call.
fn normalize(path: &str) -> Cow<'_, str> {
    if is_normalized(path) {
        return Cow::Borrowed(path);
    }
    let path_str = if path.starts_with('/') {
        Cow::Borrowed(path)
    } else {
        Cow::Owned(format!("/{path}"))
    };
    let mut result = String::with_capacity(path_str.len());
    let mut prev_slash = false;
    for ch in path_str.chars() {
        if ch == '/' {
            if !prev_slash {
                result.push(ch);
            }
            prev_slash = true;
        } else {
            result.push(ch);
            prev_slash = false;
        }
    }
    if result.len() > 1 && result.ends_with('/') {
        result.pop();
    }
    Cow::Owned(result)
}

/// Return the parent of a normalized path.
fn parent(path: &str) -> &str {
    if path == "/" {
        return "/";
    }
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "/",
    }
}

impl MemoryVfs {
    /// Verify that the parent of `path` exists and is a directory.
    fn check_parent(&self, path: &str) -> Result<()> {
        let par = parent(path);
        match self.nodes.get(par) {
            Some(Node::Dir { .. }) => Ok(()),
            Some(Node::File { .. }) => Err(ShellError::NotADirectory(par.to_string())),
            None => Err(ShellError::NotFound(par.to_string())),
        }
    }
}

impl Vfs for MemoryVfs {
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir { .. }) => {},
            Some(Node::File { .. }) => {
                return Err(ShellError::NotADirectory(path.into_owned()));
            },
            None => {
                return Err(ShellError::NotFound(path.into_owned()));
            },
        }

        let prefix = if path.as_ref() == "/" {
            "/".to_string()
        } else {
            format!("{path}/")
        };

        // BTreeMap iteration is sorted by key; a range scan narrows the
        // walk to this directory's subtree.
        let mut entries = Vec::new();
        for (key, node) in self.nodes.range(prefix.clone()..) {
            if !key.starts_with(&prefix) {
                break;
            }
            // Direct child only: non-empty name with no `/` after the prefix.
            let rest = &key[prefix.len()..];
            if !rest.is_empty() && !rest.contains('/') {
                entries.push(VfsEntry {
                    name: rest.to_string(),
                    kind: match node {
                        Node::Dir { .. } => EntryKind::Directory,
                        Node::File { .. } => EntryKind::File,
                    },
                    size: match node {
                        Node::File { data, .. } => data.len() as u64,
                        Node::Dir { .. } => 0,
                    },
                });
            }
        }
        Ok(entries)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File { data, mode }) => {
                if mode & MODE_READ == 0 {
                    return Err(ShellError::PermissionDenied(path.into_owned()));
                }
                Ok(data.clone())
            },
            Some(Node::Dir { .. }) => Err(ShellError::IsADirectory(path.into_owned())),
            None => Err(ShellError::NotFound(path.into_owned())),
        }
    }

    fn write(&mut self, path: &str, data: &[u8]) -> Result<()> {
        let path = normalize(path);
        if let Some(Node::Dir { .. }) = self.nodes.get(path.as_ref()) {
            return Err(ShellError::IsADirectory(path.into_owned()));
        }
        self.check_parent(&path)?;
        // Overwriting keeps the existing mode bits.
        let mode = match self.nodes.get(path.as_ref()) {
            Some(Node::File { mode, .. }) => *mode,
            _ => DEFAULT_FILE_MODE,
        };
        self.nodes.insert(
            path.into_owned(),
            Node::File {
                data: data.to_vec(),
                mode,
            },
        );
        Ok(())
    }

    fn stat(&self, path: &str) -> Result<VfsMetadata> {
        let path = normalize(path);
        match self.nodes.get(path.as_ref()) {
            Some(Node::File { data, mode }) => Ok(VfsMetadata {
                kind: EntryKind::File,
                size: data.len() as u64,
                mode: *mode,
            }),
            Some(Node::Dir { mode }) => Ok(VfsMetadata {
                kind: EntryKind::Directory,
                size: 0,
                mode: *mode,
            }),
            None => Err(ShellError::NotFound(path.into_owned())),
        }
    }

    fn mkdir(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if self.nodes.contains_key(path.as_ref()) {
            return Err(ShellError::BadArgument(format!(
                "mkdir: cannot create directory '{path}': file exists"
            )));
        }
        self.check_parent(&path)?;
        self.nodes.insert(
            path.into_owned(),
            Node::Dir {
                mode: DEFAULT_DIR_MODE,
            },
        );
        Ok(())
    }

    fn remove(&mut self, path: &str) -> Result<()> {
        let path = normalize(path);
        if path.as_ref() == "/" {
            return Err(ShellError::BadArgument("cannot remove root".to_string()));
        }
        match self.nodes.get(path.as_ref()) {
            Some(Node::Dir { .. }) => {
                // Only empty directories may be removed.
                let prefix = format!("{path}/");
                let has_children = self
                    .nodes
                    .range(prefix.clone()..)
                    .next()
                    .is_some_and(|(k, _)| k.starts_with(&prefix));
                if has_children {
                    return Err(ShellError::BadArgument(format!(
                        "directory not empty: {path}"
                    )));
                }
            },
            Some(Node::File { .. }) => {},
            None => {
                return Err(ShellError::NotFound(path.into_owned()));
            },
        }
        self.nodes.remove(path.as_ref());
        Ok(())
    }

    fn set_mode(&mut self, path: &str, mode: u16) -> Result<()> {
        let path = normalize(path);
        match self.nodes.get_mut(path.as_ref()) {
            Some(Node::File { mode: m, .. }) | Some(Node::Dir { mode: m }) => {
                *m = mode;
                Ok(())
            },
            None => Err(ShellError::NotFound(path.into_owned())),
        }
    }

    fn exists(&self, path: &str) -> bool {
        let path = normalize(path);
        self.nodes.contains_key(path.as_ref())
    }
}
