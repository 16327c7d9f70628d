//! Virtual file system abstraction for shellquest.
//!
//! Each shell session owns one VFS tree outright, built from a static
//! level descriptor and discarded on unmount. Nothing is backed by real
//! storage and there is no aliasing: every path resolves through a pure
//! tree walk.

mod memory;

pub use memory::MemoryVfs;
use shellquest_types::error::Result;

/// Kind of a directory entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry returned by `readdir`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsEntry {
    pub name: String,
    pub kind: EntryKind,
    pub size: u64,
}

/// Metadata for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VfsMetadata {
    pub kind: EntryKind,
    pub size: u64,
    /// Octal permission bits (e.g. `0o644`).
    pub mode: u16,
}

/// The file system operations the engine's builtins depend on.
///
/// Listing order is lexicographic; commands apply their own filter
/// policy on top (e.g. `ls` hides dot-prefixed names unless `-a`).
pub trait Vfs {
    /// List the direct children of a directory, sorted by name.
    fn readdir(&self, path: &str) -> Result<Vec<VfsEntry>>;

    /// Read a file's contents. Denied when the owner-read bit is unset.
    fn read(&self, path: &str) -> Result<Vec<u8>>;

    /// Create or overwrite a file. The parent directory must exist.
    fn write(&mut self, path: &str, data: &[u8]) -> Result<()>;

    /// Metadata for a path.
    fn stat(&self, path: &str) -> Result<VfsMetadata>;

    /// Create a single directory. The parent directory must exist.
    fn mkdir(&mut self, path: &str) -> Result<()>;

    /// Remove a file or an empty directory.
    fn remove(&mut self, path: &str) -> Result<()>;

    /// Replace the permission bits of a path.
    fn set_mode(&mut self, path: &str, mode: u16) -> Result<()>;

    /// Whether a path exists.
    fn exists(&self, path: &str) -> bool;
}
