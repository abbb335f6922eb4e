//! The virtual-node tree.
//!
//! Every entry the filesystem synthesizes is a [`VfsNode`]. The variant is
//! the node's state: a `Dir` carries its children in listing order, a `File`
//! carries the download URL and byte size, and a `DirStub` is a placeholder
//! whose children have not been fetched yet. Illegal states (a file with
//! children, a stub with a URL) are unrepresentable.
//!
//! Nodes serialize with a `"type"` tag (`"dir"` / `"file"` / `"dirstub"`)
//! matching the on-disk cache dump format; serialization only happens at the
//! persistence and debug-dump boundaries.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tree mutation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NodeError {
    /// Attempted to attach a child to a non-directory node.
    #[error("not a directory: {0}")]
    NotADirectory(String),
}

/// One node of the synthesized filesystem tree.
///
/// `path` is the absolute virtual path and is never mutated after creation;
/// the cache keys entries by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum VfsNode {
    /// A populated directory. Children are listed in insertion order.
    Dir {
        path: String,
        #[serde(default)]
        children: Vec<VfsNode>,
    },
    /// A downloadable file. `url` is the source path the bytes are fetched
    /// from, `size` the advertised byte length.
    File { path: String, url: String, size: u64 },
    /// A directory placeholder: name only, children not yet fetched.
    /// Transitions to `Dir` at most once (see the unstubber).
    DirStub { path: String },
}

impl VfsNode {
    /// Create an empty directory node.
    pub fn dir(path: impl Into<String>) -> Self {
        VfsNode::Dir {
            path: path.into(),
            children: Vec::new(),
        }
    }

    /// Create a file node.
    pub fn file(path: impl Into<String>, url: impl Into<String>, size: u64) -> Self {
        VfsNode::File {
            path: path.into(),
            url: url.into(),
            size,
        }
    }

    /// Create a directory stub.
    pub fn stub(path: impl Into<String>) -> Self {
        VfsNode::DirStub { path: path.into() }
    }

    /// The absolute virtual path of this node.
    pub fn path(&self) -> &str {
        match self {
            VfsNode::Dir { path, .. } | VfsNode::File { path, .. } | VfsNode::DirStub { path } => {
                path
            }
        }
    }

    /// Returns true for a populated directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, VfsNode::Dir { .. })
    }

    /// Returns true for a file.
    pub fn is_file(&self) -> bool {
        matches!(self, VfsNode::File { .. })
    }

    /// Returns true for an unexpanded stub.
    pub fn is_stub(&self) -> bool {
        matches!(self, VfsNode::DirStub { .. })
    }

    /// Byte size; zero for anything that is not a file.
    pub fn size(&self) -> u64 {
        match self {
            VfsNode::File { size, .. } => *size,
            _ => 0,
        }
    }

    /// Download URL, present only for files.
    pub fn url(&self) -> Option<&str> {
        match self {
            VfsNode::File { url, .. } => Some(url),
            _ => None,
        }
    }

    /// Children of a populated directory. Stubs and files have none.
    pub fn children(&self) -> &[VfsNode] {
        match self {
            VfsNode::Dir { children, .. } => children,
            _ => &[],
        }
    }

    /// Number of direct children.
    pub fn child_count(&self) -> usize {
        self.children().len()
    }

    /// Attach a child to this directory, preserving insertion order.
    pub fn push(&mut self, child: VfsNode) -> Result<(), NodeError> {
        match self {
            VfsNode::Dir { children, .. } => {
                children.push(child);
                Ok(())
            }
            _ => Err(NodeError::NotADirectory(self.path().to_string())),
        }
    }
}
