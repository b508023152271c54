//! Directory tree assembled from relative file paths.

use crate::error::{Error, Result};
use std::collections::BTreeMap;

/// A node of the directory tree.
///
/// Children are kept in a [`BTreeMap`], so iteration is always in
/// lexicographic name order with directories and files interleaved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    /// Directory with its named children
    Directory(BTreeMap<String, TreeNode>),
    /// File leaf
    File,
}

impl Default for TreeNode {
    fn default() -> Self {
        Self::Directory(BTreeMap::new())
    }
}

impl TreeNode {
    /// Returns true if this node is a directory.
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        matches!(self, Self::Directory(_))
    }

    /// Returns the children of a directory, `None` for files.
    #[must_use]
    pub const fn children(&self) -> Option<&BTreeMap<String, Self>> {
        match self {
            Self::Directory(children) => Some(children),
            Self::File => None,
        }
    }

    /// Looks up a descendant by `/`-separated path.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Self> {
        path.split('/')
            .try_fold(self, |node, segment| node.children()?.get(segment))
    }

    /// Counts every node below this one.
    #[must_use]
    pub fn descendant_count(&self) -> usize {
        self.children().map_or(0, |children| {
            children.values().map(|child| 1 + child.descendant_count()).sum()
        })
    }
}

/// Folds relative paths into a [`TreeNode::Directory`].
#[derive(Debug, Default)]
pub struct TreeBuilder {
    root: TreeNode,
}

impl TreeBuilder {
    /// Creates a builder with an empty root directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a tree from `/`-separated relative paths in one go.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TreeConstruction`] for the first malformed path.
    pub fn build<I, S>(paths: I) -> Result<TreeNode>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = Self::new();
        for path in paths {
            builder.insert(path.as_ref())?;
        }
        Ok(builder.finish())
    }

    /// Inserts one file path, creating intermediate directories.
    ///
    /// Directory nodes are never demoted to files: inserting a file where a
    /// directory of the same name exists is a no-op, and a file standing
    /// where a directory is needed is promoted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TreeConstruction`] if the path is empty or contains
    /// an empty, `.` or `..` segment.
    pub fn insert(&mut self, path: &str) -> Result<()> {
        let segments = Self::segments(path)?;
        let Some((leaf, parents)) = segments.split_last() else {
            return Err(Error::tree_construction(path, "empty path"));
        };

        let mut current = &mut self.root;
        for segment in parents {
            let TreeNode::Directory(children) = current else {
                return Err(Error::tree_construction(path, "parent is not a directory"));
            };
            let child = children.entry((*segment).to_string()).or_default();
            if !child.is_directory() {
                *child = TreeNode::default();
            }
            current = child;
        }

        let TreeNode::Directory(children) = current else {
            return Err(Error::tree_construction(path, "parent is not a directory"));
        };
        children.entry((*leaf).to_string()).or_insert(TreeNode::File);
        Ok(())
    }

    /// Returns the finished tree.
    #[must_use]
    pub fn finish(self) -> TreeNode {
        self.root
    }

    fn segments(path: &str) -> Result<Vec<&str>> {
        if path.is_empty() {
            return Err(Error::tree_construction(path, "empty path"));
        }
        path.split('/')
            .map(|segment| match segment {
                "" => Err(Error::tree_construction(path, "empty path segment")),
                "." | ".." => Err(Error::tree_construction(
                    path,
                    format!("'{segment}' segment in tree path"),
                )),
                s => Ok(s),
            })
            .collect()
    }
}
