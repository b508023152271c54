//! Box-drawing rendering of a [`TreeNode`].

use crate::tree::TreeNode;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE_INDENT: &str = "│   ";
const SPACE_INDENT: &str = "    ";

/// Renders a directory tree as display lines.
///
/// Children are visited depth-first, pre-order, in lexicographic name
/// order. The root itself is not printed; an empty directory contributes
/// no lines of its own.
#[derive(Debug, Default, Clone, Copy)]
pub struct TreeRenderer;

impl TreeRenderer {
    /// Renders every entry below `tree`, one line per node.
    #[must_use]
    pub fn render(tree: &TreeNode) -> Vec<String> {
        let mut lines = Vec::new();
        Self::render_into(tree, "", &mut lines);
        lines
    }

    fn render_into(node: &TreeNode, prefix: &str, lines: &mut Vec<String>) {
        let Some(children) = node.children() else {
            return;
        };

        let total = children.len();
        for (index, (name, child)) in children.iter().enumerate() {
            let is_last = index + 1 == total;
            let connector = if is_last { LAST_BRANCH } else { BRANCH };
            lines.push(format!("{prefix}{connector}{name}"));

            if child.is_directory() {
                let indent = if is_last { SPACE_INDENT } else { PIPE_INDENT };
                Self::render_into(child, &format!("{prefix}{indent}"), lines);
            }
        }
    }
}
