use crate::{
    classify::{BinaryClassifier, FileKind},
    document::{ContentBlock, OutputDocument},
    render::TreeRenderer,
    resolver::ResolvedFile,
    storage::Storage,
    tree::TreeNode,
};
use tracing::{debug, trace, warn};

/// Builds the [`OutputDocument`] for a set of resolved files.
///
/// Per-file failures never abort assembly: an unreadable file becomes an
/// inline error marker and the remaining files are still emitted.
pub struct ContentAssembler<'a> {
    storage: &'a dyn Storage,
    classifier: BinaryClassifier,
}

impl<'a> ContentAssembler<'a> {
    /// Creates an assembler reading through `storage`.
    #[must_use]
    pub fn new(storage: &'a dyn Storage, classifier: BinaryClassifier) -> Self {
        Self { storage, classifier }
    }

    /// Renders `tree` and produces one block per file, in input order.
    #[must_use]
    pub fn assemble(&self, files: &[ResolvedFile], tree: &TreeNode) -> OutputDocument {
        let tree_lines = TreeRenderer::render(tree);
        let blocks = files.iter().map(|file| self.block_for(file)).collect();
        OutputDocument::new(tree_lines, blocks)
    }

    fn block_for(&self, file: &ResolvedFile) -> ContentBlock {
        let label = file.working_relative.as_str();

        match self.classifier.sniff(self.storage, &file.absolute_path) {
            Ok(FileKind::Text) => {}
            Ok(FileKind::Binary) => {
                debug!("Skipping binary file: {}", label);
                return ContentBlock::new_binary(label);
            }
            Err(e) => {
                warn!("Failed to read {}: {}", label, e);
                return ContentBlock::new_error(label, e.detail());
            }
        }

        let bytes = match self.storage.read(&file.absolute_path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Failed to read {}: {}", label, e);
                return ContentBlock::new_error(label, e.detail());
            }
        };

        match String::from_utf8(bytes) {
            Ok(text) => {
                trace!("Including {} ({} bytes)", label, text.len());
                ContentBlock::new_text(label, text)
            }
            Err(e) => {
                warn!("Failed to decode {}: {}", label, e);
                ContentBlock::new_error(label, e.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{resolver::PathResolver, storage::MemoryStorage, tree::TreeBuilder};

    fn resolve(root: &str, cwd: &str, paths: &[&str]) -> Vec<ResolvedFile> {
        PathResolver::new(root, cwd).resolve_all(paths).unwrap()
    }

    fn tree_for(files: &[ResolvedFile]) -> TreeNode {
        TreeBuilder::build(
            files
                .iter()
                .filter(|f| !f.escapes_working_dir())
                .map(|f| f.working_relative.as_str()),
        )
        .unwrap()
    }

    #[test]
    fn test_flat_repo() {
        let storage = MemoryStorage::new("/repo")
            .with_file("/repo/file1.txt", "hello")
            .with_file("/repo/image.bin", b"PNG\0\x01\x02".to_vec());
        let files = resolve("/repo", "/repo", &["image.bin", "file1.txt"]);

        let assembler = ContentAssembler::new(&storage, BinaryClassifier::default());
        let document = assembler.assemble(&files, &tree_for(&files));

        assert_eq!(document.tree_lines(), ["├── file1.txt", "└── image.bin"]);
        assert_eq!(
            document.blocks(),
            [ContentBlock::new_binary("image.bin"), ContentBlock::new_text("file1.txt", "hello")]
        );
    }

    #[test]
    fn test_subdirectory_invocation() {
        let storage = MemoryStorage::new("/repo/sub")
            .with_file("/repo/a.txt", "A")
            .with_file("/repo/sub/b.txt", "B");
        let files = resolve("/repo", "/repo/sub", &["a.txt", "sub/b.txt"]);

        let assembler = ContentAssembler::new(&storage, BinaryClassifier::default());
        let document = assembler.assemble(&files, &tree_for(&files));

        assert_eq!(document.tree_lines(), ["└── b.txt"]);
        let labels: Vec<_> = document.blocks().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, ["../a.txt", "b.txt"]);
        assert_eq!(document.blocks()[0].content_str(), Some("A"));
    }

    #[test]
    fn test_missing_file_becomes_error_marker() {
        let storage = MemoryStorage::new("/repo").with_file("/repo/kept.txt", "still here");
        let files = resolve("/repo", "/repo", &["gone.txt", "kept.txt"]);

        let assembler = ContentAssembler::new(&storage, BinaryClassifier::default());
        let document = assembler.assemble(&files, &tree_for(&files));

        assert_eq!(document.error_count(), 1);
        assert_eq!(document.text_count(), 1);
        let rendered = document.to_string();
        assert!(rendered.contains("--- File: gone.txt (Error reading file: No such file or directory) ---\n"));
        assert!(rendered.contains("--- File: kept.txt ---\n```\nstill here\n```\n"));
    }

    #[test]
    fn test_permission_denied_becomes_error_marker() {
        let storage = MemoryStorage::new("/repo").with_unreadable_file("/repo/secret.txt");
        let files = resolve("/repo", "/repo", &["secret.txt"]);

        let assembler = ContentAssembler::new(&storage, BinaryClassifier::default());
        let document = assembler.assemble(&files, &tree_for(&files));

        assert_eq!(
            document.blocks(),
            [ContentBlock::new_error("secret.txt", "Permission denied")]
        );
        assert_eq!(document.binary_count(), 0);
    }

    #[test]
    fn test_invalid_utf8_becomes_error_marker() {
        let storage = MemoryStorage::new("/repo").with_file("/repo/latin1.txt", b"caf\xe9".to_vec());
        let files = resolve("/repo", "/repo", &["latin1.txt"]);

        let assembler = ContentAssembler::new(&storage, BinaryClassifier::default());
        let document = assembler.assemble(&files, &tree_for(&files));

        assert!(document.blocks()[0].is_error());
        assert!(document.to_string().contains("(Error reading file: invalid utf-8"));
    }

    #[test]
    fn test_empty_file_is_text_block() {
        let storage = MemoryStorage::new("/repo").with_file("/repo/empty.txt", Vec::<u8>::new());
        let files = resolve("/repo", "/repo", &["empty.txt"]);

        let assembler = ContentAssembler::new(&storage, BinaryClassifier::default());
        let document = assembler.assemble(&files, &tree_for(&files));

        assert_eq!(document.blocks(), [ContentBlock::new_text("empty.txt", "")]);
    }
}
