use std::fmt::{self, Write};

const FENCE: &str = "```";

/// What a content block carries for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockContent {
    /// Full text of the file
    Text(String),

    /// File was classified as binary and skipped
    Binary,

    /// File could not be read; carries the fault description
    ReadError(String),
}

/// One file's entry in the "File Contents" section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    /// Working-directory-relative path shown in the marker
    pub label: String,

    /// Block payload
    pub content: BlockContent,
}

impl ContentBlock {
    /// Creates a text block.
    #[must_use]
    pub fn new_text(label: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: BlockContent::Text(text.into()),
        }
    }

    /// Creates a binary skip marker.
    #[must_use]
    pub fn new_binary(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: BlockContent::Binary,
        }
    }

    /// Creates a read-error marker.
    #[must_use]
    pub fn new_error(label: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            content: BlockContent::ReadError(detail.into()),
        }
    }

    /// Returns true if this is a text block.
    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self.content, BlockContent::Text(_))
    }

    /// Returns true if this is a binary skip marker.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        matches!(self.content, BlockContent::Binary)
    }

    /// Returns true if this is a read-error marker.
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self.content, BlockContent::ReadError(_))
    }

    /// Returns the text content if this is a text block.
    #[must_use]
    pub fn content_str(&self) -> Option<&str> {
        match &self.content {
            BlockContent::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for ContentBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.content {
            BlockContent::Text(text) => {
                writeln!(f, "--- File: {} ---", self.label)?;
                writeln!(f, "{FENCE}")?;
                f.write_str(text)?;
                if !text.is_empty() && !text.ends_with('\n') {
                    f.write_char('\n')?;
                }
                writeln!(f, "{FENCE}")
            }
            BlockContent::Binary => {
                writeln!(f, "--- File: {} (Binary file ignored) ---", self.label)
            }
            BlockContent::ReadError(detail) => {
                writeln!(f, "--- File: {} (Error reading file: {detail}) ---", self.label)
            }
        }
    }
}

/// The complete output: directory diagram followed by content blocks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputDocument {
    tree_lines: Vec<String>,
    blocks: Vec<ContentBlock>,
}

impl OutputDocument {
    /// Creates a document from rendered tree lines and ordered blocks.
    #[must_use]
    pub const fn new(tree_lines: Vec<String>, blocks: Vec<ContentBlock>) -> Self {
        Self { tree_lines, blocks }
    }

    /// Rendered directory diagram, one entry per line.
    #[must_use]
    pub fn tree_lines(&self) -> &[String] {
        &self.tree_lines
    }

    /// Content blocks in output order.
    #[must_use]
    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    /// Number of text blocks.
    #[must_use]
    pub fn text_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_text()).count()
    }

    /// Number of binary skip markers.
    #[must_use]
    pub fn binary_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_binary()).count()
    }

    /// Number of read-error markers.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.blocks.iter().filter(|b| b.is_error()).count()
    }
}

impl fmt::Display for OutputDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{FENCE}")?;
        writeln!(f, "Directory Tree:")?;
        for line in &self.tree_lines {
            writeln!(f, "{line}")?;
        }
        writeln!(f, "{FENCE}")?;
        writeln!(f)?;
        writeln!(f, "File Contents:")?;
        for block in &self.blocks {
            writeln!(f)?;
            write!(f, "{block}")?;
        }
        Ok(())
    }
}
