//! The document record exchanged between loaders and transformers.

use serde::{Deserialize, Serialize};

/// One text document held in the Context.
///
/// Loaders produce lists of these; batch transformers consume them and use
/// `filename` as the item identity for intermediate files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub filename: String,
    /// Source path, or `virtual/<filename>` for documents that only exist in memory.
    pub filepath: String,
    pub content: String,
}

impl Document {
    pub fn new(
        filename: impl Into<String>,
        filepath: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            filename: filename.into(),
            filepath: filepath.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_json_shape() {
        let doc = Document::new("a.txt", "./inputs/a.txt", "hello");
        let value = serde_json::to_value(&doc).unwrap();
        assert_eq!(value["filename"], "a.txt");
        assert_eq!(value["filepath"], "./inputs/a.txt");
        assert_eq!(value["content"], "hello");
    }
}
