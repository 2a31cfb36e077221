//! Source files shared between tokens, streams and diagnostics

use std::sync::Arc;

/// An immutable source unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Identifier stored in every span produced from this file
    pub id: usize,
    /// Display path
    pub path: String,
    /// Full text
    pub text: String,
}

impl SourceFile {
    pub fn new(id: usize, path: impl Into<String>, text: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id,
            path: path.into(),
            text: text.into(),
        })
    }

    /// 1-based line and column of a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.text.len());
        let before = &self.text[..self.floor_boundary(offset)];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = before[line_start..].chars().count() + 1;
        (line, column)
    }

    /// The full text of a 1-based line, without its terminator
    pub fn line_text(&self, line: usize) -> &str {
        self.text
            .split('\n')
            .nth(line.saturating_sub(1))
            .map(|l| l.trim_end_matches('\r'))
            .unwrap_or("")
    }

    /// Slice of the text covered by a byte range, clamped to the file
    pub fn snippet(&self, start: usize, end: usize) -> &str {
        let start = self.floor_boundary(start.min(self.text.len()));
        let end = self.floor_boundary(end.min(self.text.len())).max(start);
        &self.text[start..end]
    }

    fn floor_boundary(&self, mut offset: usize) -> usize {
        while offset > 0 && !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_col() {
        let file = SourceFile::new(0, "a.sr", "let a: i32 = 1;\nlet b: i32 = 2;\n");
        assert_eq!(file.line_col(0), (1, 1));
        assert_eq!(file.line_col(4), (1, 5));
        assert_eq!(file.line_col(16), (2, 1));
        assert_eq!(file.line_text(2), "let b: i32 = 2;");
    }

    #[test]
    fn test_snippet_clamps() {
        let file = SourceFile::new(0, "a.sr", "fn main");
        assert_eq!(file.snippet(3, 100), "main");
        assert_eq!(file.snippet(10, 2), "");
    }
}
