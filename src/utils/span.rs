//! Source location tracking

use serde::Serialize;

/// A span represents a byte range in one source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// File ID
    pub file_id: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize, file_id: usize) -> Self {
        Self { start, end, file_id }
    }

    /// Create a span from an offset and a length
    pub fn at(offset: usize, length: usize, file_id: usize) -> Self {
        Self { start: offset, end: offset + length, file_id }
    }

    /// Create a dummy span (for testing)
    pub fn dummy() -> Self {
        Self { start: 0, end: 0, file_id: 0 }
    }

    /// Merge two spans
    pub fn merge(&self, other: &Span) -> Span {
        Span {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
            file_id: self.file_id,
        }
    }

    /// Byte offset of the first character
    pub fn offset(&self) -> usize {
        self.start
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

impl Default for Span {
    fn default() -> Self {
        Self::dummy()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_orders_bounds() {
        let a = Span::new(10, 14, 0);
        let b = Span::new(2, 5, 0);
        let merged = a.merge(&b);
        assert_eq!(merged.start, 2);
        assert_eq!(merged.end, 14);
        assert_eq!(merged.len(), 12);
    }

    #[test]
    fn test_at_builds_from_length() {
        let span = Span::at(4, 3, 1);
        assert_eq!(span.end, 7);
        assert_eq!(span.file_id, 1);
        assert!(!span.is_empty());
        assert!(Span::dummy().is_empty());
    }
}
