//! Line/column mapping for diagnostic rendering.
//!
//! Spans store byte offsets; hosts want `(line, column)`. The table
//! pre-computes line start offsets for O(log L) lookups.

use valet_ir::Span;

/// Pre-computed line offset table for efficient line/column lookup.
#[derive(Clone, Debug, Default)]
pub struct LineOffsetTable {
    /// Byte offset of each line start. `offsets[0] = 0`; each subsequent
    /// entry is the byte after a `\n`.
    offsets: Vec<u32>,
}

impl LineOffsetTable {
    /// Build a line offset table from source text. O(n) construction,
    /// O(log L) lookups.
    pub fn build(source: &str) -> Self {
        let mut offsets = vec![0u32];
        for (i, byte) in source.as_bytes().iter().enumerate() {
            if *byte == b'\n' {
                offsets.push(u32::try_from(i + 1).unwrap_or(u32::MAX));
            }
        }
        LineOffsetTable { offsets }
    }

    /// Get the 1-based line number containing a byte offset.
    #[inline]
    pub fn line_from_offset(&self, offset: u32) -> u32 {
        let line_idx = match self.offsets.binary_search(&offset) {
            Ok(exact) => exact,
            Err(insert) => insert.saturating_sub(1),
        };
        u32::try_from(line_idx).unwrap_or(u32::MAX - 1) + 1
    }

    /// Get 1-based `(line, column)` from a byte offset. The column counts
    /// characters (not bytes) from the start of the line.
    pub fn offset_to_line_col(&self, source: &str, offset: u32) -> (u32, u32) {
        let line = self.line_from_offset(offset);
        let line_start = self
            .offsets
            .get((line - 1) as usize)
            .copied()
            .unwrap_or(0) as usize;
        let offset = (offset as usize).min(source.len());
        let col_chars = source[line_start..offset].chars().count();
        let col = u32::try_from(col_chars).unwrap_or(u32::MAX - 1) + 1;
        (line, col)
    }

    /// Get 1-based `(line, column)` for the start of a span.
    pub fn span_start(&self, source: &str, span: Span) -> (u32, u32) {
        self.offset_to_line_col(source, span.start)
    }

    /// The full text of the 1-based line, without its trailing newline.
    pub fn line_text<'src>(&self, source: &'src str, line: u32) -> &'src str {
        if line == 0 {
            return "";
        }
        let start = match self.offsets.get((line - 1) as usize) {
            Some(&s) => s as usize,
            None => return "",
        };
        let end = self
            .offsets
            .get(line as usize)
            .map_or(source.len(), |&next| (next as usize).saturating_sub(1));
        source.get(start..end).unwrap_or("").trim_end_matches('\r')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_col_basic() {
        let source = "line1\nline2\nline3";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.offset_to_line_col(source, 0), (1, 1));
        assert_eq!(table.offset_to_line_col(source, 6), (2, 1));
        assert_eq!(table.offset_to_line_col(source, 12), (3, 1));
    }

    #[test]
    fn column_counts_chars_not_bytes() {
        let source = "é = 1";
        let table = LineOffsetTable::build(source);
        // 'é' is two bytes; the '=' at byte offset 3 is character column 3.
        assert_eq!(table.offset_to_line_col(source, 3), (1, 3));
    }

    #[test]
    fn line_text_extraction() {
        let source = "int x;\nx = 5;\n";
        let table = LineOffsetTable::build(source);
        assert_eq!(table.line_text(source, 1), "int x;");
        assert_eq!(table.line_text(source, 2), "x = 5;");
        assert_eq!(table.line_text(source, 99), "");
    }
}
