//! Shared output sink.
//!
//! Every fragment of one physical SQL stream is appended to a single
//! [`SqlSink`], including the text of nested subqueries. Words are separated
//! by one space except at the start of the buffer and right after `(`.

use std::ops::Range;

use crate::dialect::PlaceholderStyle;

/// SQL text buffer with placeholder bookkeeping.
#[derive(Debug, Default, Clone)]
pub struct SqlSink {
    sql: String,
    placeholders: Vec<Range<usize>>,
    glued: bool,
}

impl SqlSink {
    /// Creates an empty sink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            sql: String::new(),
            placeholders: Vec::new(),
            glued: false,
        }
    }

    fn space(&mut self) {
        if self.glued {
            self.glued = false;
            return;
        }
        if !self.sql.is_empty() && !self.sql.ends_with('(') && !self.sql.ends_with(' ') {
            self.sql.push(' ');
        }
    }

    /// Appends a keyword or any other space-separated word.
    pub fn keyword(&mut self, word: &str) {
        if word.is_empty() {
            return;
        }
        self.space();
        self.sql.push_str(word);
    }

    /// Appends a word produced by `write`, preceded by a separating space.
    pub fn word_with(&mut self, write: impl FnOnce(&mut String)) {
        self.space();
        write(&mut self.sql);
    }

    /// Appends text with no separating space.
    pub fn push(&mut self, text: &str) {
        self.glued = false;
        self.sql.push_str(text);
    }

    /// Suppresses the space before the next word.
    pub fn glue(&mut self) {
        self.glued = true;
    }

    /// Appends `,`.
    pub fn comma(&mut self) {
        self.push(",");
    }

    /// Opens a parenthesized block.
    pub fn open_paren(&mut self) {
        self.space();
        self.sql.push('(');
    }

    /// Closes a parenthesized block.
    pub fn close_paren(&mut self) {
        self.push(")");
    }

    /// Appends a placeholder for the 1-based parameter `index`.
    pub fn placeholder(&mut self, style: PlaceholderStyle, index: usize) {
        self.space();
        let start = self.sql.len();
        style.write(index, &mut self.sql);
        self.placeholders.push(start..self.sql.len());
    }

    /// The text written so far.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.sql
    }

    /// Byte length of the text.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sql.len()
    }

    /// Returns true when nothing was written.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    /// Number of placeholders written so far.
    #[must_use]
    pub fn placeholder_count(&self) -> usize {
        self.placeholders.len()
    }

    /// Byte spans of the placeholders, in emission order.
    #[must_use]
    pub fn placeholders(&self) -> &[Range<usize>] {
        &self.placeholders
    }

    /// Consumes the sink into its text and placeholder spans.
    #[must_use]
    pub fn into_parts(self) -> (String, Vec<Range<usize>>) {
        (self.sql, self.placeholders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_spacing() {
        let mut sink = SqlSink::new();
        sink.keyword("SELECT");
        sink.keyword("COUNT");
        sink.push("(");
        sink.keyword("o.id");
        sink.close_paren();
        sink.comma();
        sink.keyword("-");
        sink.glue();
        sink.keyword("o.qty");
        sink.keyword("WHERE");
        sink.keyword("EXISTS");
        sink.open_paren();
        sink.keyword("SELECT");
        sink.close_paren();
        assert_eq!(
            sink.as_str(),
            "SELECT COUNT(o.id), -o.qty WHERE EXISTS (SELECT)"
        );
    }

    #[test]
    fn test_placeholder_spans() {
        let mut sink = SqlSink::new();
        sink.keyword("x =");
        sink.placeholder(PlaceholderStyle::Dollar, 1);
        sink.keyword("AND y IN");
        sink.open_paren();
        sink.placeholder(PlaceholderStyle::Dollar, 2);
        sink.comma();
        sink.placeholder(PlaceholderStyle::Dollar, 3);
        sink.close_paren();
        assert_eq!(sink.as_str(), "x = $1 AND y IN ($2, $3)");
        let spans: Vec<&str> = sink
            .placeholders()
            .iter()
            .map(|r| &sink.as_str()[r.clone()])
            .collect();
        assert_eq!(spans, ["$1", "$2", "$3"]);
    }
}
