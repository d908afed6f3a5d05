//! Line storage for the editor
//!
//! Lines are kept 1-indexed behind a sentinel at index 0. Every structural
//! change (insert, delete, move) goes through [`Buffer::block_move`], which
//! relocates a contiguous range with three in-place reversals.

/// One stored line. `text` keeps its trailing `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Line {
    pub text: String,
    pub mark: bool,
}

impl Line {
    fn new(text: String) -> Self {
        Self { text, mark: false }
    }
}

/// The edit buffer: lines plus the current line pointer.
#[derive(Debug, Clone)]
pub struct Buffer {
    lines: Vec<Line>,
    cur_line: usize,
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

impl Buffer {
    /// Create an empty buffer holding only the sentinel.
    pub fn new() -> Self {
        Self {
            lines: vec![Line::default()],
            cur_line: 0,
        }
    }

    /// Build a buffer from already terminated lines; the current line is the last one.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut buffer = Self::new();
        for text in lines {
            buffer.put_text(text.into());
        }
        buffer
    }

    /// Drop every line and reset the current line to 0.
    pub fn clear(&mut self) {
        self.lines.truncate(1);
        self.cur_line = 0;
    }

    /// Number of the last line (0 when empty).
    pub fn last_line(&self) -> usize {
        self.lines.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.last_line() == 0
    }

    pub fn current(&self) -> usize {
        self.cur_line
    }

    /// Set the current line, clamped to the last line.
    pub fn set_current(&mut self, n: usize) {
        self.cur_line = n.min(self.last_line());
    }

    /// Text of line `n`, terminator included. Line 0 is the empty sentinel.
    pub fn get(&self, n: usize) -> &str {
        &self.lines[n].text
    }

    pub fn put(&mut self, n: usize, text: String) {
        self.lines[n].text = text;
    }

    pub fn mark(&self, n: usize) -> bool {
        self.lines[n].mark
    }

    pub fn set_mark(&mut self, n: usize, mark: bool) {
        self.lines[n].mark = mark;
    }

    /// Line after `n`, wrapping to 0 past the end.
    pub fn next_line(&self, n: usize) -> usize {
        if n >= self.last_line() { 0 } else { n + 1 }
    }

    /// Line before `n`, wrapping to the last line before 1.
    pub fn prev_line(&self, n: usize) -> usize {
        if n == 0 { self.last_line() } else { n - 1 }
    }

    /// Iterate over the text of lines `n1..=n2`.
    pub fn texts(&self, n1: usize, n2: usize) -> impl Iterator<Item = &str> {
        self.lines[n1..=n2].iter().map(|line| line.text.as_str())
    }

    /// Reverse the stored order of lines `n1..=n2` in place.
    pub fn reverse(&mut self, n1: usize, n2: usize) {
        if n1 < n2 {
            self.lines[n1..=n2].reverse();
        }
    }

    /// Move lines `n1..=n2` to sit right after line `n3`.
    ///
    /// `n3` must lie outside `n1..=n2`; a target already adjacent to the block
    /// leaves the buffer untouched.
    pub fn block_move(&mut self, n1: usize, n2: usize, n3: usize) {
        if n3 + 1 < n1 {
            self.reverse(n3 + 1, n1 - 1);
            self.reverse(n1, n2);
            self.reverse(n3 + 1, n2);
        } else if n2 < n3 {
            self.reverse(n1, n2);
            self.reverse(n2 + 1, n3);
            self.reverse(n1, n3);
        }
    }

    /// Insert `text` after the current line and make it current.
    pub fn put_text(&mut self, text: String) {
        self.lines.push(Line::new(text));
        let last = self.last_line();
        self.block_move(last, last, self.cur_line);
        self.cur_line += 1;
    }

    /// Delete lines `n1..=n2`; the current line becomes the one before `n1`.
    pub fn delete(&mut self, n1: usize, n2: usize) {
        let last = self.last_line();
        self.block_move(n1, n2, last);
        self.lines.truncate(last - (n2 - n1 + 1) + 1);
        self.cur_line = self.prev_line(n1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(buffer: &Buffer) -> Vec<&str> {
        if buffer.is_empty() {
            return Vec::new();
        }
        buffer.texts(1, buffer.last_line()).collect()
    }

    #[test]
    fn test_new_buffer_is_empty() {
        let buffer = Buffer::new();
        assert_eq!(buffer.last_line(), 0);
        assert_eq!(buffer.current(), 0);
        assert_eq!(buffer.get(0), "");
    }

    #[test]
    fn test_put_text_inserts_after_current() {
        let mut buffer = Buffer::from_lines(["a\n", "c\n"]);
        buffer.set_current(1);
        buffer.put_text("b\n".to_string());
        assert_eq!(texts(&buffer), vec!["a\n", "b\n", "c\n"]);
        assert_eq!(buffer.current(), 2);
    }

    #[test]
    fn test_put_text_at_head() {
        let mut buffer = Buffer::from_lines(["b\n"]);
        buffer.set_current(0);
        buffer.put_text("a\n".to_string());
        assert_eq!(texts(&buffer), vec!["a\n", "b\n"]);
        assert_eq!(buffer.current(), 1);
    }

    #[test]
    fn test_reverse_range() {
        let mut buffer = Buffer::from_lines(["1\n", "2\n", "3\n", "4\n"]);
        buffer.reverse(2, 4);
        assert_eq!(texts(&buffer), vec!["1\n", "4\n", "3\n", "2\n"]);
    }

    #[test]
    fn test_block_move_backward() {
        let mut buffer = Buffer::from_lines(["a\n", "b\n", "c\n", "d\n"]);
        buffer.block_move(3, 4, 0);
        assert_eq!(texts(&buffer), vec!["c\n", "d\n", "a\n", "b\n"]);
    }

    #[test]
    fn test_block_move_forward() {
        let mut buffer = Buffer::from_lines(["a\n", "b\n", "c\n", "d\n"]);
        buffer.block_move(1, 1, 3);
        assert_eq!(texts(&buffer), vec!["b\n", "c\n", "a\n", "d\n"]);
    }

    #[test]
    fn test_block_move_adjacent_is_noop() {
        let mut buffer = Buffer::from_lines(["a\n", "b\n", "c\n"]);
        buffer.block_move(2, 3, 1);
        assert_eq!(texts(&buffer), vec!["a\n", "b\n", "c\n"]);
    }

    #[test]
    fn test_delete_middle() {
        let mut buffer = Buffer::from_lines(["a\n", "b\n", "c\n", "d\n"]);
        buffer.delete(2, 3);
        assert_eq!(texts(&buffer), vec!["a\n", "d\n"]);
        assert_eq!(buffer.current(), 1);
    }

    #[test]
    fn test_delete_everything() {
        let mut buffer = Buffer::from_lines(["a\n", "b\n"]);
        buffer.delete(1, 2);
        assert!(buffer.is_empty());
        assert_eq!(buffer.current(), 0);
    }

    #[test]
    fn test_next_and_prev_wrap() {
        let buffer = Buffer::from_lines(["a\n", "b\n"]);
        assert_eq!(buffer.next_line(2), 0);
        assert_eq!(buffer.next_line(0), 1);
        assert_eq!(buffer.prev_line(0), 2);
        assert_eq!(buffer.prev_line(1), 0);
    }

    #[test]
    fn test_marks_travel_with_lines() {
        let mut buffer = Buffer::from_lines(["a\n", "b\n", "c\n"]);
        buffer.set_mark(3, true);
        buffer.block_move(3, 3, 0);
        assert!(buffer.mark(1));
        assert!(!buffer.mark(3));
    }
}
