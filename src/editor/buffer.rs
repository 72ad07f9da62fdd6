use std::path::{Path, PathBuf};

use regex::Regex;
use ropey::Rope;

use crate::host::{ScanControl, ScanMatch};

/// A position in the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Point {
    /// Zero-based row.
    pub row: usize,
    /// Zero-based column, in characters.
    pub column: usize,
}

impl Point {
    pub const fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

/// A rope-backed text buffer, optionally bound to a file.
#[derive(Debug, Clone)]
pub struct TextBuffer {
    rope: Rope,
    path: Option<PathBuf>,
}

impl TextBuffer {
    /// Create an unsaved buffer holding `text`.
    pub fn from_text(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
            path: None,
        }
    }

    pub fn empty() -> Self {
        Self::from_text("")
    }

    /// The file this buffer saves to, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn set_path(&mut self, path: Option<PathBuf>) {
        self.path = path;
    }

    /// Total number of rows. An empty buffer still has one (empty) row.
    pub fn line_count(&self) -> usize {
        self.rope.len_lines()
    }

    /// Text of `row` without its line terminator.
    pub fn line_at(&self, row: usize) -> Option<String> {
        if row >= self.rope.len_lines() {
            return None;
        }
        let line = self.rope.line(row).to_string();
        Some(strip_terminator(&line).to_string())
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Replace the whole content.
    pub fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }

    /// Insert `text` at `at` (clamped to the buffer), returning the point
    /// just past the inserted text.
    pub fn insert(&mut self, at: Point, text: &str) -> Point {
        let at = self.clip(at);
        let char_idx = self.char_index(at);
        self.rope.insert(char_idx, text);

        let end = char_idx + text.chars().count();
        let row = self.rope.char_to_line(end);
        Point::new(row, end - self.rope.line_to_char(row))
    }

    /// Remove the text between `start` and `end` (both clamped).
    pub fn delete(&mut self, start: Point, end: Point) {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        let from = self.char_index(self.clip(start));
        let to = self.char_index(self.clip(end));
        if from < to {
            self.rope.remove(from..to);
        }
    }

    /// Report matches of `pattern` row by row until `on_match` says stop.
    pub fn scan(&self, pattern: &Regex, on_match: &mut dyn FnMut(ScanMatch) -> ScanControl) {
        for (row, line) in self.rope.lines().enumerate() {
            let text = line.to_string();
            for found in pattern.find_iter(strip_terminator(&text)) {
                let hit = ScanMatch {
                    row,
                    start: found.start(),
                    end: found.end(),
                };
                if on_match(hit) == ScanControl::Stop {
                    return;
                }
            }
        }
    }

    /// Clamp `point` to an existing row and column.
    pub fn clip(&self, point: Point) -> Point {
        let last_row = self.line_count().saturating_sub(1);
        let row = point.row.min(last_row);
        let len = self.line_at(row).map_or(0, |line| line.chars().count());
        Point::new(row, point.column.min(len))
    }

    fn char_index(&self, point: Point) -> usize {
        self.rope.line_to_char(point.row) + point.column
    }
}

/// Rows end at `\n`, `\r\n` or a lone `\r`; nothing else breaks a row.
fn strip_terminator(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

impl Default for TextBuffer {
    fn default() -> Self {
        Self::empty()
    }
}
