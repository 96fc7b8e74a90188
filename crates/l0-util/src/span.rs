//! Source location tracking.
//!
//! A [`Span`] is a half-open `[start, end)` range over (line, column) pairs
//! inside a named file, as described in spec.md §3 ("Source position").
//! Byte offsets are also tracked since the lexer and parser both need them,
//! but all diagnostic rendering is line/column based.

use std::path::{Path, PathBuf};

/// Identifies one loaded source file inside a [`SourceMap`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileId(pub u32);

impl FileId {
    pub const DUMMY: FileId = FileId(u32::MAX);
}

/// A half-open source range `[start, end)`, in both byte offsets and
/// 1-based line/column pairs, tied to a specific file.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub file: FileId,
    pub start: usize,
    pub end: usize,
    pub start_line: u32,
    pub start_column: u32,
    pub end_line: u32,
    pub end_column: u32,
}

impl Default for FileId {
    fn default() -> Self {
        FileId::DUMMY
    }
}

impl Span {
    pub const DUMMY: Span = Span {
        file: FileId(u32::MAX),
        start: 0,
        end: 0,
        start_line: 0,
        start_column: 0,
        end_line: 0,
        end_column: 0,
    };

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        file: FileId,
        start: usize,
        end: usize,
        start_line: u32,
        start_column: u32,
        end_line: u32,
        end_column: u32,
    ) -> Self {
        Self {
            file,
            start,
            end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }

    /// A zero-width span at a single point, useful for synthesized nodes.
    pub fn point(file: FileId, offset: usize, line: u32, column: u32) -> Self {
        Self::new(file, offset, offset, line, column, line, column)
    }

    /// Smallest span enclosing both `self` and `other`. Both must share a file.
    pub fn to(self, other: Span) -> Span {
        debug_assert_eq!(self.file, other.file);
        let (start, start_line, start_column) = if self.start <= other.start {
            (self.start, self.start_line, self.start_column)
        } else {
            (other.start, other.start_line, other.start_column)
        };
        let (end, end_line, end_column) = if self.end >= other.end {
            (self.end, self.end_line, self.end_column)
        } else {
            (other.end, other.end_line, other.end_column)
        };
        Span {
            file: self.file,
            start,
            end,
            start_line,
            start_column,
            end_line,
            end_column,
        }
    }
}

/// One loaded source file: its name, its text, and line-start byte offsets
/// (used to translate byte offsets back to line/column when needed).
#[derive(Debug)]
pub struct SourceFile {
    pub name: PathBuf,
    pub module_name: String,
    pub text: String,
    line_starts: Vec<usize>,
}

impl SourceFile {
    pub fn new(name: impl Into<PathBuf>, module_name: impl Into<String>, text: String) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in text.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self {
            name: name.into(),
            module_name: module_name.into(),
            text,
            line_starts,
        }
    }

    /// Translate a byte offset into a 1-based (line, column) pair.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i.saturating_sub(1),
        };
        let line_start = self.line_starts[line_idx];
        let column = self.text[line_start..offset.min(self.text.len())]
            .chars()
            .count()
            + 1;
        (line_idx as u32 + 1, column as u32)
    }
}

/// Owns all loaded source files for one compilation, indexed by [`FileId`].
#[derive(Debug, Default)]
pub struct SourceMap {
    files: Vec<SourceFile>,
}

impl SourceMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_file(&mut self, file: SourceFile) -> FileId {
        let id = FileId(self.files.len() as u32);
        self.files.push(file);
        id
    }

    pub fn get(&self, id: FileId) -> Option<&SourceFile> {
        self.files.get(id.0 as usize)
    }

    pub fn path(&self, id: FileId) -> Option<&Path> {
        self.get(id).map(|f| f.name.as_path())
    }
}
