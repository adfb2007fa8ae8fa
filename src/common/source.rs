// Copyright (c) 2016-2020 Fabian Schuiki

//! A global source table that assigns an opaque ID to each registered source
//! buffer. This keeps source locations lean and allows for simple querying of
//! path and content information. Loading files from disk is the driver's
//! business; the table only ever sees in-memory buffers.

use std::fmt;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;

/// The ID of a source that does not actually exist.
pub const INVALID_SOURCE: Source = Source(0);

/// A span in a source that does not actually exist.
pub const INVALID_SPAN: Span = Span {
    source: INVALID_SOURCE,
    begin: 0,
    end: 0,
};

/// An opaque handle to a registered source buffer.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Source(pub u32);

impl Source {
    /// Return the path under which this source was registered.
    pub fn get_path(self) -> String {
        get_source_table().get_path(self)
    }

    /// Copy a range of the source content into a caller-owned string.
    pub fn extract(self, begin: usize, end: usize) -> String {
        get_source_table().extract(self, begin, end)
    }
}

impl fmt::Debug for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.0 > 0 {
            write!(f, "Source({}; \"{}\")", self.0, self.get_path())
        } else {
            write!(f, "Source(INVALID)")
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        fmt::Display::fmt(&self.get_path(), f)
    }
}

/// A byte offset into a source buffer.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Location {
    pub source: Source,
    pub offset: usize,
}

impl Location {
    pub fn new(source: Source, offset: usize) -> Location {
        Location { source, offset }
    }
}

/// A range of bytes in a source buffer, expressed as a half-open interval.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Span {
    pub source: Source,
    pub begin: usize,
    pub end: usize,
}

impl Span {
    /// Create a new span from two byte offsets.
    pub fn new(source: Source, begin: usize, end: usize) -> Span {
        Span { source, begin, end }
    }

    /// Create a new span that covers two spans, i.e. represents the smallest
    /// span that fully contains both.
    pub fn union<S: Into<Span>>(self, other: S) -> Span {
        let other = other.into();
        assert_eq!(self.source, other.source);
        Span {
            source: self.source,
            begin: std::cmp::min(self.begin, other.begin),
            end: std::cmp::max(self.end, other.end),
        }
    }

    /// Return the location just at the beginning of this span.
    pub fn begin(&self) -> Location {
        Location::new(self.source, self.begin)
    }

    /// Copy the spanned range of the source content into a caller-owned
    /// string.
    pub fn extract(&self) -> String {
        self.source.extract(self.begin, self.end)
    }

    /// Resolve the beginning of the span to a 1-based line and column pair.
    pub fn line_col(&self) -> (usize, usize) {
        get_source_table().line_col(self.source, self.begin)
    }
}

impl From<Location> for Span {
    fn from(loc: Location) -> Span {
        Span {
            source: loc.source,
            begin: loc.offset,
            end: loc.offset,
        }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.source == INVALID_SOURCE {
            write!(f, "<unknown>")
        } else {
            let (line, col) = self.line_col();
            write!(f, "{}:{}:{}", self.source, line, col)
        }
    }
}

/// A wrapper that associates a span with a value.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Spanned<T> {
    pub value: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    /// Wrap a given value together with the span it covers.
    pub fn new(value: T, span: Span) -> Spanned<T> {
        Spanned { value, span }
    }

    /// Map the value, keeping the span.
    pub fn map<F, U>(self, f: F) -> Spanned<U>
    where
        F: FnOnce(T) -> U,
    {
        Spanned::new(f(self.value), self.span)
    }
}

impl<T> fmt::Display for Spanned<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.value.fmt(f)
    }
}

/// A table of registered source buffers, addressable by `Source` handles.
pub struct SourceTable {
    paths: Vec<String>,
    contents: Vec<String>,
}

impl SourceTable {
    fn new() -> SourceTable {
        // Index 0 is reserved for INVALID_SOURCE.
        SourceTable {
            paths: vec!["<invalid>".to_string()],
            contents: vec![String::new()],
        }
    }

    /// Register a source buffer under the given path.
    pub fn add(&mut self, path: &str, content: &str) -> Source {
        let id = Source(self.paths.len() as u32);
        self.paths.push(path.to_string());
        self.contents.push(content.to_string());
        id
    }

    fn get_path(&self, source: Source) -> String {
        self.paths[source.0 as usize].clone()
    }

    fn extract(&self, source: Source, begin: usize, end: usize) -> String {
        self.contents[source.0 as usize][begin..end].to_string()
    }

    fn line_col(&self, source: Source, offset: usize) -> (usize, usize) {
        let content = &self.contents[source.0 as usize];
        let mut line = 1;
        let mut col = 1;
        for (i, c) in content.char_indices() {
            if i >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        (line, col)
    }
}

static SOURCE_TABLE: Lazy<Mutex<SourceTable>> = Lazy::new(|| Mutex::new(SourceTable::new()));

/// Access the global source table.
pub fn get_source_table() -> MutexGuard<'static, SourceTable> {
    SOURCE_TABLE.lock().unwrap()
}

/// Register a source buffer in the global source table.
pub fn add_source(path: &str, content: &str) -> Source {
    get_source_table().add(path, content)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_and_lines() {
        let src = add_source("test.cov", "signal a 7:0\nsignal b 3:0\n");
        let sp = Span::new(src, 13, 19);
        assert_eq!(sp.extract(), "signal");
        assert_eq!(sp.line_col(), (2, 1));
        let all = sp.union(Span::new(src, 0, 6));
        assert_eq!(all.begin, 0);
        assert_eq!(all.end, 19);
    }
}
