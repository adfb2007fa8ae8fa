// Copyright (c) 2016-2020 Fabian Schuiki

//! Utilities to implement diagnostics and error reporting facilities.
//!
//! Two distinct result disciplines live here. [`DiagResult2`] carries a
//! single diagnostic and is used by passes that stop at the first structural
//! problem. [`CheckResult`] carries a non-empty ordered list of diagnostics
//! and is used by passes that gather every independent finding before
//! reporting; combining two failed results concatenates their lists in
//! source order.

use std::fmt;

use crate::source::Span;

/// Used to emit structured diagnostic messages.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagBuilder2 {
    pub severity: Severity,
    pub message: String,
    pub segments: Vec<DiagSegment>,
}

/// A part of a diagnostic message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DiagSegment {
    Span(Span),
    Note(String),
}

/// A diagnostic result type. Either carries the result `T` in the Ok variant,
/// or an assembled diagnostic in the Err variant.
pub type DiagResult2<T> = Result<T, DiagBuilder2>;

impl DiagBuilder2 {
    pub fn new<S: Into<String>>(severity: Severity, message: S) -> DiagBuilder2 {
        DiagBuilder2 {
            severity,
            message: message.into(),
            segments: Vec::new(),
        }
    }

    pub fn bug<S: Into<String>>(message: S) -> DiagBuilder2 {
        DiagBuilder2::new(Severity::Bug, message)
    }

    pub fn fatal<S: Into<String>>(message: S) -> DiagBuilder2 {
        DiagBuilder2::new(Severity::Fatal, message)
    }

    pub fn error<S: Into<String>>(message: S) -> DiagBuilder2 {
        DiagBuilder2::new(Severity::Error, message)
    }

    pub fn warning<S: Into<String>>(message: S) -> DiagBuilder2 {
        DiagBuilder2::new(Severity::Warning, message)
    }

    pub fn note<S: Into<String>>(message: S) -> DiagBuilder2 {
        DiagBuilder2::new(Severity::Note, message)
    }

    /// Append a segment to the diagnostic.
    pub fn segment(mut self, segment: DiagSegment) -> DiagBuilder2 {
        self.segments.push(segment);
        self
    }

    /// Point the diagnostic at a location in a source buffer.
    pub fn span<S: Into<Span>>(self, span: S) -> DiagBuilder2 {
        self.segment(DiagSegment::Span(span.into()))
    }

    /// Attach an additional explanatory note.
    pub fn add_note<S: Into<String>>(self, message: S) -> DiagBuilder2 {
        self.segment(DiagSegment::Note(message.into()))
    }

    pub fn get_severity(&self) -> Severity {
        self.severity
    }

    pub fn get_message(&self) -> &String {
        &self.message
    }

    pub fn get_segments(&self) -> &[DiagSegment] {
        &self.segments
    }
}

/// How severe a diagnostic is.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum Severity {
    Note,
    Warning,
    Error,
    Fatal,
    Bug,
}

impl Severity {
    pub fn to_str(self) -> &'static str {
        match self {
            Severity::Fatal => "fatal",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Note => "note",
            Severity::Bug => "compiler bug",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl fmt::Display for DiagBuilder2 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.get_severity(), self.get_message())?;
        for segment in &self.segments {
            match *segment {
                DiagSegment::Span(sp) => write!(f, "\n  --> {}", sp)?,
                DiagSegment::Note(ref message) => write!(f, "\n   = note: {}", message)?,
            }
        }
        Ok(())
    }
}

/// A non-empty ordered list of diagnostics.
///
/// This is the failure side of [`CheckResult`]. Lists concatenate when
/// independent sub-results are combined, preserving the order in which the
/// checks were performed.
#[must_use]
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagList {
    diags: Vec<DiagBuilder2>,
}

impl DiagList {
    /// Create a list holding a single diagnostic.
    pub fn new(diag: DiagBuilder2) -> DiagList {
        DiagList { diags: vec![diag] }
    }

    /// Append a diagnostic to the end of the list.
    pub fn push(&mut self, diag: DiagBuilder2) {
        self.diags.push(diag);
    }

    /// Append all diagnostics of another list, preserving their order.
    pub fn append(&mut self, mut other: DiagList) {
        self.diags.append(&mut other.diags);
    }

    /// Iterate over the diagnostics in the list.
    pub fn iter(&self) -> impl Iterator<Item = &DiagBuilder2> {
        self.diags.iter()
    }

    /// The number of diagnostics in the list. Always at least 1.
    pub fn len(&self) -> usize {
        self.diags.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl From<DiagBuilder2> for DiagList {
    fn from(diag: DiagBuilder2) -> DiagList {
        DiagList::new(diag)
    }
}

impl IntoIterator for DiagList {
    type Item = DiagBuilder2;
    type IntoIter = std::vec::IntoIter<DiagBuilder2>;
    fn into_iter(self) -> Self::IntoIter {
        self.diags.into_iter()
    }
}

impl fmt::Display for DiagList {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (i, diag) in self.diags.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", diag)?;
        }
        Ok(())
    }
}

/// An accumulating diagnostic result type. Either carries the result `T` in
/// the Ok variant, or one or more diagnostics in the Err variant.
///
/// Use `?` to sequence checks where a later step depends on the result of an
/// earlier one. Use [`join`] and [`gather`] to combine checks that are
/// independent of each other, so that a user sees every finding in one run.
pub type CheckResult<T> = Result<T, DiagList>;

/// Shorthand to fail a check with a single diagnostic.
pub fn fail<T>(diag: DiagBuilder2) -> CheckResult<T> {
    Err(DiagList::new(diag))
}

/// Combine two independent checks. Succeeds with both values if both checks
/// succeed; otherwise accumulates the diagnostics of both, first check first.
pub fn join<A, B>(a: CheckResult<A>, b: CheckResult<B>) -> CheckResult<(A, B)> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(a), Ok(_)) => Err(a),
        (Ok(_), Err(b)) => Err(b),
        (Err(mut a), Err(b)) => {
            a.append(b);
            Err(a)
        }
    }
}

/// Combine any number of independent checks. Succeeds with all values if
/// every check succeeds; otherwise accumulates every diagnostic in check
/// order.
pub fn gather<T, I>(results: I) -> CheckResult<Vec<T>>
where
    I: IntoIterator<Item = CheckResult<T>>,
{
    let mut values = Vec::new();
    let mut diags: Option<DiagList> = None;
    for result in results {
        match result {
            Ok(v) => values.push(v),
            Err(d) => match diags {
                Some(ref mut diags) => diags.append(d),
                None => diags = Some(d),
            },
        }
    }
    match diags {
        Some(diags) => Err(diags),
        None => Ok(values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn err(msg: &str) -> CheckResult<()> {
        fail(DiagBuilder2::error(msg))
    }

    #[test]
    fn join_accumulates_in_order() {
        let combined = join(err("first"), err("second"));
        let diags: Vec<_> = combined
            .unwrap_err()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(diags, vec!["first", "second"]);
    }

    #[test]
    fn join_passes_values_through() {
        let combined = join::<_, ()>(Ok(42), err("oops"));
        assert_eq!(combined.unwrap_err().len(), 1);
        let combined = join(Ok(42), Ok("ok"));
        assert_eq!(combined.unwrap(), (42, "ok"));
    }

    #[test]
    fn gather_keeps_every_diagnostic() {
        let combined = gather(vec![err("a"), Ok(()), err("b"), err("c")]);
        let diags: Vec<_> = combined
            .unwrap_err()
            .into_iter()
            .map(|d| d.message)
            .collect();
        assert_eq!(diags, vec!["a", "b", "c"]);
        assert_eq!(gather(vec![Ok(1), Ok(2)]).unwrap(), vec![1, 2]);
    }
}
