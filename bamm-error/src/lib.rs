//! Contains the common [`ErrorKind`] trait used by all errors to display user-facing error
//! messages, and the [`Error`] type every fallible stage of the model pipeline returns.
//!
//! Errors in this workspace are not tied to a source file. Instead, an [`Error`] carries the
//! rendered text of the expression that failed, along with the regions of that text (usually the
//! operands of the failing node) that should be highlighted when the error is reported.

// lets `#[derive(ErrorKind)]` resolve `bamm_error::EXPR` inside this crate's own tests
#[cfg(test)]
extern crate self as bamm_error;

use ariadne::{Color, Report, Source};
use std::{any::Any, fmt::{self, Debug, Display}, ops::Range};

/// The color to use to highlight expressions.
pub const EXPR: Color = Color::RGB(52, 235, 152);

/// Represents any kind of error that can occur during some operation.
pub trait ErrorKind: Debug + Send + Sync {
    /// Returns the kind as [`Any`], so that callers can inspect which error occurred.
    fn as_any(&self) -> &dyn Any;

    /// The one-line message describing this error.
    fn message(&self) -> String;

    /// Builds the report for this error.
    fn build_report<'a>(
        &self,
        src_id: &'a str,
        spans: &[Range<usize>],
    ) -> Report<(&'a str, Range<usize>)>;
}

/// An error associated with regions of a rendered expression that can be highlighted.
#[derive(Debug)]
pub struct Error {
    /// The rendered expression this error originated from. May be empty if the error is not
    /// associated with any particular expression (such as a configuration error).
    pub source: String,

    /// The regions of [`Error::source`] that this error originated from.
    pub spans: Vec<Range<usize>>,

    /// The kind of error that occurred.
    pub kind: Box<dyn ErrorKind>,
}

impl Error {
    /// Creates a new error with the given spans and kind.
    pub fn new(spans: Vec<Range<usize>>, kind: impl ErrorKind + 'static) -> Self {
        Self { source: String::new(), spans, kind: Box::new(kind) }
    }

    /// Creates a new error that is not associated with any expression.
    pub fn bare(kind: impl ErrorKind + 'static) -> Self {
        Self::new(Vec::new(), kind)
    }

    /// Attaches the rendered expression that the spans of this error point into.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    /// Returns true if the kind of this error is `K`.
    pub fn is<K: ErrorKind + 'static>(&self) -> bool {
        self.kind.as_any().is::<K>()
    }

    /// Returns the kind of this error as `K`, if it is one.
    pub fn downcast_ref<K: ErrorKind + 'static>(&self) -> Option<&K> {
        self.kind.as_any().downcast_ref::<K>()
    }

    /// Build a report from this error kind.
    pub fn build_report<'a>(&self, src_id: &'a str) -> Report<(&'a str, Range<usize>)> {
        self.kind.build_report(src_id, &self.spans)
    }

    /// Writes the report of this error to stderr.
    ///
    /// The `ariadne` crate's [`Report`] type does not have a `Display` implementation, so we can
    /// only use its `eprint` method to print to stderr.
    pub fn report_to_stderr(&self, src_id: &str) -> std::io::Result<()> {
        self.build_report(src_id).eprint((src_id, Source::from(&self.source)))
    }

    /// Renders the report of this error into a string, including ANSI color codes.
    pub fn report_to_string(&self, src_id: &str) -> String {
        let mut buf = Vec::new();
        // writing into a `Vec` can't fail
        let _ = self.build_report(src_id).write((src_id, Source::from(&self.source)), &mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind.message())?;
        if !self.source.is_empty() {
            write!(f, " (in `{}`)", self.source)?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use bamm_attrs::ErrorKind;
    use super::*;

    #[derive(Debug, ErrorKind)]
    #[error(
        message = format!("`{}` is not defined", self.name),
        labels = ["this symbol"],
        help = "define it first",
    )]
    struct Undefined {
        name: String,
    }

    #[test]
    fn downcast_kind() {
        let err = Error::new(vec![0..1], Undefined { name: "x".to_string() }).with_source("x + 1");
        assert!(err.is::<Undefined>());
        assert_eq!(err.downcast_ref::<Undefined>().unwrap().name, "x");
        assert_eq!(err.to_string(), "`x` is not defined (in `x + 1`)");
    }

    #[test]
    fn report_without_spans() {
        let err = Error::bare(Undefined { name: "y".to_string() });
        let report = err.report_to_string("model");
        let stripped = String::from_utf8(strip_ansi_escapes::strip(report)).unwrap();
        assert!(stripped.contains("`y` is not defined"));
    }

    #[test]
    fn report_labels_span() {
        let err = Error::new(vec![4..5], Undefined { name: "k".to_string() }).with_source("1 + k");
        let report = err.report_to_string("model");
        let stripped = String::from_utf8(strip_ansi_escapes::strip(report)).unwrap();
        assert!(stripped.contains("this symbol"));
        assert!(stripped.contains("define it first"));
    }
}
