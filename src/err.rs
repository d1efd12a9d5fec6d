//! Error interface for this crate.
//!
//! Every error type in the crate implements [`Error`], which extends
//! [`std::error::Error`] with a source code span and a help message.
//! [`report`] renders such an error against its source code.

use std::borrow::Cow;
use std::ops::Range;

pub use crate::ast::FieldNewErr;
pub use crate::parse::lex::LexErr;
pub use crate::parse::{ParseErr, ParseErrKind};
pub use crate::asm::{AsmErr, AsmErrKind};
pub use crate::sim::SimErr;
pub use crate::sim::preload::PreloadErr;

/// Unified error interface for all errors in this crate.
pub trait Error: std::error::Error {
    /// The range of source code this error refers to, if any.
    fn span(&self) -> Option<ErrSpan> {
        None
    }

    /// A message suggesting how the error can be fixed.
    fn help(&self) -> Option<Cow<str>> {
        None
    }
}

/// A span of source code associated with an error.
#[derive(Debug, PartialEq, Eq, Hash, Clone)]
pub struct ErrSpan(Range<usize>);
impl ErrSpan {
    /// The byte range of the span.
    pub fn range(&self) -> Range<usize> {
        self.0.clone()
    }
}
impl From<Range<usize>> for ErrSpan {
    fn from(value: Range<usize>) -> Self {
        ErrSpan(value)
    }
}

/// Renders an error as a multi-line report.
///
/// If the error has a span inside of `src`, the offending line
/// is printed with the span underlined.
///
/// ```
/// use simple_asm::parse::parse_ast;
/// use simple_asm::err::report;
///
/// let src = "LOAD R0, 101\nLOAD R0, 1, 2\n";
/// let err = parse_ast(src).unwrap_err();
/// let rendered = report(&err, src);
/// assert!(rendered.contains("2:13"));
/// assert!(rendered.contains("LOAD R0, 1, 2"));
/// ```
pub fn report(err: &dyn Error, src: &str) -> String {
    use std::fmt::Write;

    let mut buf = format!("error: {err}");
    if let Some(span) = err.span().map(|s| s.range()).filter(|r| r.start <= src.len()) {
        let line_start = src[..span.start].rfind('\n').map_or(0, |i| i + 1);
        let line_end = src[span.start..].find('\n').map_or(src.len(), |i| span.start + i);
        let line = src[line_start..line_end].trim_end_matches('\r');

        let lno = src[..line_start].matches('\n').count() + 1;
        let col = span.start - line_start + 1;
        let width = span.end.min(line_end).saturating_sub(span.start).max(1);

        // writing into a String cannot fail
        let _ = write!(buf, "\n  --> {lno}:{col}");
        let _ = write!(buf, "\n   | {line}");
        let _ = write!(buf, "\n   | {:pad$}{:^<width$}", "", "", pad = col - 1);
    }
    if let Some(help) = err.help() {
        let _ = write!(buf, "\n help: {help}");
    }

    buf
}
