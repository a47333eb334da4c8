//! Diagnostics for the layout core.
//!
//! Mirrors the shape of `typst`'s `diag` module: a [`SourceResult`] that
//! carries a vector of diagnostics, a [`Warned`] wrapper for non-fatal
//! output, and `bail!`/`error!`/`warning!` macros that build diagnostics
//! from a [`Location`] and a format string.

use ecow::{eco_vec, EcoString, EcoVec};

use crate::geom::Location;

/// A result that can carry a layout error.
pub type SourceResult<T> = Result<T, EcoVec<LayoutDiagnostic>>;

/// An output alongside warnings generated while producing it.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Warned<T> {
    pub output: T,
    pub warnings: EcoVec<LayoutDiagnostic>,
}

/// An error or warning raised during layout.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct LayoutDiagnostic {
    pub severity: Severity,
    pub location: Option<Location>,
    pub kind: ErrorKind,
    pub message: EcoString,
    pub hints: EcoVec<EcoString>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Severity {
    Error,
    Warning,
}

/// Error kinds named in the error handling design.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ErrorKind {
    /// Stack spacing sums to infinity: no finite region to pack into.
    InfiniteSize,
    /// Relayout iteration cap exceeded; output is best-effort.
    LayoutRecursionLimit,
    /// `into_frame()` was called on a multi-frame fragment.
    FragmentArityError,
    /// External cancellation was signaled.
    Cancelled,
    /// No font covers the required glyphs.
    FontMissing,
    /// A caller-supplied layouter callback failed.
    DownstreamError,
}

impl LayoutDiagnostic {
    pub fn error(location: Option<Location>, kind: ErrorKind, message: impl Into<EcoString>) -> Self {
        Self {
            severity: Severity::Error,
            location,
            kind,
            message: message.into(),
            hints: eco_vec![],
        }
    }

    pub fn warning(location: Option<Location>, kind: ErrorKind, message: impl Into<EcoString>) -> Self {
        Self {
            severity: Severity::Warning,
            location,
            kind,
            message: message.into(),
            hints: eco_vec![],
        }
    }

    pub fn with_hint(mut self, hint: impl Into<EcoString>) -> Self {
        self.hints.push(hint.into());
        self
    }
}

/// Early-return with a [`SourceResult`] built from a [`LayoutDiagnostic`].
#[macro_export]
macro_rules! bail {
    ($loc:expr, $kind:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        return Err(::ecow::eco_vec![$crate::error::LayoutDiagnostic::error(
            $loc,
            $kind,
            ::ecow::eco_format!($fmt $(, $arg)*),
        )])
    };
}

/// Construct an error-severity [`LayoutDiagnostic`] without returning.
#[macro_export]
macro_rules! error {
    ($loc:expr, $kind:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::error::LayoutDiagnostic::error(
            $loc,
            $kind,
            ::ecow::eco_format!($fmt $(, $arg)*),
        )
    };
}

/// Construct a warning-severity [`LayoutDiagnostic`].
#[macro_export]
macro_rules! warning {
    ($loc:expr, $kind:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $crate::error::LayoutDiagnostic::warning(
            $loc,
            $kind,
            ::ecow::eco_format!($fmt $(, $arg)*),
        )
    };
}

pub use {bail, error, warning};

/// Accumulates non-fatal diagnostics produced during a composition.
///
/// Plays the role of the teacher's `Sink`: layout code that hits a
/// recoverable condition (a missing math font, a recursion cap) records a
/// warning here rather than aborting, matching the propagation policy in
/// the error handling design (§7).
#[derive(Debug, Default, Clone)]
pub struct Sink {
    warnings: EcoVec<LayoutDiagnostic>,
}

impl Sink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn warn(&mut self, diagnostic: LayoutDiagnostic) {
        self.warnings.push(diagnostic);
    }

    pub fn into_warnings(self) -> EcoVec<LayoutDiagnostic> {
        self.warnings
    }
}

/// A cooperative cancellation check, threaded through composition the way
/// the teacher threads `Engine`/`Route` by reference through every layout
/// call. Checked at each child dispatch and relayout iteration (§5).
pub trait Cancellation {
    fn is_cancelled(&self) -> bool;
}

impl Cancellation for () {
    fn is_cancelled(&self) -> bool {
        false
    }
}
