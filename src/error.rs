//! Error handling.

use std::fmt;

/// A specialized [`Result`] type for windowing and context operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The error type for all library operations.
///
/// Every failing call reports through two channels: the registered error
/// callback is invoked synchronously with this value, and the value is
/// returned to the caller. The library never panics on caller misuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// The raw code of the underlying OS error, when one exists.
    raw_code: Option<i64>,

    /// Human-readable description. OS error text is embedded here rather
    /// than surfaced raw.
    description: String,

    /// The simplified error kind to match on.
    kind: ErrorKind,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, description: impl Into<String>) -> Self {
        Self { raw_code: None, description: description.into(), kind }
    }

    pub(crate) fn with_code(
        kind: ErrorKind,
        raw_code: i64,
        description: impl Into<String>,
    ) -> Self {
        Self { raw_code: Some(raw_code), description: description.into(), kind }
    }

    /// The underlying error kind.
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// The human-readable description.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The underlying raw OS code in case it's present.
    #[inline]
    pub fn raw_code(&self) -> Option<i64> {
        self.raw_code
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(raw_code) = self.raw_code {
            write!(f, "[{raw_code:x}] ")?;
        }

        if self.description.is_empty() {
            write!(f, "{}", self.kind.as_str())
        } else {
            write!(f, "{}: {}", self.kind.as_str(), self.description)
        }
    }
}

impl std::error::Error for Error {}

/// Build an error with just a kind.
impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Self {
        Error { raw_code: None, description: String::new(), kind }
    }
}

/// A flat list of the general categories a failing call can report.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ErrorKind {
    /// The library has been terminated, or the call arrived before any
    /// backend finished initializing.
    NotInitialized,

    /// The operation needs a context current on the calling thread and none
    /// is.
    NoCurrentContext,

    /// An out-of-range enumeration value was passed, such as a joystick
    /// slot beyond the supported count.
    InvalidEnum,

    /// One or more argument values are invalid, including stale window and
    /// monitor handles.
    InvalidValue,

    /// An allocation failed.
    OutOfMemory,

    /// The requested client API or its loader is absent on this system.
    ApiUnavailable,

    /// The requested client API version or profile cannot be satisfied.
    VersionUnavailable,

    /// No platform backend could be initialized, or the requested one is
    /// not compiled in.
    PlatformUnavailable,

    /// A platform call failed for a reason outside the other categories.
    /// The description carries the OS error text.
    PlatformError,

    /// The requested pixel format or clipboard format is unavailable.
    FormatUnavailable,

    /// The window has no associated context.
    NoWindowContext,

    /// The requested cursor shape or mode cannot be provided.
    CursorUnavailable,

    /// The platform backend does not support the requested feature.
    FeatureUnavailable,

    /// The feature is not yet implemented for this platform backend.
    FeatureUnimplemented,
}

impl ErrorKind {
    pub(crate) fn as_str(&self) -> &'static str {
        use ErrorKind::*;
        match *self {
            NotInitialized => "the library is not initialized",
            NoCurrentContext => "there is no current context on this thread",
            InvalidEnum => "invalid enumeration value",
            InvalidValue => "invalid argument value",
            OutOfMemory => "out of memory",
            ApiUnavailable => "the requested client API is unavailable",
            VersionUnavailable => "the requested client API version is unavailable",
            PlatformUnavailable => "no usable platform backend",
            PlatformError => "platform error",
            FormatUnavailable => "the requested format is unavailable",
            NoWindowContext => "the window has no associated context",
            CursorUnavailable => "the requested cursor is unavailable",
            FeatureUnavailable => "the feature is unavailable on this platform",
            FeatureUnimplemented => "the feature is not implemented for this platform",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
