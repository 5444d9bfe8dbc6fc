use core::fmt;
use thiserror::Error;

/// Result alias used across the crate
pub type Result<T, E = HeadmapError> = core::result::Result<T, E>;

/// Which dimension of a table an index or a name list refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Column,
    Row,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Column => write!(f, "column"),
            Axis::Row => write!(f, "row"),
        }
    }
}

/// Failures reported by the external statistical engine.
///
/// These are produced by a [`crate::source::TableSource`] and pass through
/// the core unchanged.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("statistical engine could not be started: {0}")]
    Startup(String),
    #[error("statistical engine library not found: {0}")]
    LibraryNotFound(String),
    #[error("statistical engine environment not found: {0}")]
    EnvironmentNotFound(String),
    #[error("engine function `{function}` failed: {message}")]
    Execution { function: String, message: String },
}

/// Errors of the head-map core
#[derive(Debug, Error)]
pub enum HeadmapError {
    /// The engine result is not a two-dimensional named table, or one of its
    /// columns is not a string vector.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Explicit table construction with name lists that do not match the data.
    #[error("dimension mismatch: {names} {axis} names for {data} {axis}s of data")]
    DimensionMismatch { axis: Axis, names: usize, data: usize },

    #[error("{axis} index {index} out of range (table has {len} {axis}s)")]
    OutOfRange { axis: Axis, index: usize, len: usize },

    /// A parsed symptom has no collection from the structural phase.
    #[error("script changed for {processor} ({request}): unexpected symptom `{symptom}`")]
    UnexpectedSymptom {
        processor: String,
        request: String,
        symptom: String,
    },

    /// Shape errors raised while a processor parsed one engine request.
    #[error("script changed for {processor} ({request}): {reason}")]
    ScriptChanged {
        processor: String,
        request: String,
        reason: String,
    },

    /// Engine failure, tagged with the processor and request that hit it
    #[error("{processor} ({request}): {source}")]
    Engine {
        processor: String,
        request: String,
        #[source]
        source: EngineError,
    },

    #[error("misuse: {0}")]
    Misuse(String),
}

impl HeadmapError {
    /// Wraps an engine failure with the request that produced it
    pub fn engine(processor: &str, request: &str, source: EngineError) -> Self {
        HeadmapError::Engine {
            processor: processor.to_string(),
            request: request.to_string(),
            source,
        }
    }

    /// Converts a lower-level parsing error into the processor boundary
    /// taxonomy. Symptom and engine errors keep their kind; everything else
    /// becomes [`HeadmapError::ScriptChanged`].
    pub fn at_boundary(self, processor: &str, request: &str) -> Self {
        match self {
            err @ (HeadmapError::UnexpectedSymptom { .. }
            | HeadmapError::ScriptChanged { .. }
            | HeadmapError::Engine { .. }
            | HeadmapError::Misuse(_)) => err,
            other => HeadmapError::ScriptChanged {
                processor: processor.to_string(),
                request: request.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
