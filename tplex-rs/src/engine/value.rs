//! Runtime value type for the template engine.
//!
//! Every value is a string at heart.  Composite values (arrays, maps) and
//! function bodies are still strings; the [`Kind`] tag tells a built-in how
//! the text should be interpreted, and [`Status`] carries the outcome of the
//! call that produced the value.

use std::fmt;

/// Type hint carried next to a value's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Kind {
    /// Plain text.
    #[default]
    Normal,
    /// The text is a composite-store handle referring to an array.
    Array,
    /// The text is a composite-store handle referring to a map.
    Map,
    /// The text is an unevaluated call body, produced by `func`.
    Function,
}

impl Kind {
    pub fn name(self) -> &'static str {
        match self {
            Kind::Normal => "normal",
            Kind::Array => "array",
            Kind::Map => "map",
            Kind::Function => "function",
        }
    }
}

/// Outcome of evaluating a call.
///
/// Anything other than [`Status::Success`] aborts the enclosing call chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Status {
    #[default]
    Success,
    /// Wrong argument count, or an index/key beyond a container.
    OutOfBounds,
    /// A call was opened with `{{` but never closed.
    ExpectedTermination,
    /// A handle did not resolve, or a value could not be interpreted.
    InvalidValue,
    /// An argument's [`Kind`] does not match what the built-in expects.
    InvalidType,
}

impl Status {
    pub fn is_success(self) -> bool {
        self == Status::Success
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Status::Success => "success",
            Status::OutOfBounds => "out of bounds",
            Status::ExpectedTermination => "expected termination",
            Status::InvalidValue => "invalid value",
            Status::InvalidType => "invalid type",
        })
    }
}

/// A template runtime value.
#[derive(Debug, Clone, Default)]
pub struct Value {
    pub text: String,
    pub kind: Kind,
    pub status: Status,
    /// Set only by `comment`: the scanner drops the value instead of
    /// recording it as an argument.
    discard: bool,
}

impl Value {
    /// A `Normal` value with `Success` status.
    pub fn new(text: impl Into<String>) -> Self {
        Self::with_kind(text, Kind::Normal)
    }

    pub fn with_kind(text: impl Into<String>, kind: Kind) -> Self {
        Value {
            text: text.into(),
            kind,
            status: Status::Success,
            discard: false,
        }
    }

    /// A callable body, as produced by `func`.
    pub fn function(body: impl Into<String>) -> Self {
        Self::with_kind(body, Kind::Function)
    }

    /// An empty value carrying a failure status.
    pub fn error(status: Status) -> Self {
        Value {
            status,
            ..Value::default()
        }
    }

    /// The empty result of `comment`.
    pub fn discarded() -> Self {
        Value {
            discard: true,
            ..Value::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn is_discarded(&self) -> bool {
        self.discard
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

/// Status and the discard marker are not part of a value's identity.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.text == other.text && self.kind == other.kind
    }
}

impl Eq for Value {}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(s)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::new(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::new(if b { "1" } else { "0" })
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
