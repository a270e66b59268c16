//! The `{{ call }}` template engine.
//!
//! A document is plain text with embedded calls.  Each call names a function
//! and passes whitespace-separated arguments; nested calls are evaluated
//! first and their results become arguments of the enclosing call.  The
//! engine has a single data type (text) with a [`Kind`] hint for arrays,
//! maps and deferred function bodies.
//!
//! # Quick start
//!
//! ```rust
//! use tplex::engine::Generator;
//!
//! let mut gen = Generator::from_source("{{ for x {{ list a b }} {{ func <{{ x }}> }} }}");
//! assert_eq!(gen.render().unwrap(), "<a><b>");
//! ```

pub mod builtins;
pub mod expand;
pub mod function;
pub mod generator;
pub mod store;
pub mod value;

// Re-exports for convenience.
pub use expand::{ParseError, ParseResult};
pub use function::{Callback, Function, FunctionId, FunctionTable};
pub use generator::Generator;
pub use store::{CompositeStore, Handle, Map};
pub use value::{Kind, Status, Value};
