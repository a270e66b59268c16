//! Call-expression scanner and evaluator.
//!
//! | Sequence              | Meaning                                            |
//! |-----------------------|----------------------------------------------------|
//! | `{{ name a b … }}`    | Call `name` with whitespace-delimited arguments    |
//! | `{{ f {{ g x }} }}`   | Nested call: `g x` is evaluated first, its value   |
//! |                       | becomes one argument of `f`                         |
//! | `{{ raw … }}`         | Special call: the body is captured verbatim        |
//!
//! Whitespace is space, tab, vertical tab and newline.  Everything outside a
//! call is copied through unchanged.
//!
//! Evaluation is innermost-first and strictly left to right at each level.
//! Each top-level call is replaced in the output by its result text; the
//! result is never scanned again.  Rather than splicing into the source in
//! place, the driver builds a fresh output buffer from literal spans and
//! call results.

use thiserror::Error;
use tracing::{debug, trace};

use super::function::FunctionId;
use super::generator::Generator;
use super::value::{Status, Value};

const OPEN: &[u8] = b"{{";
const CLOSE: &[u8] = b"}}";

fn is_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\x0b' | b'\n')
}

// ── Results ───────────────────────────────────────────────────────────────────

/// Outcome of [`Generator::parse`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseResult {
    pub status: Status,
    /// The expanded document.  Only complete when `status` is `Success`;
    /// after a failure it holds the text produced so far followed by the
    /// unprocessed remainder.
    pub output: String,
    /// Name of the call whose evaluation produced a failure status, when
    /// one could be determined.
    pub failed_call: Option<String>,
}

impl ParseResult {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Convert into a `Result`, discarding the partial output on failure.
    pub fn into_result(self) -> Result<String, ParseError> {
        if self.status.is_success() {
            Ok(self.output)
        } else {
            Err(ParseError {
                status: self.status,
                call: self.failed_call,
            })
        }
    }
}

/// A failed expansion: the terminal status and the call that raised it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}{}", .call.as_ref().map(|c| format!(" in call `{c}`")).unwrap_or_default())]
pub struct ParseError {
    pub status: Status,
    pub call: Option<String>,
}

/// Internal failure carried up the recursive descent.
#[derive(Debug)]
struct Failure {
    status: Status,
    call: Option<String>,
}

impl Failure {
    fn new(status: Status, call: Option<&Value>) -> Self {
        Failure {
            status,
            call: call.map(|v| v.text.clone()),
        }
    }
}

// ── Driver ────────────────────────────────────────────────────────────────────

/// Expand every call in `src` against `generator`'s function table.
///
/// Stops at the first call that fails.
pub fn expand(src: &str, generator: &mut Generator) -> ParseResult {
    let mut out = String::with_capacity(src.len());
    let mut scanner = Scanner { src, pos: 0 };

    while let Some(rel) = src[scanner.pos..].find("{{") {
        let open = scanner.pos + rel;
        out.push_str(&src[scanner.pos..open]);
        scanner.pos = open + OPEN.len();

        match scanner.eval_call(generator) {
            Ok(value) => {
                trace!(at = open, len = value.text.len(), "spliced call result");
                out.push_str(&value.text);
            }
            Err(failure) => {
                debug!(status = %failure.status, call = ?failure.call, "expansion aborted");
                out.push_str(&src[open..]);
                return ParseResult {
                    status: failure.status,
                    output: out,
                    failed_call: failure.call,
                };
            }
        }
    }

    out.push_str(&src[scanner.pos..]);
    ParseResult {
        status: Status::Success,
        output: out,
        failed_call: None,
    }
}

// ── Scanner ───────────────────────────────────────────────────────────────────

struct Scanner<'a> {
    src: &'a str,
    /// Byte offset.  Only ever split at ASCII delimiters, so every slice
    /// taken between two stops lies on a char boundary.
    pos: usize,
}

impl Scanner<'_> {
    fn at(&self, marker: &[u8]) -> bool {
        self.src.as_bytes()[self.pos..].starts_with(marker)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.src.len()
    }

    /// Evaluate one call.  `pos` is just past its opening `{{`; on success it
    /// is left just past the matching `}}`.
    fn eval_call(&mut self, generator: &mut Generator) -> Result<Value, Failure> {
        let mut args: Vec<Value> = Vec::new();
        let mut token_start: Option<usize> = None;

        loop {
            if self.at_end() {
                return Err(Failure::new(Status::ExpectedTermination, args.first()));
            }

            if self.at(CLOSE) {
                if let Some(start) = token_start.take() {
                    args.push(Value::new(&self.src[start..self.pos]));
                }
                self.pos += CLOSE.len();
                return dispatch(args, generator);
            }

            if self.at(OPEN) {
                if let Some(start) = token_start.take() {
                    args.push(Value::new(&self.src[start..self.pos]));
                    if let Some(id) = special_call(&args, generator) {
                        return self.eval_special(id, args, generator);
                    }
                }
                self.pos += OPEN.len();
                let value = self.eval_call(generator)?;
                if !value.is_discarded() {
                    args.push(value);
                }
                continue;
            }

            let b = self.src.as_bytes()[self.pos];
            if is_space(b) {
                self.pos += 1;
                if let Some(start) = token_start.take() {
                    args.push(Value::new(&self.src[start..self.pos - 1]));
                    if let Some(id) = special_call(&args, generator) {
                        return self.eval_special(id, args, generator);
                    }
                }
                continue;
            }

            if token_start.is_none() {
                token_start = Some(self.pos);
            }
            self.pos += 1;
        }
    }

    /// Capture the rest of a special call verbatim and invoke it.
    ///
    /// Inner `{{ … }}` pairs are balanced but not evaluated.  One trailing
    /// whitespace character before the closing marker is dropped, mirroring
    /// the single delimiter skipped after the call name.
    fn eval_special(
        &mut self,
        id: FunctionId,
        mut args: Vec<Value>,
        generator: &mut Generator,
    ) -> Result<Value, Failure> {
        let body_start = self.pos;
        let mut depth = 0usize;

        loop {
            if self.at_end() {
                return Err(Failure::new(Status::ExpectedTermination, args.first()));
            }
            if self.at(OPEN) {
                depth += 1;
                self.pos += OPEN.len();
            } else if self.at(CLOSE) {
                if depth == 0 {
                    break;
                }
                depth -= 1;
                self.pos += CLOSE.len();
            } else {
                self.pos += 1;
            }
        }

        let mut body_end = self.pos;
        if body_end > body_start && is_space(self.src.as_bytes()[body_end - 1]) {
            body_end -= 1;
        }
        self.pos += CLOSE.len();

        trace!(name = %args[0].text, len = body_end - body_start, "captured verbatim body");
        args.push(Value::new(&self.src[body_start..body_end]));
        invoke(id, args, generator)
    }
}

/// If `args` holds exactly a call name that is special, its function id.
fn special_call(args: &[Value], generator: &Generator) -> Option<FunctionId> {
    match args {
        [name] => generator.special_function(&name.text),
        _ => None,
    }
}

/// Look up `args[0]` and invoke it.  Empty calls and unknown names yield
/// empty text rather than an error.
fn dispatch(args: Vec<Value>, generator: &mut Generator) -> Result<Value, Failure> {
    let Some(name) = args.first() else {
        return Ok(Value::default());
    };
    match generator.functions().find(&name.text) {
        Some(id) => invoke(id, args, generator),
        None => {
            debug!(name = %name.text, "no such function; call yields empty text");
            Ok(Value::default())
        }
    }
}

fn invoke(id: FunctionId, args: Vec<Value>, generator: &mut Generator) -> Result<Value, Failure> {
    let Some(callback) = generator.functions().get(id).map(|f| f.callback.clone()) else {
        return Ok(Value::default());
    };
    debug!(name = %args[0].text, argc = args.len() - 1, "dispatching call");
    let result = callback.invoke(&args, generator);
    if result.is_success() {
        Ok(result)
    } else {
        Err(Failure::new(result.status, args.first()))
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
