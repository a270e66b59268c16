//! Built-in template functions.
//!
//! Every built-in receives the full argument list (`args[0]` is the call
//! name) and the calling [`Generator`], and returns a [`Value`].  Failures
//! are reported through [`Value::error`]; nothing here panics.
//!
//! | Name      | Arguments                               | Result                       |
//! |-----------|-----------------------------------------|------------------------------|
//! | `func`    | *body* (verbatim)                       | body as a `Function` value   |
//! | `raw`     | *text* (verbatim)                       | text, unevaluated            |
//! | `comment` | anything (verbatim)                     | nothing at all               |
//! | `if`      | cond then-fn else-fn                    | chosen branch, expanded      |
//! | `switch`  | subject (value fn)… [default-fn]        | first matching branch        |
//! | `cond`    | (pred fn)… [default-fn]                 | first truthy branch          |
//! | `for`     | var array body / key val map body       | bodies concatenated          |
//! | `at`      | container index-or-key                  | element                      |
//! | `==` `!=` | pivot operand…                          | `1` / `0`                    |
//! | `!`       | operand                                 | `1` / `0`                    |
//! | `&&` `||` | operand operand…                        | `1` / `0`                    |
//! | `list`    | item…                                   | array handle                 |
//! | `dict`    | key value…                              | map handle                   |

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::function::{BuiltinFn, Callback, Function, FunctionTable};
use super::generator::Generator;
use super::store::NULL_HANDLE;
use super::value::{Kind, Status, Value};

/// Leading integer after optional whitespace: sign, digits.
static LEADING_INT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([+-]?)([0-9]+)").unwrap());

/// The standard library, in lookup order.
pub fn standard_library() -> FunctionTable {
    let mut table = FunctionTable::new();
    for (name, f) in [
        ("func", builtin_func as BuiltinFn),
        ("raw", builtin_raw),
        ("comment", builtin_comment),
        ("if", builtin_if),
        ("switch", builtin_switch),
        ("at", builtin_at),
        ("cond", builtin_cond),
        ("for", builtin_for),
        ("==", builtin_eq),
        ("!=", builtin_ne),
        ("!", builtin_not),
        ("&&", builtin_and),
        ("||", builtin_or),
        ("list", builtin_list),
        ("dict", builtin_dict),
    ] {
        table.append(Function::builtin(name, f));
    }
    table
}

// ── Coercions ─────────────────────────────────────────────────────────────────

/// Boolean coercion.
///
/// True when the text (after leading whitespace) starts with `true`, or
/// starts with an integer that is not zero.  Anything else is false.
pub fn truthy(text: &str) -> bool {
    if text.trim_start().starts_with("true") {
        return true;
    }
    LEADING_INT
        .captures(text)
        .is_some_and(|c| c[2].bytes().any(|b| b != b'0'))
}

/// Permissive index parse: no leading digits reads as 0; a negative or
/// overflowing index lands out of range.
fn parse_index(text: &str) -> usize {
    let Some(c) = LEADING_INT.captures(text) else {
        return 0;
    };
    let digits = &c[2];
    if &c[1] == "-" && digits.bytes().any(|b| b != b'0') {
        return usize::MAX;
    }
    digits.parse().unwrap_or(usize::MAX)
}

// ── Quoting ───────────────────────────────────────────────────────────────────

fn builtin_func(args: &[Value], _: &mut Generator) -> Value {
    Value::function(args.get(1).map(|a| a.text.as_str()).unwrap_or(""))
}

fn builtin_raw(args: &[Value], _: &mut Generator) -> Value {
    args.get(1).map(|a| Value::new(a.text.clone())).unwrap_or_default()
}

fn builtin_comment(_: &[Value], _: &mut Generator) -> Value {
    Value::discarded()
}

// ── Control flow ──────────────────────────────────────────────────────────────

/// Expand a captured body in a child generator.
fn run_body(generator: &Generator, body: &str) -> Value {
    let mut child = generator.child();
    let result = child.run(body);
    if result.is_success() {
        Value::new(result.output)
    } else {
        Value::error(result.status)
    }
}

fn builtin_if(args: &[Value], generator: &mut Generator) -> Value {
    let [_, cond, then_fn, else_fn] = args else {
        return Value::error(Status::OutOfBounds);
    };
    if then_fn.kind != Kind::Function || else_fn.kind != Kind::Function {
        debug!(then = then_fn.kind.name(), other = else_fn.kind.name(), "if branches must be functions");
        return Value::error(Status::InvalidType);
    }
    let taken = truthy(&cond.text);
    debug!(taken, "if");
    run_body(generator, if taken { &then_fn.text } else { &else_fn.text })
}

/// Shared pairwise scan of `switch` and `cond`.
///
/// From `first` on, arguments are `(value, fn)` pairs tested with
/// `matches`; a lone trailing function is the default branch.  A lone
/// trailing plain value after a function yields empty text.  Falling off
/// the end without a match is `OutOfBounds`.
fn select_branch(
    args: &[Value],
    first: usize,
    generator: &Generator,
    matches: impl Fn(&Value) -> bool,
) -> Value {
    if args.len() < 2 {
        return Value::error(Status::OutOfBounds);
    }
    let mut i = first;
    while i < args.len() {
        let arg = &args[i];
        let last = i + 1 == args.len();
        if !last && arg.kind == Kind::Normal && args[i + 1].kind == Kind::Function {
            if matches(arg) {
                return run_body(generator, &args[i + 1].text);
            }
            i += 2;
        } else if last && arg.kind == Kind::Normal && args[i - 1].kind == Kind::Function {
            return Value::default();
        } else if last && arg.kind == Kind::Function {
            return run_body(generator, &arg.text);
        } else {
            return Value::error(Status::InvalidType);
        }
    }
    Value::error(Status::OutOfBounds)
}

fn builtin_switch(args: &[Value], generator: &mut Generator) -> Value {
    let subject = args.get(1).cloned().unwrap_or_default();
    select_branch(args, 2, generator, |v| *v == subject)
}

fn builtin_cond(args: &[Value], generator: &mut Generator) -> Value {
    select_branch(args, 1, generator, |v| truthy(&v.text))
}

fn builtin_for(args: &[Value], generator: &mut Generator) -> Value {
    match args {
        [_, var, collection, body] => {
            if body.kind != Kind::Function {
                debug!(kind = body.kind.name(), "for body must be a function");
                return Value::error(Status::InvalidType);
            }
            let Some(items) = generator.array(collection) else {
                return Value::error(Status::InvalidValue);
            };
            debug!(var = %var.text, len = items.len(), "for over array");

            let mut child = generator.child();
            let slot = child.push_variable(var.text.clone(), Value::default());
            let mut out = String::new();
            for item in items {
                child
                    .functions_mut()
                    .replace_callback(slot, Callback::Constant(Value::new(item)));
                let result = child.run(&body.text);
                if !result.is_success() {
                    return Value::error(result.status);
                }
                out.push_str(&result.output);
            }
            Value::new(out)
        }
        [_, key_var, val_var, collection, body] => {
            if body.kind != Kind::Function {
                debug!(kind = body.kind.name(), "for body must be a function");
                return Value::error(Status::InvalidType);
            }
            let Some(map) = generator.map(collection) else {
                return Value::error(Status::InvalidValue);
            };
            debug!(key = %key_var.text, value = %val_var.text, len = map.len(), "for over map");

            let mut child = generator.child();
            let key_slot = child.push_variable(key_var.text.clone(), Value::default());
            let val_slot = child.push_variable(val_var.text.clone(), Value::default());
            let mut out = String::new();
            for (k, v) in map {
                let table = child.functions_mut();
                table.replace_callback(key_slot, Callback::Constant(Value::new(k)));
                table.replace_callback(val_slot, Callback::Constant(Value::new(v)));
                let result = child.run(&body.text);
                if !result.is_success() {
                    return Value::error(result.status);
                }
                out.push_str(&result.output);
            }
            Value::new(out)
        }
        _ => Value::error(Status::OutOfBounds),
    }
}

// ── Indexing ──────────────────────────────────────────────────────────────────

fn builtin_at(args: &[Value], generator: &mut Generator) -> Value {
    let [_, container, key] = args else {
        return Value::error(Status::OutOfBounds);
    };
    match container.kind {
        Kind::Map => {
            let store = generator.store();
            let Some(map) = store.resolve_map(container) else {
                return Value::error(Status::InvalidValue);
            };
            let found = map.get(&key.text).cloned();
            found.map_or(Value::error(Status::OutOfBounds), Value::new)
        }
        Kind::Array => {
            let store = generator.store();
            let Some(array) = store.resolve_array(container) else {
                return Value::error(Status::InvalidValue);
            };
            let found = array.get(parse_index(&key.text)).cloned();
            found.map_or(Value::error(Status::InvalidValue), Value::new)
        }
        Kind::Normal | Kind::Function => container
            .text
            .chars()
            .nth(parse_index(&key.text))
            .map(|c| Value::new(c.to_string()))
            .unwrap_or_default(),
    }
}

// ── Boolean algebra ───────────────────────────────────────────────────────────

fn builtin_eq(args: &[Value], _: &mut Generator) -> Value {
    let Some(pivot) = args.get(1) else {
        return Value::from(true);
    };
    Value::from(args[2..].iter().all(|a| a == pivot))
}

fn builtin_ne(args: &[Value], _: &mut Generator) -> Value {
    let Some(pivot) = args.get(1) else {
        return Value::from(true);
    };
    Value::from(!args[2..].iter().any(|a| a == pivot))
}

fn builtin_not(args: &[Value], _: &mut Generator) -> Value {
    match args.get(1) {
        Some(a) => Value::from(!truthy(&a.text)),
        None => Value::error(Status::OutOfBounds),
    }
}

fn builtin_and(args: &[Value], _: &mut Generator) -> Value {
    if args.len() < 3 {
        return Value::error(Status::OutOfBounds);
    }
    Value::from(args[1..].iter().all(|a| truthy(&a.text)))
}

fn builtin_or(args: &[Value], _: &mut Generator) -> Value {
    if args.len() < 3 {
        return Value::error(Status::OutOfBounds);
    }
    Value::from(args[1..].iter().any(|a| truthy(&a.text)))
}

// ── Construction ──────────────────────────────────────────────────────────────

fn builtin_list(args: &[Value], generator: &mut Generator) -> Value {
    if args.len() < 2 {
        return Value::with_kind(NULL_HANDLE, Kind::Array);
    }
    generator.make_array(args[1..].iter().map(|a| a.text.clone()))
}

fn builtin_dict(args: &[Value], generator: &mut Generator) -> Value {
    if args.len() < 2 {
        return Value::with_kind(NULL_HANDLE, Kind::Map);
    }
    let pairs = args[1..].chunks(2).map(|pair| {
        let value = pair.get(1).map(|v| v.text.clone()).unwrap_or_default();
        (pair[0].text.clone(), value)
    });
    generator.make_map(pairs)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
