//! The generator: one document plus everything needed to expand it.
//!
//! A [`Generator`] owns the document buffer, a [`FunctionTable`] pre-seeded
//! with the standard library, and a handle to the [`CompositeStore`] that
//! backs its array and map values.
//!
//! Control-flow built-ins (`if`, `switch`, `cond`, `for`) never re-enter the
//! generator that called them.  They build a [`Generator::child`] instead:
//! the child gets a copy of the parent's function table and an empty
//! document of its own, and shares the parent's composite store so that
//! handles created on either side stay resolvable.
//!
//! A generator is single-threaded and not reentrant.  Expanding a document
//! with deeply self-referential bodies can recurse without bound; no depth
//! or time limit is imposed.

use std::cell::{Ref, RefCell, RefMut};
use std::path::Path;
use std::rc::Rc;

use tracing::warn;

use super::builtins;
use super::expand::{expand, ParseError, ParseResult};
use super::function::{Callback, Function, FunctionId, FunctionTable};
use super::store::{CompositeStore, Map};
use super::value::{Kind, Value};
use crate::source::{self, LoadError, LoadStatus};

/// Names of the built-ins whose bodies are captured verbatim.
const SPECIAL_NAMES: [&str; 3] = ["func", "raw", "comment"];

pub struct Generator {
    document: String,
    functions: FunctionTable,
    store: Rc<RefCell<CompositeStore>>,
    /// Entries of `functions` whose calls are not tokenized.  Tracked by
    /// handle, so renaming one of them moves the special behaviour with it.
    special: Vec<FunctionId>,
}

impl Default for Generator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator {
    /// An empty generator with the standard library installed.
    pub fn new() -> Self {
        let functions = builtins::standard_library();
        let special = SPECIAL_NAMES
            .iter()
            .filter_map(|name| functions.find(name))
            .collect();
        Generator {
            document: String::new(),
            functions,
            store: Rc::new(RefCell::new(CompositeStore::new())),
            special,
        }
    }

    pub fn from_source(src: &str) -> Self {
        let mut generator = Self::new();
        generator.load_str(src);
        generator
    }

    /// A sub-generator: copied function table, shared composite store,
    /// empty document.
    pub fn child(&self) -> Self {
        Generator {
            document: String::new(),
            functions: self.functions.clone(),
            store: Rc::clone(&self.store),
            special: self.special.clone(),
        }
    }

    // ── Loading ───────────────────────────────────────────────────────────────

    pub fn load_str(&mut self, src: &str) {
        self.document = src.to_owned();
    }

    /// Install `bytes` as the document.
    ///
    /// Invalid UTF-8 is advisory: the content is still installed, with each
    /// invalid sequence replaced by `replacement` (U+FFFD when `None`), and
    /// [`LoadStatus::InvalidUtf8`] is returned.
    pub fn load_bytes(&mut self, bytes: &[u8], replacement: Option<char>) -> LoadStatus {
        let (text, status) = source::decode(bytes, replacement);
        if status == LoadStatus::InvalidUtf8 {
            warn!("document is not valid UTF-8; invalid sequences replaced");
        }
        self.document = text;
        status
    }

    pub fn load_file(
        &mut self,
        path: impl AsRef<Path>,
        replacement: Option<char>,
    ) -> Result<LoadStatus, LoadError> {
        let bytes = source::read(path.as_ref())?;
        Ok(self.load_bytes(&bytes, replacement))
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    // ── Expansion ─────────────────────────────────────────────────────────────

    /// Expand every call in the document.
    ///
    /// The document is replaced by the expansion.  On failure it holds the
    /// partial output and must not be treated as a finished result.
    pub fn parse(&mut self) -> ParseResult {
        let source = std::mem::take(&mut self.document);
        let result = expand(&source, self);
        self.document = result.output.clone();
        result
    }

    /// Load `src` and expand it.
    pub fn run(&mut self, src: &str) -> ParseResult {
        self.load_str(src);
        self.parse()
    }

    /// Expand the document, returning only the finished text.
    pub fn render(&mut self) -> Result<String, ParseError> {
        self.parse().into_result()
    }

    // ── Function registry ─────────────────────────────────────────────────────

    pub fn functions(&self) -> &FunctionTable {
        &self.functions
    }

    pub fn functions_mut(&mut self) -> &mut FunctionTable {
        &mut self.functions
    }

    /// Append a variable.  Earlier entries with the same name shadow it.
    pub fn push_variable(&mut self, name: impl Into<String>, value: Value) -> FunctionId {
        self.functions.append(Function::variable(name, value))
    }

    pub fn push_function(&mut self, function: Function) -> FunctionId {
        self.functions.append(function)
    }

    /// Rebind the first function named `name` to return `value`.
    pub fn set_variable(&mut self, name: &str, value: Value) -> bool {
        self.functions.set_constant(name, value)
    }

    /// Replace the callback of the first function named `name`.
    pub fn set_function(&mut self, name: &str, callback: Callback) -> bool {
        self.functions.set_callback(name, callback)
    }

    /// Rename (empty name keeps) and rebind the entry behind `id`.
    pub fn modify(&mut self, id: FunctionId, function: Function) {
        self.functions.modify(id, function);
    }

    pub fn function_name(&self, id: FunctionId) -> Option<&str> {
        self.functions.name(id)
    }

    /// The special function currently named `name`, if any.
    pub fn special_function(&self, name: &str) -> Option<FunctionId> {
        self.special
            .iter()
            .copied()
            .find(|&id| self.functions.name(id) == Some(name))
    }

    // ── Composite values ──────────────────────────────────────────────────────

    /// Shared read access to the composite store.
    ///
    /// Do not hold the guard across a nested expansion: built-ins that
    /// allocate need mutable access.
    pub fn store(&self) -> Ref<'_, CompositeStore> {
        self.store.borrow()
    }

    pub fn store_mut(&self) -> RefMut<'_, CompositeStore> {
        self.store.borrow_mut()
    }

    /// Allocate an array holding `items` and return its handle value.
    pub fn make_array<I, S>(&self, items: I) -> Value
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut store = self.store.borrow_mut();
        let (handle, array) = store.allocate_array();
        array.extend(items.into_iter().map(Into::into));
        Value::with_kind(handle.encode(), Kind::Array)
    }

    /// Allocate a map holding `pairs` and return its handle value.  For a
    /// repeated key the first value is kept.
    pub fn make_map<I, K, V>(&self, pairs: I) -> Value
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut store = self.store.borrow_mut();
        let (handle, map) = store.allocate_map();
        for (k, v) in pairs {
            map.entry(k.into()).or_insert_with(|| v.into());
        }
        Value::with_kind(handle.encode(), Kind::Map)
    }

    /// A copy of the array behind `value`.
    pub fn array(&self, value: &Value) -> Option<Vec<String>> {
        self.store.borrow().resolve_array(value).cloned()
    }

    /// A copy of the map behind `value`.
    pub fn map(&self, value: &Value) -> Option<Map> {
        self.store.borrow().resolve_map(value).cloned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::value::Status;

    #[test]
    fn builtins_are_preinstalled() {
        let gen = Generator::new();
        for name in [
            "func", "raw", "comment", "if", "switch", "at", "cond", "for", "==", "!=", "!",
            "&&", "||", "list", "dict",
        ] {
            assert!(gen.functions().find(name).is_some(), "missing {name}");
        }
        assert_eq!(gen.functions().find("func").map(FunctionId::index), Some(0));
    }

    #[test]
    fn push_variable_and_parse() {
        let mut gen = Generator::from_source("{{ greeting }}, {{ name }}");
        gen.push_variable("greeting", Value::new("Hi"));
        gen.push_variable("name", Value::new("Ada"));
        assert_eq!(gen.render().unwrap(), "Hi, Ada");
        assert_eq!(gen.document(), "Hi, Ada");
    }

    #[test]
    fn set_variable_rebinds_existing() {
        let mut gen = Generator::new();
        gen.push_variable("v", Value::new("old"));
        assert!(gen.set_variable("v", Value::new("new")));
        assert!(!gen.set_variable("absent", Value::new("x")));
        assert_eq!(gen.run("{{ v }}").output, "new");
    }

    #[test]
    fn set_function_overrides_builtin() {
        let mut gen = Generator::new();
        assert!(gen.set_function("raw", Callback::native(|_, _| Value::new("patched"))));
        // Still special: the body is not evaluated before the callback runs.
        assert_eq!(gen.run("{{ raw {{ unclosed? }} }}").output, "patched");
    }

    #[test]
    fn native_function_sees_generator() {
        let mut gen = Generator::new();
        gen.push_function(Function::native("count", |args, gen| {
            let items = gen.array(&args[1]).unwrap_or_default();
            Value::new(items.len().to_string())
        }));
        assert_eq!(gen.run("{{ count {{ list a b c }} }}").output, "3");
    }

    #[test]
    fn function_handles_stay_valid() {
        let mut gen = Generator::new();
        let id = gen.push_variable("first", Value::new("1"));
        for i in 0..50 {
            gen.push_variable(format!("v{i}"), Value::default());
        }
        gen.modify(id, Function::variable("", Value::new("2")));
        assert_eq!(gen.function_name(id), Some("first"));
        assert_eq!(gen.run("{{ first }}").output, "2");

        gen.modify(id, Function::variable("renamed", Value::new("3")));
        assert_eq!(gen.run("{{ renamed }}|{{ first }}").output, "3|");
    }

    #[test]
    fn renamed_special_keeps_verbatim_capture() {
        let mut gen = Generator::new();
        let id = gen.functions().find("raw").unwrap();
        gen.functions_mut().rename(id, "verbatim");
        assert_eq!(gen.special_function("verbatim"), Some(id));
        assert_eq!(gen.special_function("raw"), None);
        assert_eq!(gen.run("{{ verbatim {{ x }} }}").output, "{{ x }}");
    }

    #[test]
    fn make_array_and_map() {
        let mut gen = Generator::new();
        let arr = gen.make_array(["x", "y"]);
        let map = gen.make_map([("k", "v"), ("k", "ignored"), ("j", "w")]);
        assert_eq!(gen.array(&arr).unwrap(), ["x", "y"]);
        let m = gen.map(&map).unwrap();
        assert_eq!(m.get("k").map(String::as_str), Some("v"));
        assert_eq!(m.keys().collect::<Vec<_>>(), ["k", "j"]);

        gen.push_variable("arr", arr);
        gen.push_variable("map", map);
        assert_eq!(gen.run("{{ at {{ arr }} 1 }}{{ at {{ map }} j }}").output, "yw");
    }

    #[test]
    fn child_shares_store_and_copies_functions() {
        let mut parent = Generator::new();
        let arr = parent.make_array(["p"]);
        let mut child = parent.child();
        assert_eq!(child.array(&arr).unwrap(), ["p"]);

        child.push_variable("only_in_child", Value::new("c"));
        let made_in_child = child.make_array(["q"]);
        assert!(parent.functions().find("only_in_child").is_none());
        assert_eq!(parent.array(&made_in_child).unwrap(), ["q"]);
        assert_eq!(parent.run("{{ only_in_child }}").output, "");
    }

    #[test]
    fn foreign_handle_is_invalid() {
        let other = Generator::new();
        let foreign = other.make_array(["z"]);
        let mut gen = Generator::new();
        gen.push_variable("foreign", foreign);
        assert_eq!(gen.run("{{ at {{ foreign }} 0 }}").status, Status::InvalidValue);
    }

    #[test]
    fn load_bytes_reports_invalid_utf8() {
        let mut gen = Generator::new();
        assert_eq!(gen.load_bytes(b"ok", None), LoadStatus::Success);
        assert_eq!(gen.load_bytes(b"a\xffb", Some('?')), LoadStatus::InvalidUtf8);
        assert_eq!(gen.document(), "a?b");
        // Advisory only: parsing still works.
        assert_eq!(gen.render().unwrap(), "a?b");
    }
}
