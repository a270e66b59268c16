//! `.tplexrc` variables file parser.
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | text variable |
//! | `/list <name> <item> …` | array variable |
//! | `/dict <name> <key> <value> …` | map variable |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | skipped |
//!
//! Tokens are whitespace separated; double quotes group a token and `\"`
//! escapes a quote inside them.

use std::path::Path;

use thiserror::Error;
use tracing::debug;

use crate::source::{self, LoadError};
use crate::var::{VarDef, VarStore};

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error on a recognised directive.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Parsed variables file.
#[derive(Debug, Default)]
pub struct Config {
    pub vars: VarStore,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a variables file.
    ///
    /// Returns the config and the errors of any malformed recognised lines;
    /// those lines are skipped and the rest still loads.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }
            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let tokens = split_args(args_str.trim());

            let parsed = match cmd {
                "set" => parse_set(&tokens),
                "list" => parse_list(&tokens),
                "dict" => parse_dict(&tokens),
                _ => {
                    debug!(line = lineno, cmd, "skipping unknown directive");
                    continue;
                }
            };
            match parsed {
                Ok((name, def)) => config.vars.define(name, def),
                Err(message) => errors.push(ConfigError { line: lineno, message }),
            }
        }

        (config, errors)
    }

    /// Read and parse a variables file from disk.
    pub fn load_file(path: &Path) -> Result<(Self, Vec<ConfigError>), LoadError> {
        let bytes = source::read(path)?;
        let (text, _) = source::decode(&bytes, None);
        Ok(Self::load_str(&text))
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.  `""` yields an empty token.
fn split_args(s: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut cur = String::new();
    let mut quoted = false;
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                quoted = true;
            }
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if quoted || !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
                quoted = false;
            }
            c => cur.push(c),
        }
    }
    if quoted || !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── Directives ────────────────────────────────────────────────────────────────

type Parsed = Result<(String, VarDef), String>;

fn require_name<'a>(tokens: &'a [String], cmd: &str) -> Result<&'a str, String> {
    match tokens.first() {
        Some(name) if !name.is_empty() => Ok(name.as_str()),
        Some(_) => Err(format!("/{cmd}: variable name cannot be empty")),
        None => Err(format!("/{cmd}: requires a variable name")),
    }
}

/// `/set <name>=<value>` or `/set <name> <value…>`.
fn parse_set(tokens: &[String]) -> Parsed {
    if tokens.is_empty() {
        return Err("/set: requires an argument".into());
    }

    let (name, value) = if let Some((name, value)) = tokens[0].split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{}'", tokens[0]));
    };

    if name.is_empty() {
        return Err("/set: variable name cannot be empty".into());
    }
    Ok((name, VarDef::Text(value)))
}

/// `/list <name> <item…>`.  No items defines an empty array.
fn parse_list(tokens: &[String]) -> Parsed {
    let name = require_name(tokens, "list")?;
    Ok((name.to_owned(), VarDef::List(tokens[1..].to_vec())))
}

/// `/dict <name> <key> <value> …`.  A trailing key without a value maps to
/// the empty string.
fn parse_dict(tokens: &[String]) -> Parsed {
    let name = require_name(tokens, "dict")?;
    let pairs = tokens[1..]
        .chunks(2)
        .map(|pair| (pair[0].clone(), pair.get(1).cloned().unwrap_or_default()))
        .collect();
    Ok((name.to_owned(), VarDef::Dict(pairs)))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
