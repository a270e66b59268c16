//! Command-line argument parsing.
//!
//! Usage:
//!   tplex [-f[<file>]] [-c<text>] [-D<name>=<value>]... [-r[<char>]] [-dq] [<file>|-]

use std::path::PathBuf;

use directories::ProjectDirs;
use thiserror::Error;

// ── Public types ──────────────────────────────────────────────────────────────

pub const USAGE: &str =
    "Usage: tplex [-f[<file>]] [-c<text>] [-D<name>=<value>]... [-r[<char>]] [-dq] [<file>|-]";

/// Replacement for invalid UTF-8 when `-r` is given without a character.
pub const DEFAULT_REPLACEMENT: char = '?';

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Variables-file specification.
    pub config: ConfigFile,
    /// Where the template comes from.
    pub input: Input,
    /// `-D<name>=<value>` definitions, in command-line order.
    pub defines: Vec<(String, String)>,
    /// Replacement for invalid UTF-8 (`-r[<char>]`).
    pub replacement: Option<char>,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Suppress warnings (`-q`).
    pub quiet: bool,
}

/// How to choose the variables file.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum ConfigFile {
    /// Search the user config dir, then `./.tplexrc` (default).
    #[default]
    Search,
    /// `-f` with no file argument: load no variables file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

/// Template source.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Input {
    /// No positional argument, or `-`.
    #[default]
    Stdin,
    File(PathBuf),
    /// `-c<text>`.
    Inline(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CliError {
    #[error("unknown option: -{0}")]
    UnknownOption(char),
    #[error("-{0} requires an argument")]
    MissingArgument(char),
    #[error("-D expects <name>=<value>, got '{0}'")]
    BadDefine(String),
    #[error("-r takes a single character, got '{0}'")]
    BadReplacement(String),
    #[error("a template file and -c cannot be combined")]
    ConflictingInput,
    #[error("too many arguments ({0})")]
    TooManyArguments(usize),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()`.
pub fn parse_args() -> Result<CliArgs, CliError> {
    let raw: Vec<String> = std::env::args().skip(1).collect();
    parse_argv(&raw)
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, CliError> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            positional.extend(argv[i + 1..].iter().cloned());
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            // Text attached to the current flag, if any.
            let attached = || -> Option<String> {
                (j + 1 < chars.len()).then(|| chars[j + 1..].iter().collect())
            };
            match chars[j] {
                'd' => args.debug = true,
                'q' => args.quiet = true,

                // -f[<file>]
                'f' => {
                    args.config = match attached() {
                        Some(file) => ConfigFile::Explicit(PathBuf::from(file)),
                        None => ConfigFile::Skip,
                    };
                    j = chars.len();
                }

                // -r[<char>]
                'r' => {
                    args.replacement = Some(match attached() {
                        None => DEFAULT_REPLACEMENT,
                        Some(s) => {
                            let mut it = s.chars();
                            match (it.next(), it.next()) {
                                (Some(c), None) => c,
                                _ => return Err(CliError::BadReplacement(s)),
                            }
                        }
                    });
                    j = chars.len();
                }

                // -c<text> or -D<name>=<value>, attached or separate
                flag @ ('c' | 'D') => {
                    let value = match attached() {
                        Some(s) => s,
                        None if i + 1 < argv.len() => {
                            i += 1;
                            argv[i].clone()
                        }
                        None => return Err(CliError::MissingArgument(flag)),
                    };
                    j = chars.len();
                    if flag == 'c' {
                        args.input = Input::Inline(value);
                    } else {
                        let (name, val) = value
                            .split_once('=')
                            .filter(|(name, _)| !name.is_empty())
                            .ok_or_else(|| CliError::BadDefine(value.clone()))?;
                        args.defines.push((name.to_owned(), val.to_owned()));
                    }
                }

                c => return Err(CliError::UnknownOption(c)),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 if matches!(args.input, Input::Inline(_)) => return Err(CliError::ConflictingInput),
        1 if positional[0] == "-" => args.input = Input::Stdin,
        1 => args.input = Input::File(PathBuf::from(positional.remove(0))),
        n => return Err(CliError::TooManyArguments(n)),
    }

    Ok(args)
}

// ── Path helpers ──────────────────────────────────────────────────────────────

/// Search for the user variables file: the platform config directory
/// (`~/.config/tplex/tplexrc` on Linux), then `./.tplexrc`.
/// Returns the first path that exists.
pub fn find_user_config() -> Option<PathBuf> {
    ProjectDirs::from("", "", "tplex")
        .map(|dirs| dirs.config_dir().join("tplexrc"))
        .into_iter()
        .chain([PathBuf::from(".tplexrc")])
        .find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|&s| s.to_owned()).collect()
    }

    fn parse(args: &[&str]) -> CliArgs {
        parse_argv(&argv(args)).unwrap()
    }

    #[test]
    fn empty_args() {
        let a = parse(&[]);
        assert_eq!(a.input, Input::Stdin);
        assert_eq!(a.config, ConfigFile::Search);
        assert!(a.defines.is_empty());
        assert_eq!(a.replacement, None);
    }

    #[test]
    fn file_positional() {
        assert_eq!(parse(&["page.tpl"]).input, Input::File(PathBuf::from("page.tpl")));
        assert_eq!(parse(&["-"]).input, Input::Stdin);
        assert_eq!(parse(&["--", "-odd.tpl"]).input, Input::File(PathBuf::from("-odd.tpl")));
    }

    #[test]
    fn bool_flags() {
        let a = parse(&["-d", "-q"]);
        assert!(a.debug && a.quiet);
        let a = parse(&["-qd"]);
        assert!(a.debug && a.quiet);
    }

    #[test]
    fn config_skip_and_explicit() {
        assert_eq!(parse(&["-f"]).config, ConfigFile::Skip);
        assert_eq!(
            parse(&["-fvars.rc"]).config,
            ConfigFile::Explicit(PathBuf::from("vars.rc"))
        );
        // -f never consumes the next argument.
        let a = parse(&["-f", "page.tpl"]);
        assert_eq!(a.config, ConfigFile::Skip);
        assert_eq!(a.input, Input::File(PathBuf::from("page.tpl")));
    }

    #[test]
    fn inline_text() {
        assert_eq!(parse(&["-c{{ raw x }}"]).input, Input::Inline("{{ raw x }}".into()));
        assert_eq!(parse(&["-c", "hi"]).input, Input::Inline("hi".into()));
        assert_eq!(parse_argv(&argv(&["-c"])).unwrap_err(), CliError::MissingArgument('c'));
    }

    #[test]
    fn inline_text_and_file_conflict() {
        assert_eq!(
            parse_argv(&argv(&["-cx", "page.tpl"])).unwrap_err(),
            CliError::ConflictingInput
        );
    }

    #[test]
    fn defines_in_order() {
        let a = parse(&["-Da=1", "-D", "b=two words", "-Dc="]);
        assert_eq!(
            a.defines,
            [
                ("a".to_owned(), "1".to_owned()),
                ("b".to_owned(), "two words".to_owned()),
                ("c".to_owned(), String::new()),
            ]
        );
    }

    #[test]
    fn bad_defines() {
        assert!(matches!(parse_argv(&argv(&["-Dnovalue"])), Err(CliError::BadDefine(_))));
        assert!(matches!(parse_argv(&argv(&["-D=x"])), Err(CliError::BadDefine(_))));
    }

    #[test]
    fn replacement_char() {
        assert_eq!(parse(&["-r"]).replacement, Some('?'));
        assert_eq!(parse(&["-r_"]).replacement, Some('_'));
        assert_eq!(parse(&["-r·"]).replacement, Some('·'));
        assert!(matches!(parse_argv(&argv(&["-rab"])), Err(CliError::BadReplacement(_))));
    }

    #[test]
    fn too_many_positional() {
        assert_eq!(
            parse_argv(&argv(&["a", "b", "c"])).unwrap_err(),
            CliError::TooManyArguments(3)
        );
    }

    #[test]
    fn unknown_flag() {
        assert_eq!(parse_argv(&argv(&["-z"])).unwrap_err(), CliError::UnknownOption('z'));
        assert_eq!(parse_argv(&argv(&["-z"])).unwrap_err().to_string(), "unknown option: -z");
    }
}
