use std::io::{Read, Write};
use std::path::Path;

use tracing::{info, warn};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use tplex::cli::{self, CliArgs, ConfigFile, Input};
use tplex::config::Config;
use tplex::engine::Generator;
use tplex::var::VarStore;

/// Exit status for usage and I/O errors.
const EXIT_USAGE: i32 = 1;
/// Exit status when expansion fails.
const EXIT_EVAL: i32 = 2;

fn main() {
    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("tplex: {e}");
            eprintln!("{}", cli::USAGE);
            std::process::exit(EXIT_USAGE);
        }
    };

    init_logging(&args);

    // ── Variables: config file, then -D overrides ─────────────────────────────
    let mut vars = match args.config {
        ConfigFile::Skip => VarStore::new(),
        ConfigFile::Explicit(ref path) => match load_config(path) {
            Some(vars) => vars,
            None => std::process::exit(EXIT_USAGE),
        },
        ConfigFile::Search => cli::find_user_config()
            .and_then(|path| load_config(&path))
            .unwrap_or_default(),
    };
    for (name, value) in &args.defines {
        vars.set(name.as_str(), value.as_str());
    }

    let mut generator = Generator::new();
    vars.install(&mut generator);

    // ── Template source ───────────────────────────────────────────────────────
    match &args.input {
        Input::Inline(text) => generator.load_str(text),
        Input::File(path) => {
            if let Err(e) = generator.load_file(path, args.replacement) {
                eprintln!("tplex: {e}");
                std::process::exit(EXIT_USAGE);
            }
        }
        Input::Stdin => {
            let mut bytes = Vec::new();
            if let Err(e) = std::io::stdin().read_to_end(&mut bytes) {
                eprintln!("tplex: cannot read standard input: {e}");
                std::process::exit(EXIT_USAGE);
            }
            generator.load_bytes(&bytes, args.replacement);
        }
    }

    // ── Expand ────────────────────────────────────────────────────────────────
    match generator.render() {
        Ok(output) => {
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(output.as_bytes()).and_then(|()| stdout.flush()) {
                eprintln!("tplex: {e}");
                std::process::exit(EXIT_USAGE);
            }
        }
        Err(e) => {
            eprintln!("tplex: {e}");
            std::process::exit(EXIT_EVAL);
        }
    }
}

/// Install the stderr subscriber.  `-d` and `-q` override `TPLEX_LOG`.
fn init_logging(args: &CliArgs) {
    let filter = if args.debug {
        EnvFilter::new("debug")
    } else if args.quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_env("TPLEX_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Load a variables file.  Malformed lines are reported and skipped; an
/// unreadable file is reported and yields `None`.
fn load_config(path: &Path) -> Option<VarStore> {
    match Config::load_file(path) {
        Ok((config, errors)) => {
            info!(path = %path.display(), vars = config.vars.len(), "loaded variables file");
            for e in errors {
                warn!("{}: {e}", path.display());
            }
            Some(config.vars)
        }
        Err(e) => {
            eprintln!("tplex: {e}");
            None
        }
    }
}
