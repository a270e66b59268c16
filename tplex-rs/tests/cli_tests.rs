/// End-to-end tests: run templates through the `tplex` binary and check
/// stdout, stderr and the exit status.
///
/// Every run passes `-f` (or an explicit `-f<file>`) so a variables file in
/// the user's config directory cannot leak into the results.

use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_tplex"))
}

/// Run the binary with `args`, feeding `stdin` to it.
fn run(args: &[&str], stdin: &[u8]) -> Output {
    let mut child = Command::new(binary())
        .args(args)
        .env_remove("TPLEX_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn tplex binary");
    child
        .stdin
        .take()
        .expect("stdin not open")
        .write_all(stdin)
        .expect("write to stdin");
    child.wait_with_output().expect("wait failed")
}

/// Expand `template` from stdin and assert a clean success with `expected`.
fn check(args: &[&str], template: &str, expected: &str) {
    let out = run(args, template.as_bytes());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert_eq!(out.status.code(), Some(0), "template {template:?}\nstderr:\n{stderr}");
    assert_eq!(String::from_utf8_lossy(&out.stdout), expected, "template {template:?}");
}

// ── Success paths ─────────────────────────────────────────────────────────────

#[test]
fn stdin_template() {
    check(&["-f"], "a {{ raw b }} c", "a b c");
}

#[test]
fn stdin_dash() {
    check(&["-f", "-"], "{{ == x x }}", "1");
}

#[test]
fn no_trailing_newline_added() {
    check(&["-f"], "line\n", "line\n");
}

#[test]
fn inline_text() {
    let out = run(&["-f", "-c{{ for x {{list a b}} {{func ({{x}})}} }}"], b"");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "(a)(b)");
}

#[test]
fn defines_become_variables() {
    check(&["-f", "-Dwho=world", "-D", "n=2"], "hello {{ who }} x{{ n }}", "hello world x2");
}

#[test]
fn template_file_and_variables_file() {
    let dir = tempfile::tempdir().unwrap();
    let template = dir.path().join("page.tpl");
    let rc = dir.path().join("vars.rc");
    std::fs::write(&template, "{{ title }}:{{ for k v {{ meta }} {{ func [{{k}}={{v}}] }} }}").unwrap();
    std::fs::write(&rc, "; site\n/set title=Home\n/dict meta lang en year 2024\n").unwrap();

    let flag = format!("-f{}", rc.display());
    let out = run(&[flag.as_str(), template.to_str().unwrap()], b"");
    assert_eq!(out.status.code(), Some(0), "{}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "Home:[lang=en][year=2024]");
}

#[test]
fn defines_override_variables_file() {
    let dir = tempfile::tempdir().unwrap();
    let rc = dir.path().join("vars.rc");
    std::fs::write(&rc, "/set mode=file\n").unwrap();
    let flag = format!("-f{}", rc.display());
    check(&[flag.as_str(), "-Dmode=flag"], "{{ mode }}", "flag");
}

#[test]
fn invalid_utf8_is_replaced() {
    let out = run(&["-f", "-r_", "-q"], b"a\xffb {{ raw c }}");
    assert_eq!(out.status.code(), Some(0));
    assert_eq!(String::from_utf8_lossy(&out.stdout), "a_b c");
}

// ── Failure paths ─────────────────────────────────────────────────────────────

#[test]
fn evaluation_failure_exits_2() {
    let out = run(&["-f"], b"before {{ ! }} after");
    assert_eq!(out.status.code(), Some(2));
    assert!(out.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("out of bounds in call `!`"), "stderr: {stderr}");
}

#[test]
fn unterminated_call_exits_2() {
    let out = run(&["-f"], b"{{ raw x");
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("expected termination"));
}

#[test]
fn missing_template_file_exits_1() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("nope.tpl");
    let out = run(&["-f", missing.to_str().unwrap()], b"");
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("cannot read"));
}

#[test]
fn missing_variables_file_exits_1() {
    let out = run(&["-f/definitely/not/here.rc"], b"");
    assert_eq!(out.status.code(), Some(1));
}

#[test]
fn bad_option_prints_usage() {
    let out = run(&["-z"], b"");
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("unknown option: -z"));
    assert!(stderr.contains("Usage: tplex"));
}
