//! Small stateless helpers: environment-variable expansion for CLI
//! arguments, `KEY=VALUE` parsing for labels/annotations, and the
//! best-effort health file writer used by watch mode.
//!
//! `write_health` mirrors the teacher's `util::write_ok`: create-or-truncate
//! and write a short marker, treating failure as a log line rather than a
//! fatal error, since a liveness probe file is a convenience, not part of
//! the tool's actual contract with its sinks.

use std::path::Path;

/// Expands `$VAR` and `${VAR}` references in each argument using the
/// process environment, the way `pkg/cmd/common.go`'s `ExpandArgs` calls
/// `os.ExpandEnv` on every raw CLI argument before cobra parses flags.
/// Unset variables expand to an empty string.
pub fn expand_args(args: &[String]) -> Vec<String> {
    args.iter().map(|a| expand_env(a)).collect()
}

fn expand_env(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            out.push(c);
            continue;
        }

        match chars.peek() {
            Some('{') => {
                chars.next();
                let mut name = String::new();
                for c in chars.by_ref() {
                    if c == '}' {
                        break;
                    }
                    name.push(c);
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            Some(c) if c.is_ascii_alphanumeric() || *c == '_' => {
                let mut name = String::new();
                while let Some(c) = chars.peek() {
                    if c.is_ascii_alphanumeric() || *c == '_' {
                        name.push(*c);
                        chars.next();
                    } else {
                        break;
                    }
                }
                out.push_str(&std::env::var(&name).unwrap_or_default());
            }
            _ => out.push('$'),
        }
    }

    out
}

/// Parses a repeated `--label key=value` / `--annotation key=value` flag
/// value into a pair, rejecting anything without an `=`.
pub fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((k, v)) if !k.is_empty() => Ok((k.to_string(), v.to_string())),
        _ => Err(format!("expected KEY=VALUE, got '{raw}'")),
    }
}

/// Writes a liveness marker file, creating its parent directory if
/// necessary. Errors are logged, never propagated: a refresh cycle that
/// otherwise succeeded shouldn't be reported as failed just because the
/// health file couldn't be written.
pub fn write_health(path: &Path, healthy: bool) {
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!(path = %parent.display(), error = %e, "failed to create health file directory");
            return;
        }
    }

    let marker: &[u8] = if healthy { b"OK" } else { b"NOK" };
    if let Err(e) = std::fs::write(path, marker) {
        tracing::warn!(path = %path.display(), error = %e, "failed to write health file");
    }
}
