//! Environment variable lookup and `${VAR}` expansion

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Source of environment variables.
///
/// The loader and sanitizer never read `std::env` directly; they go through
/// this trait so a map can stand in for the process environment.
pub trait Environment: Send + Sync {
    fn var(&self, key: &str) -> Option<String>;
}

impl Environment for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned()
    }
}

/// Process environment, backed by a `.env` file under the application root.
///
/// Process variables win over `.env` entries.
#[derive(Debug, Clone, Default)]
pub struct SystemEnv {
    root: PathBuf,
    dotenv: HashMap<String, String>,
}

impl SystemEnv {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let dotenv = match std::fs::read_to_string(root.join(".env")) {
            Ok(content) => parse_dotenv(&content),
            Err(_) => HashMap::new(),
        };
        Self { root, dotenv }
    }

    /// Environment rooted at the current working directory
    pub fn current() -> Self {
        Self::new(application_root())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Environment for SystemEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key)
            .ok()
            .or_else(|| self.dotenv.get(key).cloned())
    }
}

/// Application root: the current working directory, or `.` if unavailable
pub fn application_root() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

/// Parse `KEY=VALUE` lines. Blank lines and `#` comments are skipped, an
/// `export ` prefix is accepted and matching outer quotes are stripped.
pub fn parse_dotenv(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| {
            let line = line.strip_prefix("export ").unwrap_or(line);
            let (key, value) = line.split_once('=')?;
            let key = key.trim();
            if key.is_empty() {
                return None;
            }
            Some((key.to_string(), unquote(value.trim()).to_string()))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Expand `${VAR}` and `${VAR:-default}` references.
///
/// An unset `${VAR}` expands to the empty string; `${VAR:-default}` uses the
/// default when the variable is unset or empty. An unterminated `${` is
/// kept literally.
pub fn expand_env(value: &str, env: &dyn Environment) -> String {
    let mut out = String::with_capacity(value.len());
    let mut rest = value;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };

        let reference = &after[..end];
        let expanded = match reference.split_once(":-") {
            Some((name, default)) => env
                .var(name.trim())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string()),
            None => env.var(reference.trim()).unwrap_or_default(),
        };
        out.push_str(&expanded);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    out
}
