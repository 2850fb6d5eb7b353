//! File selection: ordered include/exclude regex lists with first-match semantics.

use regex::Regex;

const DEFAULT_INCLUDES: &[&str] = &[".*"];
const DEFAULT_EXCLUDES: &[&str] = &["^\\..*"];

/// Compiles include/exclude patterns and classifies candidate paths.
///
/// An empty include list rejects everything, matching the walk: `pass` starts
/// `false` and only an include match can set it `true` before the exclude
/// pass runs.
#[derive(Debug, Clone)]
pub struct Selector {
    includes: Vec<Regex>,
    excludes: Vec<Regex>,
}

impl Selector {
    pub fn new(includes: &[String], excludes: &[String]) -> crate::Result<Self> {
        let compile = |patterns: &[String]| -> crate::Result<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p)
                        .map_err(|e| crate::Error::Config(format!("invalid regex '{p}': {e}")))
                })
                .collect()
        };

        Ok(Self {
            includes: compile(includes)?,
            excludes: compile(excludes)?,
        })
    }

    pub fn default_includes() -> Vec<String> {
        DEFAULT_INCLUDES.iter().map(|s| s.to_string()).collect()
    }

    pub fn default_excludes() -> Vec<String> {
        DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect()
    }

    /// Returns whether `path` survives the filter.
    pub fn keep(&self, path: &str) -> bool {
        let mut pass = false;

        for re in &self.includes {
            if re.is_match(path) {
                pass = true;
                tracing::debug!(%path, pattern = re.as_str(), "matched include");
                break;
            }
        }

        for re in &self.excludes {
            if re.is_match(path) {
                pass = false;
                tracing::debug!(%path, pattern = re.as_str(), "matched exclude");
                break;
            }
        }

        pass
    }
}
