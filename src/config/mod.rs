use anyhow::{Context, anyhow};
use serde::Deserialize;
use simplequery::query::{DEFAULT_MAX_DEPTH, EvalOptions};
use std::collections::HashMap;
use std::path::Path;

/// Named queries loaded from a filter file.
///
/// ```yaml
/// max_depth: 16
/// queries:
///   adults: "status=active AND (age>=18 OR vip)"
/// ```
#[derive(Debug, Deserialize)]
pub struct FiltersConfig {
    #[serde(default)]
    pub max_depth: Option<usize>,
    #[serde(default)]
    pub queries: HashMap<String, String>,
}

impl FiltersConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let settings = ::config::Config::builder()
            .add_source(::config::File::from(path))
            .build()
            .with_context(|| format!("Config: Failed to read {:?}", path))?;
        Ok(settings.try_deserialize()?)
    }

    pub fn query(&self, name: &str) -> anyhow::Result<&str> {
        self.queries.get(name).map(String::as_str).ok_or_else(|| {
            let mut known: Vec<&str> = self.queries.keys().map(String::as_str).collect();
            known.sort_unstable();
            anyhow!(
                "Config: no query named '{}' (available: {})",
                name,
                known.join(", ")
            )
        })
    }
}

#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub max_depth: usize,
    /// Abort on the first record that fails to evaluate.
    pub strict: bool,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            strict: false,
        }
    }
}

impl RuntimeConfig {
    pub fn eval_options(&self) -> EvalOptions {
        EvalOptions {
            max_depth: self.max_depth,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_yaml(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_named_queries() {
        let file = write_yaml(
            "max_depth: 4\nqueries:\n  adults: \"age>=18\"\n  vip: \"vip OR status=gold\"\n",
        );
        let config = FiltersConfig::load(file.path()).unwrap();
        assert_eq!(config.max_depth, Some(4));
        assert_eq!(config.query("adults").unwrap(), "age>=18");
        assert_eq!(config.query("vip").unwrap(), "vip OR status=gold");
    }

    #[test]
    fn unknown_query_lists_available_names() {
        let file = write_yaml("queries:\n  b: \"x\"\n  a: \"y\"\n");
        let config = FiltersConfig::load(file.path()).unwrap();
        assert_eq!(config.max_depth, None);
        let err = config.query("missing").unwrap_err().to_string();
        assert!(err.contains("available: a, b"), "{}", err);
    }

    #[test]
    fn runtime_defaults_to_library_depth() {
        let runtime = RuntimeConfig::default();
        assert_eq!(runtime.eval_options(), EvalOptions::default());
        assert!(!runtime.strict);
    }
}
