//! Per-disease protocol templates
//!
//! Templates supply the default inclusion criteria and primary endpoints used
//! when a request does not carry its own. The store is read-only once built.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default criteria and endpoints for one disease type
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    #[serde(default)]
    pub inclusion_criteria: Vec<String>,
    #[serde(default)]
    pub primary_endpoints: Vec<String>,
}

impl Template {
    pub fn is_empty(&self) -> bool {
        self.inclusion_criteria.is_empty() && self.primary_endpoints.is_empty()
    }
}

static EMPTY_TEMPLATE: Lazy<Template> = Lazy::new(Template::default);

/// Why a template file could not be used
#[derive(Debug, Error)]
pub enum TemplateLoadFailure {
    #[error("failed to read template file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse template file {path}: {message}")]
    Parse { path: PathBuf, message: String },
}

/// Disease type to [`Template`] lookup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateStore {
    templates: BTreeMap<String, Template>,
}

impl TemplateStore {
    /// Built-in template set
    pub fn builtin() -> Self {
        let mut templates = BTreeMap::new();
        templates.insert(
            "psoriasis".to_string(),
            Template {
                inclusion_criteria: vec![
                    "Adults aged 18-65 years".to_string(),
                    "Confirmed plaque psoriasis diagnosis".to_string(),
                    "BSA ≥ 10%".to_string(),
                    "PASI score ≥ 12".to_string(),
                ],
                primary_endpoints: vec![
                    "PASI 75 at Week 12".to_string(),
                    "IGA score of 0/1 at Week 12".to_string(),
                ],
            },
        );
        Self { templates }
    }

    pub fn from_map<I, K>(templates: I) -> Self
    where
        I: IntoIterator<Item = (K, Template)>,
        K: AsRef<str>,
    {
        Self {
            templates: templates
                .into_iter()
                .map(|(key, template)| (normalize_key(key.as_ref()), template))
                .collect(),
        }
    }

    /// Read templates from a JSON file, or TOML when the extension is `.toml`
    pub fn try_load(path: impl AsRef<Path>) -> Result<Self, TemplateLoadFailure> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| TemplateLoadFailure::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let parsed: BTreeMap<String, Template> = if is_toml {
            toml::from_str(&content).map_err(|e| TemplateLoadFailure::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            serde_json::from_str(&content).map_err(|e| TemplateLoadFailure::Parse {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        tracing::debug!(path = %path.display(), count = parsed.len(), "loaded protocol templates");
        Ok(Self::from_map(parsed))
    }

    /// Like [`TemplateStore::try_load`] but falls back to the built-in set
    pub fn load(path: impl AsRef<Path>) -> Self {
        match Self::try_load(path) {
            Ok(store) => store,
            Err(e) => {
                tracing::warn!(error = %e, "using built-in protocol templates");
                Self::builtin()
            }
        }
    }

    /// Template for `disease_type`, or an empty template when unknown
    pub fn get(&self, disease_type: &str) -> &Template {
        self.templates
            .get(&normalize_key(disease_type))
            .unwrap_or(&*EMPTY_TEMPLATE)
    }

    pub fn contains(&self, disease_type: &str) -> bool {
        self.templates.contains_key(&normalize_key(disease_type))
    }

    /// Known disease types in sorted order
    pub fn disease_types(&self) -> impl Iterator<Item = &str> {
        self.templates.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_psoriasis_template() {
        let store = TemplateStore::builtin();
        let template = store.get("psoriasis");
        assert_eq!(template.inclusion_criteria.len(), 4);
        assert_eq!(template.inclusion_criteria[2], "BSA ≥ 10%");
        assert_eq!(
            template.primary_endpoints,
            vec!["PASI 75 at Week 12", "IGA score of 0/1 at Week 12"]
        );
    }

    #[test]
    fn test_unknown_disease_yields_empty_template() {
        let store = TemplateStore::builtin();
        assert!(store.get("unknown-disease").is_empty());
        assert!(!store.contains("unknown-disease"));
    }

    #[test]
    fn test_lookup_normalizes_keys() {
        let store = TemplateStore::from_map([(
            " Atopic Dermatitis ",
            Template {
                inclusion_criteria: vec!["EASI ≥ 16".to_string()],
                primary_endpoints: vec![],
            },
        )]);
        assert_eq!(store.get("atopic dermatitis").inclusion_criteria, vec!["EASI ≥ 16"]);
        assert_eq!(store.get("ATOPIC DERMATITIS  ").inclusion_criteria.len(), 1);
        assert_eq!(store.disease_types().collect::<Vec<_>>(), vec!["atopic dermatitis"]);
    }

    #[test]
    fn test_try_load_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("templates.json");
        fs::write(
            &path,
            r#"{
                "asthma": {"inclusion_criteria": ["FEV1 40-80%"], "primary_endpoints": ["Change in FEV1"]},
                "gout": {"primary_endpoints": ["Serum urate < 6 mg/dL"]}
            }"#,
        )
        .unwrap();

        let store = TemplateStore::try_load(&path).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.get("asthma").primary_endpoints, vec!["Change in FEV1"]);
        assert!(store.get("gout").inclusion_criteria.is_empty());
        assert!(!store.contains("psoriasis"));
    }

    #[test]
    fn test_try_load_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("templates.toml");
        fs::write(
            &path,
            r#"
[migraine]
inclusion_criteria = ["4-14 migraine days per month"]
primary_endpoints = ["Change in monthly migraine days"]
"#,
        )
        .unwrap();

        let store = TemplateStore::try_load(&path).unwrap();
        assert_eq!(
            store.get("migraine").inclusion_criteria,
            vec!["4-14 migraine days per month"]
        );
    }

    #[test]
    fn test_try_load_reports_failures() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.json");
        assert!(matches!(
            TemplateStore::try_load(&missing),
            Err(TemplateLoadFailure::Io { .. })
        ));

        let broken = dir.path().join("broken.json");
        fs::write(&broken, "{not json").unwrap();
        assert!(matches!(
            TemplateStore::try_load(&broken),
            Err(TemplateLoadFailure::Parse { .. })
        ));
    }

    #[test]
    fn test_load_falls_back_to_builtin() {
        let dir = TempDir::new().unwrap();
        let store = TemplateStore::load(dir.path().join("missing.json"));
        assert_eq!(store, TemplateStore::builtin());
    }
}
