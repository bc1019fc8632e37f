// Engine selector table: the fixed allow-list of languages the remote
// endpoint is asked to run, with optional version overrides loaded from
// config/languages.json

use crate::error::HarnessError;
use arbiter_common::types::Language;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// `{engineLanguage, engineVersion}` pair sent to the execution endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineSelector {
    pub engine_language: String,
    pub engine_version: String,
}

#[derive(Debug, Clone, Deserialize)]
struct LanguageOverride {
    name: String,
    #[serde(default)]
    engine_language: Option<String>,
    version: String,
}

#[derive(Debug, Deserialize)]
struct LanguagesJson {
    languages: Vec<LanguageOverride>,
}

/// Listing entry for `GET /languages` and `arbiter-cli languages`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LanguageInfo {
    pub name: Language,
    #[serde(flatten)]
    pub engine: EngineSelector,
    pub driver_synthesis: bool,
}

fn builtin_selector(language: Language) -> EngineSelector {
    let (engine_language, engine_version) = match language {
        Language::Javascript => ("javascript", "18.15.0"),
        Language::Python => ("python", "3.10.0"),
        Language::Java => ("java", "15.0.2"),
        Language::Cpp => ("c++", "10.2.0"),
    };
    EngineSelector {
        engine_language: engine_language.to_string(),
        engine_version: engine_version.to_string(),
    }
}

/// Resolved allow-list. Every `Language` variant is always present.
#[derive(Debug, Clone)]
pub struct LanguageTable {
    selectors: HashMap<Language, EngineSelector>,
}

impl Default for LanguageTable {
    fn default() -> Self {
        let selectors = Language::ALL
            .iter()
            .map(|&lang| (lang, builtin_selector(lang)))
            .collect();
        Self { selectors }
    }
}

impl LanguageTable {
    /// Load version overrides from a languages.json file.
    ///
    /// The file may only re-version languages already on the allow-list;
    /// an unknown name is rejected.
    pub fn load(path: &Path) -> Result<Self, HarnessError> {
        let content = fs::read_to_string(path).map_err(|e| {
            HarnessError::Config(format!("failed to read {}: {}", path.display(), e))
        })?;
        Self::from_json(&content)
    }

    /// Load overrides if the file exists, otherwise use the built-in table
    pub fn load_or_default(path: &Path) -> Result<Self, HarnessError> {
        if path.exists() {
            let table = Self::load(path)?;
            info!(path = %path.display(), "Loaded language overrides");
            Ok(table)
        } else {
            debug!(path = %path.display(), "No language overrides file, using built-in table");
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self, HarnessError> {
        let parsed: LanguagesJson = serde_json::from_str(content)
            .map_err(|e| HarnessError::Config(format!("failed to parse languages.json: {}", e)))?;

        let mut table = Self::default();
        for entry in parsed.languages {
            let language = Language::from_tag(&entry.name).ok_or_else(|| {
                HarnessError::Config(format!("unknown language '{}' in languages.json", entry.name))
            })?;
            if entry.version.trim().is_empty() {
                return Err(HarnessError::Config(format!(
                    "empty version for '{}' in languages.json",
                    entry.name
                )));
            }
            let selector = table
                .selectors
                .entry(language)
                .or_insert_with(|| builtin_selector(language));
            if let Some(engine_language) = entry.engine_language {
                selector.engine_language = engine_language;
            }
            selector.engine_version = entry.version;
        }
        Ok(table)
    }

    /// Resolve a raw language tag, rejecting anything off the allow-list
    pub fn resolve(&self, tag: &str) -> Result<(Language, &EngineSelector), HarnessError> {
        let language = Language::from_tag(tag)
            .ok_or_else(|| HarnessError::UnsupportedLanguage(tag.to_string()))?;
        let selector = self
            .selectors
            .get(&language)
            .ok_or_else(|| HarnessError::UnsupportedLanguage(tag.to_string()))?;
        Ok((language, selector))
    }

    pub fn selector(&self, language: Language) -> Option<&EngineSelector> {
        self.selectors.get(&language)
    }

    pub fn list(&self) -> Vec<LanguageInfo> {
        Language::ALL
            .iter()
            .filter_map(|&lang| {
                self.selectors.get(&lang).map(|engine| LanguageInfo {
                    name: lang,
                    engine: engine.clone(),
                    driver_synthesis: crate::driver::DriverTemplate::for_language(lang)
                        .synthesizes(),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_table() {
        let table = LanguageTable::default();
        let (lang, selector) = table.resolve("js").unwrap();
        assert_eq!(lang, Language::Javascript);
        assert_eq!(selector.engine_language, "javascript");
        assert_eq!(selector.engine_version, "18.15.0");

        let (_, cpp) = table.resolve("C++").unwrap();
        assert_eq!(cpp.engine_language, "c++");
    }

    #[test]
    fn test_unsupported_language() {
        let table = LanguageTable::default();
        assert_eq!(
            table.resolve("brainfuck").unwrap_err(),
            HarnessError::UnsupportedLanguage("brainfuck".to_string())
        );
    }

    #[test]
    fn test_version_override() {
        let table = LanguageTable::from_json(
            r#"{"languages": [{"name": "python", "version": "3.12.0"}]}"#,
        )
        .unwrap();
        assert_eq!(table.selector(Language::Python).unwrap().engine_version, "3.12.0");
        assert_eq!(table.selector(Language::Javascript).unwrap().engine_version, "18.15.0");
    }

    #[test]
    fn test_unknown_override_rejected() {
        let err = LanguageTable::from_json(r#"{"languages": [{"name": "ruby", "version": "3"}]}"#)
            .unwrap_err();
        assert!(matches!(err, HarnessError::Config(msg) if msg.contains("ruby")));
    }

    #[test]
    fn test_missing_file_uses_builtin() {
        let table = LanguageTable::load_or_default(Path::new("does/not/exist.json")).unwrap();
        assert_eq!(table.list().len(), Language::ALL.len());
    }

    #[test]
    fn test_listing_marks_passthrough_languages() {
        let listing = LanguageTable::default().list();
        let java = listing.iter().find(|l| l.name == Language::Java).unwrap();
        assert!(!java.driver_synthesis);
        let python = listing.iter().find(|l| l.name == Language::Python).unwrap();
        assert!(python.driver_synthesis);
    }
}
