//! Internationalization (i18n) support
//!
//! Interface strings ship for `pt-BR` and `en`. A site may override or add
//! languages with flat `key: text` files in its languages directory.

use anyhow::Result;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

const PT_BR: &[(&str, &str)] = &[
    ("load_more", "Carregar mais posts"),
    ("loading", "Carregando..."),
    ("not_found", "Post não encontrado"),
    ("reading_time", "%d min"),
    ("load_error", "Não foi possível carregar mais posts"),
];

const EN: &[(&str, &str)] = &[
    ("load_more", "Load more posts"),
    ("loading", "Loading..."),
    ("not_found", "Post not found"),
    ("reading_time", "%d min"),
    ("load_error", "Could not load more posts"),
];

/// Internationalization handler
pub struct I18n {
    /// Current language
    language: String,
    /// Language data: lang -> key -> translation
    translations: HashMap<String, HashMap<String, String>>,
}

impl I18n {
    /// Create a handler with the built-in languages
    pub fn new(language: &str) -> Self {
        let mut translations = HashMap::new();
        for (lang, table) in [("pt-BR", PT_BR), ("en", EN)] {
            translations.insert(
                lang.to_string(),
                table
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .collect(),
            );
        }

        Self {
            language: language.to_string(),
            translations,
        }
    }

    /// Load `<lang>.yml` files from a directory, overriding built-in keys
    pub fn load_languages<P: AsRef<Path>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        if !dir.exists() {
            return Ok(());
        }

        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let ext = path.extension().and_then(|e| e.to_str());
            if !path.is_file() || !matches!(ext, Some("yml") | Some("yaml")) {
                continue;
            }

            let lang = path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("en")
                .to_string();

            let content = fs::read_to_string(&path)?;
            match serde_yaml::from_str::<HashMap<String, serde_yaml::Value>>(&content) {
                Ok(data) => {
                    let table = self.translations.entry(lang).or_default();
                    for (key, value) in data {
                        if let Some(text) = yaml_value_to_string(&value) {
                            table.insert(key, text);
                        }
                    }
                    tracing::debug!("Loaded language file: {:?}", path);
                }
                Err(e) => {
                    tracing::warn!("Failed to parse language file {:?}: {}", path, e);
                }
            }
        }

        Ok(())
    }

    /// Get the current language
    pub fn language(&self) -> &str {
        &self.language
    }

    /// Get a translation by key
    pub fn get(&self, key: &str) -> String {
        self.get_for_lang(&self.language, key)
    }

    /// Get a translation for a specific language, falling back to English
    pub fn get_for_lang(&self, lang: &str, key: &str) -> String {
        [lang, "en"]
            .iter()
            .find_map(|l| self.translations.get(*l).and_then(|t| t.get(key)))
            .cloned()
            .unwrap_or_else(|| key.to_string())
    }

    /// Translation with `%d` replaced by a number
    pub fn get_count(&self, key: &str, count: u32) -> String {
        self.get(key).replace("%d", &count.to_string())
    }

    /// All translations for the current language, English filling the gaps
    pub fn get_all_translations(&self) -> HashMap<String, String> {
        let mut result = self
            .translations
            .get(&self.language)
            .cloned()
            .unwrap_or_default();

        if let Some(en) = self.translations.get("en") {
            for (k, v) in en {
                result.entry(k.clone()).or_insert_with(|| v.clone());
            }
        }

        result
    }
}

/// Convert a scalar YAML value to a string
fn yaml_value_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl Default for I18n {
    fn default() -> Self {
        Self::new("pt-BR")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_translations() {
        let i18n = I18n::default();
        assert_eq!(i18n.language(), "pt-BR");
        assert_eq!(i18n.get("load_more"), "Carregar mais posts");
        assert_eq!(i18n.get("loading"), "Carregando...");
        assert_eq!(i18n.get_count("reading_time", 4), "4 min");
        assert_eq!(i18n.get("unknown"), "unknown");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        let i18n = I18n::new("de");
        assert_eq!(i18n.get("load_more"), "Load more posts");
        assert_eq!(i18n.get_all_translations().get("loading").unwrap(), "Loading...");
    }

    #[test]
    fn test_load_language_overrides() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("pt-BR.yml"),
            "load_more: Mais posts\nnested:\n  ignored: true\n",
        )
        .unwrap();
        fs::write(dir.path().join("es.yml"), "loading: Cargando...\n").unwrap();
        fs::write(dir.path().join("broken.yml"), ": : :\n  - [").unwrap();

        let mut i18n = I18n::new("pt-BR");
        i18n.load_languages(dir.path()).unwrap();
        assert_eq!(i18n.get("load_more"), "Mais posts");
        assert_eq!(i18n.get("loading"), "Carregando...");
        assert_eq!(i18n.get("nested"), "nested");
        assert_eq!(i18n.get_for_lang("es", "loading"), "Cargando...");
        assert_eq!(i18n.get_for_lang("es", "load_more"), "Load more posts");
    }
}
