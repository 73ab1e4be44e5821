// src/common/i18n.rs

use std::{collections::HashMap, sync::OnceLock};

pub const DEFAULT_LANG: &str = "es";
pub const SUPPORTED_LANGS: [&str; 3] = ["es", "en", "pt"];

// Catálogos embutidos no binário
const CATALOGS: [(&str, &str); 3] = [
    ("es", include_str!("../../locales/es.json")),
    ("en", include_str!("../../locales/en.json")),
    ("pt", include_str!("../../locales/pt.json")),
];

/// Mensagens traduzidas, indexadas por idioma e chave (`errors.forbidden`).
#[derive(Debug, Default)]
pub struct I18nStore {
    messages: HashMap<String, HashMap<String, String>>,
}

impl I18nStore {
    /// Carrega os catálogos embutidos. Um JSON inválido é erro de build, não de runtime.
    pub fn load() -> anyhow::Result<Self> {
        let mut messages = HashMap::new();
        for (lang, raw) in CATALOGS {
            let catalog: HashMap<String, String> = serde_json::from_str(raw)
                .map_err(|e| anyhow::anyhow!("Catálogo '{}' inválido: {}", lang, e))?;
            messages.insert(lang.to_string(), catalog);
        }
        Ok(Self { messages })
    }

    /// Instância global, usada onde não há `AppState` (ex: rejeição de extratores).
    pub fn shared() -> &'static I18nStore {
        static STORE: OnceLock<I18nStore> = OnceLock::new();
        STORE.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                tracing::error!("Falha ao carregar catálogos de idioma: {}", e);
                Self::default()
            })
        })
    }

    pub fn translate(&self, lang: &str, key: &str) -> String {
        self.lookup(lang, key)
            .or_else(|| self.lookup(DEFAULT_LANG, key))
            .map(str::to_string)
            .unwrap_or_else(|| key.to_string())
    }

    /// Igual a `translate`, substituindo `{nome}` pelos valores informados.
    pub fn translate_with(&self, lang: &str, key: &str, params: &[(&str, &str)]) -> String {
        let mut message = self.translate(lang, key);
        for (name, value) in params {
            message = message.replace(&format!("{{{}}}", name), value);
        }
        message
    }

    fn lookup(&self, lang: &str, key: &str) -> Option<&str> {
        self.messages
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_catalog_has_the_same_keys() {
        let store = I18nStore::load().unwrap();
        let base = &store.messages[DEFAULT_LANG];
        for lang in SUPPORTED_LANGS {
            let catalog = &store.messages[lang];
            for key in base.keys() {
                assert!(catalog.contains_key(key), "{} sem a chave {}", lang, key);
            }
        }
    }

    #[test]
    fn unknown_language_falls_back_to_spanish() {
        let store = I18nStore::load().unwrap();
        assert_eq!(
            store.translate("de", "errors.forbidden"),
            store.translate("es", "errors.forbidden")
        );
    }

    #[test]
    fn unknown_key_is_returned_verbatim() {
        let store = I18nStore::load().unwrap();
        assert_eq!(store.translate("en", "errors.nope"), "errors.nope");
    }

    #[test]
    fn placeholders_are_substituted() {
        let store = I18nStore::load().unwrap();
        let msg = store.translate_with("es", "errors.missing_fields", &[("fields", "email")]);
        assert!(msg.contains("email"));
        assert!(!msg.contains("{fields}"));
    }
}
