// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};

use crate::common::i18n::{DEFAULT_LANG, SUPPORTED_LANGS};

/// Idioma da resposta, a partir do `Accept-Language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl Locale {
    /// Primeiro idioma suportado, em ordem de preferência do cliente.
    /// "pt-BR" conta como "pt".
    pub fn from_header_value(raw: &str) -> Self {
        accept_language::parse(raw)
            .iter()
            .filter_map(|tag| tag.split(['-', '_']).next())
            .map(str::to_lowercase)
            .find(|primary| SUPPORTED_LANGS.contains(&primary.as_str()))
            .map(Locale)
            .unwrap_or_default()
    }

    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok())
            .map(Self::from_header_value)
            .unwrap_or_default()
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self::from_headers(&parts.headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_first_supported_language() {
        assert_eq!(Locale::from_header_value("pt-BR,pt;q=0.9,en;q=0.8").0, "pt");
        assert_eq!(Locale::from_header_value("de-DE,en;q=0.5").0, "en");
    }

    #[test]
    fn unknown_or_missing_languages_fall_back_to_spanish() {
        assert_eq!(Locale::from_header_value("fr-FR").0, "es");
        assert_eq!(Locale::from_headers(&HeaderMap::new()).0, "es");
    }
}
