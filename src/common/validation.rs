// src/common/validation.rs

use std::sync::OnceLock;

use chrono::NaiveTime;
use regex::Regex;
use validator::ValidationError;

// HH:MM - HH:MM, com espaços opcionais nas bordas e ao redor do hífen
fn schedule_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^\s*(\d{2}:\d{2})\s*-\s*(\d{2}:\d{2})\s*$").expect("regex de horário válida")
    })
}

/// Interpreta um horário de atendimento estrito (`09:00 - 18:00`).
/// Retorna `None` se o formato não bater, se algum horário não existir
/// ou se o início não for anterior ao fim.
pub fn parse_schedule(raw: &str) -> Option<(NaiveTime, NaiveTime)> {
    let caps = schedule_pattern().captures(raw)?;
    let start = NaiveTime::parse_from_str(caps.get(1)?.as_str(), "%H:%M").ok()?;
    let end = NaiveTime::parse_from_str(caps.get(2)?.as_str(), "%H:%M").ok()?;
    (start < end).then_some((start, end))
}

pub fn is_valid_schedule(raw: &str) -> bool {
    parse_schedule(raw).is_some()
}

/// Aceita apenas URLs absolutas http/https com host.
pub fn is_valid_http_url(raw: &str) -> bool {
    let raw = raw.trim();
    let rest = match raw.split_once("://") {
        Some((scheme, rest)) if scheme.eq_ignore_ascii_case("http") || scheme.eq_ignore_ascii_case("https") => rest,
        _ => return false,
    };
    let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
    !host.is_empty() && !host.starts_with(':') && !host.contains(char::is_whitespace)
}

/// E-mails são comparados sem espaços e em minúsculas.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// `Some(texto aparado)` se houver conteúdo.
pub fn non_blank(raw: Option<&str>) -> Option<&str> {
    raw.map(str::trim).filter(|s| !s.is_empty())
}

/// Monta o erro `MissingFields` a partir de pares (nome, presente?).
pub fn require_fields(fields: &[(&str, bool)]) -> Result<(), crate::common::error::AppError> {
    let missing: Vec<&str> = fields
        .iter()
        .filter(|(_, present)| !present)
        .map(|(name, _)| *name)
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(crate::common::error::AppError::MissingFields(missing.join(", ")))
    }
}

// --- Validadores customizados para o `validator` ---

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required"));
    }
    Ok(())
}

pub fn validate_logo_url(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() || is_valid_http_url(value) {
        Ok(())
    } else {
        Err(ValidationError::new("url"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_schedule_is_accepted() {
        assert!(is_valid_schedule("09:00 - 18:00"));
        assert!(is_valid_schedule("  08:30-12:00 "));
    }

    #[test]
    fn reversed_or_equal_schedule_is_rejected() {
        assert!(!is_valid_schedule("18:00 - 09:00"));
        assert!(!is_valid_schedule("09:00 - 09:00"));
    }

    #[test]
    fn loose_or_impossible_schedules_are_rejected() {
        assert!(!is_valid_schedule("9:00 - 18:00"));
        assert!(!is_valid_schedule("Atención online"));
        assert!(!is_valid_schedule("25:00 - 26:00"));
        assert!(!is_valid_schedule("09:00 - 18:00 lun-vie"));
        assert!(!is_valid_schedule(""));
    }

    #[test]
    fn url_requires_http_scheme_and_host() {
        assert!(is_valid_http_url("https://cdn.example.com/logo.png"));
        assert!(is_valid_http_url("http://localhost:8080"));
        assert!(!is_valid_http_url("ftp://example.com/logo.png"));
        assert!(!is_valid_http_url("https://"));
        assert!(!is_valid_http_url("example.com/logo.png"));
    }

    #[test]
    fn require_fields_lists_every_missing_name() {
        let err = require_fields(&[("email", false), ("role", true), ("token", false)]).unwrap_err();
        match err {
            crate::common::error::AppError::MissingFields(fields) => assert_eq!(fields, "email, token"),
            other => panic!("erro inesperado: {other:?}"),
        }
    }
}
