// src/models/tenant.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        validation::{is_valid_schedule, non_blank, validate_logo_url, validate_not_blank},
    },
    models::auth::AccountStatus,
};

pub const VIRTUAL_ADDRESS_PLACEHOLDER: &str = "Sin tienda física (virtual)";
pub const VIRTUAL_SCHEDULE_PLACEHOLDER: &str = "Atención online";

// Palavras que indicam loja sem espaço físico, buscadas em endereço e horário
const VIRTUAL_MARKERS: [&str; 6] = [
    "online",
    "virtual",
    "sin tienda",
    "sin local",
    "no disponible",
    "no aplica",
];

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Physical,
    Virtual,
}

impl StoreKind {
    /// Regra canônica: horário estrito válido => física; qualquer outra coisa => virtual.
    pub fn from_schedule(schedule: &str) -> Self {
        if is_valid_schedule(schedule) {
            StoreKind::Physical
        } else {
            StoreKind::Virtual
        }
    }

    /// Interpreta a flag explícita enviada pelo formulário.
    pub fn parse_flag(raw: &str) -> Option<Self> {
        match raw.trim().to_lowercase().as_str() {
            "virtual" | "v" => Some(StoreKind::Virtual),
            "fisica" | "física" | "f" | "physical" => Some(StoreKind::Physical),
            _ => None,
        }
    }

    /// Decide o tipo de loja no cadastro. A flag explícita vence; depois um horário
    /// válido indica loja física; endereço e horário em branco, ou palavras-marcadoras,
    /// indicam virtual.
    pub fn infer(explicit: Option<StoreKind>, address: Option<&str>, schedule: Option<&str>) -> Self {
        if let Some(kind) = explicit {
            return kind;
        }
        let address = non_blank(address);
        let schedule = non_blank(schedule);
        if schedule.is_some_and(is_valid_schedule) {
            return StoreKind::Physical;
        }
        if address.is_none() && schedule.is_none() {
            return StoreKind::Virtual;
        }
        let mentions_virtual = [address, schedule].into_iter().flatten().any(|text| {
            let text = text.to_lowercase();
            VIRTUAL_MARKERS.iter().any(|marker| text.contains(marker))
        });
        if mentions_virtual {
            StoreKind::Virtual
        } else {
            StoreKind::Physical
        }
    }
}

/// Endereço e horário já normalizados para gravação.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreLocation {
    pub kind: StoreKind,
    pub address: String,
    pub schedule: String,
}

impl StoreLocation {
    /// Valida e normaliza endereço/horário. O resultado gravado sempre é lido de volta
    /// como o mesmo tipo por `StoreKind::from_schedule`.
    pub fn resolve(
        explicit: Option<StoreKind>,
        address: Option<&str>,
        schedule: Option<&str>,
    ) -> Result<Self, AppError> {
        let address = non_blank(address);
        let schedule = non_blank(schedule);

        match StoreKind::infer(explicit, address, schedule) {
            StoreKind::Virtual => {
                if schedule.is_some_and(is_valid_schedule) {
                    return Err(AppError::VirtualStoreWithOpeningHours);
                }
                Ok(Self {
                    kind: StoreKind::Virtual,
                    address: address.unwrap_or(VIRTUAL_ADDRESS_PLACEHOLDER).to_string(),
                    schedule: schedule.unwrap_or(VIRTUAL_SCHEDULE_PLACEHOLDER).to_string(),
                })
            }
            StoreKind::Physical => {
                let (Some(address), Some(schedule)) = (address, schedule) else {
                    return Err(AppError::PhysicalStoreRequiresAddress);
                };
                if !is_valid_schedule(schedule) {
                    return Err(AppError::InvalidSchedule);
                }
                Ok(Self {
                    kind: StoreKind::Physical,
                    address: address.to_string(),
                    schedule: schedule.to_string(),
                })
            }
        }
    }
}

// --- ENTIDADE ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Tenant {
    pub id: Uuid,
    pub business_name: String,
    pub logo_url: Option<String>,
    pub address: String,
    pub schedule: String,
    pub owner_first_name: String,
    pub owner_paternal_surname: String,
    pub owner_maternal_surname: String,
    pub email: String,

    #[serde(skip_serializing)]
    pub password_hash: String,

    pub status: AccountStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Tenant {
    pub fn store_kind(&self) -> StoreKind {
        StoreKind::from_schedule(&self.schedule)
    }
}

/// Microempresa como exposta pela API, com o tipo de loja derivado.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct TenantProfile {
    #[serde(flatten)]
    pub tenant: Tenant,
    pub store_kind: StoreKind,
}

impl From<Tenant> for TenantProfile {
    fn from(tenant: Tenant) -> Self {
        let store_kind = tenant.store_kind();
        Self { tenant, store_kind }
    }
}

// --- PAYLOADS ---

/// Campos de perfil da microempresa, usados no cadastro direto e na criação pelo admin.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewTenantPayload {
    #[validate(custom(function = "validate_not_blank", message = "El nombre de la microempresa es obligatorio."))]
    pub business_name: String,
    #[validate(custom(function = "validate_logo_url", message = "La URL del logo no es válida."))]
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub schedule: Option<String>,
    /// `fisica` | `virtual`
    pub store_kind: Option<String>,
    #[validate(custom(function = "validate_not_blank", message = "El nombre del propietario es obligatorio."))]
    pub owner_first_name: String,
    #[validate(custom(function = "validate_not_blank", message = "El apellido paterno es obligatorio."))]
    pub owner_paternal_surname: String,
    #[validate(custom(function = "validate_not_blank", message = "El apellido materno es obligatorio."))]
    pub owner_maternal_surname: String,
    #[validate(email(message = "Email inválido."))]
    pub email: String,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateTenantPayload {
    pub business_name: Option<String>,
    #[validate(custom(function = "validate_logo_url", message = "La URL del logo no es válida."))]
    pub logo_url: Option<String>,
    pub address: Option<String>,
    pub schedule: Option<String>,
    pub store_kind: Option<String>,
    pub owner_first_name: Option<String>,
    pub owner_paternal_surname: Option<String>,
    pub owner_maternal_surname: Option<String>,
    /// Só é aceito se for igual ao atual.
    pub email: Option<String>,
    #[validate(length(min = 6, message = "La contraseña debe tener al menos 6 caracteres."))]
    pub password: Option<String>,
}

/// Parse da flag opcional de tipo de loja; valor desconhecido é erro de validação.
pub fn parse_store_kind_flag(raw: Option<&str>) -> Result<Option<StoreKind>, AppError> {
    match non_blank(raw) {
        None => Ok(None),
        Some(value) => StoreKind::parse_flag(value).map(Some).ok_or_else(|| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("store_kind", validator::ValidationError::new("store_kind"));
            AppError::ValidationError(errors)
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_schedule_means_physical_store() {
        assert_eq!(StoreKind::from_schedule("09:00 - 18:00"), StoreKind::Physical);
        assert_eq!(StoreKind::from_schedule("Atención online"), StoreKind::Virtual);
    }

    #[test]
    fn explicit_flag_wins_over_inference() {
        let kind = StoreKind::infer(Some(StoreKind::Virtual), Some("Av. Lima 123"), None);
        assert_eq!(kind, StoreKind::Virtual);
    }

    #[test]
    fn marker_words_infer_virtual() {
        assert_eq!(StoreKind::infer(None, Some("Sin local"), None), StoreKind::Virtual);
        assert_eq!(StoreKind::infer(None, None, Some("Solo ONLINE")), StoreKind::Virtual);
        assert_eq!(StoreKind::infer(None, Some("Jr. Puno 45"), Some("lunes")), StoreKind::Physical);
    }

    #[test]
    fn blank_address_and_schedule_register_a_virtual_store() {
        let loc = StoreLocation::resolve(None, Some(""), Some("")).unwrap();
        assert_eq!(loc.kind, StoreKind::Virtual);
        assert_eq!(loc.address, VIRTUAL_ADDRESS_PLACEHOLDER);
        assert_eq!(loc.schedule, VIRTUAL_SCHEDULE_PLACEHOLDER);
        assert_eq!(StoreKind::from_schedule(&loc.schedule), StoreKind::Virtual);
    }

    #[test]
    fn invalid_schedule_without_marker_stays_physical() {
        assert_eq!(StoreKind::infer(None, None, Some("lunes a viernes")), StoreKind::Physical);
        let err = StoreLocation::resolve(None, Some("Av. Sol 1"), Some("todo el día")).unwrap_err();
        assert!(matches!(err, AppError::InvalidSchedule));
    }

    #[test]
    fn virtual_store_gets_placeholders() {
        let loc = StoreLocation::resolve(Some(StoreKind::Virtual), None, Some("  ")).unwrap();
        assert_eq!(loc.address, VIRTUAL_ADDRESS_PLACEHOLDER);
        assert_eq!(loc.schedule, VIRTUAL_SCHEDULE_PLACEHOLDER);
    }

    #[test]
    fn physical_store_requires_address_and_schedule() {
        let err = StoreLocation::resolve(Some(StoreKind::Physical), Some("Av. Sol 1"), None).unwrap_err();
        assert!(matches!(err, AppError::PhysicalStoreRequiresAddress));
    }

    #[test]
    fn physical_store_with_reversed_schedule_is_rejected() {
        let err = StoreLocation::resolve(None, Some("Av. Sol 1"), Some("18:00 - 09:00 horas")).unwrap_err();
        assert!(matches!(err, AppError::InvalidSchedule));
    }

    #[test]
    fn virtual_store_cannot_keep_a_physical_schedule() {
        let err = StoreLocation::resolve(Some(StoreKind::Virtual), None, Some("09:00 - 18:00")).unwrap_err();
        assert!(matches!(err, AppError::VirtualStoreWithOpeningHours));
    }

    #[test]
    fn resolved_location_reads_back_as_the_same_kind() {
        let cases = [
            (None, Some("Av. Sol 1"), Some("09:00 - 18:00")),
            (None, Some("online"), None),
            (Some(StoreKind::Virtual), None, None),
            (Some(StoreKind::Virtual), Some("Sin tienda"), Some("24 horas por web")),
            (Some(StoreKind::Physical), Some("Jr. Lima 3"), Some("08:00-13:00")),
        ];
        for (flag, address, schedule) in cases {
            let loc = StoreLocation::resolve(flag, address, schedule).unwrap();
            assert_eq!(StoreKind::from_schedule(&loc.schedule), loc.kind);
        }
    }

    #[test]
    fn store_kind_flag_accepts_spanish_aliases() {
        assert_eq!(StoreKind::parse_flag("Física"), Some(StoreKind::Physical));
        assert_eq!(StoreKind::parse_flag("v"), Some(StoreKind::Virtual));
        assert_eq!(StoreKind::parse_flag("mixta"), None);
        assert!(parse_store_kind_flag(Some("mixta")).is_err());
        assert_eq!(parse_store_kind_flag(Some(" ")).unwrap(), None);
    }
}
