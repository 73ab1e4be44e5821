// src/services/onboarding_service.rs

use chrono::{DateTime, Duration, Utc};
use qrcode::{render::svg, QrCode};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        validation::{non_blank, normalize_email, require_fields},
    },
    db::{
        tenant_repo::TenantFields, OnboardingRepository, PlanRepository, SubscriptionRepository,
        TenantRepository,
    },
    models::{
        auth::AccountStatus,
        onboarding::{reference_text, OnboardingRequest, PendingReview, ReviewDecision, StartOnboardingPayload},
        plan::CatalogStatus,
        subscription::Subscription,
        tenant::{parse_store_kind_flag, StoreLocation, Tenant},
    },
    services::{
        security::{generate_token, hash_password, verify_password, TokenHasher},
        storage_service::{content_type_for, proof_extension, ProofStorage},
    },
};

/// Token de edição recém-emitido. O valor cru só existe nesta resposta.
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Como o passo 1 do cadastro terminou.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    Created,
    Resumed,
    Edited,
}

#[derive(Debug)]
pub struct StartOutcome {
    pub mode: StartMode,
    pub tenant_id: Uuid,
    pub signup_id: Uuid,
    pub token: Option<IssuedToken>,
}

/// Comprovante carregado do disco para download.
#[derive(Debug)]
pub struct ProofFile {
    pub bytes: Vec<u8>,
    pub content_type: &'static str,
    pub filename: String,
}

/// Resultado de uma revisão do super usuário.
#[derive(Debug)]
pub enum ReviewOutcome {
    Approved { request: OnboardingRequest, subscription: Subscription },
    Rejected { request: OnboardingRequest },
}

// Dados do passo 1 já validados e normalizados
#[derive(Debug)]
struct SignupProfile {
    business_name: String,
    owner_first_name: String,
    owner_paternal_surname: String,
    owner_maternal_surname: String,
    email: String,
    logo_url: Option<String>,
    location: StoreLocation,
}

impl SignupProfile {
    fn from_payload(payload: &StartOnboardingPayload) -> Result<Self, AppError> {
        let business_name = non_blank(payload.business_name.as_deref());
        let owner_first_name = non_blank(payload.owner_first_name.as_deref());
        let owner_paternal_surname = non_blank(payload.owner_paternal_surname.as_deref());
        let owner_maternal_surname = non_blank(payload.owner_maternal_surname.as_deref());
        let email = non_blank(payload.email.as_deref());

        require_fields(&[
            ("business_name", business_name.is_some()),
            ("owner_first_name", owner_first_name.is_some()),
            ("owner_paternal_surname", owner_paternal_surname.is_some()),
            ("owner_maternal_surname", owner_maternal_surname.is_some()),
            ("email", email.is_some()),
        ])?;

        let explicit = parse_store_kind_flag(payload.store_kind.as_deref())?;
        let location = StoreLocation::resolve(explicit, payload.address.as_deref(), payload.schedule.as_deref())?;

        Ok(Self {
            business_name: business_name.unwrap_or_default().to_string(),
            owner_first_name: owner_first_name.unwrap_or_default().to_string(),
            owner_paternal_surname: owner_paternal_surname.unwrap_or_default().to_string(),
            owner_maternal_surname: owner_maternal_surname.unwrap_or_default().to_string(),
            email: normalize_email(email.unwrap_or_default()),
            logo_url: non_blank(payload.logo_url.as_deref()).map(str::to_string),
            location,
        })
    }

    fn fields(&self) -> TenantFields<'_> {
        TenantFields {
            business_name: &self.business_name,
            logo_url: self.logo_url.as_deref(),
            address: &self.location.address,
            schedule: &self.location.schedule,
            owner_first_name: &self.owner_first_name,
            owner_paternal_surname: &self.owner_paternal_surname,
            owner_maternal_surname: &self.owner_maternal_surname,
            email: &self.email,
        }
    }
}

#[derive(Clone)]
pub struct OnboardingService {
    tenant_repo: TenantRepository,
    onboarding_repo: OnboardingRepository,
    plan_repo: PlanRepository,
    subscription_repo: SubscriptionRepository,
    storage: ProofStorage,
    hasher: TokenHasher,
    token_ttl_minutes: i64,
    subscription_days: i64,
    pool: PgPool,
}

impl OnboardingService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        tenant_repo: TenantRepository,
        onboarding_repo: OnboardingRepository,
        plan_repo: PlanRepository,
        subscription_repo: SubscriptionRepository,
        storage: ProofStorage,
        hasher: TokenHasher,
        token_ttl_minutes: i64,
        subscription_days: i64,
        pool: PgPool,
    ) -> Self {
        Self {
            tenant_repo,
            onboarding_repo,
            plan_repo,
            subscription_repo,
            storage,
            hasher,
            token_ttl_minutes,
            subscription_days,
            pool,
        }
    }

    fn issue_token(&self) -> Result<(IssuedToken, String), AppError> {
        let token = generate_token()?;
        let hash = self.hasher.hash(&token);
        let expires_at = Utc::now() + Duration::minutes(self.token_ttl_minutes);
        Ok((IssuedToken { token, expires_at }, hash))
    }

    fn check_token(&self, request: &OnboardingRequest, token: Option<&str>) -> Result<(), AppError> {
        let token = non_blank(token).ok_or(AppError::InvalidOnboardingToken)?;
        if self.hasher.verify(token, &request.token_hash, request.token_expires_at, Utc::now()) {
            Ok(())
        } else {
            Err(AppError::InvalidOnboardingToken)
        }
    }

    // ===========================================================================
    // PASSO 1: CRIAR / RETOMAR / EDITAR
    // ===========================================================================

    pub async fn start(&self, payload: &StartOnboardingPayload) -> Result<StartOutcome, AppError> {
        let profile = SignupProfile::from_payload(payload)?;
        let password = non_blank(payload.password.as_deref());

        // 1. Edição pelo signup_id. Um id desconhecido cai no fluxo por e-mail.
        if let Some(signup_id) = payload.signup_id {
            if let Some(request) = self.onboarding_repo.find_by_id(&self.pool, signup_id).await? {
                return self
                    .edit_existing(request, &profile, password, payload.onboarding_token.as_deref())
                    .await;
            }
            tracing::debug!(%signup_id, "signup_id desconhecido; seguindo pelo e-mail");
        }

        let mut tx = self.pool.begin().await?;

        // 2. Retomar um cadastro pendente com o mesmo e-mail
        if let Some(existing) = self.tenant_repo.find_by_email(&mut *tx, &profile.email).await? {
            if existing.status != AccountStatus::Pending {
                return Err(AppError::EmailAlreadyExists);
            }
            let password = password.ok_or(AppError::PasswordRequired)?;
            if !verify_password(password, &existing.password_hash).await? {
                return Err(AppError::InvalidCredentials);
            }

            let latest = self.onboarding_repo.find_latest_for_tenant(&mut *tx, existing.id).await?;
            let (issued, hash) = self.issue_token()?;
            let request = match latest {
                None => self.onboarding_repo.create(&mut *tx, existing.id, &hash, issued.expires_at).await?,
                Some(request) if request.state.is_locked() => return Err(AppError::OnboardingLocked),
                Some(request) => self
                    .onboarding_repo
                    .replace_token(&mut *tx, request.id, &hash, issued.expires_at)
                    .await?
                    .ok_or(AppError::OnboardingLocked)?,
            };

            if self.tenant_repo.business_name_taken(&mut *tx, &profile.business_name, Some(existing.id)).await? {
                return Err(AppError::BusinessNameAlreadyExists);
            }
            self.tenant_repo.update_profile(&mut *tx, existing.id, profile.fields()).await?;
            tx.commit().await?;

            tracing::info!(tenant_id = %existing.id, signup_id = %request.id, "Cadastro retomado pelo e-mail");
            return Ok(StartOutcome {
                mode: StartMode::Resumed,
                tenant_id: existing.id,
                signup_id: request.id,
                token: Some(issued),
            });
        }

        // 3. Cadastro novo
        if self.tenant_repo.business_name_taken(&mut *tx, &profile.business_name, None).await? {
            return Err(AppError::BusinessNameAlreadyExists);
        }
        let password = password.ok_or(AppError::PasswordRequired)?;
        let password_hash = hash_password(password).await?;

        let tenant = self
            .tenant_repo
            .create(&mut *tx, profile.fields(), &password_hash, AccountStatus::Pending)
            .await?;
        let (issued, hash) = self.issue_token()?;
        let request = self.onboarding_repo.create(&mut *tx, tenant.id, &hash, issued.expires_at).await?;

        tx.commit().await?;

        tracing::info!(
            tenant_id = %tenant.id,
            signup_id = %request.id,
            store_kind = ?profile.location.kind,
            "🆕 Cadastro de microempresa iniciado"
        );
        Ok(StartOutcome {
            mode: StartMode::Created,
            tenant_id: tenant.id,
            signup_id: request.id,
            token: Some(issued),
        })
    }

    async fn edit_existing(
        &self,
        request: OnboardingRequest,
        profile: &SignupProfile,
        password: Option<&str>,
        token: Option<&str>,
    ) -> Result<StartOutcome, AppError> {
        if request.state.is_locked() {
            return Err(AppError::OnboardingLocked);
        }
        self.check_token(&request, token)?;

        let password_hash = match password {
            Some(p) => Some(hash_password(p).await?),
            None => None,
        };

        let mut tx = self.pool.begin().await?;

        let tenant = self
            .tenant_repo
            .find_by_id_for_update(&mut *tx, request.tenant_id)
            .await?
            .ok_or(AppError::TenantNotFound)?;
        if tenant.status != AccountStatus::Pending {
            return Err(AppError::TenantNotPending);
        }

        if let Some(other) = self.tenant_repo.find_by_email(&mut *tx, &profile.email).await? {
            if other.id != tenant.id {
                return Err(AppError::EmailAlreadyExists);
            }
        }
        if self.tenant_repo.business_name_taken(&mut *tx, &profile.business_name, Some(tenant.id)).await? {
            return Err(AppError::BusinessNameAlreadyExists);
        }

        self.tenant_repo.update_profile(&mut *tx, tenant.id, profile.fields()).await?;
        if let Some(hash) = password_hash {
            self.tenant_repo.update_password(&mut *tx, tenant.id, &hash).await?;
        }

        // A solicitação pode ter sido enviada por outra requisição nesse meio tempo
        let current = self
            .onboarding_repo
            .find_by_id(&mut *tx, request.id)
            .await?
            .ok_or(AppError::OnboardingNotFound)?;
        if current.state.is_locked() {
            return Err(AppError::OnboardingLocked);
        }

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant.id, signup_id = %request.id, "Cadastro atualizado");
        Ok(StartOutcome {
            mode: StartMode::Edited,
            tenant_id: tenant.id,
            signup_id: request.id,
            token: None,
        })
    }

    // ===========================================================================
    // PASSO 2: PLANO E COMPROVANTE
    // ===========================================================================

    async fn active_plan(&self, plan_id: Uuid) -> Result<(), AppError> {
        match self.plan_repo.find_by_id(&self.pool, plan_id).await? {
            Some(plan) if plan.status == CatalogStatus::Active => Ok(()),
            _ => Err(AppError::InvalidPlan),
        }
    }

    pub async fn select_plan(
        &self,
        signup_id: Uuid,
        plan_id: Uuid,
        token: Option<&str>,
    ) -> Result<OnboardingRequest, AppError> {
        let request = self
            .onboarding_repo
            .find_by_id(&self.pool, signup_id)
            .await?
            .ok_or(AppError::OnboardingNotFound)?;
        if request.state.is_locked() {
            return Err(AppError::OnboardingLocked);
        }
        self.check_token(&request, token)?;
        self.active_plan(plan_id).await?;

        let updated = self
            .onboarding_repo
            .select_plan(&self.pool, signup_id, plan_id)
            .await?
            .ok_or(AppError::OnboardingLocked)?;

        tracing::info!(%signup_id, %plan_id, "Plano selecionado");
        Ok(updated)
    }

    /// Envia o comprovante e leva a solicitação para `awaiting_review`.
    /// Nada é gravado (nem em disco) se alguma verificação falhar.
    pub async fn submit(
        &self,
        signup_id: Uuid,
        plan_id: Uuid,
        token: Option<&str>,
        filename: &str,
        bytes: &[u8],
    ) -> Result<OnboardingRequest, AppError> {
        proof_extension(filename)?;

        let request = self
            .onboarding_repo
            .find_by_id(&self.pool, signup_id)
            .await?
            .ok_or(AppError::OnboardingNotFound)?;
        if !request.state.can_submit() {
            return Err(AppError::OnboardingLocked);
        }
        self.check_token(&request, token)?;
        self.active_plan(plan_id).await?;

        let proof_path = self.storage.save(request.tenant_id, filename, bytes).await?;
        let qr_text = reference_text(request.id, request.tenant_id, plan_id);

        let result = async {
            let mut tx = self.pool.begin().await?;
            let updated = self
                .onboarding_repo
                .submit(&mut *tx, signup_id, plan_id, &proof_path, &qr_text)
                .await?
                .ok_or(AppError::OnboardingLocked)?;
            tx.commit().await?;
            Ok::<_, AppError>(updated)
        }
        .await;

        match result {
            Ok(updated) => {
                tracing::info!(%signup_id, tenant_id = %updated.tenant_id, %plan_id, "📎 Comprovante enviado; aguardando revisão");
                Ok(updated)
            }
            Err(e) => {
                self.storage.remove(&proof_path).await;
                Err(e)
            }
        }
    }

    pub async fn status(&self, signup_id: Uuid) -> Result<OnboardingRequest, AppError> {
        self.onboarding_repo
            .find_by_id(&self.pool, signup_id)
            .await?
            .ok_or(AppError::OnboardingNotFound)
    }

    /// QR (SVG) do texto de referência do pagamento.
    pub async fn qr_svg(&self, signup_id: Uuid) -> Result<String, AppError> {
        let request = self.status(signup_id).await?;
        let text = request.qr_text.ok_or(AppError::QrNotAvailable)?;
        render_qr_svg(&text)
    }

    // ===========================================================================
    // REVISÃO (super usuário)
    // ===========================================================================

    pub async fn list_pending(&self) -> Result<Vec<PendingReview>, AppError> {
        let mut rows = self.onboarding_repo.list_pending().await?;
        for row in &mut rows {
            row.proof_url = Some(format!("/api/onboarding/microempresa/proof/{}", row.signup_id));
        }
        Ok(rows)
    }

    pub async fn proof(&self, signup_id: Uuid) -> Result<ProofFile, AppError> {
        let request = self.status(signup_id).await?;
        let path = request.proof_path.filter(|p| !p.is_empty()).ok_or(AppError::ProofNotFound)?;
        let bytes = self.storage.read(&path).await?;
        let filename = path.rsplit('/').next().unwrap_or("comprobante").to_string();
        Ok(ProofFile { bytes, content_type: content_type_for(&path), filename })
    }

    /// Aprova ou rejeita a solicitação mais recente da microempresa, tudo numa transação.
    pub async fn review(
        &self,
        tenant_id: Uuid,
        decision: ReviewDecision,
        reviewer_id: Uuid,
        note: Option<&str>,
    ) -> Result<ReviewOutcome, AppError> {
        let note = non_blank(note);
        let mut tx = self.pool.begin().await?;

        let tenant: Tenant = self
            .tenant_repo
            .find_by_id_for_update(&mut *tx, tenant_id)
            .await?
            .ok_or(AppError::TenantNotFound)?;
        let request = self
            .onboarding_repo
            .find_latest_for_tenant(&mut *tx, tenant.id)
            .await?
            .ok_or(AppError::OnboardingNotFound)?;

        if !request.state.can_review() {
            return Err(AppError::InvalidTransition);
        }

        let outcome = match decision {
            ReviewDecision::Approve => {
                let plan_id = request.plan_id.ok_or(AppError::InvalidTransition)?;
                let reviewed = self
                    .onboarding_repo
                    .review(&mut *tx, request.id, decision.target_state(), reviewer_id, note)
                    .await?
                    .ok_or(AppError::InvalidTransition)?;

                self.tenant_repo
                    .set_status(&mut *tx, tenant.id, AccountStatus::Active)
                    .await?
                    .ok_or(AppError::TenantNotFound)?;

                let starts_at = Utc::now();
                let ends_at = starts_at + Duration::days(self.subscription_days);
                let subscription = self
                    .subscription_repo
                    .create(&mut *tx, tenant.id, plan_id, reviewed.id, starts_at, ends_at)
                    .await?;

                ReviewOutcome::Approved { request: reviewed, subscription }
            }
            ReviewDecision::Reject => {
                let reviewed = self
                    .onboarding_repo
                    .review(&mut *tx, request.id, decision.target_state(), reviewer_id, note)
                    .await?
                    .ok_or(AppError::InvalidTransition)?;

                self.tenant_repo
                    .set_status(&mut *tx, tenant.id, AccountStatus::Inactive)
                    .await?
                    .ok_or(AppError::TenantNotFound)?;

                ReviewOutcome::Rejected { request: reviewed }
            }
        };

        tx.commit().await?;

        tracing::info!(
            %tenant_id,
            signup_id = %request.id,
            %reviewer_id,
            ?decision,
            "✅ Solicitação de assinatura revisada"
        );
        Ok(outcome)
    }
}

pub fn render_qr_svg(text: &str) -> Result<String, AppError> {
    let code = QrCode::new(text.as_bytes())
        .map_err(|e| AppError::InternalServerError(anyhow::Error::msg(e.to_string())))?;
    Ok(code
        .render::<svg::Color>()
        .min_dimensions(256, 256)
        .quiet_zone(true)
        .build())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload() -> StartOnboardingPayload {
        StartOnboardingPayload {
            signup_id: None,
            onboarding_token: None,
            business_name: Some("  Bodega Rosa ".into()),
            owner_first_name: Some("Rosa".into()),
            owner_paternal_surname: Some("Diaz".into()),
            owner_maternal_surname: Some("Paz".into()),
            address: Some("Av. Sol 123".into()),
            schedule: Some("09:00 - 18:00".into()),
            email: Some(" Rosa@Bodega.PE ".into()),
            password: Some("secreto".into()),
            logo_url: None,
            store_kind: None,
        }
    }

    #[test]
    fn profile_is_trimmed_and_email_normalized() {
        let profile = SignupProfile::from_payload(&payload()).unwrap();
        assert_eq!(profile.business_name, "Bodega Rosa");
        assert_eq!(profile.email, "rosa@bodega.pe");
        assert_eq!(profile.location.schedule, "09:00 - 18:00");
    }

    #[test]
    fn missing_owner_fields_are_listed() {
        let mut p = payload();
        p.owner_first_name = None;
        p.email = Some("   ".into());
        match SignupProfile::from_payload(&p) {
            Err(AppError::MissingFields(fields)) => assert_eq!(fields, "owner_first_name, email"),
            other => panic!("esperava MissingFields, veio {other:?}"),
        }
    }

    #[test]
    fn online_store_gets_placeholders() {
        let mut p = payload();
        p.address = Some("".into());
        p.schedule = Some("Atención online 24h".into());
        let profile = SignupProfile::from_payload(&p).unwrap();
        assert_eq!(profile.location.address, crate::models::tenant::VIRTUAL_ADDRESS_PLACEHOLDER);
        assert_eq!(profile.location.schedule, "Atención online 24h");
    }

    #[test]
    fn physical_store_with_bad_hours_is_rejected() {
        let mut p = payload();
        p.schedule = Some("18:00 - 09:00".into());
        assert!(matches!(SignupProfile::from_payload(&p), Err(AppError::InvalidSchedule)));
    }

    #[test]
    fn qr_is_rendered_as_svg() {
        let svg = render_qr_svg("MICROEMPRESA_SAAS|SIGNUP:1|TENANT:2|PLAN:3").unwrap();
        assert!(svg.contains("<svg"));
    }
}
