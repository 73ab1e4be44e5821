// src/services/security.rs

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bcrypt::{hash, verify, DEFAULT_COST};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

use crate::common::error::AppError;

type HmacSha256 = Hmac<Sha256>;

/// Bytes aleatórios de cada token de uso único.
pub const TOKEN_BYTES: usize = 24;

// ===========================================================================
// SENHAS
// ===========================================================================

/// Gera o hash bcrypt fora do runtime assíncrono.
pub async fn hash_password(password: &str) -> Result<String, AppError> {
    let password = password.to_owned();
    let hashed = tokio::task::spawn_blocking(move || hash(&password, DEFAULT_COST))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de hashing: {}", e))??;
    Ok(hashed)
}

/// Verifica uma senha contra o hash gravado.
/// Aceita bcrypt e o formato legado (sha256 em hex).
pub async fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    if is_legacy_hash(stored_hash) {
        return Ok(verify_legacy(password, stored_hash));
    }
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    let ok = tokio::task::spawn_blocking(move || verify(&password, &stored_hash))
        .await
        .map_err(|e| anyhow::anyhow!("Falha na task de verificação de senha: {}", e))?
        // Hash corrompido conta como senha errada, não como erro interno
        .unwrap_or(false);
    Ok(ok)
}

/// Hashes legados precisam ser regravados com bcrypt após um login válido.
pub fn needs_rehash(stored_hash: &str) -> bool {
    is_legacy_hash(stored_hash)
}

fn is_legacy_hash(stored_hash: &str) -> bool {
    stored_hash.len() == 64 && stored_hash.bytes().all(|b| b.is_ascii_hexdigit())
}

fn verify_legacy(password: &str, stored_hash: &str) -> bool {
    let computed = hex::encode(Sha256::digest(password.as_bytes()));
    constant_time_eq(computed.as_bytes(), stored_hash.to_ascii_lowercase().as_bytes())
}

// ===========================================================================
// TOKENS DE USO ÚNICO (onboarding e recuperação de senha)
// ===========================================================================

/// Gera um token aleatório em base64 url-safe.
pub fn generate_token() -> Result<String, AppError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| anyhow::anyhow!("Falha ao gerar token aleatório: {}", e))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

/// Hash com chave (HMAC-SHA256) dos tokens; só o hash vai para o banco.
#[derive(Clone)]
pub struct TokenHasher {
    mac: HmacSha256,
}

impl TokenHasher {
    pub fn new(secret: &str) -> anyhow::Result<Self> {
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| anyhow::anyhow!("Chave HMAC inválida: {}", e))?;
        Ok(Self { mac })
    }

    pub fn hash(&self, token: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(token.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Confere o token contra o hash gravado e a validade.
    /// Qualquer falha tem o mesmo resultado: `false`.
    pub fn verify(&self, token: &str, stored_hash: &str, expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        let matches = constant_time_eq(self.hash(token).as_bytes(), stored_hash.as_bytes());
        matches && now < expires_at
    }
}

pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn generated_tokens_are_url_safe_and_unique() {
        let a = generate_token().unwrap();
        let b = generate_token().unwrap();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn token_hash_depends_on_the_key() {
        let token = "abc";
        assert_ne!(TokenHasher::new("k1").unwrap().hash(token), TokenHasher::new("k2").unwrap().hash(token));
        assert_eq!(TokenHasher::new("k1").unwrap().hash(token).len(), 64);
    }

    #[test]
    fn token_verifies_only_before_expiry() {
        let hasher = TokenHasher::new("segredo").unwrap();
        let now = Utc::now();
        let stored = hasher.hash("tok");
        assert!(hasher.verify("tok", &stored, now + Duration::minutes(1), now));
        assert!(!hasher.verify("tok", &stored, now, now));
        assert!(!hasher.verify("tok", &stored, now - Duration::seconds(1), now));
        assert!(!hasher.verify("outro", &stored, now + Duration::minutes(1), now));
    }

    #[tokio::test]
    async fn legacy_sha256_hashes_still_verify() {
        let legacy = hex::encode(Sha256::digest(b"clave123"));
        assert!(needs_rehash(&legacy));
        assert!(verify_password("clave123", &legacy).await.unwrap());
        assert!(!verify_password("clave124", &legacy).await.unwrap());
    }

    #[tokio::test]
    async fn new_hashes_use_bcrypt() {
        let hashed = hash_password("clave123").await.unwrap();
        assert!(hashed.starts_with("$2"));
        assert!(!needs_rehash(&hashed));
        assert!(verify_password("clave123", &hashed).await.unwrap());
    }

    #[tokio::test]
    async fn garbage_hash_fails_closed() {
        assert!(!verify_password("x", "not-a-hash").await.unwrap());
    }
}
