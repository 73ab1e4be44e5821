// src/services/storage_service.rs

use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::{fs, io::AsyncWriteExt};
use uuid::Uuid;

use crate::common::error::AppError;

pub const ALLOWED_PROOF_EXTENSIONS: [&str; 4] = ["pdf", "png", "jpg", "jpeg"];

// Subpasta fixa dos comprovantes dentro da raiz de uploads
const PROOF_SUBDIR: &str = "comprobantes";

/// Extensão permitida do comprovante, em minúsculas.
pub fn proof_extension(filename: &str) -> Result<String, AppError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .ok_or(AppError::InvalidFileType)?;
    if ALLOWED_PROOF_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ext)
    } else {
        Err(AppError::InvalidFileType)
    }
}

/// Nome seguro montado do radical do original mais a extensão já validada.
/// No radical só ficam ASCII alfanumérico, `.`, `-` e `_`; espaços viram `_`.
pub fn stored_filename(original: &str, extension: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or_default();
    let stem = Path::new(base).file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_matches(['.', '_']);
    let stem = if cleaned.is_empty() { "comprobante" } else { cleaned };
    format!("{stem}.{extension}")
}

pub fn content_type_for(path: &str) -> &'static str {
    match Path::new(path).extension().and_then(|e| e.to_str()).map(str::to_lowercase).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

/// Armazena comprovantes de pagamento em disco, uma pasta por microempresa.
#[derive(Clone, Debug)]
pub struct ProofStorage {
    root: PathBuf,
}

impl ProofStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Grava o arquivo e devolve o caminho relativo à raiz, que é o que vai para o banco.
    pub async fn save(&self, tenant_id: Uuid, original_name: &str, bytes: &[u8]) -> Result<String, AppError> {
        let extension = proof_extension(original_name)?;
        let dir = Path::new(PROOF_SUBDIR).join(tenant_id.to_string());
        fs::create_dir_all(self.root.join(&dir)).await?;

        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let suffix = format!("{:08x}", rand::random::<u32>());
        let filename = format!("{}_{}_{}", stamp, suffix, stored_filename(original_name, &extension));
        let relative = dir.join(&filename);

        // create_new: nunca sobrescreve um comprovante existente
        let mut file = fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(self.root.join(&relative))
            .await?;
        file.write_all(bytes).await?;
        file.flush().await?;

        let relative = relative.to_string_lossy().replace('\\', "/");
        tracing::info!(%tenant_id, path = %relative, size = bytes.len(), "Comprovante gravado");
        Ok(relative)
    }

    pub async fn read(&self, relative: &str) -> Result<Vec<u8>, AppError> {
        let path = self.resolve(relative)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(AppError::ProofNotFound),
            Err(e) => Err(e.into()),
        }
    }

    /// Remoção de melhor esforço (usada quando a transição falha depois do upload).
    /// A pasta da microempresa também sai se ficar vazia.
    pub async fn remove(&self, relative: &str) {
        let Ok(path) = self.resolve(relative) else { return };
        if let Err(e) = fs::remove_file(&path).await {
            tracing::warn!(path = %path.display(), "Falha ao remover comprovante órfão: {}", e);
            return;
        }
        if let Some(dir) = path.parent() {
            // remove_dir só apaga pasta vazia
            let _ = fs::remove_dir(dir).await;
        }
    }

    /// Só aceita caminhos relativos, sem `..`, dentro da raiz.
    fn resolve(&self, relative: &str) -> Result<PathBuf, AppError> {
        let path = Path::new(relative);
        let safe = path.components().all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative.is_empty() {
            return Err(AppError::ProofNotFound);
        }
        Ok(self.root.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_documents_and_images_are_accepted() {
        assert_eq!(proof_extension("pago.PDF").unwrap(), "pdf");
        assert_eq!(proof_extension("foto.jpeg").unwrap(), "jpeg");
        assert!(matches!(proof_extension("virus.exe"), Err(AppError::InvalidFileType)));
        assert!(matches!(proof_extension("sin_extension"), Err(AppError::InvalidFileType)));
        assert!(matches!(proof_extension("pdf"), Err(AppError::InvalidFileType)));
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(stored_filename("../../etc/recibo.pdf", "pdf"), "recibo.pdf");
        assert_eq!(stored_filename("mi pago (1).png", "png"), "mi_pago_1.png");
        assert_eq!(stored_filename("C:\\docs\\voucher.JPG", "jpg"), "voucher.jpg");
        assert_eq!(stored_filename("...pdf", "pdf"), "comprobante.pdf");
    }

    #[test]
    fn non_ascii_names_keep_the_extension() {
        let name = stored_filename("ñ.pdf", "pdf");
        assert_eq!(name, "comprobante.pdf");
        assert_eq!(content_type_for(&name), "application/pdf");
        assert_eq!(stored_filename("niño señal.png", "png"), "nio_seal.png");
    }

    #[tokio::test]
    async fn removing_the_only_proof_drops_the_tenant_directory() {
        let root = tempfile::tempdir().unwrap();
        let storage = ProofStorage::new(root.path());
        let tenant_id = Uuid::new_v4();
        let tenant_dir = root.path().join(PROOF_SUBDIR).join(tenant_id.to_string());

        let first = storage.save(tenant_id, "pago.pdf", b"%PDF-1.4").await.unwrap();
        let second = storage.save(tenant_id, "pago.png", b"png").await.unwrap();

        storage.remove(&second).await;
        assert!(tenant_dir.is_dir());

        storage.remove(&first).await;
        assert!(!tenant_dir.exists());
    }

    #[tokio::test]
    async fn saved_proofs_live_under_the_tenant_directory() {
        let root = tempfile::tempdir().unwrap();
        let storage = ProofStorage::new(root.path());
        let tenant_id = Uuid::new_v4();

        let first = storage.save(tenant_id, "pago.pdf", b"%PDF-1.4").await.unwrap();
        let second = storage.save(tenant_id, "pago.pdf", b"%PDF-1.4").await.unwrap();

        assert!(first.starts_with(&format!("{PROOF_SUBDIR}/{tenant_id}/")));
        assert!(first.ends_with("_pago.pdf"));
        assert_ne!(first, second);
        assert_eq!(storage.read(&first).await.unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn traversal_paths_are_refused() {
        let root = tempfile::tempdir().unwrap();
        let storage = ProofStorage::new(root.path());
        assert!(matches!(storage.read("../secret.pdf").await, Err(AppError::ProofNotFound)));
        assert!(matches!(storage.read("/etc/passwd").await, Err(AppError::ProofNotFound)));
        assert!(matches!(storage.read("comprobantes/x.pdf").await, Err(AppError::ProofNotFound)));
    }
}
