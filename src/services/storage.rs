// src/services/storage.rs

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use tokio::fs;
use uuid::Uuid;

use crate::{common::error::AppError, models::service_orders::AttachmentInput};

/// Limite por anexo depois de decodificado.
pub const MAX_ATTACHMENT_BYTES: usize = 10 * 1024 * 1024;

/// Armazenamento de anexos (fotos de problemas e comprovações).
#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Grava o arquivo e devolve a URL pública.
    async fn upload(&self, path: &str, data: Vec<u8>, mime_type: &str) -> Result<String, AppError>;
    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError>;
    async fn delete(&self, path: &str) -> Result<(), AppError>;
}

/// Disco local, servido pelo `ServeDir` em `public_url`.
pub struct LocalFileStorage {
    base_dir: PathBuf,
    public_url: String,
}

impl LocalFileStorage {
    pub async fn new(
        base_dir: impl Into<PathBuf>,
        public_url: impl Into<String>,
    ) -> Result<Self, AppError> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        Ok(Self {
            base_dir,
            public_url: public_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, AppError> {
        let relative = Path::new(path);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !safe {
            return Err(AppError::InvalidAttachment(path.to_string()));
        }
        Ok(self.base_dir.join(relative))
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn upload(&self, path: &str, data: Vec<u8>, _mime_type: &str) -> Result<String, AppError> {
        let full = self.resolve(path)?;
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::StorageError(e.to_string()))?;
        }
        fs::write(&full, data)
            .await
            .map_err(|e| AppError::StorageError(e.to_string()))?;
        Ok(format!("{}/{}", self.public_url, path))
    }

    async fn download(&self, path: &str) -> Result<Vec<u8>, AppError> {
        let full = self.resolve(path)?;
        match fs::read(&full).await {
            Ok(data) => Ok(data),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::ResourceNotFound("Arquivo".into()))
            }
            Err(e) => Err(AppError::StorageError(e.to_string())),
        }
    }

    async fn delete(&self, path: &str) -> Result<(), AppError> {
        let full = self.resolve(path)?;
        match fs::remove_file(&full).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::StorageError(e.to_string())),
        }
    }
}

/// Anexo decodificado, pronto para subir.
#[derive(Debug)]
pub struct DecodedAttachment {
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

pub fn decode_attachment(input: &AttachmentInput) -> Result<DecodedAttachment, AppError> {
    let data = STANDARD
        .decode(input.content_base64.trim())
        .map_err(|_| AppError::InvalidAttachment(input.file_name.clone()))?;
    if data.is_empty() || data.len() > MAX_ATTACHMENT_BYTES {
        return Err(AppError::InvalidAttachment(input.file_name.clone()));
    }
    Ok(DecodedAttachment {
        file_name: sanitize_file_name(&input.file_name),
        mime_type: input.mime_type.clone(),
        data,
    })
}

/// Caminho do objeto: `<loja>/<ordem>/<tipo>/<uuid>-<nome>`.
pub fn object_path(store_id: Uuid, order_id: Uuid, kind: &str, file_name: &str) -> String {
    format!("{store_id}/{order_id}/{kind}/{}-{file_name}", Uuid::new_v4())
}

fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "arquivo".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attachment(name: &str, content: &str) -> AttachmentInput {
        AttachmentInput {
            file_name: name.into(),
            mime_type: "image/jpeg".into(),
            content_base64: content.into(),
        }
    }

    #[tokio::test]
    async fn upload_then_download_returns_same_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = LocalFileStorage::new(dir.path(), "/files/").await.expect("storage");

        let url = storage
            .upload("loja/ordem/problema/foto.jpg", b"abc".to_vec(), "image/jpeg")
            .await
            .expect("upload");
        assert_eq!(url, "/files/loja/ordem/problema/foto.jpg");

        let data = storage.download("loja/ordem/problema/foto.jpg").await.expect("download");
        assert_eq!(data, b"abc");
    }

    #[tokio::test]
    async fn path_traversal_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = LocalFileStorage::new(dir.path(), "/files").await.expect("storage");

        let err = storage.download("../etc/passwd").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidAttachment(_)));
        let err = storage.upload("/abs/path", vec![1], "text/plain").await.unwrap_err();
        assert!(matches!(err, AppError::InvalidAttachment(_)));
    }

    #[tokio::test]
    async fn missing_file_is_not_found_and_delete_is_idempotent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = LocalFileStorage::new(dir.path(), "/files").await.expect("storage");

        assert!(matches!(
            storage.download("nada.jpg").await,
            Err(AppError::ResourceNotFound(_))
        ));
        storage.delete("nada.jpg").await.expect("delete");
    }

    #[test]
    fn decode_rejects_bad_base64_and_cleans_names() {
        assert!(decode_attachment(&attachment("a.jpg", "%%%")).is_err());
        assert!(decode_attachment(&attachment("a.jpg", "")).is_err());

        let decoded = decode_attachment(&attachment("../foto da porta.jpg", "YWJj")).expect("decode");
        assert_eq!(decoded.data, b"abc");
        assert_eq!(decoded.file_name, "_foto_da_porta.jpg");
    }
}
