//! Receipt file storage.
//!
//! Storage is not transactional: a file written here is not rolled back with
//! the database. Operations that store a file and then open a database
//! transaction remove the file themselves when the transaction fails (see
//! `ops::receipts`).

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

/// Prefix of every stored receipt URL.
pub const UPLOADS_PREFIX: &str = "/uploads/";

/// An uploaded file as received from the client.
#[derive(Clone, Debug, Default)]
pub struct Upload {
    pub original_name: Option<String>,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(original_name: Option<String>, bytes: Vec<u8>) -> Self {
        Self {
            original_name,
            bytes,
        }
    }

    /// Lower-cased alphanumeric extension of the original name, if any.
    fn extension(&self) -> Option<String> {
        let name = self.original_name.as_deref()?;
        let (_, ext) = name.rsplit_once('.')?;
        let ext = ext.to_ascii_lowercase();
        (!ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric()))
            .then_some(ext)
    }

    /// Server-generated opaque file name.
    pub(crate) fn opaque_name(&self) -> String {
        let id = Uuid::new_v4().simple();
        match self.extension() {
            Some(ext) => format!("{id}.{ext}"),
            None => id.to_string(),
        }
    }
}

/// A file written to storage.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredFile {
    pub filename: String,
}

impl StoredFile {
    /// URL persisted in the database, relative to the public base URL.
    #[must_use]
    pub fn relative_url(&self) -> String {
        format!("{UPLOADS_PREFIX}{}", self.filename)
    }
}

/// Extracts the file name from a stored relative URL.
pub fn filename_from_url(url: &str) -> Option<&str> {
    url.strip_prefix(UPLOADS_PREFIX)
        .filter(|name| is_safe_filename(name))
}

fn is_safe_filename(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_')
}

#[async_trait]
pub trait ReceiptStorage: Send + Sync + std::fmt::Debug {
    /// Writes the upload under a fresh opaque name.
    async fn store(&self, upload: &Upload) -> ResultEngine<StoredFile>;

    /// Deletes a stored file. Removing a file that is already gone succeeds.
    async fn remove(&self, filename: &str) -> ResultEngine<()>;

    /// Reads a stored file back.
    async fn read(&self, filename: &str) -> ResultEngine<Vec<u8>>;

    /// Turns a stored relative URL into the public one.
    fn public_url(&self, relative: &str) -> String;
}

/// Storage on the local filesystem, one flat directory.
#[derive(Clone, Debug)]
pub struct DiskStorage {
    root: PathBuf,
    public_base_url: String,
}

impl DiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_base_url: public_base_url.into(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_of(&self, filename: &str) -> ResultEngine<PathBuf> {
        if !is_safe_filename(filename) {
            return Err(EngineError::Validation(format!(
                "invalid receipt file name: {filename}"
            )));
        }
        Ok(self.root.join(filename))
    }
}

impl Default for DiskStorage {
    fn default() -> Self {
        Self::new("uploads", "")
    }
}

#[async_trait]
impl ReceiptStorage for DiskStorage {
    async fn store(&self, upload: &Upload) -> ResultEngine<StoredFile> {
        tokio::fs::create_dir_all(&self.root).await?;
        let filename = upload.opaque_name();
        let path = self.path_of(&filename)?;
        if let Err(err) = tokio::fs::write(&path, &upload.bytes).await {
            // A partial write must not linger.
            let _ = tokio::fs::remove_file(&path).await;
            return Err(err.into());
        }
        tracing::debug!("stored receipt {}", path.display());
        Ok(StoredFile { filename })
    }

    async fn remove(&self, filename: &str) -> ResultEngine<()> {
        let path = self.path_of(filename)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    async fn read(&self, filename: &str) -> ResultEngine<Vec<u8>> {
        let path = self.path_of(filename)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                Err(EngineError::KeyNotFound(filename.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    fn public_url(&self, relative: &str) -> String {
        if relative.starts_with("http://") || relative.starts_with("https://") {
            return relative.to_string();
        }
        format!("{}{relative}", self.public_base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opaque_name_keeps_a_safe_extension() {
        let upload = Upload::new(Some("Foto Recibo.JPG".to_string()), vec![1]);
        let name = upload.opaque_name();
        assert!(name.ends_with(".jpg"));
        assert!(is_safe_filename(&name));

        let upload = Upload::new(Some("../../etc/passwd".to_string()), vec![1]);
        assert!(!upload.opaque_name().contains('/'));
    }

    #[test]
    fn filename_from_url_rejects_traversal() {
        assert_eq!(filename_from_url("/uploads/abc.png"), Some("abc.png"));
        assert_eq!(filename_from_url("/uploads/../secret"), None);
        assert_eq!(filename_from_url("/other/abc.png"), None);
    }

    #[test]
    fn public_url_prefixes_base() {
        let storage = DiskStorage::new("uploads", "https://caja.example.com/");
        assert_eq!(
            storage.public_url("/uploads/a.png"),
            "https://caja.example.com/uploads/a.png"
        );
        assert_eq!(
            storage.public_url("https://cdn.example.com/a.png"),
            "https://cdn.example.com/a.png"
        );
    }
}
