use std::sync::Arc;

use sea_orm::DatabaseConnection;

use crate::{DiskStorage, EngineError, ReceiptStorage, ResultEngine};

mod access;
mod batch;
mod cajas;
mod closing;
mod movements;
mod receipts;
mod withdrawals;

pub use closing::ClosingData;
pub use movements::CajaMovements;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    storage: Arc<dyn ReceiptStorage>,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Public URL of a stored relative receipt URL.
    pub fn public_url(&self, relative: &str) -> String {
        self.storage.public_url(relative)
    }
}

fn normalize_required_text(value: &str, label: &str) -> ResultEngine<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{label} must not be empty")));
    }
    Ok(trimmed.to_string())
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
    storage: Option<Arc<dyn ReceiptStorage>>,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Pass the receipt storage. Defaults to a [`DiskStorage`] on `./uploads`.
    pub fn storage(mut self, storage: Arc<dyn ReceiptStorage>) -> EngineBuilder {
        self.storage = Some(storage);
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            storage: self
                .storage
                .unwrap_or_else(|| Arc::new(DiskStorage::default())),
        })
    }
}
