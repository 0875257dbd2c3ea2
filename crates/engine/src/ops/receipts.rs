//! Receipt attachment.
//!
//! Every operation here is a three-stage saga: the file is written to storage
//! first, then the database transaction binds it to the ledger rows and the
//! register's receipt map. When the transaction fails the file is removed
//! again, retrying a few times; a removal that still fails is logged and the
//! transaction error is returned unchanged.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    BusinessType, Caja, EngineError, ReceiptMap, ResultEngine, StoredFile, Upload, cajas,
    movements,
};

use super::{Engine, with_tx};

const REMOVE_ATTEMPTS: u32 = 3;

impl Engine {
    /// Attaches a receipt to the ledger rows of `business_type` and records it
    /// in the register's receipt map, keeping the other entries.
    pub async fn attach_receipt(
        &self,
        caja_id: i32,
        business_type: BusinessType,
        upload: Upload,
    ) -> ResultEngine<Caja> {
        ensure_not_empty(&upload)?;
        let stored = self.storage.store(&upload).await?;
        let url = stored.relative_url();

        let result = self.bind_receipt(caja_id, business_type, &url).await;
        if result.is_err() {
            self.discard_uploads(std::slice::from_ref(&stored)).await;
        }
        let model = result?;
        tracing::info!("caja {caja_id}: receipt {} attached as {url}", business_type.code());
        Caja::try_from(model)
    }

    /// Replaces the receipt of `business_type`, returning the new relative
    /// URL. The previous file stays in storage.
    pub async fn update_receipt(
        &self,
        caja_id: i32,
        business_type: BusinessType,
        upload: Upload,
    ) -> ResultEngine<String> {
        ensure_not_empty(&upload)?;
        let stored = self.storage.store(&upload).await?;
        let url = stored.relative_url();

        let result = self.bind_receipt(caja_id, business_type, &url).await;
        if result.is_err() {
            self.discard_uploads(std::slice::from_ref(&stored)).await;
        }
        result?;
        tracing::info!("caja {caja_id}: receipt {} replaced by {url}", business_type.code());
        Ok(url)
    }

    /// Relative URL of the receipt stored for `business_type`.
    pub async fn resolve_receipt(
        &self,
        caja_id: i32,
        business_type: BusinessType,
    ) -> ResultEngine<String> {
        with_tx!(self, |db_tx| {
            let caja = self.require_caja(&db_tx, caja_id).await?;
            caja.receipt_map()
                .get(business_type.code())
                .map(ToString::to_string)
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!(
                        "caja {caja_id} has no {} receipt",
                        business_type.code()
                    ))
                })
        })
    }

    /// Content of a stored receipt.
    pub async fn receipt_file(&self, filename: &str) -> ResultEngine<Vec<u8>> {
        self.storage.read(filename).await
    }

    async fn bind_receipt(
        &self,
        caja_id: i32,
        business_type: BusinessType,
        url: &str,
    ) -> ResultEngine<cajas::Model> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let caja = self.require_caja(&db_tx, caja_id).await?;
            self.bind_receipt_rows(&db_tx, caja_id, business_type, url, now)
                .await?;

            let mut receipts = caja.receipt_map();
            if let Some(previous) = receipts.insert(business_type, url) {
                tracing::debug!("caja {caja_id}: {} no longer points to {previous}", business_type.code());
            }
            self.write_receipt_map(&db_tx, caja_id, &receipts).await
        })
    }

    /// Sets `receipt_path` on every ledger row the business type targets.
    ///
    /// When several rows share the operator and service the most recent one
    /// is updated; when there is none a zero-amount row is created to carry
    /// the receipt.
    pub(super) async fn bind_receipt_rows(
        &self,
        db: &DatabaseTransaction,
        caja_id: i32,
        business_type: BusinessType,
        url: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<()> {
        for key in business_type.targets() {
            let existing = movements::Entity::find()
                .filter(movements::Column::CajaId.eq(caja_id))
                .filter(movements::Column::OperatorName.eq(key.operator.as_str()))
                .filter(movements::Column::ServiceName.eq(key.service.as_str()))
                .order_by_desc(movements::Column::Id)
                .one(db)
                .await?;

            match existing {
                Some(row) => {
                    let mut row: movements::ActiveModel = row.into();
                    row.receipt_path = ActiveValue::Set(Some(url.to_string()));
                    row.update(db).await?;
                }
                None => {
                    movements::ActiveModel::new_line(
                        caja_id,
                        key,
                        Decimal::ZERO,
                        Some(url.to_string()),
                        now,
                    )
                    .insert(db)
                    .await?;
                }
            }
        }
        Ok(())
    }

    pub(super) async fn write_receipt_map(
        &self,
        db: &DatabaseTransaction,
        caja_id: i32,
        receipts: &ReceiptMap,
    ) -> ResultEngine<cajas::Model> {
        let update = cajas::ActiveModel {
            id: ActiveValue::Unchanged(caja_id),
            receipts: ActiveValue::Set(Some(receipts.encode())),
            ..Default::default()
        };
        update.update(db).await.map_err(Into::into)
    }

    /// Writes every upload, removing the ones already written if a later one
    /// fails.
    pub(super) async fn store_uploads(&self, uploads: &[Upload]) -> ResultEngine<Vec<StoredFile>> {
        let mut stored = Vec::with_capacity(uploads.len());
        for upload in uploads {
            match self.storage.store(upload).await {
                Ok(file) => stored.push(file),
                Err(err) => {
                    self.discard_uploads(&stored).await;
                    return Err(err);
                }
            }
        }
        Ok(stored)
    }

    /// Compensating delete of files whose transaction failed.
    pub(super) async fn discard_uploads(&self, files: &[StoredFile]) {
        for file in files {
            let mut attempt = 1;
            loop {
                match self.storage.remove(&file.filename).await {
                    Ok(()) => {
                        tracing::debug!("discarded upload {}", file.filename);
                        break;
                    }
                    Err(err) if attempt < REMOVE_ATTEMPTS => {
                        tracing::warn!(
                            "removing upload {} failed (attempt {attempt}): {err}",
                            file.filename
                        );
                        attempt += 1;
                    }
                    Err(err) => {
                        tracing::error!("upload {} left behind: {err}", file.filename);
                        break;
                    }
                }
            }
        }
    }
}

pub(super) fn ensure_not_empty(upload: &Upload) -> ResultEngine<()> {
    if upload.bytes.is_empty() {
        return Err(EngineError::Validation("receipt file is empty".to_string()));
    }
    Ok(())
}
