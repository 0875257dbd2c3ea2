use std::collections::HashSet;

use chrono::Utc;
use sea_orm::TransactionTrait;

use crate::{BusinessType, EngineError, ReceiptMap, ResultEngine, StoredFile, Upload};

use super::{Engine, receipts::ensure_not_empty, with_tx};

impl Engine {
    /// Attaches several receipts in one transaction.
    ///
    /// `types[i]` is the business type of `uploads[i]`. The receipt map is
    /// read once, updated in memory for every file and written once at the
    /// end. If anything fails, every file of the batch is removed.
    ///
    /// Returns the relative URLs in upload order.
    pub async fn attach_receipts_batch(
        &self,
        caja_id: i32,
        types: &[BusinessType],
        uploads: Vec<Upload>,
    ) -> ResultEngine<Vec<String>> {
        check_batch(types, &uploads)?;
        let stored = self.store_uploads(&uploads).await?;

        let result = self.bind_batch(caja_id, types, &stored).await;
        if result.is_err() {
            self.discard_uploads(&stored).await;
        }
        let urls = result?;
        tracing::info!("caja {caja_id}: {} receipts attached in batch", urls.len());
        Ok(urls)
    }

    async fn bind_batch(
        &self,
        caja_id: i32,
        types: &[BusinessType],
        stored: &[StoredFile],
    ) -> ResultEngine<Vec<String>> {
        let now = Utc::now();
        with_tx!(self, |db_tx| {
            let caja = self.require_caja(&db_tx, caja_id).await?;

            let mut urls = Vec::with_capacity(stored.len());
            for (business_type, file) in types.iter().zip(stored) {
                let url = file.relative_url();
                self.bind_receipt_rows(&db_tx, caja_id, *business_type, &url, now)
                    .await?;
                urls.push(url);
            }

            let receipts = merge_batch(caja.receipt_map(), types, &urls);
            self.write_receipt_map(&db_tx, caja_id, &receipts).await?;
            Ok(urls)
        })
    }
}

fn check_batch(types: &[BusinessType], uploads: &[Upload]) -> ResultEngine<()> {
    if uploads.is_empty() {
        return Err(EngineError::Validation(
            "at least one receipt is required".to_string(),
        ));
    }
    if uploads.len() != types.len() {
        return Err(EngineError::Validation(format!(
            "{} receipts but {} business types",
            uploads.len(),
            types.len()
        )));
    }
    let mut seen = HashSet::with_capacity(types.len());
    if let Some(repeated) = types.iter().find(|business_type| !seen.insert(**business_type)) {
        return Err(EngineError::Validation(format!(
            "business type {} appears more than once in the batch",
            repeated.code()
        )));
    }
    uploads.iter().try_for_each(ensure_not_empty)
}

/// Folds the batch into the existing map.
fn merge_batch(mut receipts: ReceiptMap, types: &[BusinessType], urls: &[String]) -> ReceiptMap {
    for (business_type, url) in types.iter().zip(urls) {
        receipts.insert(*business_type, url.clone());
    }
    receipts
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business(code: &str) -> BusinessType {
        BusinessType::parse(code).unwrap()
    }

    fn upload() -> Upload {
        Upload::new(Some("r.jpg".to_string()), vec![1, 2, 3])
    }

    #[test]
    fn check_batch_requires_matching_lengths() {
        let types = [business("minicargas"), business("wepa")];
        assert_eq!(
            check_batch(&types, &[upload()]),
            Err(EngineError::Validation(
                "1 receipts but 2 business types".to_string()
            ))
        );
        assert!(check_batch(&types, &[upload(), upload()]).is_ok());
    }

    #[test]
    fn check_batch_rejects_empty_input() {
        assert!(check_batch(&[], &[]).is_err());
        assert!(check_batch(&[business("netel")], &[Upload::default()]).is_err());
    }

    #[test]
    fn check_batch_rejects_repeated_business_type() {
        let types = [business("minicargas"), business("wepa"), business("minicargas")];
        assert_eq!(
            check_batch(&types, &[upload(), upload(), upload()]),
            Err(EngineError::Validation(
                "business type minicargas appears more than once in the batch".to_string()
            ))
        );
    }

    #[test]
    fn merge_batch_keeps_existing_entries() {
        let mut existing = ReceiptMap::default();
        existing.insert(business("claroGiros"), "/uploads/old.png");
        existing.insert(business("minicargas"), "/uploads/older.png");

        let merged = merge_batch(
            existing,
            &[business("minicargas"), business("aquiPago")],
            &["/uploads/a.png".to_string(), "/uploads/b.png".to_string()],
        );

        assert_eq!(merged.len(), 3);
        assert_eq!(merged.get("claroGiros"), Some("/uploads/old.png"));
        assert_eq!(merged.get("aquiPago"), Some("/uploads/b.png"));
        assert_eq!(merged.get("minicargas"), Some("/uploads/a.png"));
    }
}
