use std::collections::HashSet;

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    CashOperation, EngineError, LedgerEntry, NewCashOperationCmd, OperationKind, ReceptionStatus,
    ResultEngine, WithdrawalGroup, WithdrawalSelection, cash_operations, group_withdrawals,
    ledger_entries,
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Takes cash out of a register: one pending row per currency with a
    /// positive amount, all sharing one timestamp.
    pub async fn new_withdrawal(&self, cmd: NewCashOperationCmd) -> ResultEngine<Vec<CashOperation>> {
        self.new_cash_operation(OperationKind::Egress, cmd).await
    }

    /// Puts cash into a register. Same row shape as a withdrawal.
    pub async fn new_ingress(&self, cmd: NewCashOperationCmd) -> ResultEngine<Vec<CashOperation>> {
        self.new_cash_operation(OperationKind::Ingress, cmd).await
    }

    async fn new_cash_operation(
        &self,
        kind: OperationKind,
        cmd: NewCashOperationCmd,
    ) -> ResultEngine<Vec<CashOperation>> {
        let amounts: Vec<_> = cmd.amounts.positive().collect();
        if amounts.is_empty() {
            return Err(EngineError::Validation(
                "at least one amount must be greater than zero".to_string(),
            ));
        }
        let mut person = cmd.person;
        person.name = normalize_required_text(&person.name, "person name")?;
        let created_at = Utc::now();

        with_tx!(self, |db_tx| {
            self.require_caja(&db_tx, cmd.caja_id).await?;

            let mut rows = Vec::with_capacity(amounts.len());
            for (currency, amount) in &amounts {
                let model = cash_operations::ActiveModel::pending(
                    cmd.caja_id,
                    kind,
                    &person,
                    *currency,
                    *amount,
                    &cmd.observation,
                    created_at,
                )
                .insert(&db_tx)
                .await?;
                rows.push(CashOperation::try_from(model)?);
            }
            tracing::info!(
                "caja {}: {} {} rows for {}",
                cmd.caja_id,
                rows.len(),
                kind.as_str(),
                person.name
            );
            Ok(rows)
        })
    }

    /// Withdrawals of a register, regrouped into logical operations.
    pub async fn withdrawals(&self, caja_id: i32) -> ResultEngine<Vec<WithdrawalGroup>> {
        with_tx!(self, |db_tx| {
            self.require_caja(&db_tx, caja_id).await?;
            let rows = cash_operations::Entity::find()
                .filter(cash_operations::Column::CajaId.eq(caja_id))
                .filter(cash_operations::Column::Kind.eq(OperationKind::Egress.as_str()))
                .order_by_asc(cash_operations::Column::Id)
                .all(&db_tx)
                .await?;
            let rows = rows
                .into_iter()
                .map(CashOperation::try_from)
                .collect::<ResultEngine<Vec<_>>>()?;
            Ok(group_withdrawals(rows))
        })
    }

    /// Deletes withdrawal rows, returning the deleted ids.
    ///
    /// A [`WithdrawalSelection::Many`] is all or nothing: every id must be an
    /// existing withdrawal and all of them must belong to one register.
    pub async fn delete_withdrawals(&self, selection: WithdrawalSelection) -> ResultEngine<Vec<i32>> {
        let ids = match &selection {
            WithdrawalSelection::Single(id) => vec![*id],
            WithdrawalSelection::Many(ids) => {
                let mut seen = HashSet::new();
                ids.iter().copied().filter(|id| seen.insert(*id)).collect()
            }
        };
        if ids.is_empty() {
            return Err(EngineError::Validation(
                "no withdrawal ids given".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            match selection {
                WithdrawalSelection::Single(id) => {
                    let row = self.require_cash_operation(&db_tx, id).await?;
                    if row.kind()? != OperationKind::Egress {
                        return Err(EngineError::Validation(format!(
                            "row {id} is not a withdrawal"
                        )));
                    }
                }
                WithdrawalSelection::Many(_) => {
                    self.require_withdrawal_set(&db_tx, &ids).await?;
                }
            }

            cash_operations::Entity::delete_many()
                .filter(cash_operations::Column::Id.is_in(ids.clone()))
                .exec(&db_tx)
                .await?;
            tracing::info!("deleted withdrawal rows {ids:?}");
            Ok(ids)
        })
    }

    /// Marks a pending withdrawal row as received by the back office and
    /// books the amount in the general ledger.
    pub async fn mark_withdrawal_received(&self, withdrawal_id: i32) -> ResultEngine<CashOperation> {
        let booked_at = Utc::now();
        with_tx!(self, |db_tx| {
            let row = self.require_withdrawal(&db_tx, withdrawal_id).await?;
            if row.status != ReceptionStatus::Pending {
                return Err(EngineError::Validation(format!(
                    "withdrawal {withdrawal_id} is not pending"
                )));
            }

            let row = self
                .set_reception_status(&db_tx, withdrawal_id, ReceptionStatus::Received)
                .await?;
            ledger_entries::ActiveModel::booking(
                row.caja_id,
                row.id,
                row.currency,
                row.amount,
                format!("withdrawal {withdrawal_id} received"),
                booked_at,
            )
            .insert(&db_tx)
            .await?;
            tracing::info!("withdrawal {withdrawal_id} received");
            Ok(row)
        })
    }

    /// Sends a received withdrawal row back to pending, booking the
    /// compensating negative entry in the same transaction. A blank
    /// `reason` is allowed and leaves the entry concept without one.
    pub async fn return_withdrawal_to_pending(
        &self,
        withdrawal_id: i32,
        reason: &str,
    ) -> ResultEngine<CashOperation> {
        let reason = reason.trim();
        let concept = if reason.is_empty() {
            format!("withdrawal {withdrawal_id} returned to pending")
        } else {
            format!("withdrawal {withdrawal_id} returned to pending: {reason}")
        };
        let booked_at = Utc::now();
        with_tx!(self, |db_tx| {
            let row = self.require_withdrawal(&db_tx, withdrawal_id).await?;
            if row.status != ReceptionStatus::Received {
                return Err(EngineError::Validation(format!(
                    "withdrawal {withdrawal_id} is not received"
                )));
            }

            let row = self
                .set_reception_status(&db_tx, withdrawal_id, ReceptionStatus::Pending)
                .await?;
            ledger_entries::ActiveModel::booking(
                row.caja_id,
                row.id,
                row.currency,
                -row.amount,
                concept,
                booked_at,
            )
            .insert(&db_tx)
            .await?;
            tracing::info!("withdrawal {withdrawal_id} returned to pending");
            Ok(row)
        })
    }

    /// General-ledger entries booked for a withdrawal row, oldest first.
    pub async fn ledger_entries(&self, withdrawal_id: i32) -> ResultEngine<Vec<LedgerEntry>> {
        with_tx!(self, |db_tx| {
            ledger_entries::Entity::find()
                .filter(ledger_entries::Column::WithdrawalId.eq(withdrawal_id))
                .order_by_asc(ledger_entries::Column::Id)
                .all(&db_tx)
                .await?
                .into_iter()
                .map(LedgerEntry::try_from)
                .collect::<ResultEngine<Vec<_>>>()
        })
    }

    async fn require_withdrawal(
        &self,
        db: &DatabaseTransaction,
        withdrawal_id: i32,
    ) -> ResultEngine<CashOperation> {
        let row = CashOperation::try_from(self.require_cash_operation(db, withdrawal_id).await?)?;
        if row.kind != OperationKind::Egress {
            return Err(EngineError::Validation(format!(
                "row {withdrawal_id} is not a withdrawal"
            )));
        }
        Ok(row)
    }

    async fn require_withdrawal_set(&self, db: &DatabaseTransaction, ids: &[i32]) -> ResultEngine<()> {
        let rows = cash_operations::Entity::find()
            .filter(cash_operations::Column::Id.is_in(ids.to_vec()))
            .filter(cash_operations::Column::Kind.eq(OperationKind::Egress.as_str()))
            .all(db)
            .await?;

        if let Some(missing) = ids
            .iter()
            .find(|id| !rows.iter().any(|row| row.id == **id))
        {
            return Err(EngineError::KeyNotFound(format!(
                "withdrawal {missing} not exists"
            )));
        }

        let cajas: HashSet<i32> = rows.iter().map(|row| row.caja_id).collect();
        if cajas.len() > 1 {
            let mut cajas: Vec<_> = cajas.into_iter().collect();
            cajas.sort_unstable();
            return Err(EngineError::MismatchedCaja(format!(
                "withdrawals {ids:?} span cajas {cajas:?}"
            )));
        }
        Ok(())
    }

    async fn set_reception_status(
        &self,
        db: &DatabaseTransaction,
        withdrawal_id: i32,
        status: ReceptionStatus,
    ) -> ResultEngine<CashOperation> {
        let update = cash_operations::ActiveModel {
            id: ActiveValue::Unchanged(withdrawal_id),
            reception_status: ActiveValue::Set(status.as_str().to_string()),
            ..Default::default()
        };
        CashOperation::try_from(update.update(db).await?)
    }
}
