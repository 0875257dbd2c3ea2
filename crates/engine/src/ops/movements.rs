use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    MovementEntry, MovementLine, MovementMatrix, ReceiptMap, RecordMovementsCmd, ResultEngine,
    movements,
};

use super::{Engine, with_tx};

/// Movement matrix of a register together with its receipt map.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CajaMovements {
    pub movements: MovementMatrix,
    pub receipts: ReceiptMap,
}

impl Engine {
    /// Stores a movement submission.
    ///
    /// With `replace_all` every ledger row of the register is deleted first
    /// and all submitted lines are inserted, zero amounts included. Otherwise
    /// only lines with a positive amount are appended as new rows; existing
    /// rows for the same operator and service are left alone.
    ///
    /// Returns the inserted rows.
    pub async fn record_movements(&self, cmd: RecordMovementsCmd) -> ResultEngine<Vec<MovementEntry>> {
        let created_at = Utc::now();
        let lines: Vec<MovementLine> = cmd
            .movements
            .lines()
            .into_iter()
            .filter(|line| cmd.replace_all || line.amount > Decimal::ZERO)
            .collect();

        with_tx!(self, |db_tx| {
            self.require_caja(&db_tx, cmd.caja_id).await?;

            if cmd.replace_all {
                let deleted = movements::Entity::delete_many()
                    .filter(movements::Column::CajaId.eq(cmd.caja_id))
                    .exec(&db_tx)
                    .await?;
                tracing::debug!(
                    "caja {}: replacing {} movement rows",
                    cmd.caja_id,
                    deleted.rows_affected
                );
            }

            let mut inserted = Vec::with_capacity(lines.len());
            for line in &lines {
                let model =
                    movements::ActiveModel::new_line(cmd.caja_id, line.key, line.amount, None, created_at)
                        .insert(&db_tx)
                        .await?;
                inserted.push(MovementEntry::from(model));
            }
            Ok(inserted)
        })
    }

    /// Reads the movement matrix of a register.
    ///
    /// Rows are read in insertion order and a repeated operator and service
    /// keeps the last row's amount. Rows whose names fall outside the
    /// catalogue are skipped.
    pub async fn movements(&self, caja_id: i32) -> ResultEngine<CajaMovements> {
        with_tx!(self, |db_tx| {
            let caja = self.require_caja(&db_tx, caja_id).await?;
            let rows = movements::Entity::find()
                .filter(movements::Column::CajaId.eq(caja_id))
                .order_by_asc(movements::Column::Id)
                .all(&db_tx)
                .await?;

            let lines = rows.into_iter().map(MovementEntry::from).filter_map(|entry| {
                match entry.key() {
                    Some(key) => Some(MovementLine {
                        key,
                        amount: entry.amount,
                    }),
                    None => {
                        tracing::debug!(
                            "caja {caja_id}: skipping movement {} ({}/{})",
                            entry.id,
                            entry.operator_name,
                            entry.service_name
                        );
                        None
                    }
                }
            });

            Ok(CajaMovements {
                movements: MovementMatrix::from_lines(lines),
                receipts: caja.receipt_map(),
            })
        })
    }
}
