use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Branch, Caja, CajaStatus, Case, CloseCajaCmd, DenominationBreakdown, EngineError,
    OpenCajaCmd, ResultEngine, ServiceBalance, ServiceBalances, branches,
    cajas::{self, OpeningFields},
    cases,
};

use super::{Engine, normalize_required_text, with_tx};

impl Engine {
    /// Registers a branch.
    pub async fn new_branch(&self, name: &str) -> ResultEngine<Branch> {
        let name = normalize_required_text(name, "branch name")?;
        with_tx!(self, |db_tx| {
            let model = branches::ActiveModel::named(name).insert(&db_tx).await?;
            Ok(Branch::from(model))
        })
    }

    /// Registers a case inside an existing branch.
    pub async fn new_case(&self, branch_id: i32, code: &str) -> ResultEngine<Case> {
        let code = normalize_required_text(code, "case code")?;
        with_tx!(self, |db_tx| {
            self.require_branch(&db_tx, branch_id).await?;
            let model = cases::ActiveModel::in_branch(branch_id, code)
                .insert(&db_tx)
                .await?;
            Ok(Case::from(model))
        })
    }

    /// Return a register snapshot from DB.
    pub async fn caja(&self, caja_id: i32) -> ResultEngine<Caja> {
        with_tx!(self, |db_tx| {
            let model = self.require_caja(&db_tx, caja_id).await?;
            Caja::try_from(model)
        })
    }

    /// Return the open register of a case.
    pub async fn open_caja_for_case(&self, case_id: i32) -> ResultEngine<Caja> {
        with_tx!(self, |db_tx| {
            self.require_case(&db_tx, case_id).await?;
            let model = self
                .find_open_caja(&db_tx, case_id)
                .await?
                .ok_or_else(|| {
                    EngineError::KeyNotFound(format!("case {case_id} has no open caja"))
                })?;
            Caja::try_from(model)
        })
    }

    /// Opens a register on a case.
    ///
    /// The case must exist and belong to the branch, and must not already
    /// carry an open register. The check runs inside the transaction and the
    /// partial unique index on `cajas(case_id)` backs it up against a
    /// concurrent open, whose violation is reported as
    /// [`EngineError::CaseInUse`] as well.
    pub async fn open_caja(&self, cmd: OpenCajaCmd) -> ResultEngine<Caja> {
        let opened_at = Utc::now();
        with_tx!(self, |db_tx| {
            let case = self.require_case(&db_tx, cmd.case_id).await?;
            if case.branch_id != cmd.branch_id {
                return Err(EngineError::Validation(format!(
                    "case {} does not belong to branch {}",
                    cmd.case_id, cmd.branch_id
                )));
            }
            if let Some(open) = self.find_open_caja(&db_tx, cmd.case_id).await? {
                return Err(EngineError::CaseInUse(format!(
                    "case {} already has open caja {}",
                    cmd.case_id, open.id
                )));
            }

            let model = cajas::ActiveModel::opening(OpeningFields {
                branch_id: cmd.branch_id,
                user_id: cmd.user_id,
                case_id: cmd.case_id,
                opened_at,
                breakdown: &cmd.breakdown,
                services: &cmd.services,
            })?
            .insert(&db_tx)
            .await
            .map_err(|err| EngineError::from_open_insert(err, cmd.case_id))?;

            tracing::info!("caja {} opened on case {}", model.id, cmd.case_id);
            warn_on_count_mismatch(model.id, &cmd.breakdown);
            Caja::try_from(model)
        })
    }

    /// Closes an open register.
    ///
    /// Flat final totals and the structured final fields are written in the
    /// same statement. Closing twice fails with
    /// [`EngineError::AlreadyClosed`] and leaves the first closing untouched.
    pub async fn close_caja(&self, cmd: CloseCajaCmd) -> ResultEngine<Caja> {
        let closed_at = Utc::now();
        with_tx!(self, |db_tx| {
            let model = self.require_caja(&db_tx, cmd.caja_id).await?;
            if !model.status()?.is_open() {
                return Err(already_closed(cmd.caja_id));
            }

            let mut update = cajas::ActiveModel {
                status: ActiveValue::Set(CajaStatus::Closed.as_str().to_string()),
                closed_at: ActiveValue::Set(Some(closed_at)),
                ..Default::default()
            };
            update.set_closing_data(&cmd.breakdown, &cmd.services)?;

            // Guarded on the status so a concurrent close cannot win twice.
            let result = cajas::Entity::update_many()
                .set(update)
                .filter(cajas::Column::Id.eq(cmd.caja_id))
                .filter(cajas::Column::Status.eq(CajaStatus::Open.as_str()))
                .exec(&db_tx)
                .await?;
            if result.rows_affected == 0 {
                return Err(already_closed(cmd.caja_id));
            }

            tracing::info!("caja {} closed", cmd.caja_id);
            warn_on_count_mismatch(cmd.caja_id, &cmd.breakdown);
            let model = self.require_caja(&db_tx, cmd.caja_id).await?;
            Caja::try_from(model)
        })
    }

    /// Re-saves the opening count and service balances. No status change.
    pub async fn update_opening_data(
        &self,
        caja_id: i32,
        breakdown: &DenominationBreakdown,
        services: &ServiceBalances,
    ) -> ResultEngine<Caja> {
        with_tx!(self, |db_tx| {
            let model = self.require_caja(&db_tx, caja_id).await?;
            let mut update: cajas::ActiveModel = model.into();
            update.set_opening_data(breakdown, services)?;
            let model = update.update(&db_tx).await?;
            tracing::debug!("caja {caja_id}: opening data corrected");
            warn_on_count_mismatch(caja_id, breakdown);
            Caja::try_from(model)
        })
    }

    /// Re-saves the closing count and service balances of a closed register.
    pub async fn update_closing_data(
        &self,
        caja_id: i32,
        breakdown: &DenominationBreakdown,
        services: &[ServiceBalance],
    ) -> ResultEngine<Caja> {
        with_tx!(self, |db_tx| {
            let model = self.require_closed_caja(&db_tx, caja_id).await?;
            let mut update: cajas::ActiveModel = model.into();
            update.set_closing_data(breakdown, services)?;
            let model = update.update(&db_tx).await?;
            tracing::debug!("caja {caja_id}: closing data corrected");
            warn_on_count_mismatch(caja_id, breakdown);
            Caja::try_from(model)
        })
    }

    async fn find_open_caja(
        &self,
        db: &DatabaseTransaction,
        case_id: i32,
    ) -> ResultEngine<Option<cajas::Model>> {
        cajas::Entity::find()
            .filter(cajas::Column::CaseId.eq(case_id))
            .filter(cajas::Column::Status.eq(CajaStatus::Open.as_str()))
            .order_by_desc(cajas::Column::Id)
            .one(db)
            .await
            .map_err(Into::into)
    }
}

fn already_closed(caja_id: i32) -> EngineError {
    EngineError::AlreadyClosed(format!("caja {caja_id} is already closed"))
}

/// The signed total is what gets stored; a disagreeing itemization is only
/// reported.
fn warn_on_count_mismatch(caja_id: i32, breakdown: &DenominationBreakdown) {
    if !breakdown.count_matches_total() {
        tracing::warn!(
            "caja {caja_id}: denominations add up to {:?} but the signed total is {:?}",
            breakdown.counted_totals(),
            breakdown.total
        );
    }
}
