//! General-ledger entries booked when withdrawn cash is received by the
//! back office, or sent back to pending.
//!
//! Entries are append-only: a reversal is a new entry with the opposite
//! sign that references the same withdrawal row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{
    Currency, EngineError, ResultEngine,
    money::{decode_amount, encode_amount},
};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: i32,
    pub caja_id: i32,
    pub withdrawal_id: i32,
    pub currency: Currency,
    /// Signed: positive on reception, negative on reversal.
    pub amount: Decimal,
    pub concept: String,
    pub booked_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "ledger_entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub caja_id: i32,
    pub withdrawal_id: i32,
    pub currency: String,
    pub amount: String,
    pub concept: String,
    pub booked_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn booking(
        caja_id: i32,
        withdrawal_id: i32,
        currency: Currency,
        amount: Decimal,
        concept: String,
        booked_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            caja_id: ActiveValue::Set(caja_id),
            withdrawal_id: ActiveValue::Set(withdrawal_id),
            currency: ActiveValue::Set(currency.code().to_string()),
            amount: ActiveValue::Set(encode_amount(amount)),
            concept: ActiveValue::Set(concept),
            booked_at: ActiveValue::Set(booked_at),
        }
    }
}

impl TryFrom<Model> for LedgerEntry {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            caja_id: model.caja_id,
            withdrawal_id: model.withdrawal_id,
            currency: Currency::try_from(model.currency.as_str())?,
            amount: decode_amount(&model.amount),
            concept: model.concept,
            booked_at: model.booked_at,
        })
    }
}
