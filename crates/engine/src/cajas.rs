//! The module contains the `Caja` (cash register) and its storage adapter.
//!
//! A register keeps every total twice: flat decimal columns per currency and
//! a structured JSON breakdown. The two are written together but can be
//! corrected independently, so decoding never assumes they agree.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    CurrencyTotals, EngineError, ResultEngine,
    breakdown::{DenominationBreakdown, ServiceBalance, ServiceBalances, StoredBreakdown},
    money::{decode_amount, encode_amount},
    receipts::ReceiptMap,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CajaStatus {
    Open,
    Closed,
}

impl CajaStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Closed => "closed",
        }
    }

    pub fn is_open(self) -> bool {
        self == Self::Open
    }
}

impl TryFrom<&str> for CajaStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "open" => Ok(Self::Open),
            "closed" => Ok(Self::Closed),
            other => Err(EngineError::Validation(format!(
                "invalid register status: {other}"
            ))),
        }
    }
}

/// A cash register session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caja {
    pub id: i32,
    pub branch_id: i32,
    pub user_id: i32,
    pub case_id: i32,
    pub status: CajaStatus,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,
    pub initial_totals: CurrencyTotals,
    pub final_totals: Option<CurrencyTotals>,
    pub initial_breakdown: Option<DenominationBreakdown>,
    pub final_breakdown: Option<DenominationBreakdown>,
    pub initial_services: ServiceBalances,
    pub final_services: Option<Vec<ServiceBalance>>,
    /// Relative receipt URLs by business-type code.
    pub receipts: ReceiptMap,
}

impl Caja {
    pub fn is_open(&self) -> bool {
        self.status == CajaStatus::Open
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "cajas")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub branch_id: i32,
    pub user_id: i32,
    pub case_id: i32,
    pub status: String,
    pub opened_at: DateTimeUtc,
    pub closed_at: Option<DateTimeUtc>,
    pub initial_pyg: String,
    pub initial_brl: String,
    pub initial_usd: String,
    pub final_pyg: Option<String>,
    pub final_brl: Option<String>,
    pub final_usd: Option<String>,
    pub initial_breakdown: Option<String>,
    pub final_breakdown: Option<String>,
    pub initial_services: Option<String>,
    pub final_services: Option<String>,
    pub receipts: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::movements::Entity")]
    Movements,
    #[sea_orm(has_many = "super::cash_operations::Entity")]
    CashOperations,
    #[sea_orm(
        belongs_to = "super::cases::Entity",
        from = "Column::CaseId",
        to = "super::cases::Column::Id",
        on_update = "NoAction",
        on_delete = "NoAction"
    )]
    Cases,
}

impl Related<super::movements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Movements.def()
    }
}

impl Related<super::cash_operations::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CashOperations.def()
    }
}

impl Related<super::cases::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cases.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub(crate) fn status(&self) -> ResultEngine<CajaStatus> {
        CajaStatus::try_from(self.status.as_str())
    }

    pub(crate) fn initial_totals(&self) -> CurrencyTotals {
        CurrencyTotals::new(
            decode_amount(&self.initial_pyg),
            decode_amount(&self.initial_brl),
            decode_amount(&self.initial_usd),
        )
    }

    /// Flat final totals; `None` until at least one column was written.
    pub(crate) fn final_totals(&self) -> Option<CurrencyTotals> {
        if self.final_pyg.is_none() && self.final_brl.is_none() && self.final_usd.is_none() {
            return None;
        }
        let read = |column: &Option<String>| column.as_deref().map(decode_amount).unwrap_or_default();
        Some(CurrencyTotals::new(
            read(&self.final_pyg),
            read(&self.final_brl),
            read(&self.final_usd),
        ))
    }

    pub(crate) fn stored_initial_breakdown(&self) -> Option<StoredBreakdown> {
        decode_json(self.initial_breakdown.as_deref(), "initial_breakdown", self.id)
    }

    pub(crate) fn stored_final_breakdown(&self) -> Option<StoredBreakdown> {
        decode_json(self.final_breakdown.as_deref(), "final_breakdown", self.id)
    }

    pub(crate) fn final_services(&self) -> Option<Vec<ServiceBalance>> {
        decode_json(self.final_services.as_deref(), "final_services", self.id)
    }

    pub(crate) fn receipt_map(&self) -> ReceiptMap {
        ReceiptMap::decode(self.receipts.as_deref())
    }
}

impl TryFrom<Model> for Caja {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let initial_totals = model.initial_totals();
        let final_totals = model.final_totals();
        Ok(Self {
            id: model.id,
            branch_id: model.branch_id,
            user_id: model.user_id,
            case_id: model.case_id,
            status: model.status()?,
            opened_at: model.opened_at,
            closed_at: model.closed_at,
            initial_totals,
            final_totals,
            initial_breakdown: model
                .stored_initial_breakdown()
                .map(|stored| stored.complete(initial_totals)),
            final_breakdown: model
                .stored_final_breakdown()
                .map(|stored| stored.complete(final_totals.unwrap_or_default())),
            initial_services: decode_json(
                model.initial_services.as_deref(),
                "initial_services",
                model.id,
            )
            .unwrap_or_default(),
            final_services: model.final_services(),
            receipts: model.receipt_map(),
        })
    }
}

/// Field set written when a register opens.
pub(crate) struct OpeningFields<'a> {
    pub branch_id: i32,
    pub user_id: i32,
    pub case_id: i32,
    pub opened_at: DateTime<Utc>,
    pub breakdown: &'a DenominationBreakdown,
    pub services: &'a ServiceBalances,
}

impl ActiveModel {
    pub(crate) fn opening(fields: OpeningFields<'_>) -> ResultEngine<Self> {
        let mut model = Self {
            id: ActiveValue::NotSet,
            branch_id: ActiveValue::Set(fields.branch_id),
            user_id: ActiveValue::Set(fields.user_id),
            case_id: ActiveValue::Set(fields.case_id),
            status: ActiveValue::Set(CajaStatus::Open.as_str().to_string()),
            opened_at: ActiveValue::Set(fields.opened_at),
            closed_at: ActiveValue::Set(None),
            final_pyg: ActiveValue::Set(None),
            final_brl: ActiveValue::Set(None),
            final_usd: ActiveValue::Set(None),
            final_breakdown: ActiveValue::Set(None),
            final_services: ActiveValue::Set(None),
            receipts: ActiveValue::Set(Some(ReceiptMap::default().encode())),
            ..Default::default()
        };
        model.set_opening_data(fields.breakdown, fields.services)?;
        Ok(model)
    }

    /// Writes flat initial totals and the structured opening fields together.
    pub(crate) fn set_opening_data(
        &mut self,
        breakdown: &DenominationBreakdown,
        services: &ServiceBalances,
    ) -> ResultEngine<()> {
        self.initial_pyg = ActiveValue::Set(encode_amount(breakdown.total.pyg));
        self.initial_brl = ActiveValue::Set(encode_amount(breakdown.total.brl));
        self.initial_usd = ActiveValue::Set(encode_amount(breakdown.total.usd));
        self.initial_breakdown = ActiveValue::Set(Some(encode_json(breakdown, "initial_breakdown")?));
        self.initial_services = ActiveValue::Set(Some(encode_json(services, "initial_services")?));
        Ok(())
    }

    /// Writes flat final totals and the structured closing fields together.
    pub(crate) fn set_closing_data(
        &mut self,
        breakdown: &DenominationBreakdown,
        services: &[ServiceBalance],
    ) -> ResultEngine<()> {
        self.final_pyg = ActiveValue::Set(Some(encode_amount(breakdown.total.pyg)));
        self.final_brl = ActiveValue::Set(Some(encode_amount(breakdown.total.brl)));
        self.final_usd = ActiveValue::Set(Some(encode_amount(breakdown.total.usd)));
        self.final_breakdown = ActiveValue::Set(Some(encode_json(breakdown, "final_breakdown")?));
        self.final_services = ActiveValue::Set(Some(encode_json(services, "final_services")?));
        Ok(())
    }
}

fn encode_json<T: Serialize + ?Sized>(value: &T, column: &str) -> ResultEngine<String> {
    serde_json::to_string(value)
        .map_err(|err| EngineError::Validation(format!("cannot encode {column}: {err}")))
}

/// Decodes a JSON column, treating empty, `null`, double-encoded and
/// malformed values as best it can. Malformed values read as absent.
pub(crate) fn decode_json<T: DeserializeOwned>(
    raw: Option<&str>,
    column: &str,
    caja_id: i32,
) -> Option<T> {
    let raw = raw.map(str::trim).filter(|raw| !raw.is_empty())?;
    let mut value: Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("caja {caja_id}: unreadable {column}: {err}");
            return None;
        }
    };
    if let Value::String(inner) = &value {
        value = serde_json::from_str(inner).ok()?;
    }
    if value.is_null() {
        return None;
    }
    match serde_json::from_value(value) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            tracing::warn!("caja {caja_id}: unexpected {column} shape: {err}");
            None
        }
    }
}
