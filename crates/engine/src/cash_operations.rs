//! Cash taken out of (egress) or put into (ingress) a register.
//!
//! A multi-currency operation is stored as one row per currency; rows of
//! one operation share person, observation and timestamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};

use crate::{
    Currency, EngineError, ResultEngine,
    money::{decode_amount, encode_amount},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    Egress,
    Ingress,
}

impl OperationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Egress => "egress",
            Self::Ingress => "ingress",
        }
    }
}

impl TryFrom<&str> for OperationKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "egress" => Ok(Self::Egress),
            "ingress" => Ok(Self::Ingress),
            other => Err(EngineError::Validation(format!(
                "invalid operation kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReceptionStatus {
    Pending,
    Received,
}

impl ReceptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Received => "RECEIVED",
        }
    }
}

impl TryFrom<&str> for ReceptionStatus {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "PENDING" => Ok(Self::Pending),
            "RECEIVED" => Ok(Self::Received),
            other => Err(EngineError::Validation(format!(
                "invalid reception status: {other}"
            ))),
        }
    }
}

/// Who takes or brings the cash.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Person {
    pub id: Option<i32>,
    pub name: String,
    pub document: Option<String>,
}

/// One per-currency row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CashOperation {
    pub id: i32,
    pub caja_id: i32,
    pub kind: OperationKind,
    pub person: Person,
    pub currency: Currency,
    pub amount: Decimal,
    pub observation: String,
    pub status: ReceptionStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "cash_operations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub caja_id: i32,
    pub kind: String,
    pub person_id: Option<i32>,
    pub person_name: String,
    pub person_document: Option<String>,
    pub currency: String,
    pub amount: String,
    pub observation: String,
    pub reception_status: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cajas::Entity",
        from = "Column::CajaId",
        to = "super::cajas::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Cajas,
}

impl Related<super::cajas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cajas.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl ActiveModel {
    pub(crate) fn pending(
        caja_id: i32,
        kind: OperationKind,
        person: &Person,
        currency: Currency,
        amount: Decimal,
        observation: &str,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            caja_id: ActiveValue::Set(caja_id),
            kind: ActiveValue::Set(kind.as_str().to_string()),
            person_id: ActiveValue::Set(person.id),
            person_name: ActiveValue::Set(person.name.clone()),
            person_document: ActiveValue::Set(person.document.clone()),
            currency: ActiveValue::Set(currency.code().to_string()),
            amount: ActiveValue::Set(encode_amount(amount)),
            observation: ActiveValue::Set(observation.to_string()),
            reception_status: ActiveValue::Set(ReceptionStatus::Pending.as_str().to_string()),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl Model {
    pub(crate) fn kind(&self) -> ResultEngine<OperationKind> {
        OperationKind::try_from(self.kind.as_str())
    }
}

impl TryFrom<Model> for CashOperation {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        Ok(Self {
            id: model.id,
            caja_id: model.caja_id,
            kind: model.kind()?,
            person: Person {
                id: model.person_id,
                name: model.person_name,
                document: model.person_document,
            },
            currency: Currency::try_from(model.currency.as_str())?,
            amount: decode_amount(&model.amount),
            observation: model.observation,
            status: ReceptionStatus::try_from(model.reception_status.as_str())?,
            created_at: model.created_at,
        })
    }
}
