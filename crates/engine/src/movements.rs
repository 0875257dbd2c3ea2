//! Movement ledger rows and the `{operator: {service: amount}}` matrix
//! clients submit and read back.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use sea_orm::{ActiveValue, entity::prelude::*};

use crate::{
    EngineError, ResultEngine,
    catalog::{MovementKey, Operator, Service},
    money::{decode_amount, encode_amount},
};

/// One `(operator, service, amount)` triple.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MovementLine {
    pub key: MovementKey,
    pub amount: Decimal,
}

/// Amounts by operator, then by service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MovementMatrix(BTreeMap<Operator, BTreeMap<Service, Decimal>>);

impl MovementMatrix {
    /// Validates raw string keys against the catalogue.
    pub fn try_from_raw<I, J>(raw: I) -> ResultEngine<Self>
    where
        I: IntoIterator<Item = (String, J)>,
        J: IntoIterator<Item = (String, Decimal)>,
    {
        let mut matrix = Self::default();
        for (operator, services) in raw {
            let operator = Operator::try_from(operator.as_str())?;
            for (service, amount) in services {
                let service = Service::try_from(service.as_str())?;
                let key = MovementKey::new(operator, service);
                if !key.is_known() {
                    return Err(EngineError::Validation(format!(
                        "{} does not offer {}",
                        operator.as_str(),
                        service.as_str()
                    )));
                }
                matrix.set(key, amount);
            }
        }
        Ok(matrix)
    }

    /// Rebuilds a matrix from ledger lines. A repeated key keeps the last
    /// line's amount, amounts are never summed.
    pub fn from_lines<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = MovementLine>,
    {
        let mut matrix = Self::default();
        for line in lines {
            matrix.set(line.key, line.amount);
        }
        matrix
    }

    pub fn set(&mut self, key: MovementKey, amount: Decimal) {
        self.0
            .entry(key.operator)
            .or_default()
            .insert(key.service, amount);
    }

    #[must_use]
    pub fn get(&self, key: MovementKey) -> Option<Decimal> {
        self.0
            .get(&key.operator)
            .and_then(|services| services.get(&key.service))
            .copied()
    }

    /// Flattens the matrix into triples, in operator then service order.
    #[must_use]
    pub fn lines(&self) -> Vec<MovementLine> {
        self.0
            .iter()
            .flat_map(|(operator, services)| {
                services.iter().map(|(service, amount)| MovementLine {
                    key: MovementKey::new(*operator, *service),
                    amount: *amount,
                })
            })
            .collect()
    }

    /// Nested view keyed by wire names.
    #[must_use]
    pub fn to_named(&self) -> BTreeMap<String, BTreeMap<String, Decimal>> {
        self.0
            .iter()
            .map(|(operator, services)| {
                (
                    operator.as_str().to_string(),
                    services
                        .iter()
                        .map(|(service, amount)| (service.as_str().to_string(), *amount))
                        .collect(),
                )
            })
            .collect()
    }
}

/// A persisted ledger row.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovementEntry {
    pub id: i32,
    pub caja_id: i32,
    pub operator_name: String,
    pub service_name: String,
    pub amount: Decimal,
    pub receipt_path: Option<String>,
}

impl MovementEntry {
    /// Catalogue coordinates of the row, `None` for names no longer in the
    /// catalogue.
    #[must_use]
    pub fn key(&self) -> Option<MovementKey> {
        let operator = Operator::try_from(self.operator_name.as_str()).ok()?;
        let service = Service::try_from(self.service_name.as_str()).ok()?;
        Some(MovementKey::new(operator, service))
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "movements")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub caja_id: i32,
    pub operator_name: String,
    pub service_name: String,
    pub amount: String,
    pub receipt_path: Option<String>,
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
    pub(crate) fn new_line(
        caja_id: i32,
        key: MovementKey,
        amount: Decimal,
        receipt_path: Option<String>,
        created_at: DateTimeUtc,
    ) -> Self {
        Self {
            id: ActiveValue::NotSet,
            caja_id: ActiveValue::Set(caja_id),
            operator_name: ActiveValue::Set(key.operator.as_str().to_string()),
            service_name: ActiveValue::Set(key.service.as_str().to_string()),
            amount: ActiveValue::Set(encode_amount(amount)),
            receipt_path: ActiveValue::Set(receipt_path),
            created_at: ActiveValue::Set(created_at),
        }
    }
}

impl From<Model> for MovementEntry {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            caja_id: model.caja_id,
            operator_name: model.operator_name,
            service_name: model.service_name,
            amount: decode_amount(&model.amount),
            receipt_path: model.receipt_path,
        }
    }
}
