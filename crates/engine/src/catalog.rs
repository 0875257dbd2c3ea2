//! Closed catalogue of operators, service lines and receipt business types.
//!
//! [`RECEIPT_TARGETS`] is the single table mapping a business-type code to
//! the ledger rows its receipt belongs to. Single attachment, receipt update
//! and batch attachment all resolve through it, and movement submissions are
//! validated against the same rows.

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// Issuing business of a movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Operator {
    Tigo,
    Personal,
    Claro,
    AquiPago,
    Wepa,
    Netel,
    PagoExpress,
}

impl Operator {
    pub const ALL: [Operator; 7] = [
        Operator::Tigo,
        Operator::Personal,
        Operator::Claro,
        Operator::AquiPago,
        Operator::Wepa,
        Operator::Netel,
        Operator::PagoExpress,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tigo => "tigo",
            Self::Personal => "personal",
            Self::Claro => "claro",
            Self::AquiPago => "aquiPago",
            Self::Wepa => "wepa",
            Self::Netel => "netel",
            Self::PagoExpress => "pagoExpress",
        }
    }
}

impl TryFrom<&str> for Operator {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|operator| operator.as_str() == value)
            .ok_or_else(|| EngineError::Validation(format!("unknown operator: {value}")))
    }
}

/// Service line offered by an operator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Minicargas,
    Maxicargas,
    Recargas,
    Giros,
    Billetera,
    Paquetes,
    Pagos,
    Retiros,
}

impl Service {
    pub const ALL: [Service; 8] = [
        Service::Minicargas,
        Service::Maxicargas,
        Service::Recargas,
        Service::Giros,
        Service::Billetera,
        Service::Paquetes,
        Service::Pagos,
        Service::Retiros,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minicargas => "minicargas",
            Self::Maxicargas => "maxicargas",
            Self::Recargas => "recargas",
            Self::Giros => "giros",
            Self::Billetera => "billetera",
            Self::Paquetes => "paquetes",
            Self::Pagos => "pagos",
            Self::Retiros => "retiros",
        }
    }
}

impl TryFrom<&str> for Service {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::ALL
            .into_iter()
            .find(|service| service.as_str() == value)
            .ok_or_else(|| EngineError::Validation(format!("unknown service: {value}")))
    }
}

/// Ledger row coordinates inside a register.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MovementKey {
    pub operator: Operator,
    pub service: Service,
}

impl MovementKey {
    pub const fn new(operator: Operator, service: Service) -> Self {
        Self { operator, service }
    }

    /// Whether the pair is part of the catalogue.
    #[must_use]
    pub fn is_known(self) -> bool {
        RECEIPT_TARGETS.iter().any(|target| {
            target.operator == self.operator && target.services.contains(&self.service)
        })
    }
}

/// One row of the business-type table.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ReceiptTarget {
    pub code: &'static str,
    pub operator: Operator,
    /// Ledger rows that share the receipt. Combined payment and withdrawal
    /// operators list both `Pagos` and `Retiros`.
    pub services: &'static [Service],
}

const fn single(code: &'static str, operator: Operator, service: &'static [Service]) -> ReceiptTarget {
    ReceiptTarget {
        code,
        operator,
        services: service,
    }
}

const COMBINED: &[Service] = &[Service::Pagos, Service::Retiros];

pub static RECEIPT_TARGETS: [ReceiptTarget; 18] = [
    single("minicargas", Operator::Tigo, &[Service::Minicargas]),
    single("maxicargas", Operator::Tigo, &[Service::Maxicargas]),
    single("tigoGiros", Operator::Tigo, &[Service::Giros]),
    single("tigoBilletera", Operator::Tigo, &[Service::Billetera]),
    single("tigoPaquetes", Operator::Tigo, &[Service::Paquetes]),
    single("personalMaxicargas", Operator::Personal, &[Service::Maxicargas]),
    single("personalRecargas", Operator::Personal, &[Service::Recargas]),
    single("personalGiros", Operator::Personal, &[Service::Giros]),
    single("personalBilletera", Operator::Personal, &[Service::Billetera]),
    single("personalPaquetes", Operator::Personal, &[Service::Paquetes]),
    single("claroRecargas", Operator::Claro, &[Service::Recargas]),
    single("claroGiros", Operator::Claro, &[Service::Giros]),
    single("claroBilletera", Operator::Claro, &[Service::Billetera]),
    single("claroPaquetes", Operator::Claro, &[Service::Paquetes]),
    single("aquiPago", Operator::AquiPago, COMBINED),
    single("wepa", Operator::Wepa, COMBINED),
    single("netel", Operator::Netel, COMBINED),
    single("pagoExpress", Operator::PagoExpress, COMBINED),
];

/// A validated receipt business-type code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct BusinessType(&'static ReceiptTarget);

impl BusinessType {
    /// Looks a code up in [`RECEIPT_TARGETS`].
    pub fn parse(code: &str) -> ResultEngine<Self> {
        let code = code.trim();
        RECEIPT_TARGETS
            .iter()
            .find(|target| target.code == code)
            .map(Self)
            .ok_or_else(|| EngineError::Validation(format!("unknown business type: {code}")))
    }

    #[must_use]
    pub fn code(self) -> &'static str {
        self.0.code
    }

    #[must_use]
    pub fn operator(self) -> Operator {
        self.0.operator
    }

    /// Ledger rows the receipt is bound to.
    pub fn targets(self) -> impl Iterator<Item = MovementKey> {
        let operator = self.0.operator;
        self.0
            .services
            .iter()
            .map(move |service| MovementKey::new(operator, *service))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn codes_are_unique() {
        let codes: HashSet<_> = RECEIPT_TARGETS.iter().map(|t| t.code).collect();
        assert_eq!(codes.len(), RECEIPT_TARGETS.len());
    }

    #[test]
    fn single_operator_has_one_target() {
        let business = BusinessType::parse("minicargas").unwrap();
        let targets: Vec<_> = business.targets().collect();
        assert_eq!(
            targets,
            vec![MovementKey::new(Operator::Tigo, Service::Minicargas)]
        );
    }

    #[test]
    fn combined_operator_targets_payments_and_withdrawals() {
        let business = BusinessType::parse("aquiPago").unwrap();
        let targets: Vec<_> = business.targets().collect();
        assert_eq!(
            targets,
            vec![
                MovementKey::new(Operator::AquiPago, Service::Pagos),
                MovementKey::new(Operator::AquiPago, Service::Retiros),
            ]
        );
    }

    #[test]
    fn unknown_code_is_a_validation_error() {
        assert_eq!(
            BusinessType::parse("bancard"),
            Err(EngineError::Validation(
                "unknown business type: bancard".to_string()
            ))
        );
    }

    #[test]
    fn catalogue_pairs_are_known() {
        assert!(MovementKey::new(Operator::Claro, Service::Recargas).is_known());
        assert!(!MovementKey::new(Operator::Claro, Service::Minicargas).is_known());
    }

    #[test]
    fn names_round_trip() {
        for operator in Operator::ALL {
            assert_eq!(Operator::try_from(operator.as_str()).unwrap(), operator);
        }
        for service in Service::ALL {
            assert_eq!(Service::try_from(service.as_str()).unwrap(), service);
        }
    }
}
