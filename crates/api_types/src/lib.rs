//! Wire types of the register HTTP API.
//!
//! Field names follow the JSON contract used by the front office (Spanish,
//! camelCase). Request amounts are kept as raw JSON values: clients send
//! numbers, plain strings and locally formatted strings (`"1.500.000"`), and
//! the server parses them leniently.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// An amount as sent by a client: number, string or absent.
pub type RawAmount = Value;

/// Error body of every failed request.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

pub mod registry {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BranchNew {
        pub nombre: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BranchView {
        pub id: i32,
        pub nombre: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CaseNew {
        pub codigo: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CaseView {
        pub id: i32,
        pub sucursal_id: i32,
        pub codigo: String,
    }
}

pub mod caja {
    use super::*;

    /// Denomination line of a request breakdown.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct DenominationBody {
        pub valor: RawAmount,
        #[serde(default)]
        pub cantidad: RawAmount,
        pub moneda: String,
    }

    /// Per-currency totals of a request breakdown.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TotalsBody {
        #[serde(rename = "PYG", default)]
        pub pyg: RawAmount,
        #[serde(rename = "BRL", default)]
        pub brl: RawAmount,
        #[serde(rename = "USD", default)]
        pub usd: RawAmount,
    }

    /// `{denominaciones: [...], total: {PYG, BRL, USD}}`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct BreakdownBody {
        pub denominaciones: Option<Vec<DenominationBody>>,
        pub total: Option<TotalsBody>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceBalanceBody {
        pub servicio: String,
        #[serde(default)]
        pub monto: RawAmount,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CajaOpen {
        pub sucursal_id: i32,
        pub usuario_id: i32,
        pub maletin_id: i32,
        pub saldo_inicial: Option<BreakdownBody>,
        #[serde(default)]
        pub saldos_servicios_inicial: BTreeMap<String, RawAmount>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CajaClose {
        pub saldo_final: Option<BreakdownBody>,
        #[serde(default)]
        pub saldos_servicios_final: Vec<ServiceBalanceBody>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct OpeningDataUpdate {
        pub saldo_inicial: Option<BreakdownBody>,
        #[serde(default)]
        pub saldos_servicios_inicial: BTreeMap<String, RawAmount>,
    }

    /// Same shape as [`CajaClose`], applied without a status change.
    pub type ClosingDataUpdate = CajaClose;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct DenominationView {
        pub valor: Decimal,
        pub cantidad: u32,
        pub moneda: String,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TotalsView {
        #[serde(rename = "PYG")]
        pub pyg: Decimal,
        #[serde(rename = "BRL")]
        pub brl: Decimal,
        #[serde(rename = "USD")]
        pub usd: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BreakdownView {
        pub denominaciones: Vec<DenominationView>,
        pub total: TotalsView,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ServiceBalanceView {
        pub servicio: String,
        pub monto: Decimal,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CajaView {
        pub id: i32,
        pub sucursal_id: i32,
        pub usuario_id: i32,
        pub maletin_id: i32,
        /// `abierta` or `cerrada`.
        pub estado: String,
        pub fecha_apertura: DateTime<Utc>,
        pub fecha_cierre: Option<DateTime<Utc>>,
        pub saldo_inicial: BreakdownView,
        pub saldo_final: Option<BreakdownView>,
        pub saldos_servicios_inicial: BTreeMap<String, Decimal>,
        pub saldos_servicios_final: Option<Vec<ServiceBalanceView>>,
        /// Absolute receipt URLs by business-type code.
        pub comprobantes: BTreeMap<String, String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct ClosingDataView {
        pub saldo_final: BreakdownView,
        pub saldos_servicios_final: Vec<ServiceBalanceView>,
        pub fecha_cierre: Option<DateTime<Utc>>,
    }
}

pub mod movement {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct MovementsSubmit {
        /// `{operator: {service: amount}}`.
        pub movimientos: BTreeMap<String, BTreeMap<String, RawAmount>>,
        #[serde(default)]
        pub actualizar_todos: bool,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementView {
        pub id: i32,
        pub operadora: String,
        pub servicio: String,
        pub monto: Decimal,
        pub comprobante: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementsCreated {
        pub movimientos: Vec<MovementView>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct MovementsView {
        pub movimientos: BTreeMap<String, BTreeMap<String, Decimal>>,
        pub comprobantes: BTreeMap<String, String>,
    }
}

pub mod receipt {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptUrl {
        pub url: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BatchAttached {
        pub message: String,
        pub urls: Vec<String>,
    }
}

pub mod withdrawal {
    use super::*;

    /// Reception state of a withdrawal as shown to clients.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "UPPERCASE")]
    pub enum ReceptionStatus {
        Pending,
        Received,
    }

    /// Body of withdrawal and ingress creation.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct CashOperationNew {
        #[serde(rename = "montoPYG", default)]
        pub monto_pyg: RawAmount,
        #[serde(rename = "montoBRL", default)]
        pub monto_brl: RawAmount,
        #[serde(rename = "montoUSD", default)]
        pub monto_usd: RawAmount,
        #[serde(rename = "personaId")]
        pub persona_id: Option<i32>,
        #[serde(rename = "personaNombre")]
        pub persona_nombre: String,
        #[serde(rename = "personaDocumento")]
        pub persona_documento: Option<String>,
        #[serde(default)]
        pub observacion: String,
    }

    /// One stored per-currency row.
    #[derive(Debug, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CashOperationView {
        pub id: i32,
        pub caja_id: i32,
        pub persona_nombre: String,
        pub moneda: String,
        pub monto: Decimal,
        pub observacion: String,
        pub estado_recepcion: ReceptionStatus,
        pub fecha: DateTime<Utc>,
    }

    /// A logical withdrawal regrouped from its per-currency rows.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalView {
        pub id: i32,
        pub ids: Vec<i32>,
        pub fecha: DateTime<Utc>,
        #[serde(rename = "personaNombre")]
        pub persona_nombre: String,
        #[serde(rename = "montoPYG")]
        pub monto_pyg: Decimal,
        #[serde(rename = "montoBRL")]
        pub monto_brl: Decimal,
        #[serde(rename = "montoUSD")]
        pub monto_usd: Decimal,
        pub observacion: String,
        #[serde(rename = "estadoRecepcion")]
        pub estado_recepcion: ReceptionStatus,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct WithdrawalDelete {
        pub ids: Option<Vec<i32>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct WithdrawalsDeleted {
        pub ids: Vec<i32>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReturnToPending {
        #[serde(default)]
        pub motivo: String,
    }
}
