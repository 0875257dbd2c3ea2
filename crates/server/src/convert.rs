//! Conversions between wire DTOs and engine values.

use std::collections::BTreeMap;

use api_types::{
    RawAmount,
    caja::{
        BreakdownBody, BreakdownView, CajaView, ClosingDataView, DenominationBody,
        DenominationView, ServiceBalanceBody, ServiceBalanceView, TotalsBody, TotalsView,
    },
    movement::MovementView,
    registry::{BranchView, CaseView},
    withdrawal::{CashOperationView, ReceptionStatus as WireStatus, WithdrawalView},
};
use engine::{
    Branch, Caja, Case, CashOperation, ClosingData, Currency, CurrencyTotals, Denomination,
    DenominationBreakdown, Engine, MovementEntry, ReceiptMap, ReceptionStatus,
    ServiceAmount, ServiceBalance, ServiceBalances, WithdrawalGroup, money::amount_from_value,
};
use rust_decimal::{Decimal, prelude::ToPrimitive};

use crate::ServerError;

fn totals_from_body(body: &TotalsBody) -> CurrencyTotals {
    CurrencyTotals::new(
        amount_from_value(&body.pyg),
        amount_from_value(&body.brl),
        amount_from_value(&body.usd),
    )
}

fn count_from_value(raw: &RawAmount) -> Result<u32, ServerError> {
    let count = amount_from_value(raw);
    count
        .trunc()
        .to_u32()
        .filter(|_| count.fract().is_zero())
        .ok_or_else(|| ServerError::Generic(format!("invalid denomination count: {raw}")))
}

fn denomination_from_body(body: &DenominationBody) -> Result<Denomination, ServerError> {
    Ok(Denomination {
        value: amount_from_value(&body.valor),
        count: count_from_value(&body.cantidad)?,
        currency: Currency::try_from(body.moneda.as_str())?,
    })
}

/// A missing body or a missing `total` is a validation error.
pub fn breakdown_from_body(body: Option<&BreakdownBody>) -> Result<DenominationBreakdown, ServerError> {
    let Some(body) = body else {
        return Ok(DenominationBreakdown::from_parts(None, None)?);
    };
    let denominations = body
        .denominaciones
        .as_ref()
        .map(|list| {
            list.iter()
                .map(denomination_from_body)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;
    let total = body.total.as_ref().map(totals_from_body);
    Ok(DenominationBreakdown::from_parts(denominations, total)?)
}

pub fn service_balances_from_body(body: BTreeMap<String, RawAmount>) -> ServiceBalances {
    ServiceBalances(
        body.into_iter()
            .map(|(service, amount)| (service, ServiceAmount(amount_from_value(&amount))))
            .collect(),
    )
}

pub fn service_list_from_body(body: Vec<ServiceBalanceBody>) -> Vec<ServiceBalance> {
    body.into_iter()
        .map(|line| ServiceBalance {
            service: line.servicio,
            amount: amount_from_value(&line.monto),
        })
        .collect()
}

fn totals_view(totals: CurrencyTotals) -> TotalsView {
    TotalsView {
        pyg: totals.pyg,
        brl: totals.brl,
        usd: totals.usd,
    }
}

pub fn breakdown_view(breakdown: &DenominationBreakdown) -> BreakdownView {
    BreakdownView {
        denominaciones: breakdown
            .denominations
            .iter()
            .map(|denomination| DenominationView {
                valor: denomination.value,
                cantidad: denomination.count,
                moneda: denomination.currency.code().to_string(),
            })
            .collect(),
        total: totals_view(breakdown.total),
    }
}

fn services_view(services: &[ServiceBalance]) -> Vec<ServiceBalanceView> {
    services
        .iter()
        .map(|line| ServiceBalanceView {
            servicio: line.service.clone(),
            monto: line.amount,
        })
        .collect()
}

/// Receipt map with absolute URLs.
pub fn receipts_view(engine: &Engine, receipts: &ReceiptMap) -> BTreeMap<String, String> {
    receipts
        .iter()
        .map(|(code, url)| (code.to_string(), engine.public_url(url)))
        .collect()
}

pub fn caja_view(engine: &Engine, caja: &Caja) -> CajaView {
    // Legacy rows may only carry the flat opening totals.
    let initial = caja
        .initial_breakdown
        .clone()
        .unwrap_or_else(|| DenominationBreakdown {
            denominations: Vec::new(),
            total: caja.initial_totals,
        });
    let final_breakdown = caja.final_breakdown.clone().or_else(|| {
        caja.final_totals.map(|total| DenominationBreakdown {
            denominations: Vec::new(),
            total,
        })
    });

    CajaView {
        id: caja.id,
        sucursal_id: caja.branch_id,
        usuario_id: caja.user_id,
        maletin_id: caja.case_id,
        estado: if caja.is_open() { "abierta" } else { "cerrada" }.to_string(),
        fecha_apertura: caja.opened_at,
        fecha_cierre: caja.closed_at,
        saldo_inicial: breakdown_view(&initial),
        saldo_final: final_breakdown.as_ref().map(breakdown_view),
        saldos_servicios_inicial: caja
            .initial_services
            .0
            .iter()
            .map(|(service, amount)| (service.clone(), amount.0))
            .collect(),
        saldos_servicios_final: caja.final_services.as_deref().map(services_view),
        comprobantes: receipts_view(engine, &caja.receipts),
    }
}

pub fn closing_data_view(data: &ClosingData) -> ClosingDataView {
    ClosingDataView {
        saldo_final: breakdown_view(&data.breakdown),
        saldos_servicios_final: services_view(&data.services),
        fecha_cierre: data.closed_at,
    }
}

pub fn movement_view(engine: &Engine, entry: MovementEntry) -> MovementView {
    MovementView {
        id: entry.id,
        operadora: entry.operator_name,
        servicio: entry.service_name,
        monto: entry.amount,
        comprobante: entry.receipt_path.map(|url| engine.public_url(&url)),
    }
}

fn wire_status(status: ReceptionStatus) -> WireStatus {
    match status {
        ReceptionStatus::Pending => WireStatus::Pending,
        ReceptionStatus::Received => WireStatus::Received,
    }
}

pub fn withdrawal_view(group: WithdrawalGroup) -> WithdrawalView {
    WithdrawalView {
        id: group.id,
        ids: group.ids,
        fecha: group.occurred_at,
        persona_nombre: group.person_name,
        monto_pyg: group.amounts.pyg,
        monto_brl: group.amounts.brl,
        monto_usd: group.amounts.usd,
        observacion: group.observation,
        estado_recepcion: wire_status(group.status),
    }
}

pub fn cash_operation_view(row: CashOperation) -> CashOperationView {
    CashOperationView {
        id: row.id,
        caja_id: row.caja_id,
        persona_nombre: row.person.name,
        moneda: row.currency.code().to_string(),
        monto: row.amount,
        observacion: row.observation,
        estado_recepcion: wire_status(row.status),
        fecha: row.created_at,
    }
}

pub fn branch_view(branch: Branch) -> BranchView {
    BranchView {
        id: branch.id,
        nombre: branch.name,
    }
}

pub fn case_view(case: Case) -> CaseView {
    CaseView {
        id: case.id,
        sucursal_id: case.branch_id,
        codigo: case.code,
    }
}

/// Amounts of `{operator: {service: raw}}` parsed leniently.
pub fn movement_amounts(
    raw: BTreeMap<String, BTreeMap<String, RawAmount>>,
) -> Vec<(String, Vec<(String, Decimal)>)> {
    raw.into_iter()
        .map(|(operator, services)| {
            let services = services
                .into_iter()
                .map(|(service, amount)| (service, amount_from_value(&amount)))
                .collect();
            (operator, services)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use engine::EngineError;
    use serde_json::json;

    use super::*;

    fn body(value: serde_json::Value) -> BreakdownBody {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn breakdown_body_parses_lenient_amounts() {
        let breakdown = breakdown_from_body(Some(&body(json!({
            "denominaciones": [{"valor": "100000", "cantidad": "3", "moneda": "PYG"}],
            "total": {"PYG": "300.000,00", "USD": 12.5}
        }))))
        .ok()
        .unwrap();

        assert_eq!(breakdown.denominations[0].value, Decimal::from(100_000));
        assert_eq!(breakdown.denominations[0].count, 3);
        assert_eq!(breakdown.total.pyg, Decimal::from(300_000));
        assert_eq!(breakdown.total.brl, Decimal::ZERO);
        assert_eq!(breakdown.total.usd, Decimal::new(125, 1));
    }

    #[test]
    fn breakdown_without_total_is_rejected() {
        let err = breakdown_from_body(Some(&body(json!({"denominaciones": []})))).err();
        assert!(matches!(
            err,
            Some(ServerError::Engine(EngineError::Validation(_)))
        ));
        assert!(breakdown_from_body(None).is_err());
    }

    #[test]
    fn fractional_or_negative_count_is_rejected() {
        for count in [json!(1.5), json!(-2)] {
            let err = breakdown_from_body(Some(&body(json!({
                "denominaciones": [{"valor": 1000, "cantidad": count, "moneda": "PYG"}],
                "total": {"PYG": 0}
            }))))
            .err();
            assert!(matches!(err, Some(ServerError::Generic(_))));
        }
    }

    #[test]
    fn unknown_currency_is_rejected() {
        let err = breakdown_from_body(Some(&body(json!({
            "denominaciones": [{"valor": 10, "cantidad": 1, "moneda": "EUR"}],
            "total": {}
        }))))
        .err();
        assert!(matches!(
            err,
            Some(ServerError::Engine(EngineError::Validation(_)))
        ));
    }

    #[test]
    fn service_balances_default_to_zero() {
        let mut raw = BTreeMap::new();
        raw.insert("tigo".to_string(), json!("1.500,00"));
        raw.insert("claro".to_string(), json!(null));
        let balances = service_balances_from_body(raw);
        assert_eq!(balances.0["tigo"], ServiceAmount(Decimal::from(1500)));
        assert_eq!(balances.0["claro"], ServiceAmount(Decimal::ZERO));
    }
}
