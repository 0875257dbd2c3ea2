//! Cash counts and service balances captured when a register opens or closes.
//!
//! Persisted shape of a breakdown:
//!
//! ```json
//! { "denominaciones": [{ "valor": 100000, "cantidad": 3, "moneda": "PYG" }],
//!   "total": { "PYG": 300000, "BRL": 0, "USD": 0 } }
//! ```

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{Currency, CurrencyTotals, EngineError, ResultEngine, money::lenient_amount};

/// A counted note or coin: `cantidad` pieces of face value `valor`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Denomination {
    #[serde(rename = "valor", deserialize_with = "lenient_amount")]
    pub value: Decimal,
    #[serde(rename = "cantidad", default)]
    pub count: u32,
    #[serde(rename = "moneda")]
    pub currency: Currency,
}

impl Denomination {
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.value * Decimal::from(self.count)
    }
}

/// Complete cash count with its per-currency total.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenominationBreakdown {
    #[serde(rename = "denominaciones")]
    pub denominations: Vec<Denomination>,
    pub total: CurrencyTotals,
}

impl DenominationBreakdown {
    /// Builds a breakdown from request parts. The total is mandatory: it is
    /// the figure the cashier signs off on, the itemized list is optional.
    pub fn from_parts(
        denominations: Option<Vec<Denomination>>,
        total: Option<CurrencyTotals>,
    ) -> ResultEngine<Self> {
        let total = total.ok_or_else(|| {
            EngineError::Validation("breakdown total is required".to_string())
        })?;
        let denominations = denominations.unwrap_or_default();
        for denomination in &denominations {
            if denomination.value <= Decimal::ZERO {
                return Err(EngineError::Validation(format!(
                    "denomination value must be > 0, got {}",
                    denomination.value
                )));
            }
            if denomination.value.normalize().scale() > denomination.currency.minor_units() {
                return Err(EngineError::Validation(format!(
                    "{} does not have a {} denomination",
                    denomination.currency, denomination.value
                )));
            }
        }
        Ok(Self {
            denominations,
            total,
        })
    }

    /// Sum of the itemized denominations, per currency.
    #[must_use]
    pub fn counted_totals(&self) -> CurrencyTotals {
        let mut totals = CurrencyTotals::default();
        for denomination in &self.denominations {
            totals.add(denomination.currency, denomination.subtotal());
        }
        totals
    }

    /// Whether the itemized count adds up to the signed total. A breakdown
    /// without denominations always matches.
    #[must_use]
    pub fn count_matches_total(&self) -> bool {
        self.denominations.is_empty() || self.counted_totals() == self.total
    }
}

/// Breakdown as it may appear in a JSON column: either member can be absent.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub(crate) struct StoredBreakdown {
    #[serde(rename = "denominaciones", default)]
    pub denominations: Option<Vec<Denomination>>,
    #[serde(default)]
    pub total: Option<CurrencyTotals>,
}

impl StoredBreakdown {
    /// Fills the absent members: no itemization, and `fallback_total` for a
    /// missing total.
    pub(crate) fn complete(self, fallback_total: CurrencyTotals) -> DenominationBreakdown {
        DenominationBreakdown {
            denominations: self.denominations.unwrap_or_default(),
            total: self.total.unwrap_or(fallback_total),
        }
    }
}

/// Opening balance of each service line, keyed by service name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceBalances(pub BTreeMap<String, ServiceAmount>);

/// Amount wrapper so map values accept numbers and strings alike.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServiceAmount(#[serde(deserialize_with = "lenient_amount")] pub Decimal);

/// Closing balance of one service line.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceBalance {
    #[serde(rename = "servicio")]
    pub service: String,
    #[serde(rename = "monto", default, deserialize_with = "lenient_amount")]
    pub amount: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_parts_requires_total() {
        assert_eq!(
            DenominationBreakdown::from_parts(Some(Vec::new()), None),
            Err(EngineError::Validation(
                "breakdown total is required".to_string()
            ))
        );
    }

    #[test]
    fn from_parts_rejects_fractional_guaranies() {
        let denominations = vec![Denomination {
            value: Decimal::new(5, 1),
            count: 1,
            currency: Currency::Pyg,
        }];
        assert!(
            DenominationBreakdown::from_parts(Some(denominations), Some(CurrencyTotals::default()))
                .is_err()
        );
    }

    #[test]
    fn counted_totals_sum_per_currency() {
        let breakdown = DenominationBreakdown::from_parts(
            Some(vec![
                Denomination {
                    value: Decimal::from(100_000),
                    count: 3,
                    currency: Currency::Pyg,
                },
                Denomination {
                    value: Decimal::new(50, 2),
                    count: 4,
                    currency: Currency::Usd,
                },
            ]),
            Some(CurrencyTotals::default()),
        )
        .unwrap();

        let totals = breakdown.counted_totals();
        assert_eq!(totals.pyg, Decimal::from(300_000));
        assert_eq!(totals.usd, Decimal::from(2));
    }

    #[test]
    fn count_matches_total_compares_itemization() {
        let pyg = |count| Denomination {
            value: Decimal::from(50_000),
            count,
            currency: Currency::Pyg,
        };
        let signed = CurrencyTotals::new(Decimal::from(100_000), Decimal::ZERO, Decimal::ZERO);

        let matching = DenominationBreakdown::from_parts(Some(vec![pyg(2)]), Some(signed)).unwrap();
        assert!(matching.count_matches_total());

        let short = DenominationBreakdown::from_parts(Some(vec![pyg(1)]), Some(signed)).unwrap();
        assert!(!short.count_matches_total());

        let flat = DenominationBreakdown::from_parts(None, Some(signed)).unwrap();
        assert!(flat.count_matches_total());
    }

    #[test]
    fn stored_breakdown_fills_missing_members() {
        let stored: StoredBreakdown =
            serde_json::from_str(r#"{"denominaciones": [{"valor": "1000", "cantidad": 2, "moneda": "PYG"}]}"#)
                .unwrap();
        let fallback = CurrencyTotals::new(Decimal::from(2000), Decimal::ZERO, Decimal::ZERO);
        let breakdown = stored.complete(fallback);
        assert_eq!(breakdown.total, fallback);
        assert_eq!(breakdown.denominations.len(), 1);

        let stored: StoredBreakdown = serde_json::from_str(r#"{"total": {"USD": 10}}"#).unwrap();
        let breakdown = stored.complete(CurrencyTotals::default());
        assert!(breakdown.denominations.is_empty());
        assert_eq!(breakdown.total.usd, Decimal::from(10));
    }

    #[test]
    fn service_balances_accept_strings() {
        let balances: ServiceBalances =
            serde_json::from_str(r#"{"tigo": "150000", "claro": 2000}"#).unwrap();
        assert_eq!(balances.0["tigo"], ServiceAmount(Decimal::from(150_000)));
        assert_eq!(balances.0["claro"], ServiceAmount(Decimal::from(2000)));
    }
}
