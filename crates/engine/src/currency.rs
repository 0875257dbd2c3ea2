use serde::{Deserialize, Serialize};

use crate::EngineError;

/// Currencies a register handles.
///
/// Every register counts cash in guaraníes, reais and dollars at the same
/// time, so totals are always a triple (see [`CurrencyTotals`]).
///
/// ## Minor units
///
/// `minor_units()` is the number of decimal digits a face value or an amount
/// may carry. PYG has no fractional unit, BRL and USD use cents.
///
/// [`CurrencyTotals`]: crate::CurrencyTotals
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Pyg,
    Brl,
    Usd,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Pyg, Currency::Brl, Currency::Usd];

    /// Canonical currency code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Currency::Pyg => "PYG",
            Currency::Brl => "BRL",
            Currency::Usd => "USD",
        }
    }

    /// Number of fraction digits used when formatting/parsing amounts.
    #[must_use]
    pub const fn minor_units(self) -> u32 {
        match self {
            Currency::Pyg => 0,
            Currency::Brl | Currency::Usd => 2,
        }
    }
}

impl core::fmt::Display for Currency {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PYG" | "GS" => Ok(Currency::Pyg),
            "BRL" | "RS" => Ok(Currency::Brl),
            "USD" => Ok(Currency::Usd),
            other => Err(EngineError::Validation(format!(
                "unsupported currency: {other}"
            ))),
        }
    }
}
