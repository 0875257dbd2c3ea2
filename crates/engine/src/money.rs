//! Decimal amounts and per-currency totals.
//!
//! Amounts reach the engine from hand-typed forms and from JSON columns that
//! were written by several generations of clients, so parsing is lenient:
//! anything that cannot be read as a number counts as zero. The only place
//! that refuses non-positive input is withdrawal creation, which checks the
//! parsed values itself.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::Currency;

/// Parses a user-entered amount.
///
/// Accepts `1500`, `1500.50`, `1500,50` and the local grouping style
/// `1.500.000,50`. A string with dots and no comma reads as grouped when
/// every group after the first has exactly three digits, so `150.000` is
/// one hundred fifty thousand while `1500.50` keeps its decimals. Returns
/// zero for anything else.
///
/// ```rust
/// use engine::money::parse_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(parse_amount("1.500.000,50"), Decimal::new(150000050, 2));
/// assert_eq!(parse_amount("150.000"), Decimal::from(150_000));
/// assert_eq!(parse_amount("abc"), Decimal::ZERO);
/// ```
#[must_use]
pub fn parse_amount(raw: &str) -> Decimal {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Decimal::ZERO;
    }

    let normalized = match (compact.contains('.'), compact.contains(',')) {
        (true, true) => compact.replace('.', "").replace(',', "."),
        (false, true) => compact.replace(',', "."),
        (true, false) if is_dot_grouped(&compact) => compact.replace('.', ""),
        _ => compact,
    };
    Decimal::from_str(&normalized).unwrap_or(Decimal::ZERO)
}

/// `150.000`, `1.500.000`: a leading group of one to three digits without a
/// leading zero, then groups of exactly three.
fn is_dot_grouped(raw: &str) -> bool {
    let unsigned = raw.strip_prefix(['-', '+']).unwrap_or(raw);
    let mut groups = unsigned.split('.');
    let Some(first) = groups.next() else {
        return false;
    };
    let digits = |group: &str| group.chars().all(|c| c.is_ascii_digit());

    (1..=3).contains(&first.len())
        && !first.starts_with('0')
        && digits(first)
        && groups.all(|group| group.len() == 3 && digits(group))
}

/// Reads an amount out of an arbitrary JSON value (number or string).
#[must_use]
pub fn amount_from_value(value: &Value) -> Decimal {
    match value {
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Decimal::from(int)
            } else if let Some(float) = number.as_f64() {
                Decimal::try_from(float).unwrap_or(Decimal::ZERO)
            } else {
                parse_amount(&number.to_string())
            }
        }
        Value::String(raw) => parse_amount(raw),
        _ => Decimal::ZERO,
    }
}

/// Canonical text form used by the decimal columns.
pub(crate) fn encode_amount(amount: Decimal) -> String {
    amount.normalize().to_string()
}

/// Inverse of [`encode_amount`]. Canonical text is read as-is; anything
/// else goes through [`parse_amount`].
pub(crate) fn decode_amount(raw: &str) -> Decimal {
    Decimal::from_str(raw.trim()).unwrap_or_else(|_| parse_amount(raw))
}

/// `deserialize_with` helper applying [`amount_from_value`].
pub(crate) fn lenient_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(amount_from_value(&value))
}

/// One amount per register currency.
///
/// Serialized as `{ "PYG": .., "BRL": .., "USD": .. }`; a missing or
/// unreadable member reads as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrencyTotals {
    #[serde(rename = "PYG", default, deserialize_with = "lenient_amount")]
    pub pyg: Decimal,
    #[serde(rename = "BRL", default, deserialize_with = "lenient_amount")]
    pub brl: Decimal,
    #[serde(rename = "USD", default, deserialize_with = "lenient_amount")]
    pub usd: Decimal,
}

impl CurrencyTotals {
    #[must_use]
    pub const fn new(pyg: Decimal, brl: Decimal, usd: Decimal) -> Self {
        Self { pyg, brl, usd }
    }

    #[must_use]
    pub fn get(&self, currency: Currency) -> Decimal {
        match currency {
            Currency::Pyg => self.pyg,
            Currency::Brl => self.brl,
            Currency::Usd => self.usd,
        }
    }

    pub fn add(&mut self, currency: Currency, amount: Decimal) {
        match currency {
            Currency::Pyg => self.pyg += amount,
            Currency::Brl => self.brl += amount,
            Currency::Usd => self.usd += amount,
        }
    }

    /// Iterates `(currency, amount)` pairs whose amount is strictly positive.
    pub fn positive(&self) -> impl Iterator<Item = (Currency, Decimal)> + '_ {
        Currency::ALL
            .into_iter()
            .map(|currency| (currency, self.get(currency)))
            .filter(|(_, amount)| *amount > Decimal::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_amount_accepts_local_formats() {
        assert_eq!(parse_amount("1500"), Decimal::from(1500));
        assert_eq!(parse_amount(" 10,5 "), Decimal::new(105, 1));
        assert_eq!(parse_amount("1.500.000"), Decimal::from(1_500_000));
        assert_eq!(parse_amount("1.234,56"), Decimal::new(123456, 2));
    }

    #[test]
    fn parse_amount_reads_dot_groups_as_thousands() {
        assert_eq!(parse_amount("1.500"), Decimal::from(1500));
        assert_eq!(parse_amount("150.000"), Decimal::from(150_000));
        assert_eq!(parse_amount("-25.000"), Decimal::from(-25_000));
        assert_eq!(parse_amount("150.000"), parse_amount("150.000,00"));
    }

    #[test]
    fn parse_amount_keeps_plain_decimals() {
        assert_eq!(parse_amount("1500.50"), Decimal::new(150050, 2));
        assert_eq!(parse_amount("12.5"), Decimal::new(125, 1));
        assert_eq!(parse_amount("0.500"), Decimal::new(5, 1));
        assert_eq!(parse_amount("1.50.000"), Decimal::ZERO);
    }

    #[test]
    fn parse_amount_defaults_to_zero() {
        assert_eq!(parse_amount(""), Decimal::ZERO);
        assert_eq!(parse_amount("n/a"), Decimal::ZERO);
        assert_eq!(amount_from_value(&Value::Null), Decimal::ZERO);
        assert_eq!(amount_from_value(&Value::Bool(true)), Decimal::ZERO);
    }

    #[test]
    fn totals_tolerate_strings_and_missing_members() {
        let totals: CurrencyTotals =
            serde_json::from_str(r#"{"PYG": "150000", "USD": 12.5}"#).unwrap();
        assert_eq!(totals.pyg, Decimal::from(150_000));
        assert_eq!(totals.brl, Decimal::ZERO);
        assert_eq!(totals.usd, Decimal::new(125, 1));
    }

    #[test]
    fn positive_skips_zero_and_negative() {
        let totals = CurrencyTotals::new(Decimal::from(1000), Decimal::ZERO, Decimal::from(-5));
        let positive: Vec<_> = totals.positive().collect();
        assert_eq!(positive, vec![(Currency::Pyg, Decimal::from(1000))]);
    }

    #[test]
    fn encode_amount_is_canonical() {
        assert_eq!(encode_amount(Decimal::new(150000, 2)), "1500");
        assert_eq!(decode_amount("1500.50"), Decimal::new(150050, 2));
        assert_eq!(decode_amount("12.345"), Decimal::new(12345, 3));
        assert_eq!(decode_amount("1.500,00"), Decimal::from(1500));
    }
}
