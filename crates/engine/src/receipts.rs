//! Denormalized receipt map kept on each register:
//! `{ "<businessTypeCode>": "/uploads/<filename>" }`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::catalog::BusinessType;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReceiptMap(BTreeMap<String, String>);

impl ReceiptMap {
    #[must_use]
    pub fn get(&self, code: &str) -> Option<&str> {
        self.0.get(code).map(String::as_str)
    }

    /// Sets the receipt of `business_type`, returning the URL it replaces.
    pub fn insert(&mut self, business_type: BusinessType, url: impl Into<String>) -> Option<String> {
        self.0.insert(business_type.code().to_string(), url.into())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(code, url)| (code.as_str(), url.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads the column value.
    ///
    /// Older rows hold the map JSON-encoded twice, or carry non-string
    /// values; both are tolerated and unusable entries are skipped.
    pub(crate) fn decode(raw: Option<&str>) -> Self {
        let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
            return Self::default();
        };
        let mut value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!("unreadable receipt map, starting from empty: {err}");
                return Self::default();
            }
        };
        if let Value::String(inner) = &value {
            value = serde_json::from_str(inner).unwrap_or(Value::Null);
        }

        let Value::Object(entries) = value else {
            return Self::default();
        };
        Self(
            entries
                .into_iter()
                .filter_map(|(code, url)| match url {
                    Value::String(url) if !url.is_empty() => Some((code, url)),
                    other => {
                        tracing::debug!("skipping receipt entry {code}: {other}");
                        None
                    }
                })
                .collect(),
        )
    }

    pub(crate) fn encode(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}
