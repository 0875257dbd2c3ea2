//! Regrouping of per-currency withdrawal rows into logical operations.

use std::collections::HashMap;

use chrono::{DateTime, Timelike, Utc};

use crate::{
    CurrencyTotals,
    cash_operations::{CashOperation, ReceptionStatus},
};

/// A logical withdrawal: every row sharing person, observation and minute.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WithdrawalGroup {
    /// Id of the first member row.
    pub id: i32,
    pub ids: Vec<i32>,
    /// Timestamp of the first member row.
    pub occurred_at: DateTime<Utc>,
    pub person_name: String,
    pub amounts: CurrencyTotals,
    pub observation: String,
    pub status: ReceptionStatus,
}

/// Truncates seconds and sub-seconds.
pub(crate) fn floor_to_minute(at: DateTime<Utc>) -> DateTime<Utc> {
    at.with_second(0)
        .and_then(|at| at.with_nanosecond(0))
        .unwrap_or(at)
}

/// Groups rows by `person_name + observation + minute` (exact string
/// equality), sums amounts per currency and sorts groups newest first.
///
/// A group is `RECEIVED` only when every member is.
pub fn group_withdrawals<I>(rows: I) -> Vec<WithdrawalGroup>
where
    I: IntoIterator<Item = CashOperation>,
{
    let mut index: HashMap<(String, String, DateTime<Utc>), usize> = HashMap::new();
    let mut groups: Vec<WithdrawalGroup> = Vec::new();

    for row in rows {
        let key = (
            row.person.name.clone(),
            row.observation.clone(),
            floor_to_minute(row.created_at),
        );
        let position = *index.entry(key).or_insert_with(|| {
            groups.push(WithdrawalGroup {
                id: row.id,
                ids: Vec::new(),
                occurred_at: row.created_at,
                person_name: row.person.name.clone(),
                amounts: CurrencyTotals::default(),
                observation: row.observation.clone(),
                status: ReceptionStatus::Received,
            });
            groups.len() - 1
        });

        let group = &mut groups[position];
        group.ids.push(row.id);
        group.amounts.add(row.currency, row.amount);
        if row.status != ReceptionStatus::Received {
            group.status = ReceptionStatus::Pending;
        }
    }

    groups.sort_by(|a, b| b.occurred_at.cmp(&a.occurred_at).then(b.id.cmp(&a.id)));
    groups
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use rust_decimal::Decimal;

    use super::*;
    use crate::{
        Currency,
        cash_operations::{OperationKind, Person},
    };

    fn row(
        id: i32,
        person: &str,
        observation: &str,
        currency: Currency,
        amount: i64,
        at: DateTime<Utc>,
        status: ReceptionStatus,
    ) -> CashOperation {
        CashOperation {
            id,
            caja_id: 1,
            kind: OperationKind::Egress,
            person: Person {
                id: None,
                name: person.to_string(),
                document: None,
            },
            currency,
            amount: Decimal::from(amount),
            observation: observation.to_string(),
            status,
            created_at: at,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_040 + secs, 0).unwrap()
    }

    #[test]
    fn rows_of_one_operation_become_one_group() {
        let groups = group_withdrawals([
            row(1, "ANA", "X", Currency::Pyg, 1000, at(0), ReceptionStatus::Pending),
            row(2, "ANA", "X", Currency::Usd, 5, at(0), ReceptionStatus::Pending),
        ]);

        assert_eq!(groups.len(), 1);
        let group = &groups[0];
        assert_eq!(group.amounts.pyg, Decimal::from(1000));
        assert_eq!(group.amounts.usd, Decimal::from(5));
        assert_eq!(group.amounts.brl, Decimal::ZERO);
        assert_eq!(group.ids, vec![1, 2]);
        assert_eq!(group.id, 1);
    }

    #[test]
    fn any_pending_member_makes_the_group_pending() {
        let groups = group_withdrawals([
            row(1, "ANA", "X", Currency::Pyg, 1, at(0), ReceptionStatus::Received),
            row(2, "ANA", "X", Currency::Brl, 1, at(1), ReceptionStatus::Received),
            row(3, "ANA", "X", Currency::Usd, 1, at(2), ReceptionStatus::Pending),
        ]);
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].status, ReceptionStatus::Pending);

        let groups = group_withdrawals([
            row(1, "ANA", "X", Currency::Pyg, 1, at(0), ReceptionStatus::Received),
            row(2, "ANA", "X", Currency::Brl, 1, at(0), ReceptionStatus::Received),
        ]);
        assert_eq!(groups[0].status, ReceptionStatus::Received);
    }

    #[test]
    fn key_is_exact_on_person_observation_and_minute() {
        let groups = group_withdrawals([
            row(1, "ANA", "X", Currency::Pyg, 1, at(0), ReceptionStatus::Pending),
            row(2, "Ana", "X", Currency::Pyg, 1, at(0), ReceptionStatus::Pending),
            row(3, "ANA", "X ", Currency::Pyg, 1, at(0), ReceptionStatus::Pending),
            row(4, "ANA", "X", Currency::Pyg, 1, at(60), ReceptionStatus::Pending),
        ]);
        assert_eq!(groups.len(), 4);
    }

    #[test]
    fn groups_are_sorted_newest_first() {
        let groups = group_withdrawals([
            row(1, "ANA", "X", Currency::Pyg, 1, at(0), ReceptionStatus::Pending),
            row(2, "LUIS", "Y", Currency::Pyg, 1, at(120), ReceptionStatus::Pending),
            row(3, "ANA", "X", Currency::Usd, 1, at(30), ReceptionStatus::Pending),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].person_name, "LUIS");
        assert_eq!(groups[1].ids, vec![1, 3]);
    }

    #[test]
    fn floor_to_minute_drops_seconds() {
        let at = Utc.timestamp_opt(1_700_000_059, 999).unwrap();
        assert_eq!(floor_to_minute(at), Utc.timestamp_opt(1_700_000_040, 0).unwrap());
    }
}
