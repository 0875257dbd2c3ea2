use chrono::{DateTime, Utc};
use sea_orm::TransactionTrait;

use crate::{DenominationBreakdown, ResultEngine, ServiceBalance, cajas};

use super::{Engine, with_tx};

/// Final figures of a closed register.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClosingData {
    pub breakdown: DenominationBreakdown,
    pub services: Vec<ServiceBalance>,
    pub closed_at: Option<DateTime<Utc>>,
}

impl Engine {
    /// Closing figures of a closed register, reconciled from whatever
    /// representation the row carries.
    pub async fn closing_data(&self, caja_id: i32) -> ResultEngine<ClosingData> {
        with_tx!(self, |db_tx| {
            let model = self.require_closed_caja(&db_tx, caja_id).await?;
            Ok(ClosingData {
                breakdown: reconcile_breakdown(&model),
                services: model.final_services().unwrap_or_default(),
                closed_at: model.closed_at,
            })
        })
    }
}

/// Picks the closing breakdown: the structured final breakdown, else the
/// structured initial one, else one synthesized from the flat final totals
/// with no itemization. A missing total is taken from the flat final
/// columns.
fn reconcile_breakdown(model: &cajas::Model) -> DenominationBreakdown {
    let flat = model.final_totals();
    if let Some(stored) = model.stored_final_breakdown() {
        return stored.complete(flat.unwrap_or_default());
    }
    if let Some(stored) = model.stored_initial_breakdown() {
        tracing::debug!("caja {}: closing data from the opening breakdown", model.id);
        return stored.complete(flat.unwrap_or_else(|| model.initial_totals()));
    }
    DenominationBreakdown {
        denominations: Vec::new(),
        total: flat.unwrap_or_default(),
    }
}
