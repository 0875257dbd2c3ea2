//! Withdrawal and cash ingress endpoints.

use api_types::withdrawal::{
    CashOperationNew, CashOperationView, ReturnToPending, WithdrawalDelete, WithdrawalView,
    WithdrawalsDeleted,
};
use axum::{
    Json,
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{
    CurrencyTotals, NewCashOperationCmd, Person, WithdrawalSelection, money::amount_from_value,
};

use crate::{
    ServerError,
    convert::{cash_operation_view, withdrawal_view},
    server::ServerState,
};

fn cash_operation_cmd(caja_id: i32, payload: CashOperationNew) -> NewCashOperationCmd {
    let amounts = CurrencyTotals::new(
        amount_from_value(&payload.monto_pyg),
        amount_from_value(&payload.monto_brl),
        amount_from_value(&payload.monto_usd),
    );
    let person = Person {
        id: payload.persona_id,
        name: payload.persona_nombre,
        document: payload.persona_documento,
    };
    NewCashOperationCmd::new(caja_id, person, amounts).observation(payload.observacion)
}

pub async fn list(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
) -> Result<Json<Vec<WithdrawalView>>, ServerError> {
    let groups = state.engine.withdrawals(caja_id).await?;
    Ok(Json(groups.into_iter().map(withdrawal_view).collect()))
}

pub async fn create(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    Json(payload): Json<CashOperationNew>,
) -> Result<(StatusCode, Json<Vec<CashOperationView>>), ServerError> {
    let rows = state
        .engine
        .new_withdrawal(cash_operation_cmd(caja_id, payload))
        .await?;
    let rows = rows.into_iter().map(cash_operation_view).collect();
    Ok((StatusCode::CREATED, Json(rows)))
}

pub async fn create_ingress(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    Json(payload): Json<CashOperationNew>,
) -> Result<(StatusCode, Json<Vec<CashOperationView>>), ServerError> {
    let rows = state
        .engine
        .new_ingress(cash_operation_cmd(caja_id, payload))
        .await?;
    let rows = rows.into_iter().map(cash_operation_view).collect();
    Ok((StatusCode::CREATED, Json(rows)))
}

/// The body is optional: without `ids` only the path row is deleted.
pub async fn delete(
    State(state): State<ServerState>,
    Path(withdrawal_id): Path<i32>,
    body: Bytes,
) -> Result<Json<WithdrawalsDeleted>, ServerError> {
    let payload: WithdrawalDelete = if body.iter().all(u8::is_ascii_whitespace) {
        WithdrawalDelete::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|err| ServerError::Generic(format!("invalid body: {err}")))?
    };

    let selection = match payload.ids {
        Some(ids) if !ids.is_empty() => WithdrawalSelection::Many(ids),
        _ => WithdrawalSelection::Single(withdrawal_id),
    };
    let ids = state.engine.delete_withdrawals(selection).await?;
    Ok(Json(WithdrawalsDeleted { ids }))
}

pub async fn receive(
    State(state): State<ServerState>,
    Path(withdrawal_id): Path<i32>,
) -> Result<Json<CashOperationView>, ServerError> {
    let row = state.engine.mark_withdrawal_received(withdrawal_id).await?;
    Ok(Json(cash_operation_view(row)))
}

pub async fn return_to_pending(
    State(state): State<ServerState>,
    Path(withdrawal_id): Path<i32>,
    Json(payload): Json<ReturnToPending>,
) -> Result<Json<CashOperationView>, ServerError> {
    let row = state
        .engine
        .return_withdrawal_to_pending(withdrawal_id, &payload.motivo)
        .await?;
    Ok(Json(cash_operation_view(row)))
}
