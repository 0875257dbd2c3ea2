//! Service movement endpoints.

use api_types::movement::{MovementsCreated, MovementsSubmit, MovementsView};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{MovementMatrix, RecordMovementsCmd};

use crate::{
    ServerError,
    convert::{movement_amounts, movement_view, receipts_view},
    server::ServerState,
};

pub async fn submit(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    Json(payload): Json<MovementsSubmit>,
) -> Result<(StatusCode, Json<MovementsCreated>), ServerError> {
    let matrix = MovementMatrix::try_from_raw(movement_amounts(payload.movimientos))?;
    let cmd = RecordMovementsCmd::new(caja_id, matrix).replace_all(payload.actualizar_todos);

    let entries = state.engine.record_movements(cmd).await?;
    let movimientos = entries
        .into_iter()
        .map(|entry| movement_view(&state.engine, entry))
        .collect();
    Ok((StatusCode::CREATED, Json(MovementsCreated { movimientos })))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
) -> Result<Json<MovementsView>, ServerError> {
    let read = state.engine.movements(caja_id).await?;
    Ok(Json(MovementsView {
        movimientos: read.movements.to_named(),
        comprobantes: receipts_view(&state.engine, &read.receipts),
    }))
}
