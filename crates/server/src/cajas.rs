//! Register lifecycle endpoints.

use api_types::caja::{CajaClose, CajaOpen, CajaView, ClosingDataUpdate, ClosingDataView, OpeningDataUpdate};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use engine::{CloseCajaCmd, OpenCajaCmd};

use crate::{
    ServerError,
    convert::{
        breakdown_from_body, caja_view, closing_data_view, service_balances_from_body,
        service_list_from_body,
    },
    server::ServerState,
};

pub async fn open(
    State(state): State<ServerState>,
    Json(payload): Json<CajaOpen>,
) -> Result<(StatusCode, Json<CajaView>), ServerError> {
    let breakdown = breakdown_from_body(payload.saldo_inicial.as_ref())?;
    let cmd = OpenCajaCmd::new(
        payload.sucursal_id,
        payload.usuario_id,
        payload.maletin_id,
        breakdown,
    )
    .services(service_balances_from_body(payload.saldos_servicios_inicial));

    let caja = state.engine.open_caja(cmd).await?;
    Ok((StatusCode::CREATED, Json(caja_view(&state.engine, &caja))))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
) -> Result<Json<CajaView>, ServerError> {
    let caja = state.engine.caja(caja_id).await?;
    Ok(Json(caja_view(&state.engine, &caja)))
}

pub async fn close(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    Json(payload): Json<CajaClose>,
) -> Result<Json<CajaView>, ServerError> {
    let breakdown = breakdown_from_body(payload.saldo_final.as_ref())?;
    let cmd = CloseCajaCmd::new(caja_id, breakdown)
        .services(service_list_from_body(payload.saldos_servicios_final));

    let caja = state.engine.close_caja(cmd).await?;
    Ok(Json(caja_view(&state.engine, &caja)))
}

pub async fn update_opening_data(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    Json(payload): Json<OpeningDataUpdate>,
) -> Result<Json<CajaView>, ServerError> {
    let breakdown = breakdown_from_body(payload.saldo_inicial.as_ref())?;
    let services = service_balances_from_body(payload.saldos_servicios_inicial);

    let caja = state
        .engine
        .update_opening_data(caja_id, &breakdown, &services)
        .await?;
    Ok(Json(caja_view(&state.engine, &caja)))
}

pub async fn update_closing_data(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    Json(payload): Json<ClosingDataUpdate>,
) -> Result<Json<CajaView>, ServerError> {
    let breakdown = breakdown_from_body(payload.saldo_final.as_ref())?;
    let services = service_list_from_body(payload.saldos_servicios_final);

    let caja = state
        .engine
        .update_closing_data(caja_id, &breakdown, &services)
        .await?;
    Ok(Json(caja_view(&state.engine, &caja)))
}

pub async fn closing_data(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
) -> Result<Json<ClosingDataView>, ServerError> {
    let data = state.engine.closing_data(caja_id).await?;
    Ok(Json(closing_data_view(&data)))
}
