//! Branch and case registry endpoints.

use api_types::{
    caja::CajaView,
    registry::{BranchNew, BranchView, CaseNew, CaseView},
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    ServerError,
    convert::{branch_view, caja_view, case_view},
    server::ServerState,
};

pub async fn branch_new(
    State(state): State<ServerState>,
    Json(payload): Json<BranchNew>,
) -> Result<(StatusCode, Json<BranchView>), ServerError> {
    let branch = state.engine.new_branch(&payload.nombre).await?;
    Ok((StatusCode::CREATED, Json(branch_view(branch))))
}

pub async fn case_new(
    State(state): State<ServerState>,
    Path(branch_id): Path<i32>,
    Json(payload): Json<CaseNew>,
) -> Result<(StatusCode, Json<CaseView>), ServerError> {
    let case = state.engine.new_case(branch_id, &payload.codigo).await?;
    Ok((StatusCode::CREATED, Json(case_view(case))))
}

pub async fn open_caja(
    State(state): State<ServerState>,
    Path(case_id): Path<i32>,
) -> Result<Json<CajaView>, ServerError> {
    let caja = state.engine.open_caja_for_case(case_id).await?;
    Ok(Json(caja_view(&state.engine, &caja)))
}
