//! Serves stored receipt files back.

use axum::{
    extract::{Path, State},
    http::header,
    response::IntoResponse,
};

use crate::{ServerError, server::ServerState};

fn content_type(filename: &str) -> &'static str {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "pdf" => "application/pdf",
        _ => "application/octet-stream",
    }
}

pub async fn get(
    State(state): State<ServerState>,
    Path(filename): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let bytes = state.engine.receipt_file(&filename).await?;
    Ok(([(header::CONTENT_TYPE, content_type(&filename))], bytes))
}
