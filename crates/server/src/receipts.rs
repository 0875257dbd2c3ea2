//! Receipt upload endpoints.
//!
//! Uploads arrive as `multipart/form-data`. Single uploads carry the file in
//! `comprobante` and the business type in `tipo`; batches carry every file
//! under `comprobantes` and a JSON array string of business types in `tipos`.

use api_types::{
    caja::CajaView,
    receipt::{BatchAttached, ReceiptUrl},
};
use axum::{
    Json,
    extract::{Multipart, Path, State},
};
use engine::{BusinessType, Upload};

use crate::{ServerError, convert::caja_view, server::ServerState};

/// Decoded multipart form.
#[derive(Default)]
struct ReceiptForm {
    files: Vec<Upload>,
    types: Vec<String>,
}

async fn read_form(
    mut multipart: Multipart,
    file_field: &str,
    type_field: &str,
) -> Result<ReceiptForm, ServerError> {
    let mut form = ReceiptForm::default();
    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();
        if name == file_field {
            let original_name = field.file_name().map(str::to_string);
            let bytes = field.bytes().await?;
            form.files.push(Upload::new(original_name, bytes.to_vec()));
        } else if name == type_field {
            form.types.push(field.text().await?);
        } else {
            tracing::debug!("ignoring multipart field {name}");
        }
    }
    Ok(form)
}

/// The single file and business type of a one-receipt form.
fn single_receipt(
    form: ReceiptForm,
    tipo: Option<&str>,
) -> Result<(BusinessType, Upload), ServerError> {
    let code = match tipo {
        Some(code) => code.to_string(),
        None => form
            .types
            .into_iter()
            .next()
            .ok_or_else(|| ServerError::Generic("missing field tipo".to_string()))?,
    };
    let business_type = BusinessType::parse(&code)?;
    let upload = form
        .files
        .into_iter()
        .next()
        .ok_or_else(|| ServerError::Generic("missing file comprobante".to_string()))?;
    Ok((business_type, upload))
}

/// Parses the `tipos` field: a JSON array of codes.
fn batch_types(raw: &[String]) -> Result<Vec<BusinessType>, ServerError> {
    let raw = raw
        .first()
        .ok_or_else(|| ServerError::Generic("missing field tipos".to_string()))?;
    let codes: Vec<String> = serde_json::from_str(raw)
        .map_err(|err| ServerError::Generic(format!("tipos must be a JSON array: {err}")))?;
    codes
        .iter()
        .map(|code| BusinessType::parse(code).map_err(ServerError::from))
        .collect()
}

pub async fn attach(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<CajaView>, ServerError> {
    let form = read_form(multipart, "comprobante", "tipo").await?;
    let (business_type, upload) = single_receipt(form, None)?;

    let caja = state
        .engine
        .attach_receipt(caja_id, business_type, upload)
        .await?;
    Ok(Json(caja_view(&state.engine, &caja)))
}

pub async fn update(
    State(state): State<ServerState>,
    Path((caja_id, tipo)): Path<(i32, String)>,
    multipart: Multipart,
) -> Result<Json<ReceiptUrl>, ServerError> {
    let form = read_form(multipart, "comprobante", "tipo").await?;
    let (business_type, upload) = single_receipt(form, Some(&tipo))?;

    let url = state
        .engine
        .update_receipt(caja_id, business_type, upload)
        .await?;
    Ok(Json(ReceiptUrl {
        url: state.engine.public_url(&url),
    }))
}

pub async fn resolve(
    State(state): State<ServerState>,
    Path((caja_id, tipo)): Path<(i32, String)>,
) -> Result<Json<ReceiptUrl>, ServerError> {
    let business_type = BusinessType::parse(&tipo)?;
    let url = state.engine.resolve_receipt(caja_id, business_type).await?;
    Ok(Json(ReceiptUrl {
        url: state.engine.public_url(&url),
    }))
}

pub async fn attach_batch(
    State(state): State<ServerState>,
    Path(caja_id): Path<i32>,
    multipart: Multipart,
) -> Result<Json<BatchAttached>, ServerError> {
    let form = read_form(multipart, "comprobantes", "tipos").await?;
    let types = batch_types(&form.types)?;

    let urls = state
        .engine
        .attach_receipts_batch(caja_id, &types, form.files)
        .await?;
    Ok(Json(BatchAttached {
        message: format!("{} receipts attached", urls.len()),
        urls: urls
            .iter()
            .map(|url| state.engine.public_url(url))
            .collect(),
    }))
}
