use std::{path::PathBuf, sync::Arc};

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use http_body_util::BodyExt;
use sea_orm::Database;
use serde_json::{Value, json};
use tower::ServiceExt;
use uuid::Uuid;

use engine::{DiskStorage, Engine};
use migration::MigratorTrait;
use server::{ServerOptions, ServerState, router};

const BOUNDARY: &str = "caja-test-boundary";

async fn app() -> Router {
    let uploads = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../target/test_uploads")
        .join(Uuid::new_v4().to_string());
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder()
        .database(db)
        .storage(Arc::new(DiskStorage::new(uploads, "http://cdn.test")))
        .build()
        .await
        .unwrap();

    let state = ServerState {
        engine: Arc::new(engine),
    };
    router(state, ServerOptions::default().max_body_bytes)
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

async fn send_json(app: &Router, method: Method, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

/// `(name, filename, content)`; a `None` filename makes a text field.
fn multipart(method: Method, uri: &str, parts: &[(&str, Option<&str>, &str)]) -> Request<Body> {
    let mut body = String::new();
    for (name, filename, content) in parts {
        body.push_str(&format!("--{BOUNDARY}\r\n"));
        match filename {
            Some(filename) => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                 Content-Type: image/jpeg\r\n\r\n"
            )),
            None => body.push_str(&format!(
                "Content-Disposition: form-data; name=\"{name}\"\r\n\r\n"
            )),
        }
        body.push_str(content);
        body.push_str("\r\n");
    }
    body.push_str(&format!("--{BOUNDARY}--\r\n"));

    Request::builder()
        .method(method)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

/// Creates a branch and a case, then opens a register with 300.000 Gs.
async fn open_caja(app: &Router) -> (i64, i64) {
    let (_, branch) = send_json(app, Method::POST, "/sucursales", json!({"nombre": "Central"})).await;
    let branch_id = branch["id"].as_i64().unwrap();
    let (_, case) = send_json(
        app,
        Method::POST,
        &format!("/sucursales/{branch_id}/maletines"),
        json!({"codigo": "M-01"}),
    )
    .await;
    let case_id = case["id"].as_i64().unwrap();

    let (status, caja) = send_json(
        app,
        Method::POST,
        "/cajas",
        json!({
            "sucursalId": branch_id,
            "usuarioId": 7,
            "maletinId": case_id,
            "saldoInicial": {
                "denominaciones": [{"valor": 100000, "cantidad": 3, "moneda": "PYG"}],
                "total": {"PYG": "300000", "BRL": 0, "USD": 0}
            },
            "saldosServiciosInicial": {"tigo": "150000"}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    (caja["id"].as_i64().unwrap(), case_id)
}

#[tokio::test]
async fn open_returns_register_and_second_open_conflicts() {
    let app = app().await;
    let (caja_id, case_id) = open_caja(&app).await;

    let (status, caja) = get(&app, &format!("/cajas/{caja_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(caja["estado"], "abierta");
    assert_eq!(caja["saldoInicial"]["total"]["PYG"], json!(300000.0));
    assert_eq!(caja["saldosServiciosInicial"]["tigo"], json!(150000.0));

    let (status, body) = send_json(
        &app,
        Method::POST,
        "/cajas",
        json!({
            "sucursalId": caja["sucursalId"],
            "usuarioId": 8,
            "maletinId": case_id,
            "saldoInicial": {"total": {"PYG": 1}}
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "MALETIN_EN_USO");

    let (status, open) = get(&app, &format!("/maletines/{case_id}/caja-abierta")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(open["id"].as_i64(), Some(caja_id));
}

#[tokio::test]
async fn close_twice_is_rejected() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;
    let uri = format!("/cajas/{caja_id}/cerrar");
    let body = json!({
        "saldoFinal": {"denominaciones": [], "total": {"PYG": 250000}},
        "saldosServiciosFinal": [{"servicio": "tigo", "monto": "42.000,00"}]
    });

    let (status, caja) = send_json(&app, Method::PUT, &uri, body.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(caja["estado"], "cerrada");
    assert_eq!(caja["saldosServiciosFinal"][0]["monto"], json!(42000.0));

    let (status, err) = send_json(&app, Method::PUT, &uri, body).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(err["code"], "CAJA_CERRADA");

    let (status, data) = get(&app, &format!("/cajas/{caja_id}/datos-cierre")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(data["saldoFinal"]["total"]["PYG"], json!(250000.0));
}

#[tokio::test]
async fn close_without_total_is_a_validation_error() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;

    let (status, err) = send_json(
        &app,
        Method::PUT,
        &format!("/cajas/{caja_id}/cerrar"),
        json!({"saldoFinal": {"denominaciones": []}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION");
}

#[tokio::test]
async fn missing_register_is_not_found() {
    let app = app().await;
    let (status, err) = get(&app, "/cajas/999").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "NOT_FOUND");
}

#[tokio::test]
async fn movements_are_submitted_and_read_back() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;

    let (status, created) = send_json(
        &app,
        Method::POST,
        &format!("/cajas/{caja_id}/movimiento"),
        json!({
            "movimientos": {
                "tigo": {"minicargas": "1.500,00", "giros": 0},
                "wepa": {"pagos": 2000}
            },
            "actualizarTodos": true
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["movimientos"].as_array().unwrap().len(), 3);

    let (status, read) = get(&app, &format!("/cajas/{caja_id}/movimientos")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(read["movimientos"]["tigo"]["minicargas"], json!(1500.0));
    assert_eq!(read["movimientos"]["tigo"]["giros"], json!(0.0));

    let (status, err) = send_json(
        &app,
        Method::POST,
        &format!("/cajas/{caja_id}/movimiento"),
        json!({"movimientos": {"bingo": {"pagos": 1}}}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION");
}

#[tokio::test]
async fn receipts_are_attached_resolved_and_served() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;

    let (status, caja) = send(
        &app,
        multipart(
            Method::POST,
            &format!("/cajas/{caja_id}/comprobante"),
            &[("tipo", None, "minicargas"), ("comprobante", Some("a.jpg"), "jpeg-bytes")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let url = caja["comprobantes"]["minicargas"].as_str().unwrap().to_string();
    assert!(url.starts_with("http://cdn.test/uploads/"));

    let (status, resolved) = get(&app, &format!("/cajas/{caja_id}/comprobante/minicargas")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(resolved["url"], url.as_str());

    let path = url.trim_start_matches("http://cdn.test");
    let response = app
        .clone()
        .oneshot(Request::builder().uri(path).body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[header::CONTENT_TYPE], "image/jpeg");
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(&bytes[..], b"jpeg-bytes");

    let (status, updated) = send(
        &app,
        multipart(
            Method::PUT,
            &format!("/cajas/{caja_id}/comprobante/minicargas"),
            &[("comprobante", Some("b.png"), "png-bytes")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_ne!(updated["url"], url.as_str());
    assert!(updated["url"].as_str().unwrap().ends_with(".png"));
}

#[tokio::test]
async fn batch_attach_returns_every_url() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;

    let (status, body) = send(
        &app,
        multipart(
            Method::POST,
            &format!("/cajas/{caja_id}/comprobantes/batch"),
            &[
                ("comprobantes", Some("1.jpg"), "one"),
                ("comprobantes", Some("2.jpg"), "two"),
                ("tipos", None, r#"["netel","claroGiros"]"#),
            ],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["urls"].as_array().unwrap().len(), 2);

    let (_, caja) = get(&app, &format!("/cajas/{caja_id}")).await;
    assert_eq!(caja["comprobantes"]["netel"], body["urls"][0]);
    assert_eq!(caja["comprobantes"]["claroGiros"], body["urls"][1]);
}

#[tokio::test]
async fn attach_to_missing_register_is_not_found() {
    let app = app().await;
    let (status, err) = send(
        &app,
        multipart(
            Method::POST,
            "/cajas/404/comprobante",
            &[("tipo", None, "wepa"), ("comprobante", Some("a.jpg"), "x")],
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(err["code"], "NOT_FOUND");
}

#[tokio::test]
async fn withdrawal_lifecycle() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;
    let uri = format!("/cajas/{caja_id}/retiros");

    let (status, rows) = send_json(
        &app,
        Method::POST,
        &uri,
        json!({
            "montoPYG": "1.000,00",
            "montoBRL": "",
            "montoUSD": 5,
            "personaId": 3,
            "personaNombre": "ANA",
            "observacion": "X"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rows.as_array().unwrap().len(), 2);

    let (status, list) = get(&app, &uri).await;
    assert_eq!(status, StatusCode::OK);
    let entry = &list[0];
    assert_eq!(entry["personaNombre"], "ANA");
    assert_eq!(entry["montoPYG"], json!(1000.0));
    assert_eq!(entry["montoUSD"], json!(5.0));
    assert_eq!(entry["estadoRecepcion"], "PENDING");
    assert_eq!(entry["ids"].as_array().unwrap().len(), 2);

    let first = entry["ids"][0].as_i64().unwrap();
    let (status, row) = send_json(
        &app,
        Method::PUT,
        &format!("/cajas/retiros/{first}/recibir"),
        json!({}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["estadoRecepcion"], "RECEIVED");

    let (status, row) = send_json(
        &app,
        Method::PUT,
        &format!("/cajas/retiros/{first}/devolver"),
        json!({"motivo": "wrong count"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(row["estadoRecepcion"], "PENDING");

    let (status, deleted) = send_json(
        &app,
        Method::DELETE,
        &format!("/cajas/retiros/{first}"),
        json!({"ids": entry["ids"]}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["ids"], entry["ids"]);

    let (_, list) = get(&app, &uri).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn withdrawal_without_amount_is_rejected() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;

    let (status, err) = send_json(
        &app,
        Method::POST,
        &format!("/cajas/{caja_id}/retiros"),
        json!({"montoPYG": "abc", "personaNombre": "ANA"}),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(err["code"], "VALIDATION");
}

#[tokio::test]
async fn delete_single_withdrawal_without_body() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;
    let (_, rows) = send_json(
        &app,
        Method::POST,
        &format!("/cajas/{caja_id}/retiros"),
        json!({"montoPYG": 500, "personaNombre": "LUIS"}),
    )
    .await;
    let id = rows[0]["id"].as_i64().unwrap();

    let request = Request::builder()
        .method(Method::DELETE)
        .uri(format!("/cajas/retiros/{id}"))
        .body(Body::empty())
        .unwrap();
    let (status, deleted) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(deleted["ids"], json!([id]));
}

#[tokio::test]
async fn ingress_is_not_a_withdrawal() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;

    let (status, rows) = send_json(
        &app,
        Method::POST,
        &format!("/cajas/{caja_id}/ingresos"),
        json!({"montoBRL": 50, "personaNombre": "ANA"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(rows[0]["moneda"], "BRL");

    let (_, list) = get(&app, &format!("/cajas/{caja_id}/retiros")).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn grouped_guarani_withdrawal_keeps_thousands() {
    let app = app().await;
    let (caja_id, _) = open_caja(&app).await;
    let uri = format!("/cajas/{caja_id}/retiros");

    let (status, _) = send_json(
        &app,
        Method::POST,
        &uri,
        json!({"montoPYG": "150.000", "personaNombre": "ANA"}),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, list) = get(&app, &uri).await;
    assert_eq!(list[0]["montoPYG"], json!(150000.0));
}
