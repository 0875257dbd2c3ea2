use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use std::{net::SocketAddr, sync::Arc};

use crate::{cajas, movements, receipts, registry, uploads, withdrawals};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
}

/// Listener and request limits.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub addr: SocketAddr,
    /// Largest accepted request body, multipart uploads included.
    pub max_body_bytes: usize,
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_body_bytes: 10 * 1024 * 1024,
        }
    }
}

pub fn router(state: ServerState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/sucursales", post(registry::branch_new))
        .route("/sucursales/{id}/maletines", post(registry::case_new))
        .route("/maletines/{id}/caja-abierta", get(registry::open_caja))
        .route("/cajas", post(cajas::open))
        .route("/cajas/{id}", get(cajas::get))
        .route("/cajas/{id}/cerrar", put(cajas::close))
        .route("/cajas/{id}/datos-apertura", put(cajas::update_opening_data))
        .route(
            "/cajas/{id}/datos-cierre",
            get(cajas::closing_data).put(cajas::update_closing_data),
        )
        .route("/cajas/{id}/movimiento", post(movements::submit))
        .route("/cajas/{id}/movimientos", get(movements::get))
        .route("/cajas/{id}/comprobante", post(receipts::attach))
        .route(
            "/cajas/{id}/comprobante/{tipo}",
            get(receipts::resolve).put(receipts::update),
        )
        .route("/cajas/{id}/comprobantes/batch", post(receipts::attach_batch))
        .route(
            "/cajas/{id}/retiros",
            get(withdrawals::list).post(withdrawals::create),
        )
        .route("/cajas/{id}/ingresos", post(withdrawals::create_ingress))
        .route(
            "/cajas/retiros/{id}",
            axum::routing::delete(withdrawals::delete),
        )
        .route("/cajas/retiros/{id}/recibir", put(withdrawals::receive))
        .route(
            "/cajas/retiros/{id}/devolver",
            put(withdrawals::return_to_pending),
        )
        .route("/uploads/{file}", get(uploads::get))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    listener: tokio::net::TcpListener,
    options: ServerOptions,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
    };

    axum::serve(listener, router(state, options.max_body_bytes)).await
}
