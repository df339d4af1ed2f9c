//! Job dashboard served behind HTTP basic authentication.
//!
//! Exposes the ingestion job registry on its own port, the same way the
//! public API is served, but every request must carry valid credentials.

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::get,
    Router,
};
use base64::Engine;
use std::sync::{Arc, Mutex};

use crate::worker::JobRegistry;

/// Configured username/password pair for the dashboard
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: String, password: String) -> Self {
        Self { username, password }
    }

    /// Check an `Authorization` header value against the configured pair.
    fn accepts(&self, header: &str) -> bool {
        let encoded = match header.strip_prefix("Basic ") {
            Some(encoded) => encoded,
            None => return false,
        };

        let decoded = match base64::engine::general_purpose::STANDARD.decode(encoded) {
            Ok(decoded) => decoded,
            Err(_) => return false,
        };

        let decoded = match String::from_utf8(decoded) {
            Ok(decoded) => decoded,
            Err(_) => return false,
        };

        match decoded.split_once(':') {
            Some((username, password)) => {
                username == self.username && password == self.password
            }
            None => false,
        }
    }
}

/// Shared dashboard state (job registry + credentials)
#[derive(Clone)]
struct DashboardState {
    registry: Arc<Mutex<JobRegistry>>,
    credentials: Arc<Credentials>,
}

async fn require_basic_auth(
    State(state): State<DashboardState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .map(|value| state.credentials.accepts(value))
        .unwrap_or(false);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            [(header::WWW_AUTHENTICATE, "Basic realm=\"jobs\"")],
        )
            .into_response();
    }

    next.run(request).await
}

/// GET / - current job registry as JSON
async fn status_handler(State(state): State<DashboardState>) -> Json<JobRegistry> {
    Json(state.registry.lock().unwrap().clone())
}

/// Build the dashboard router
pub fn create_router(registry: Arc<Mutex<JobRegistry>>, credentials: Credentials) -> Router {
    let state = DashboardState {
        registry,
        credentials: Arc::new(credentials),
    };

    Router::new()
        .route("/", get(status_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_basic_auth,
        ))
        .with_state(state)
}

/// Start the dashboard server (async)
pub async fn serve(
    registry: Arc<Mutex<JobRegistry>>,
    credentials: Credentials,
    port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = create_router(registry, credentials);
    let addr = format!("0.0.0.0:{}", port);

    log::info!("Job dashboard listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
