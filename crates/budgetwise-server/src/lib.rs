//! BudgetWise Web Server
//!
//! Axum-based REST API for the BudgetWise budgeting app.
//!
//! Security features:
//! - Bearer identity tokens (HS256 JWT), resolved once per request into a `Session`
//! - Auth is on by default; `--no-auth` runs as a fixed local user for development
//! - Restrictive CORS policy
//! - Sanitized error responses

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tower_http::{
    cors::CorsLayer, services::ServeDir, set_header::SetResponseHeaderLayer, trace::TraceLayer,
};
use tracing::{debug, error, info, warn};

use budgetwise_core::ai::{AIBackend, AIClient};
use budgetwise_core::{
    BudgetStore, Database, ForecastPipeline, IdentityClaims, Session, Settings, StoreEvents,
};

mod handlers;
mod notifications;

pub use notifications::Notifications;

/// Maximum transactions returned by one list call
pub const MAX_PAGE_LIMIT: usize = 1000;

/// Authorization header carrying the identity token
const AUTHORIZATION_HEADER: &str = "authorization";

/// Server configuration
#[derive(Clone)]
pub struct ServerConfig {
    /// Whether identity tokens are required (secure by default)
    pub require_auth: bool,
    /// Allowed CORS origins (empty = same-origin only in production)
    pub allowed_origins: Vec<String>,
    /// HS256 secret used to verify identity tokens
    pub jwt_secret: Option<String>,
    /// User id every request acts as when auth is disabled
    pub dev_user: String,
    /// Whether the local development user has the admin claim
    pub dev_admin: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            require_auth: true,
            allowed_origins: vec![],
            jwt_secret: None,
            dev_user: "local-dev".to_string(),
            dev_admin: false,
        }
    }
}

/// Shared application state
pub struct AppState {
    pub store: BudgetStore,
    pub config: ServerConfig,
    pub settings: Settings,
    pub ai: Option<AIClient>,
    /// Present when a prediction backend is configured
    pub forecasts: Option<ForecastPipeline>,
    pub notifications: Notifications,
}

/// Identity middleware - resolves the bearer token into a `Session`
///
/// Requests without a token continue as anonymous; anything that needs an
/// identity then fails with 401 from the store. A token that is present but
/// invalid is rejected here.
async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Response {
    if !state.config.require_auth {
        let session = if state.config.dev_admin {
            Session::admin(state.config.dev_user.clone(), None)
        } else {
            Session::user(state.config.dev_user.clone(), None)
        };
        request.extensions_mut().insert(session);
        return next.run(request).await;
    }

    let token = request
        .headers()
        .get(AUTHORIZATION_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|auth| auth.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    let session = match token {
        None => Session::anonymous(),
        Some(token) => match resolve_session(token, state.config.jwt_secret.as_deref()) {
            Ok(session) => {
                debug!(
                    user = session.user_id().unwrap_or("anonymous"),
                    admin = session.is_admin(),
                    path = %request.uri().path(),
                    "Authenticated via identity token"
                );
                session
            }
            Err(e) => {
                warn!(error = %e, path = %request.uri().path(), "Invalid identity token");
                return (
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({
                        "error": "Invalid identity token"
                    })),
                )
                    .into_response();
            }
        },
    };

    request.extensions_mut().insert(session);
    next.run(request).await
}

/// Verify an HS256 identity token and turn its claims into a session
pub fn resolve_session(token: &str, secret: Option<&str>) -> Result<Session, String> {
    let secret = secret.ok_or("Token verification is not configured")?;
    let validation = Validation::new(Algorithm::HS256);
    let data = decode::<IdentityClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| format!("JWT validation failed: {}", e))?;
    Ok(Session::from_claims(data.claims))
}

/// Create the application router
pub fn create_router(db: Database, static_dir: Option<&str>, config: ServerConfig) -> Router {
    let ai = AIClient::from_env();
    if let Some(ref client) = ai {
        let info = client.info();
        info!(
            "AI backend configured: {} at {} (model: {})",
            info.backend, info.host, info.model
        );
    } else {
        info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable forecasts)");
    }

    let settings = Settings::load().unwrap_or_else(|e| {
        warn!(error = %e, "Ignoring unreadable settings file");
        Settings::default().with_env_overrides(|key| std::env::var(key).ok())
    });

    create_router_with_options(db, static_dir, config, settings, ai)
}

/// Create the application router with explicit settings and backend (for testing)
pub fn create_router_with_options(
    db: Database,
    static_dir: Option<&str>,
    config: ServerConfig,
    settings: Settings,
    ai: Option<AIClient>,
) -> Router {
    let store = BudgetStore::with_events(db, StoreEvents::new(settings.event_capacity));
    let notifications = Notifications::spawn(store.events());
    let forecasts = ai.clone().map(ForecastPipeline::new);

    let state = Arc::new(AppState {
        store,
        config: config.clone(),
        settings,
        ai,
        forecasts,
        notifications,
    });

    let api_routes = Router::new()
        .route("/status", get(handlers::get_status))
        .route("/health", get(handlers::health))
        // Profile
        .route(
            "/me",
            get(handlers::get_me)
                .put(handlers::update_me)
                .delete(handlers::delete_me),
        )
        .route("/categories", get(handlers::list_categories))
        // Transactions
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/:id", put(handlers::update_transaction))
        // Budgets
        .route("/budgets", get(handlers::list_budgets))
        .route("/budgets/:category", put(handlers::set_budget))
        // Reports
        .route("/dashboard", get(handlers::get_dashboard))
        .route("/reports/trend", get(handlers::report_trend))
        .route("/reports/spending", get(handlers::report_spending))
        // Forecast
        .route("/forecast", post(handlers::request_forecast))
        .route("/forecast/state", get(handlers::get_forecast_state))
        .route("/notifications", get(handlers::list_notifications))
        // Admin
        .route("/admin/overview", get(handlers::admin_overview))
        .route("/admin/users", get(handlers::admin_list_users))
        .route("/admin/users/:id", get(handlers::admin_get_user))
        .route("/admin/transactions", get(handlers::admin_latest_transactions));

    let methods = [
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::DELETE,
        Method::OPTIONS,
    ];

    // Build CORS layer
    let cors = if config.allowed_origins.is_empty() {
        // Restrictive default: only allow same-origin
        CorsLayer::new()
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    } else {
        let origins: Vec<HeaderValue> = config
            .allowed_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    };

    let csp_value = HeaderValue::from_static(
        "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data:; font-src 'self'; connect-src 'self'; frame-ancestors 'none'"
    );

    let mut app = Router::new()
        .nest("/api", api_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        // Security headers
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            csp_value,
        ));

    // Serve the web frontend if a build directory was provided
    if let Some(dir) = static_dir {
        app = app.fallback_service(ServeDir::new(dir));
    }

    app
}

/// Start the server with custom configuration
pub async fn serve_with_config(
    db: Database,
    host: &str,
    port: u16,
    static_dir: Option<&str>,
    config: ServerConfig,
) -> anyhow::Result<()> {
    if !config.require_auth {
        warn!(
            user = %config.dev_user,
            admin = config.dev_admin,
            "⚠️  Authentication disabled - do not expose to network!"
        );
    } else if config.jwt_secret.is_none() {
        warn!("⚠️  BUDGETWISE_JWT_SECRET not set - every identity token will be rejected");
    }

    check_ai_connection().await;

    let app = create_router(db, static_dir, config)
        .into_make_service_with_connect_info::<std::net::SocketAddr>();
    let addr = format!("{}:{}", host, port);

    info!("Starting server at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Check and log AI backend connection status
async fn check_ai_connection() {
    match AIClient::from_env() {
        Some(client) => {
            if client.health_check().await {
                info!(
                    "✅ AI backend connected: {} (model: {})",
                    client.host(),
                    client.model()
                );
            } else {
                warn!(
                    "⚠️  AI backend configured but not responding: {} (model: {})",
                    client.host(),
                    client.model()
                );
            }
        }
        None => {
            info!("ℹ️  AI backend not configured (set OLLAMA_HOST to enable forecasts)");
        }
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Application error type with proper HTTP status codes
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    internal: Option<anyhow::Error>,
}

impl AppError {
    pub fn bad_request(msg: &str) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn service_unavailable(msg: &str) -> Self {
        Self {
            status: StatusCode::SERVICE_UNAVAILABLE,
            message: msg.to_string(),
            internal: None,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the full internal error if present
        if let Some(err) = &self.internal {
            error!(error = %err, "Internal error");
        }

        let body = Json(serde_json::json!({
            "error": self.message
        }));

        (self.status, body).into_response()
    }
}

impl From<budgetwise_core::Error> for AppError {
    fn from(err: budgetwise_core::Error) -> Self {
        use budgetwise_core::Error;

        let status = match &err {
            Error::AuthenticationRequired => StatusCode::UNAUTHORIZED,
            Error::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Error::InvalidData(_) => StatusCode::BAD_REQUEST,
            Error::InsufficientData(_) | Error::Decode(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::ForecastInProgress => StatusCode::CONFLICT,
            Error::PredictionFailed(_) => StatusCode::BAD_GATEWAY,
            Error::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            Self {
                status,
                // Return generic message to client
                message: "An internal error occurred".to_string(),
                // Keep full error for logging
                internal: Some(err.into()),
            }
        } else {
            Self {
                status,
                message: err.to_string(),
                internal: None,
            }
        }
    }
}

#[cfg(test)]
mod tests;
