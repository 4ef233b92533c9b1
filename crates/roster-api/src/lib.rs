//! HTTP surface of the team roster
//!
//! JSON API with an OpenAPI document and Swagger UI. Read-only team views are
//! public; everything that changes the roster requires an operator session.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, HeaderValue, Method},
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use roster_auth::SessionSigner;
use roster_core::Roster;
use sea_orm::DatabaseConnection;
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Application state shared across handlers
pub struct AppState {
    pub roster: Roster,
    pub sessions: Arc<SessionSigner>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Roster API",
        version = "0.1.0",
        description = "REST API for people, owners, teams and memberships"
    ),
    paths(
        handlers::health_check,
        handlers::get_stats,
        handlers::login,
        handlers::logout,
        handlers::get_current_operator,
        handlers::list_people,
        handlers::create_person,
        handlers::import_people,
        handlers::generate_sample,
        handlers::delete_person,
        handlers::list_owners,
        handlers::create_owner,
        handlers::update_owner,
        handlers::delete_owner,
        handlers::list_teams,
        handlers::get_team_by_slug,
        handlers::team_short_link,
        handlers::regenerate_teams,
        handlers::delete_team,
        handlers::export_team,
        handlers::add_member,
        handlers::remove_member,
        handlers::list_operators,
        handlers::create_operator,
        handlers::update_operator,
        handlers::delete_operator,
    ),
    components(
        schemas(
            models::HealthResponse,
            models::ErrorResponse,
            models::MessageResponse,
            models::LoginRequest,
            models::LoginResponse,
            models::Person,
            models::PersonList,
            models::CreatePersonRequest,
            models::ImportRequest,
            models::ImportResponse,
            models::SampleRequest,
            models::SampleResponse,
            models::Owner,
            models::OwnerList,
            models::OwnerRequest,
            models::OwnerDeletedResponse,
            models::Team,
            models::TeamList,
            models::Member,
            models::TeamDetail,
            models::RegenerateRequest,
            models::TeamCreationFailure,
            models::RegenerateResponse,
            models::TeamDeletedResponse,
            models::ExportFormat,
            models::AddMemberRequest,
            models::Membership,
            models::Operator,
            models::OperatorList,
            models::CreateOperatorRequest,
            models::UpdateOperatorRequest,
            models::StatsResponse,
        )
    ),
    tags(
        (name = "people", description = "Person registry endpoints"),
        (name = "owners", description = "Owner registry endpoints"),
        (name = "teams", description = "Team listing, regeneration and export endpoints"),
        (name = "members", description = "Team membership endpoints"),
        (name = "operators", description = "Portal operator management endpoints"),
        (name = "auth", description = "Session endpoints"),
        (name = "system", description = "System health and dashboard endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Allow cross-origin requests from localhost (for development)
    pub enable_cors: bool,
    /// Secret for signing session tokens
    pub jwt_secret: String,
    /// Session lifetime
    pub session_ttl_hours: i64,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            enable_cors: false,
            jwt_secret: String::new(),
            session_ttl_hours: 12,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
}

impl ApiServer {
    pub fn new(config: ApiServerConfig, db: DatabaseConnection) -> Self {
        let sessions = Arc::new(SessionSigner::new(
            config.jwt_secret.as_bytes(),
            chrono::Duration::hours(config.session_ttl_hours),
        ));

        let state = Arc::new(AppState {
            roster: Roster::new(db),
            sessions,
        });

        Self { config, state }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .route("/api/auth/login", post(handlers::login))
            .route("/api/auth/logout", post(handlers::logout))
            .route("/api/teams", get(handlers::list_teams))
            .route("/api/teams/by-slug/{slug}", get(handlers::get_team_by_slug))
            .route("/t/{slug}", get(handlers::team_short_link))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require an operator session)
        let protected_router = Router::new()
            .route("/api/auth/me", get(handlers::get_current_operator))
            .route("/api/stats", get(handlers::get_stats))
            .route(
                "/api/people",
                get(handlers::list_people).post(handlers::create_person),
            )
            .route("/api/people/import", post(handlers::import_people))
            .route("/api/people/sample", post(handlers::generate_sample))
            .route("/api/people/{id}", delete(handlers::delete_person))
            .route(
                "/api/owners",
                get(handlers::list_owners).post(handlers::create_owner),
            )
            .route(
                "/api/owners/{id}",
                put(handlers::update_owner).delete(handlers::delete_owner),
            )
            .route("/api/teams/regenerate", post(handlers::regenerate_teams))
            .route("/api/teams/{id}", delete(handlers::delete_team))
            .route("/api/teams/{id}/export", get(handlers::export_team))
            .route("/api/teams/{id}/members", post(handlers::add_member))
            .route("/api/members/{id}", delete(handlers::remove_member))
            .route(
                "/api/operators",
                get(handlers::list_operators).post(handlers::create_operator),
            )
            .route(
                "/api/operators/{id}",
                put(handlers::update_operator).delete(handlers::delete_operator),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.state.sessions.clone(),
                middleware::require_auth,
            ));

        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(public_router)
            .merge(protected_router)
            .layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            // Cookie sessions need credentials, which rules out a wildcard origin
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::COOKIE])
                .allow_credentials(true)
                .allow_origin(AllowOrigin::predicate(|origin: &HeaderValue, _| {
                    let origin = origin.to_str().unwrap_or("");
                    origin.starts_with("http://localhost:")
                        || origin.starts_with("http://127.0.0.1:")
                }));
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}
