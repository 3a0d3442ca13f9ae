//! Application bootstrapper
//!
//! [`create_app`] is the application factory: it turns one [`Config`] into a
//! fully wired, independent [`Application`]. [`run`] is the process entry
//! point that reads the environment, installs logging and serves.

use std::net::SocketAddr;

use axum::{extract::Request, middleware, Router, ServiceExt};
use tower_http::{normalize_path::NormalizePath, trace::TraceLayer};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::openapi::OpenApi;

use crate::application::blueprint::{BlueprintRegistry, CorsPolicy, RegisteredBlueprint};
use crate::application::docs;
use crate::application::extensions::Extensions;
use crate::config::{Config, LogFormat};
use crate::endpoints;
use crate::error::{json_error_bodies, not_found_handler, AppError, Result};
use crate::state::AppState;

/// One configured application instance
pub struct Application {
    config: Config,
    state: AppState,
    router: Router,
    blueprints: Vec<RegisteredBlueprint>,
    api_doc: OpenApi,
}

impl Application {
    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Mounted blueprints, in registration order
    pub fn blueprints(&self) -> &[RegisteredBlueprint] {
        &self.blueprints
    }

    pub fn blueprint_names(&self) -> Vec<&'static str> {
        self.blueprints.iter().map(|b| b.name).collect()
    }

    /// The merged OpenAPI document published at [`docs::API_DOC_PATH`]
    pub fn api_doc(&self) -> &OpenApi {
        &self.api_doc
    }

    /// Routes without trailing-slash normalization
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// The service to serve: `/users/` and `/users` reach the same handler
    pub fn service(&self) -> NormalizePath<Router> {
        NormalizePath::trim_trailing_slash(self.router.clone())
    }
}

/// Bootstrap and run the application
pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env();
    init_tracing(&config);

    tracing::info!(
        "Starting bugbounty v{} ({})",
        config.version,
        config.environment
    );

    let app = create_app(config).await?;

    serve(app).await
}

/// Initialize tracing/logging
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "bugbounty={level},tower_http={level}",
            level = config.log_level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Text => registry.with(fmt::layer().with_ansi(false)).init(),
    }
}

/// Create and configure an application instance.
///
/// Steps run in a fixed order and the first failure aborts creation:
/// validate the configuration, bind extensions, prepare the schema,
/// register blueprints, install error handlers, publish API docs.
pub async fn create_app(config: Config) -> Result<Application> {
    tracing::info!(environment = %config.environment, "create and configure the bugbounty app");

    check_config(&config)?;

    let extensions = register_extensions(&config).await?;
    prepare_schema(&config, &extensions).await?;

    let state = AppState::from_extensions(&extensions);
    let registry = register_blueprints(&state, &extensions.cors)?;
    let (router, blueprints, fragments) = registry.into_parts();

    let router = register_error_handlers(router);

    let api_doc = docs::build_api_doc(&config.version, fragments);
    let router = register_api_docs(router, &api_doc).layer(TraceLayer::new_for_http());

    tracing::info!(
        blueprints = ?blueprints.iter().map(|b| b.name).collect::<Vec<_>>(),
        "bugbounty app ready"
    );

    Ok(Application {
        config,
        state,
        router,
        blueprints,
        api_doc,
    })
}

fn check_config(config: &Config) -> Result<()> {
    tracing::info!("validate config...");

    if config.is_production() && config.database.schema_mode.is_destructive() {
        return Err(AppError::Config(format!(
            "schema mode '{}' drops all data and is refused in production, use 'migrate' or 'verify'",
            config.database.schema_mode
        )));
    }

    CorsPolicy::new(config.server.allowed_origins.as_slice())?;

    Ok(())
}

async fn register_extensions(config: &Config) -> Result<Extensions> {
    tracing::info!("register extensions...");
    Extensions::bind(config).await
}

async fn prepare_schema(config: &Config, extensions: &Extensions) -> Result<()> {
    tracing::info!(mode = %config.database.schema_mode, "prepare database schema...");
    extensions
        .migrator
        .prepare(config.database.schema_mode)
        .await
}

fn register_blueprints(state: &AppState, cors: &CorsPolicy) -> Result<BlueprintRegistry> {
    tracing::info!("register blueprints...");

    let mut registry = BlueprintRegistry::new();
    for blueprint in endpoints::blueprints(state) {
        tracing::info!(
            "register blueprint '{}' at {}",
            blueprint.name(),
            blueprint.url_prefix()
        );
        registry.register(blueprint.with_cors(cors))?;
    }

    Ok(registry)
}

fn register_error_handlers(router: Router) -> Router {
    tracing::info!("register error handlers...");

    router
        .fallback(not_found_handler)
        .layer(middleware::map_response(json_error_bodies))
}

fn register_api_docs(router: Router, api_doc: &OpenApi) -> Router {
    tracing::info!("register api docs at {}...", docs::API_DOC_PATH);
    router.merge(docs::api_doc_routes(api_doc.clone()))
}

/// Start the HTTP server
async fn serve(app: Application) -> anyhow::Result<()> {
    let server = &app.config().server;
    let addr: SocketAddr = format!("{}:{}", server.host, server.port).parse()?;
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service(app.service()),
    )
    .await?;

    Ok(())
}
