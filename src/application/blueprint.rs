//! Route blueprints
//!
//! A blueprint is a named route group mounted under one URL prefix, with its
//! own cross-origin policy and its own OpenAPI fragment. Blueprints are
//! attached to an application through a [`BlueprintRegistry`].

use axum::Router;
use http::{header, HeaderValue, Method};
use tower_http::cors::{AllowOrigin, CorsLayer};
use utoipa::openapi::OpenApi;

use crate::error::{AppError, Result};

/// Allow-list of origins permitted to call a blueprint from a browser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    origins: Vec<HeaderValue>,
}

impl CorsPolicy {
    pub fn new<S: AsRef<str>>(origins: &[S]) -> Result<Self> {
        if origins.is_empty() {
            return Err(AppError::Config(
                "at least one allowed origin is required".to_string(),
            ));
        }

        let origins = origins
            .iter()
            .map(|origin| {
                let origin = origin.as_ref();
                if origin == "*" {
                    return Err(AppError::Config(
                        "wildcard origin is not allowed, list origins explicitly".to_string(),
                    ));
                }
                HeaderValue::from_str(origin)
                    .map_err(|e| AppError::Config(format!("invalid origin '{}': {}", origin, e)))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { origins })
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.origins.iter().any(|allowed| allowed == origin)
    }

    pub fn origins(&self) -> Vec<String> {
        self.origins
            .iter()
            .filter_map(|o| o.to_str().ok().map(str::to_string))
            .collect()
    }

    /// Build the tower-http layer enforcing this policy
    pub fn layer(&self) -> CorsLayer {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(self.origins.clone()))
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
    }
}

pub struct Blueprint {
    name: &'static str,
    url_prefix: &'static str,
    router: Router,
    api: OpenApi,
    cors: Option<CorsPolicy>,
}

impl Blueprint {
    pub fn new(name: &'static str, url_prefix: &'static str, router: Router, api: OpenApi) -> Self {
        Self {
            name,
            url_prefix,
            router,
            api,
            cors: None,
        }
    }

    /// Restrict cross-origin access to this blueprint's routes
    pub fn with_cors(mut self, policy: &CorsPolicy) -> Self {
        self.router = self.router.layer(policy.layer());
        self.cors = Some(policy.clone());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn url_prefix(&self) -> &'static str {
        self.url_prefix
    }
}

/// What the application remembers about a mounted blueprint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredBlueprint {
    pub name: &'static str,
    pub url_prefix: &'static str,
    pub allowed_origins: Vec<String>,
}

/// Dispatch table under construction.
///
/// Registration order is the precedence order: a blueprint whose name is
/// taken, or whose prefix overlaps one already mounted, is rejected and the
/// earlier blueprint keeps its routes.
pub struct BlueprintRegistry {
    router: Router,
    registered: Vec<RegisteredBlueprint>,
    fragments: Vec<OpenApi>,
}

impl Default for BlueprintRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl BlueprintRegistry {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            registered: Vec::new(),
            fragments: Vec::new(),
        }
    }

    pub fn register(&mut self, blueprint: Blueprint) -> Result<()> {
        validate_prefix(blueprint.url_prefix)?;

        if let Some(existing) = self.registered.iter().find(|b| b.name == blueprint.name) {
            return Err(AppError::Config(format!(
                "blueprint '{}' is already registered at '{}'",
                existing.name, existing.url_prefix
            )));
        }

        if let Some(existing) = self
            .registered
            .iter()
            .find(|b| prefixes_overlap(b.url_prefix, blueprint.url_prefix))
        {
            return Err(AppError::Config(format!(
                "blueprint '{}' at '{}' overlaps blueprint '{}' at '{}'",
                blueprint.name, blueprint.url_prefix, existing.name, existing.url_prefix
            )));
        }

        let Blueprint {
            name,
            url_prefix,
            router,
            api,
            cors,
        } = blueprint;

        self.router = std::mem::take(&mut self.router).nest(url_prefix, router);
        self.fragments.push(api);
        self.registered.push(RegisteredBlueprint {
            name,
            url_prefix,
            allowed_origins: cors.map(|c| c.origins()).unwrap_or_default(),
        });

        tracing::debug!("Registered blueprint '{}' at {}", name, url_prefix);
        Ok(())
    }

    pub fn registered(&self) -> &[RegisteredBlueprint] {
        &self.registered
    }

    /// OpenAPI fragments of registered blueprints, in registration order
    pub fn api_fragments(&self) -> &[OpenApi] {
        &self.fragments
    }

    pub fn into_parts(self) -> (Router, Vec<RegisteredBlueprint>, Vec<OpenApi>) {
        (self.router, self.registered, self.fragments)
    }
}

fn validate_prefix(prefix: &str) -> Result<()> {
    let valid = prefix.len() > 1
        && prefix.starts_with('/')
        && !prefix.ends_with('/')
        && !prefix.contains(['{', '}', '*']);

    if valid {
        Ok(())
    } else {
        Err(AppError::Config(format!(
            "invalid blueprint prefix '{}': must be a static path like '/name'",
            prefix
        )))
    }
}

/// True when one prefix equals the other or contains it as whole path segments
fn prefixes_overlap(a: &str, b: &str) -> bool {
    fn is_segment_prefix(outer: &str, inner: &str) -> bool {
        inner
            .strip_prefix(outer)
            .is_some_and(|rest| rest.starts_with('/'))
    }

    a == b || is_segment_prefix(a, b) || is_segment_prefix(b, a)
}
