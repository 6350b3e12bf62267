//! # formrelay: contact form relay
//!
//! `formrelay` receives the multipart submissions of a website's contact form and forwards them to
//! the site owner by mail. Every answer is normalized to `{"success": bool, "message": string}` so
//! the page script can show it as it is.
//!
//! ## Request Flow
//!
//! A `POST` to the contact path (default `/contact`) is handled by
//! [`api::handlers::contact::submit_contact`]:
//!
//! 1. The relay refuses early when no mail transport is configured.
//! 2. The multipart body is streamed by [`submission::read_multipart`]. Parts with a filename are
//!    attachments and are held to the configured size and count ceilings. A filled-in honeypot
//!    field ends the read at once.
//! 3. [`submission::SubmissionForm::validate`] trims the fields, checks the required ones and the
//!    reply address, and produces a [`submission::ContactSubmission`].
//! 4. [`message::OutboundMessage`] renders the plain text and HTML bodies and sets `Reply-To` to
//!    the submitter.
//! 5. The configured [`transport::MailTransport`] (SMTP, Mailjet, an intermediary worker, or a
//!    directory of `.eml` files) delivers it within `mail.timeout`. Only an affirmative provider
//!    answer counts as sent.
//!
//! Failures become an [`errors::Error`], which picks the status code, logs the detail and sends
//! only a user-safe message back.
//!
//! The browser side lives in `static/contact-form.js`, served at `/assets/contact-form.js`. The
//! [`client`] module offers the same submission flow to Rust programs.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use formrelay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = formrelay::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     formrelay::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     Application::new(config)?
//!         .serve(async {
//!             let _ = tokio::signal::ctrl_c().await;
//!         })
//!         .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod client;
pub mod config;
pub mod errors;
pub mod message;
mod openapi;
mod static_assets;
pub mod submission;
pub mod telemetry;
pub mod transport;

#[cfg(test)]
pub mod test_utils;

use crate::config::CorsOrigin;
use crate::transport::MailTransport;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::{
    Json, Router,
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};

/// Application state shared across all request handlers.
///
/// Built once at startup and never mutated afterwards.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .maybe_transport(transport::create_transport(&config.mail)?)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    /// `None` when recipient or credentials are missing; every submission is then refused
    pub transport: Option<Arc<dyn MailTransport>>,
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = &config.cors.allowed_origins;

    let allow_origin = if origins.contains(&CorsOrigin::Wildcard) {
        AllowOrigin::any()
    } else {
        let mut values = Vec::with_capacity(origins.len());
        for origin in origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send the bare origin, without path or trailing slash
                values.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(values)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::POST])
        .allow_headers([header::ACCEPT, header::CONTENT_TYPE]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// Routes:
/// - `POST {contact_path}`: the relay itself, any other method answers 405 in the same JSON shape
/// - `GET /healthz`
/// - `GET /assets/{path}`: embedded browser script
/// - `GET /api-docs/openapi.json`
/// - `GET /internal/metrics` when `enable_metrics` is set
///
/// # Errors
///
/// Returns an error if a configured CORS origin is not a valid header value.
#[instrument(skip_all)]
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let contact_route = post(api::handlers::contact::submit_contact)
        .fallback(api::handlers::contact::method_not_allowed)
        .layer(DefaultBodyLimit::max(state.config.attachments.request_body_limit()));

    let api_doc = openapi::api_doc(&state.config.contact_path);

    let router = Router::new()
        .route(&state.config.contact_path, contact_route)
        .route("/healthz", get(|| async { "OK" }))
        .route("/assets/{*path}", get(api::handlers::static_assets::serve_embedded_asset))
        .route(
            "/api-docs/openapi.json",
            get(move || {
                let doc = api_doc.clone();
                async move { Json(doc) }
            }),
        )
        .with_state(state.clone());

    let mut router = router.layer(create_cors_layer(&state.config)?);

    if state.config.enable_metrics {
        // The handle also renders the submission counters recorded through `metrics`
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(move || async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct.
///
/// 1. **Create**: [`Application::new`] builds the mail transport and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting contact form relay with configuration: {:#?}", config);

        let transport = transport::create_transport(&config.mail)?;

        let app_state = AppState::builder().config(config.clone()).maybe_transport(transport).build();
        let router = build_router(&app_state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Contact form relay listening on http://{}, posting to {}",
            bind_addr, self.config.contact_path
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
