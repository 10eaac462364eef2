//! # Messenger Bot Web Application
//!
//! Main entry point for the Messenger webhook server.
//! Configures logging, SSL, the reply worker and route handling.

#![recursion_limit = "256"]

use logfire::config::MetricsOptions;
use messenger_bot::{
    config, consts, front,
    webhook::{
        self,
        messenger::{
            client::MessengerClient,
            handler::WebhookSettings,
            worker::{ReplyWorker, default_dispatch_table},
        },
    },
};
use ntex::web;
use openssl::ssl::{SslAcceptor, SslFiletype, SslMethod};
use std::sync::Arc;
use tokio::sync::mpsc;

#[ntex::main]
async fn main() -> anyhow::Result<()> {
    // Initialize configuration
    let app_config = config::init_config()?;

    // Initialize logging and metrics
    let shutdown_handler = match &app_config.logfire_token {
        Some(token) => Some(
            logfire::configure()
                .install_panic_handler()
                .with_metrics(Some(MetricsOptions::default()))
                .send_to_logfire(logfire::config::SendToLogfire::Yes)
                .with_token(token)
                .finish()?,
        ),
        None => {
            messenger_bot::logger::setup_simple_logger()?;
            None
        }
    };

    if !app_config.enforce_origin {
        logfire::warn!(
            "ENFORCE_ORIGIN is disabled: webhook signatures are NOT verified, never run like this in production"
        );
    }

    // Start the reply worker and the handlers feeding it
    let (queue, pending) = mpsc::channel(consts::REPLY_QUEUE_CAPACITY);
    let worker = ReplyWorker {
        client: MessengerClient::from_config(app_config)?,
        greeting_text: app_config.greeting_text.clone(),
        get_started_payload: app_config.get_started_payload.clone(),
    };
    ntex::rt::spawn(worker.run(pending));

    let app_state = front::AppState {
        dispatcher: Arc::new(default_dispatch_table(queue)),
        settings: Arc::new(WebhookSettings::from_config(app_config)),
    };

    // Configure and start the web server
    configure_and_run_server(app_config, app_state).await?;

    if let Some(shutdown_handler) = shutdown_handler {
        shutdown_handler.shutdown()?;
    }

    Ok(())
}

/// Configures SSL acceptor for production environments
fn setup_ssl_acceptor(
    app_config: &config::AppConfig,
) -> anyhow::Result<openssl::ssl::SslAcceptorBuilder> {
    let mut ssl_acceptor = SslAcceptor::mozilla_intermediate(SslMethod::tls_server())
        .map_err(|e| anyhow::anyhow!("Failed to create SSL acceptor: {}", e))?;

    ssl_acceptor
        .set_private_key_file(&app_config.private_key_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load private key from {}: {}",
                app_config.private_key_path,
                e
            )
        })?;

    ssl_acceptor
        .set_certificate_file(&app_config.certificate_path, SslFiletype::PEM)
        .map_err(|e| {
            anyhow::anyhow!(
                "Failed to load certificate from {}: {}",
                app_config.certificate_path,
                e
            )
        })?;

    Ok(ssl_acceptor)
}

/// Configures and starts the web server with appropriate SSL settings
async fn configure_and_run_server(
    app_config: &'static config::AppConfig,
    app_state: front::AppState,
) -> anyhow::Result<()> {
    let server = web::server(move || {
        web::App::new()
            .wrap(web::middleware::Logger::default())
            .wrap(web::middleware::Compress::default())
            .state(app_state.clone())
            .state(web::types::PayloadConfig::new(consts::MAX_WEBHOOK_BODY_BYTES))
            .configure(webhook::routes::messenger)
            .service(front::server::health)
            .default_service(web::route().to(front::server::serve_not_found))
    });

    let server_addr = app_config.bind_address();
    let bound_server = if app_config.is_prod() {
        let ssl_acceptor = setup_ssl_acceptor(app_config)?;
        server.bind_openssl(server_addr, ssl_acceptor)?
    } else {
        server.bind(server_addr)?
    };

    bound_server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))
}
