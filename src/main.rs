use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;

use ticket_intake::channels::SmtpNotifier;
use ticket_intake::config::IntakeConfig;
use ticket_intake::intake::{IntakeHandler, intake_routes};
use ticket_intake::llm::create_provider;
use ticket_intake::pipeline::{PipelineRunner, TicketClassifier, TicketPipeline, TicketRouter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // lettre's rustls transport needs a process-wide crypto provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("Warning: rustls crypto provider was already installed");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = IntakeConfig::from_env().context("loading configuration")?;

    eprintln!("🎫 Ticket Intake v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Model: {}", config.llm.model);
    eprintln!(
        "   SMTP: {}:{} as {}",
        config.email.smtp_host, config.email.smtp_port, config.email.sender_email
    );
    eprintln!("   Default mailbox: {}", config.routing.default_address());
    eprintln!(
        "   Pipelines: max {} concurrent, classify timeout {}s",
        config.pipeline.max_concurrent,
        config.pipeline.classify_timeout.as_secs()
    );
    eprintln!("   Inbound auth: {:?}\n", config.server.auth);

    // ── Pipeline ────────────────────────────────────────────────────────
    let llm = create_provider(&config.llm).context("creating LLM provider")?;
    let classifier = TicketClassifier::new(llm, config.pipeline.classify_timeout);
    let router = TicketRouter::new(config.routing.clone());
    let notifier = Arc::new(SmtpNotifier::new(config.email.clone()));
    let pipeline = Arc::new(TicketPipeline::new(classifier, router, notifier));

    let runner = PipelineRunner::new(config.pipeline.max_concurrent);
    let handler = IntakeHandler::new(pipeline, runner.clone());

    // ── HTTP ────────────────────────────────────────────────────────────
    let app = intake_routes(handler, config.server.auth);
    let addr = SocketAddr::new(config.server.bind, config.server.port);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding to {addr}"))?;
    tracing::info!(%addr, "Ticket intake listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server exited")?;

    // ── Drain ───────────────────────────────────────────────────────────
    if !runner.shutdown(config.pipeline.shutdown_grace).await {
        tracing::warn!(
            remaining = runner.in_flight(),
            "Exiting with unfinished ticket pipelines"
        );
    }
    tracing::info!("Ticket intake stopped");
    Ok(())
}

/// Completes on Ctrl+C or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("Shutdown signal received, no longer accepting messages");
}
