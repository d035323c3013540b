use clap::Parser;
use rollcall::{Application, Config, config, telemetry};

/// Resolves on Ctrl+C or SIGTERM; in-flight extractions finish before the server exits.
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let signal = tokio::select! {
        _ = ctrl_c => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal, "Stopping rollcall, draining in-flight uploads");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // reqwest is built without a bundled crypto provider
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    // Before clap and figment read the environment, so ROLLCALL_CONFIG and GEMINI_API_KEY can live in .env
    let dotenv_path = config::load_dotenv();

    let args = config::Args::parse();
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.log_format)?;
    if let Some(path) = dotenv_path {
        tracing::info!(path = %path.display(), "Loaded environment file");
    }
    tracing::debug!(config_file = %args.config, provider = ?config.generation.provider, "Configuration loaded");

    Application::new(config)?.serve(shutdown_signal()).await
}
