//! troupe-scribe binary entry point.

use std::process::ExitCode;

use troupe_scribe::api::{serve, AppState};
use troupe_scribe::cli::{self, Args};
use troupe_scribe::config::Config;
use troupe_scribe::{logging, LifecycleManager, SessionController};
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let args = match cli::parse_args() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("error: {}", e);
            eprintln!("Try 'troupe-scribe --help' for more information.");
            return ExitCode::from(2);
        }
    };

    if args.help {
        cli::print_help();
        return ExitCode::SUCCESS;
    }
    if args.version {
        cli::print_version();
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "troupe-scribe stopped");
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> troupe_scribe::Result<()> {
    let config = Config::load(&args)?;

    if let Err(e) = logging::try_init_with_level(Some(config.log_filter())) {
        eprintln!("warning: logging already initialized: {}", e);
    }

    info!("troupe-scribe v{}", env!("CARGO_PKG_VERSION"));

    config.validate()?;
    config.credentials.validate()?;
    let server_config = config.to_server_config()?;

    let manager = LifecycleManager::new(
        config.credentials.clone(),
        config.eaccess_client(),
        SessionController::new(config.tmux(), config.recording_settings()),
        config.lifecycle_settings(),
    );

    let state = AppState::new(manager).with_keys(server_config.key_store());
    if state.keys.is_enabled() {
        info!(keys = state.keys.count(), "Control API requires a bearer key");
    } else {
        info!("Control API authentication disabled");
    }

    let manager = std::sync::Arc::clone(&state.manager);
    serve(server_config, state).await?;

    if manager.state().is_active() {
        info!("Tearing down the recording session before exit");
        manager.kill().await;
    }

    Ok(())
}
