use dotenvy::dotenv;
use tracing::{error, info};
use uuid::Uuid;

fn init_logging() {
    // .env first so RUST_LOG and LOG_FORMAT apply
    dotenv().ok();
    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("json") => common::utils::logging::init_logging_json(),
        _ => common::utils::logging::init_logging_default(),
    }
    info!(service = "ace-host", event = "logger_init", "tracing subscriber initialized");
}

fn main() -> std::process::ExitCode {
    init_logging();

    let instance_id = Uuid::new_v4();
    let pid = std::process::id();
    let version = env!("CARGO_PKG_VERSION");

    std::panic::set_hook(Box::new(move |info| {
        error!(
            service = "ace-host",
            event = "panic",
            %instance_id,
            pid,
            message = %info,
            "unhandled panic occurred"
        );
    }));

    let cfg = match configs::AppConfig::load_and_validate() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!(
                service = "ace-host",
                event = "config_invalid",
                error = %e,
                "failed to load config"
            );
            return std::process::ExitCode::FAILURE;
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(rt) => rt,
        Err(e) => {
            error!(
                service = "ace-host",
                event = "runtime_build_failed",
                error = %e,
                "failed to build tokio runtime"
            );
            return std::process::ExitCode::FAILURE;
        }
    };

    info!(
        service = "ace-host",
        event = "start",
        %instance_id,
        pid,
        version,
        platform = %cfg.host.platform,
        "ace host starting"
    );

    rt.block_on(async move {
        let services = match service::runtime::HostServices::bootstrap(&cfg).await {
            Ok(s) => s,
            Err(e) => {
                error!(
                    service = "ace-host",
                    event = "bootstrap_failed",
                    error = %e,
                    "bootstrap failed"
                );
                return std::process::ExitCode::FAILURE;
            }
        };

        // services stay alive until the host is asked to stop
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(
                service = "ace-host",
                event = "signal_error",
                error = %e,
                "cannot listen for Ctrl+C"
            );
            return std::process::ExitCode::FAILURE;
        }
        info!(
            service = "ace-host",
            event = "stop",
            %instance_id,
            pid,
            platform = services.fetch.platform().as_str(),
            "received Ctrl+C, shutting down"
        );
        std::process::ExitCode::SUCCESS
    })
}
