//! homebell CLI: serve or invoke the agent and knowledge base functions.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;

use homebell::config::{self, FunctionConfig};
use homebell::devices::{
    DeviceApiClient, EmailNotifications, NotificationPreferences, PushNotifications,
    DEFAULT_CAMERA_API_URL, DEFAULT_DOORBELL_API_URL,
};
use homebell::runtime::{self, handlers::build_handler, ErrorReport, FunctionKind, RuntimeClient};
use homebell::tracing::{init_tracing, shutdown_tracing};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Parser)]
#[command(name = "homebell", version, about = "Home network / doorbell assistant functions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve a function against the Runtime API.
    Serve {
        #[arg(long, value_enum)]
        function: FunctionKind,

        /// Runtime API address (host:port).
        #[arg(long, env = "AWS_LAMBDA_RUNTIME_API")]
        runtime_api: String,
    },

    /// Run a function once on an event file and print the response.
    Invoke {
        #[arg(long, value_enum)]
        function: FunctionKind,

        /// Path to a JSON event.
        #[arg(long)]
        event: PathBuf,

        /// Print metrics after the response.
        #[arg(long)]
        metrics: bool,
    },

    /// Call the device APIs directly.
    Device {
        /// Override the API base URL.
        #[arg(long, env = "DEVICE_API_URL", global = true)]
        api_url: Option<String>,

        #[command(subcommand)]
        action: DeviceAction,
    },
}

#[derive(Subcommand)]
enum DeviceAction {
    /// Read a camera's signal strength.
    Signal { device_id: String },

    /// Configure doorbell notifications.
    Notify {
        #[arg(long)]
        deliveries: bool,

        #[arg(long)]
        doorbell_ring: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    init_tracing("homebell", otlp_endpoint.as_deref())?;

    let result = match cli.command {
        Commands::Serve {
            function,
            runtime_api,
        } => serve(function, &runtime_api).await,
        Commands::Invoke {
            function,
            event,
            metrics,
        } => invoke(function, &event, metrics).await,
        Commands::Device { api_url, action } => device(api_url, action).await,
    };

    shutdown_tracing();
    result
}

async fn serve(function: FunctionKind, runtime_api: &str) -> Result<(), BoxError> {
    let client = RuntimeClient::new(runtime_api);

    let handler = match FunctionConfig::from_env()
        .map_err(BoxError::from)
        .and_then(|config| build_handler(function, config).map_err(BoxError::from))
    {
        Ok(handler) => handler,
        Err(e) => {
            tracing::error!(error = %e, "Function initialization failed");
            client
                .post_init_error(&ErrorReport::new("Runtime.InitError", e.to_string()))
                .await?;
            return Err(e);
        }
    };

    runtime::run(&client, handler.as_ref()).await?;
    Ok(())
}

async fn invoke(function: FunctionKind, event: &Path, print_metrics: bool) -> Result<(), BoxError> {
    let raw = tokio::fs::read_to_string(event).await?;
    let event: Value = serde_json::from_str(&raw)?;

    let handler = build_handler(function, FunctionConfig::from_env()?)?;
    let response = handler.call(event).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);

    if print_metrics {
        print!("{}", homebell::metrics::encode());
    }
    Ok(())
}

async fn device(api_url: Option<String>, action: DeviceAction) -> Result<(), BoxError> {
    let config = FunctionConfig::from_env()?;
    let token = config::require(&config.auth_token, "HOME_NETWORK_AUTH_TOKEN")?;

    match action {
        DeviceAction::Signal { device_id } => {
            let base = api_url.as_deref().unwrap_or(DEFAULT_CAMERA_API_URL);
            let client = DeviceApiClient::new(base, token, config.http_timeout())?;
            match client.camera_signal_strength(&device_id).await {
                Some(strength) => println!("Signal strength: {}", strength),
                None => return Err(format!("Could not read status of camera {}", device_id).into()),
            }
        }
        DeviceAction::Notify {
            deliveries,
            doorbell_ring,
        } => {
            let base = api_url.as_deref().unwrap_or(DEFAULT_DOORBELL_API_URL);
            let client = DeviceApiClient::new(base, token, config.http_timeout())?;
            let preferences = NotificationPreferences {
                email_notifications: EmailNotifications { deliveries },
                push_notifications: PushNotifications { doorbell_ring },
            };
            if !client.configure_notifications(&preferences).await {
                return Err("Notification configuration was rejected".into());
            }
            println!("Notifications configured");
        }
    }
    Ok(())
}
