use std::sync::Arc;

use storyreel::config::AppConfig;
use storyreel::gemini_client::GeminiClient;
use storyreel::lookup_server::{self, GeminiPortraitAnalyzer, LookupState};
use storyreel::metadata;
use storyreel::pipeline;

#[tokio::main]
async fn main() {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    init_logging().expect("Failed to initialize logging");

    let config = AppConfig::from_env();

    // Ensure the media directories exist before any stage writes into them
    for dir in [&config.images_dir, &config.videos_dir] {
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!("Failed to create {}: {}", dir.display(), e);
        }
    }

    let client = GeminiClient::new(config.gemini_api_key.clone(), config.gemini_base_url.clone());

    // Start the lookup service in the background
    let registry = lookup_server::load_registry(&config.registry_path)
        .expect("Failed to load family registry");
    let analyzer = GeminiPortraitAnalyzer::new(client.clone(), config.vision_model.clone());
    let state = Arc::new(LookupState::new(registry, Arc::new(analyzer)));
    let router = lookup_server::lookup_routes(state);

    let addr = format!("{}:{}", config.lookup_host, config.lookup_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind lookup service address");
    tracing::info!("Lookup service listening on {}", addr);
    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            tracing::error!("Lookup service stopped: {}", e);
        }
    });

    // Health-check handshake instead of a fixed settle sleep
    let base_url = config.lookup_base_url();
    metadata::wait_until_ready(&base_url, config.readiness_timeout)
        .await
        .expect("Lookup service never became ready");

    let family_name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config.family_name.clone());

    match pipeline::generate_family_story_video(&family_name, &client, &config).await {
        Ok(Some(path)) => println!("Video created: {}", path.display()),
        Ok(None) => println!("No video clips were produced."),
        Err(e) => {
            tracing::error!("Pipeline failed: {}", e);
            server.abort();
            std::process::exit(1);
        }
    }

    server.abort();
}

fn init_logging() -> Result<(), Box<dyn std::error::Error>> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt, Layer};

    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug,storyreel=trace,reqwest=info,hyper=info,tower=info".to_string()
        } else {
            "info,storyreel=info,reqwest=warn,hyper=warn,tower=warn".to_string()
        }
    });

    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&log_level))?;

    let fmt_layer = if std::env::var("LOG_FORMAT").as_deref() == Ok("json") {
        // JSON logging for log aggregation
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(false)
            .with_target(true)
            .boxed()
    } else {
        // Human-readable logging for development
        fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .boxed()
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    Ok(())
}
