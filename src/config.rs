// config.rs - Runtime configuration loaded from environment variables
use std::path::PathBuf;
use std::time::Duration;

/// Everything the pipeline needs at startup: directories, model names, the
/// lookup service address, and the polling/readiness bounds.
///
/// All fields have defaults suitable for a local run; override via
/// environment variables (a `.env` file is honored).
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API key for the generative language API. Required for real runs;
    /// requests fail with an API error when it is empty.
    pub gemini_api_key: String,
    pub gemini_base_url: String,
    /// Model used to read name/birth place off a portrait.
    pub vision_model: String,
    /// Model used for before/after scene images.
    pub image_model: String,
    /// Model used for per-scene video clips.
    pub video_model: String,
    pub images_dir: PathBuf,
    pub videos_dir: PathBuf,
    /// JSON file mapping family name to registered portraits.
    pub registry_path: PathBuf,
    pub lookup_host: String,
    pub lookup_port: u16,
    /// Family to generate for when no CLI argument is given.
    pub family_name: String,
    /// Delay between video job status checks.
    pub video_poll_interval: Duration,
    /// Upper bound on status checks per video job.
    pub video_poll_max_attempts: u32,
    /// How long to wait for the lookup service health check at startup.
    pub readiness_timeout: Duration,
}

impl AppConfig {
    /// Load configuration from environment variables with defaults.
    pub fn from_env() -> Self {
        let gemini_api_key = std::env::var("GEMINI_API_KEY").unwrap_or_else(|_| {
            tracing::warn!("GEMINI_API_KEY not set. Generation requests will fail.");
            String::new()
        });

        let gemini_base_url = std::env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".to_string());

        let vision_model =
            std::env::var("VISION_MODEL").unwrap_or_else(|_| "gemini-2.5-flash".to_string());
        let image_model = std::env::var("IMAGE_MODEL")
            .unwrap_or_else(|_| "gemini-2.5-flash-image-preview".to_string());
        let video_model = std::env::var("VIDEO_MODEL")
            .unwrap_or_else(|_| "veo-3.1-fast-generate-preview".to_string());

        let images_dir = PathBuf::from(std::env::var("IMAGES_DIR").unwrap_or_else(|_| "images".to_string()));
        let videos_dir = PathBuf::from(std::env::var("VIDEOS_DIR").unwrap_or_else(|_| "videos".to_string()));
        let registry_path = PathBuf::from(
            std::env::var("REGISTRY_PATH").unwrap_or_else(|_| "family_registry.json".to_string()),
        );

        let lookup_host = std::env::var("LOOKUP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let lookup_port: u16 = std::env::var("LOOKUP_PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .expect("LOOKUP_PORT must be a valid port number");

        let family_name = std::env::var("FAMILY_NAME").unwrap_or_else(|_| "Doe".to_string());

        let video_poll_interval_secs: u64 = std::env::var("VIDEO_POLL_INTERVAL_SECS")
            .unwrap_or_else(|_| "15".to_string())
            .parse()
            .expect("VIDEO_POLL_INTERVAL_SECS must be a valid u64");
        let video_poll_max_attempts: u32 = std::env::var("VIDEO_POLL_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "40".to_string())
            .parse()
            .expect("VIDEO_POLL_MAX_ATTEMPTS must be a valid u32");
        let readiness_timeout_secs: u64 = std::env::var("READINESS_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".to_string())
            .parse()
            .expect("READINESS_TIMEOUT_SECS must be a valid u64");

        Self {
            gemini_api_key,
            gemini_base_url,
            vision_model,
            image_model,
            video_model,
            images_dir,
            videos_dir,
            registry_path,
            lookup_host,
            lookup_port,
            family_name,
            video_poll_interval: Duration::from_secs(video_poll_interval_secs),
            video_poll_max_attempts,
            readiness_timeout: Duration::from_secs(readiness_timeout_secs),
        }
    }

    /// Base URL of the in-process lookup service.
    pub fn lookup_base_url(&self) -> String {
        format!("http://{}:{}", self.lookup_host, self.lookup_port)
    }
}
