// lookup_server.rs - Local family metadata lookup service
//
// Serves `GET /mcp?family_name=<name>`: for each portrait registered under
// the family, a vision model reads the person's name and birth place off
// the image. Started in-process by main; `/health` is the readiness probe.

use async_trait::async_trait;
use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use base64::prelude::*;
use serde::Deserialize;
use std::{collections::HashMap, path::Path, sync::Arc};
use tower_http::cors::CorsLayer;

use crate::gemini_client::{
    Content, GeminiClient, GeminiError, GenerateContentRequest, InlineData, Part,
};
use crate::types::{local_portrait_path, CharacterRecord, RegistryEntry};

/// Instruction sent to the vision model alongside each portrait.
const EXTRACTION_INSTRUCTION: &str = "Extract the name and birth place of the person in this image. \
    Return the data in JSON format with keys 'name' and 'birth_place'. \
    If you can't determine the information, use 'Unknown'.";

/// Seam between the lookup handlers and the vision model, so the routes can
/// be exercised in tests with a stub.
#[async_trait]
pub trait PortraitAnalyzer: Send + Sync {
    /// Ask the vision model about the portrait. Returns the raw model text.
    async fn analyze_portrait(&self, image: &[u8]) -> Result<String, GeminiError>;
}

/// Production analyzer backed by the Gemini vision model.
pub struct GeminiPortraitAnalyzer {
    client: GeminiClient,
    model: String,
}

impl GeminiPortraitAnalyzer {
    pub fn new(client: GeminiClient, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl PortraitAnalyzer for GeminiPortraitAnalyzer {
    async fn analyze_portrait(&self, image: &[u8]) -> Result<String, GeminiError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::InlineData {
                        inline_data: InlineData {
                            mime_type: "image/jpeg".to_string(),
                            data: BASE64_STANDARD.encode(image),
                        },
                    },
                    Part::Text {
                        text: EXTRACTION_INSTRUCTION.to_string(),
                    },
                ],
                role: Some("user".to_string()),
            }],
            generation_config: None,
        };

        let response = self.client.generate_content(&self.model, request).await?;
        response
            .first_text()
            .map(|text| text.to_string())
            .ok_or(GeminiError::NoText)
    }
}

pub type FamilyRegistry = HashMap<String, Vec<RegistryEntry>>;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("failed to read registry file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse registry file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Load the family registry file (family name → registered portraits).
pub fn load_registry(path: &Path) -> Result<FamilyRegistry, RegistryError> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub struct LookupState {
    registry: FamilyRegistry,
    analyzer: Arc<dyn PortraitAnalyzer>,
}

impl LookupState {
    pub fn new(registry: FamilyRegistry, analyzer: Arc<dyn PortraitAnalyzer>) -> Self {
        Self { registry, analyzer }
    }
}

pub fn lookup_routes(state: Arc<LookupState>) -> Router {
    Router::new()
        .route("/mcp", get(family_lookup))
        .route("/health", get(health_check))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}

async fn health_check() -> StatusCode {
    StatusCode::OK
}

#[derive(Deserialize)]
struct LookupParams {
    family_name: Option<String>,
}

async fn family_lookup(
    Query(params): Query<LookupParams>,
    Extension(state): Extension<Arc<LookupState>>,
) -> Response {
    let Some(family_name) = params.family_name else {
        return (StatusCode::BAD_REQUEST, "Missing family_name parameter").into_response();
    };

    let Some(entries) = state.registry.get(&family_name) else {
        return (StatusCode::NOT_FOUND, "Family not found").into_response();
    };

    let mut characters = Vec::with_capacity(entries.len());
    for entry in entries {
        characters.push(resolve_character(state.analyzer.as_ref(), entry).await);
    }

    Json(characters).into_response()
}

/// Read the portrait and ask the vision model who is in it.
///
/// Analyzer or file failures degrade to the registry-recorded name with an
/// unknown birth place; a registered family always gets a full response.
async fn resolve_character(analyzer: &dyn PortraitAnalyzer, entry: &RegistryEntry) -> CharacterRecord {
    let portrait_path = local_portrait_path(&entry.image_url);

    let metadata = match tokio::fs::read(&portrait_path).await {
        Ok(bytes) => match analyzer.analyze_portrait(&bytes).await {
            Ok(text) => parse_portrait_metadata(&text),
            Err(e) => {
                tracing::warn!(
                    "Portrait analysis failed for {}: {}",
                    portrait_path.display(),
                    e
                );
                PortraitMetadata::default()
            }
        },
        Err(e) => {
            tracing::warn!("Failed to read portrait {}: {}", portrait_path.display(), e);
            PortraitMetadata::default()
        }
    };

    CharacterRecord {
        name: metadata
            .name
            .or_else(|| entry.name.clone())
            .unwrap_or_else(|| "Unknown".to_string()),
        birth_place: metadata
            .birth_place
            .unwrap_or_else(|| "Unknown".to_string()),
        image_url: entry.image_url.clone(),
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PortraitMetadata {
    pub name: Option<String>,
    pub birth_place: Option<String>,
}

/// Parse the vision model's metadata reply.
///
/// The model often wraps its JSON in markdown fences; strip them before
/// parsing. Unparseable replies fall back to the raw text as the name.
pub fn parse_portrait_metadata(raw: &str) -> PortraitMetadata {
    let cleaned = raw
        .trim()
        .trim_start_matches("```json")
        .trim_start_matches("```")
        .trim_end_matches("```")
        .trim();

    match serde_json::from_str::<PortraitMetadata>(cleaned) {
        Ok(metadata) => metadata,
        Err(_) => PortraitMetadata {
            name: Some(raw.trim().to_string()),
            birth_place: None,
        },
    }
}
