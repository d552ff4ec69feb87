use base64::prelude::*;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Client for the Gemini generative language REST API.
///
/// Covers the three calls the pipeline makes: `generateContent` for vision
/// extraction and image generation, and the long-running
/// `predictLongRunning` operations API for video generation.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("no text content in response")]
    NoText,

    #[error("no inline image data in response")]
    NoImageData,

    #[error("no generated video in operation response")]
    NoVideoData,

    #[error("failed to decode media payload: {0}")]
    Decode(#[from] base64::DecodeError),
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Content {
    #[serde(default)]
    pub parts: Vec<Part>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(untagged)]
pub enum Part {
    Text { text: String },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct InlineData {
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    pub data: String, // base64 encoded payload
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(rename = "responseModalities", skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<Content>,
    #[serde(rename = "finishReason")]
    pub finish_reason: Option<String>,
}

impl GenerateContentResponse {
    /// First text part in the first candidate, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
    }

    /// First inline media payload in the first candidate, if any.
    pub fn first_inline_data(&self) -> Option<&InlineData> {
        self.candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .find_map(|part| match part {
                Part::InlineData { inline_data } => Some(inline_data),
                _ => None,
            })
    }
}

// ============================================================================
// LONG-RUNNING VIDEO GENERATION
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VideoGenerationRequest {
    pub instances: Vec<VideoInstance>,
    pub parameters: VideoGenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct VideoInstance {
    pub prompt: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<SeedImage>,
}

/// Still image a video job starts from.
#[derive(Debug, Serialize)]
pub struct SeedImage {
    #[serde(rename = "bytesBase64Encoded")]
    pub bytes_base64_encoded: String,
    #[serde(rename = "mimeType")]
    pub mime_type: String,
}

impl SeedImage {
    pub fn from_bytes(bytes: &[u8], mime_type: &str) -> Self {
        Self {
            bytes_base64_encoded: BASE64_STANDARD.encode(bytes),
            mime_type: mime_type.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VideoGenerationConfig {
    #[serde(rename = "aspectRatio")]
    pub aspect_ratio: String,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: u32,
    pub resolution: String,
    #[serde(rename = "personGeneration")]
    pub person_generation: String,
    #[serde(rename = "enhancePrompt")]
    pub enhance_prompt: bool,
    #[serde(rename = "generateAudio")]
    pub generate_audio: bool,
    #[serde(rename = "sampleCount")]
    pub sample_count: u32,
}

impl Default for VideoGenerationConfig {
    fn default() -> Self {
        Self {
            aspect_ratio: "16:9".to_string(),
            duration_seconds: 8,
            resolution: "1080p".to_string(),
            person_generation: "allow_adult".to_string(),
            enhance_prompt: true,
            generate_audio: true,
            sample_count: 1,
        }
    }
}

/// State of a long-running video generation job.
#[derive(Debug, Deserialize)]
pub struct VideoOperation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    pub error: Option<OperationError>,
    pub response: Option<VideoOperationResponse>,
}

#[derive(Debug, Deserialize)]
pub struct OperationError {
    pub code: Option<i32>,
    pub message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct VideoOperationResponse {
    #[serde(rename = "generateVideoResponse")]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateVideoResponse {
    #[serde(rename = "generatedSamples", default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
pub struct GeneratedSample {
    pub video: Option<GeneratedVideo>,
}

/// Generated clip payload: inline base64 bytes or a download URI.
#[derive(Debug, Deserialize)]
pub struct GeneratedVideo {
    pub uri: Option<String>,
    #[serde(rename = "encodedVideo")]
    pub encoded_video: Option<String>,
}

impl VideoOperationResponse {
    pub fn first_video(&self) -> Option<&GeneratedVideo> {
        self.generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()
    }
}

impl GeminiClient {
    pub fn new(api_key: String, base_url: String) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url,
        }
    }

    pub async fn generate_content(
        &self,
        model: &str,
        request: GenerateContentRequest,
    ) -> Result<GenerateContentResponse, GeminiError> {
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(120))
            .json(&request)
            .send()
            .await?;

        Self::parse_json(response).await
    }

    /// Generate one image from a prompt plus optional reference portraits.
    ///
    /// Reference images precede the prompt text in the request. Returns the
    /// decoded bytes of the first inline image payload in the response.
    pub async fn generate_image(
        &self,
        model: &str,
        prompt: &str,
        reference_images: &[Vec<u8>],
    ) -> Result<Vec<u8>, GeminiError> {
        let mut parts: Vec<Part> = reference_images
            .iter()
            .map(|bytes| Part::InlineData {
                inline_data: InlineData {
                    mime_type: "image/jpeg".to_string(),
                    data: BASE64_STANDARD.encode(bytes),
                },
            })
            .collect();
        parts.push(Part::Text {
            text: prompt.to_string(),
        });

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts,
                role: Some("user".to_string()),
            }],
            generation_config: Some(GenerationConfig {
                response_modalities: Some(vec!["TEXT".to_string(), "IMAGE".to_string()]),
                temperature: None,
            }),
        };

        let response = self.generate_content(model, request).await?;
        let inline = response
            .first_inline_data()
            .ok_or(GeminiError::NoImageData)?;
        Ok(BASE64_STANDARD.decode(&inline.data)?)
    }

    /// Submit a video generation job. Returns the pending operation.
    pub async fn start_video_generation(
        &self,
        model: &str,
        instance: VideoInstance,
        parameters: VideoGenerationConfig,
    ) -> Result<VideoOperation, GeminiError> {
        let url = format!(
            "{}/models/{}:predictLongRunning?key={}",
            self.base_url, model, self.api_key
        );

        let request = VideoGenerationRequest {
            instances: vec![instance],
            parameters,
        };

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .timeout(Duration::from_secs(120))
            .json(&request)
            .send()
            .await?;

        Self::parse_json(response).await
    }

    /// Poll a video generation job by its operation name.
    pub async fn get_video_operation(&self, name: &str) -> Result<VideoOperation, GeminiError> {
        let url = format!("{}/{}?key={}", self.base_url, name, self.api_key);

        let response = self
            .client
            .get(&url)
            .timeout(Duration::from_secs(30))
            .send()
            .await?;

        Self::parse_json(response).await
    }

    /// Download the bytes of a generated clip.
    pub async fn fetch_video_bytes(&self, video: &GeneratedVideo) -> Result<Vec<u8>, GeminiError> {
        if let Some(encoded) = &video.encoded_video {
            return Ok(BASE64_STANDARD.decode(encoded)?);
        }

        let Some(uri) = &video.uri else {
            return Err(GeminiError::NoVideoData);
        };

        let response = self
            .client
            .get(uri)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.bytes().await?.to_vec())
    }

    async fn parse_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, GeminiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(GeminiError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<T>().await?)
    }
}
