//! Minimal Google Gemini API client.
//!
//! This crate provides a focused client for the Gemini API with:
//! - Text generation via `generateContent` (system instruction + chat history)
//! - Image generation via the Imagen `predict` endpoint

use base64::Engine;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash-preview-04-17";
const DEFAULT_IMAGE_MODEL: &str = "imagen-3.0-generate-002";

/// Errors that can occur when using the Gemini client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Gemini API client.
#[derive(Clone)]
pub struct Gemini {
    client: reqwest::Client,
    api_key: String,
    text_model: String,
    image_model: String,
}

impl Gemini {
    /// Create a new Gemini client with the given API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(std::time::Duration::from_secs(120))
                .connect_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to build HTTP client"),
            api_key: api_key.into(),
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            image_model: DEFAULT_IMAGE_MODEL.to_string(),
        }
    }

    /// Create a Gemini client from the GEMINI_API_KEY environment variable.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| Error::NoApiKey)?;
        Ok(Self::new(api_key))
    }

    /// Set the default text-generation model for this client.
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Set the default image-generation model for this client.
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Send a text-generation request and return the full response.
    pub async fn generate_content(&self, request: Request) -> Result<Response, Error> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.text_model.clone());
        let api_request = build_generate_request(&request);
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{API_BASE}/models/{model}:generateContent"))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiGenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        Ok(parse_generate_response(api_response))
    }

    /// Send an image-generation request and return the decoded images.
    pub async fn generate_images(&self, request: ImageRequest) -> Result<ImageResponse, Error> {
        let model = request
            .model
            .clone()
            .unwrap_or_else(|| self.image_model.clone());
        let api_request = ApiPredictRequest {
            instances: vec![ApiInstance {
                prompt: request.prompt.clone(),
            }],
            parameters: ApiPredictParameters {
                sample_count: request.sample_count,
                output_mime_type: request.output_mime_type.clone(),
            },
        };
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(format!("{API_BASE}/models/{model}:predict"))
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiPredictResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parse_predict_response(api_response)
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            "x-goog-api-key",
            HeaderValue::from_str(&self.api_key)
                .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
        );
        Ok(headers)
    }
}

// ============================================================================
// Public types
// ============================================================================

/// A text-generation request to send to Gemini.
#[derive(Debug, Clone)]
pub struct Request {
    pub model: Option<String>,
    pub system_instruction: Option<String>,
    pub contents: Vec<Message>,
    pub temperature: Option<f32>,
}

impl Request {
    /// Create a new request with the given conversation turns.
    pub fn new(contents: Vec<Message>) -> Self {
        Self {
            model: None,
            system_instruction: None,
            contents,
            temperature: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A turn in the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub text: String,
}

impl Message {
    /// Create a user turn.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
        }
    }

    /// Create a model turn.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            text: text.into(),
        }
    }
}

/// The role of a turn's author.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Model,
}

/// A text-generation response from Gemini.
#[derive(Debug, Clone)]
pub struct Response {
    pub candidates: Vec<Candidate>,
    pub usage: Usage,
}

impl Response {
    /// Get the text of the first candidate, or an empty string.
    pub fn text(&self) -> String {
        self.candidates
            .first()
            .map(|c| c.text.clone())
            .unwrap_or_default()
    }
}

/// A single generated candidate.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub text: String,
    pub finish_reason: FinishReason,
}

/// Why the model stopped generating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    MaxTokens,
    Safety,
    Other,
}

/// Token usage information.
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub response_tokens: usize,
}

/// An image-generation request to send to Imagen.
#[derive(Debug, Clone)]
pub struct ImageRequest {
    pub model: Option<String>,
    pub prompt: String,
    pub sample_count: usize,
    pub output_mime_type: String,
}

impl ImageRequest {
    /// Create a request for a single JPEG image of the given prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            model: None,
            prompt: prompt.into(),
            sample_count: 1,
            output_mime_type: "image/jpeg".to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_sample_count(mut self, sample_count: usize) -> Self {
        self.sample_count = sample_count;
        self
    }
}

/// An image-generation response.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    pub images: Vec<GeneratedImage>,
}

/// A generated image, decoded from the wire encoding.
#[derive(Debug, Clone)]
pub struct GeneratedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<ApiContent>,
    contents: Vec<ApiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<ApiGenerationConfig>,
}

#[derive(Debug, Serialize)]
struct ApiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<ApiPart>,
}

#[derive(Debug, Serialize)]
struct ApiPart {
    text: String,
}

#[derive(Debug, Serialize)]
struct ApiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiGenerateResponse {
    #[serde(default)]
    candidates: Vec<ApiCandidate>,
    #[serde(default)]
    usage_metadata: Option<ApiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiCandidate {
    #[serde(default)]
    content: Option<ApiCandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiCandidateContent {
    #[serde(default)]
    parts: Vec<ApiResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ApiResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiUsageMetadata {
    #[serde(default)]
    prompt_token_count: usize,
    #[serde(default)]
    candidates_token_count: usize,
}

#[derive(Debug, Serialize)]
struct ApiPredictRequest {
    instances: Vec<ApiInstance>,
    parameters: ApiPredictParameters,
}

#[derive(Debug, Serialize)]
struct ApiInstance {
    prompt: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ApiPredictParameters {
    sample_count: usize,
    output_mime_type: String,
}

#[derive(Debug, Deserialize)]
struct ApiPredictResponse {
    #[serde(default)]
    predictions: Vec<ApiPrediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiPrediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

fn build_generate_request(request: &Request) -> ApiGenerateRequest {
    let contents: Vec<ApiContent> = request
        .contents
        .iter()
        .map(|m| ApiContent {
            role: Some(match m.role {
                Role::User => "user".to_string(),
                Role::Model => "model".to_string(),
            }),
            parts: vec![ApiPart {
                text: m.text.clone(),
            }],
        })
        .collect();

    ApiGenerateRequest {
        system_instruction: request.system_instruction.as_ref().map(|s| ApiContent {
            role: None,
            parts: vec![ApiPart { text: s.clone() }],
        }),
        contents,
        generation_config: request.temperature.map(|t| ApiGenerationConfig {
            temperature: Some(t),
        }),
    }
}

fn parse_generate_response(api_response: ApiGenerateResponse) -> Response {
    let candidates: Vec<Candidate> = api_response
        .candidates
        .into_iter()
        .map(|c| {
            let text = c
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|p| p.text)
                        .collect::<Vec<_>>()
                        .join("")
                })
                .unwrap_or_default();

            let finish_reason = match c.finish_reason.as_deref() {
                Some("STOP") | None => FinishReason::Stop,
                Some("MAX_TOKENS") => FinishReason::MaxTokens,
                Some("SAFETY") => FinishReason::Safety,
                Some(_) => FinishReason::Other,
            };

            Candidate {
                text,
                finish_reason,
            }
        })
        .collect();

    let usage = api_response
        .usage_metadata
        .map(|u| Usage {
            prompt_tokens: u.prompt_token_count,
            response_tokens: u.candidates_token_count,
        })
        .unwrap_or_default();

    Response { candidates, usage }
}

fn parse_predict_response(api_response: ApiPredictResponse) -> Result<ImageResponse, Error> {
    let mut images = Vec::new();
    for prediction in api_response.predictions {
        let Some(encoded) = prediction.bytes_base64_encoded else {
            continue;
        };
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(&encoded)
            .map_err(|e| Error::Parse(format!("Base64 decode error: {e}")))?;
        images.push(GeneratedImage {
            bytes,
            mime_type: prediction
                .mime_type
                .unwrap_or_else(|| "image/jpeg".to_string()),
        });
    }
    Ok(ImageResponse { images })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = Gemini::new("test-key");
        assert_eq!(client.text_model, DEFAULT_TEXT_MODEL);
        assert_eq!(client.image_model, DEFAULT_IMAGE_MODEL);
    }

    #[test]
    fn test_client_with_models() {
        let client = Gemini::new("test-key")
            .with_text_model("gemini-2.0-flash")
            .with_image_model("imagen-4.0");
        assert_eq!(client.text_model, "gemini-2.0-flash");
        assert_eq!(client.image_model, "imagen-4.0");
    }

    #[test]
    fn test_request_builder() {
        let request = Request::new(vec![Message::user("Hello")])
            .with_system_instruction("You are a helpful guide")
            .with_temperature(0.7);

        assert!(request.system_instruction.is_some());
        assert_eq!(request.temperature, Some(0.7));
        assert_eq!(request.contents.len(), 1);
    }

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert!(matches!(user_msg.role, Role::User));

        let model_msg = Message::model("Hi there");
        assert!(matches!(model_msg.role, Role::Model));
    }

    #[test]
    fn test_generate_request_wire_format() {
        let request = Request::new(vec![Message::user("Hi"), Message::model("Hello")])
            .with_system_instruction("Be brief");
        let api_request = build_generate_request(&request);
        let value = serde_json::to_value(&api_request).unwrap();

        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(value["contents"][0]["parts"][0]["text"], "Hi");
        assert_eq!(value["contents"][1]["role"], "model");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], "Be brief");
        assert!(value["systemInstruction"].get("role").is_none());
        assert!(value.get("generationConfig").is_none());
    }

    #[test]
    fn test_generate_response_parsing() {
        let json = r#"{
            "candidates": [
                {
                    "content": {"parts": [{"text": "Greetings, "}, {"text": "traveler."}], "role": "model"},
                    "finishReason": "STOP"
                }
            ],
            "usageMetadata": {"promptTokenCount": 12, "candidatesTokenCount": 5, "totalTokenCount": 17}
        }"#;
        let api_response: ApiGenerateResponse = serde_json::from_str(json).unwrap();
        let response = parse_generate_response(api_response);

        assert_eq!(response.text(), "Greetings, traveler.");
        assert_eq!(response.candidates[0].finish_reason, FinishReason::Stop);
        assert_eq!(response.usage.prompt_tokens, 12);
        assert_eq!(response.usage.response_tokens, 5);
    }

    #[test]
    fn test_empty_response_text() {
        let api_response: ApiGenerateResponse = serde_json::from_str("{}").unwrap();
        let response = parse_generate_response(api_response);
        assert_eq!(response.text(), "");
    }

    #[test]
    fn test_image_request_defaults() {
        let request = ImageRequest::new("a sunlit temple");
        assert_eq!(request.sample_count, 1);
        assert_eq!(request.output_mime_type, "image/jpeg");
        assert!(request.model.is_none());
    }

    #[test]
    fn test_predict_request_wire_format() {
        let api_request = ApiPredictRequest {
            instances: vec![ApiInstance {
                prompt: "a city".to_string(),
            }],
            parameters: ApiPredictParameters {
                sample_count: 1,
                output_mime_type: "image/jpeg".to_string(),
            },
        };
        let value = serde_json::to_value(&api_request).unwrap();

        assert_eq!(value["instances"][0]["prompt"], "a city");
        assert_eq!(value["parameters"]["sampleCount"], 1);
        assert_eq!(value["parameters"]["outputMimeType"], "image/jpeg");
    }

    #[test]
    fn test_predict_response_parsing() {
        let json = r#"{
            "predictions": [
                {"bytesBase64Encoded": "aGVsbG8=", "mimeType": "image/jpeg"}
            ]
        }"#;
        let api_response: ApiPredictResponse = serde_json::from_str(json).unwrap();
        let response = parse_predict_response(api_response).unwrap();

        assert_eq!(response.images.len(), 1);
        assert_eq!(response.images[0].bytes, b"hello");
        assert_eq!(response.images[0].mime_type, "image/jpeg");
    }

    #[test]
    fn test_predict_response_bad_encoding() {
        let json = r#"{"predictions": [{"bytesBase64Encoded": "!!not-base64!!"}]}"#;
        let api_response: ApiPredictResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            parse_predict_response(api_response),
            Err(Error::Parse(_))
        ));
    }
}
