//! Boundary between chat logic and the generative backend.

use async_trait::async_trait;
use gemini::{Gemini, GeneratedImage, ImageRequest, Message, Request};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error(transparent)]
    Service(#[from] gemini::Error),

    #[error("the model returned no usable content")]
    EmptyResponse,
}

/// A generative backend for conversation turns and scene snapshots.
///
/// Object safe, so sessions hold a `Box<dyn Provider>` and tests swap in a
/// scripted double.
#[async_trait]
pub trait Provider: Send + Sync {
    /// Produce the next model turn for the given instruction and history,
    /// oldest turn first.
    async fn generate_text(
        &self,
        instruction: &str,
        history: Vec<Message>,
    ) -> Result<String, ProviderError>;

    /// Produce a single scene image for the prompt.
    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ProviderError>;
}

#[async_trait]
impl Provider for Gemini {
    async fn generate_text(
        &self,
        instruction: &str,
        history: Vec<Message>,
    ) -> Result<String, ProviderError> {
        let request = Request::new(history).with_system_instruction(instruction);
        let response = self.generate_content(request).await?;
        let text = response.text();
        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }
        Ok(text)
    }

    async fn generate_image(&self, prompt: &str) -> Result<GeneratedImage, ProviderError> {
        let response = self.generate_images(ImageRequest::new(prompt)).await?;
        response
            .images
            .into_iter()
            .next()
            .ok_or(ProviderError::EmptyResponse)
    }
}
