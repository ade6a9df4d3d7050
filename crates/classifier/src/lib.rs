//! Receipt classifier backed by the Gemini `generateContent` API.
//!
//! The image is sent inline (base64) next to a fixed instruction asking for a
//! single JSON object. The text of the first candidate is handed to
//! [`RawClassification`] and validated by the engine.

use async_trait::async_trait;
use base64::Engine as _;
use engine::{Classification, ClassifierError, RawClassification, ReceiptClassifier};
pub use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";

const PROMPT: &str = "Extract the data of this purchase receipt and answer with ONE valid JSON \
object and nothing else, with this shape: \
{\"store\": string|null, \"date\": string (YYYY-MM-DD)|null, \"amount\": number|null, \
\"category_id\": number|null, \"category_name\": string|null, \"error\": string|null}. \
\"amount\" is the total paid. Choose the category among: 1 food, 2 drinks, 3 subscriptions, \
4 small_payment, 5 transport, 6 others. Only fill \"date\" if it is printed on the receipt; \
never infer it. If the image is not a readable receipt, answer {\"error\": \"unreadable_image\"}.";

#[derive(Clone, Debug)]
pub struct GeminiClassifier {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl GeminiClassifier {
    pub fn new(client: Client, api_key: String) -> Self {
        Self {
            client,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

#[async_trait]
impl ReceiptClassifier for GeminiClassifier {
    async fn classify(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<Classification, ClassifierError> {
        tracing::debug!(model = %self.model, bytes = image.len(), "calling receipt classifier");

        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&GenerateRequest::for_image(image, mime_type))
            .send()
            .await
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|err| ClassifierError::Transport(err.to_string()))?;
        if !status.is_success() {
            return Err(ClassifierError::Upstream {
                status: status.as_u16(),
                message: upstream_message(&body),
            });
        }

        let text = candidate_text(&body)?;
        Ok(RawClassification::from_text(&text)?.into_classification())
    }
}

/// Stand-in used when no classifier is configured: every call fails with
/// [`ClassifierError::NotConfigured`].
#[derive(Clone, Copy, Debug, Default)]
pub struct Unconfigured;

#[async_trait]
impl ReceiptClassifier for Unconfigured {
    async fn classify(
        &self,
        _image: &[u8],
        _mime_type: &str,
    ) -> Result<Classification, ClassifierError> {
        Err(ClassifierError::NotConfigured)
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Inline { inline_data: InlineData },
    Text { text: String },
}

#[derive(Debug, Serialize)]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: &'static str,
}

impl GenerateRequest {
    fn for_image(image: &[u8], mime_type: &str) -> Self {
        Self {
            contents: vec![Content {
                parts: vec![
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: mime_type.to_string(),
                            data: base64::engine::general_purpose::STANDARD.encode(image),
                        },
                    },
                    Part::Text {
                        text: PROMPT.to_string(),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json",
            },
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    error: UpstreamErrorDetail,
}

#[derive(Debug, Deserialize)]
struct UpstreamErrorDetail {
    message: String,
}

/// Text of the first candidate's first text part.
fn candidate_text(body: &str) -> Result<String, ClassifierError> {
    let response: GenerateResponse =
        serde_json::from_str(body).map_err(|err| ClassifierError::Malformed(err.to_string()))?;
    response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.into_iter().find_map(|part| part.text))
        .ok_or_else(|| ClassifierError::Malformed("response has no candidate text".to_string()))
}

fn upstream_message(body: &str) -> String {
    match serde_json::from_str::<UpstreamError>(body) {
        Ok(err) => err.error.message,
        Err(_) => "classifier error".to_string(),
    }
}
