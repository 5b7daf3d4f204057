use super::Enricher;
use crate::core::errors::LedgerError;
use crate::core::models::expense::{Category, ExpenseSuggestions};
use crate::core::money::Money;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

pub struct GeminiEnricher {
    api_url: String,
    api_key: String,
    client: Client,
}

impl GeminiEnricher {
    pub fn new(api_url: String, api_key: String, timeout_secs: u64) -> Result<Self, LedgerError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| LedgerError::InternalServerError(format!("HTTP client setup failed: {}", e)))?;

        Ok(GeminiEnricher {
            api_url,
            api_key,
            client,
        })
    }

    async fn generate(&self, prompt: String) -> Result<String, LedgerError> {
        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Model request failed: {}", e);
                LedgerError::EnrichmentError(format!("request failed: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(LedgerError::EnrichmentError(format!(
                "model returned {}: {}",
                status, body
            )));
        }

        let parsed = response
            .json::<GenerateResponse>()
            .await
            .map_err(|e| LedgerError::EnrichmentError(format!("unreadable model response: {}", e)))?;

        first_text(parsed).ok_or_else(|| LedgerError::EnrichmentError("model returned no candidates".to_string()))
    }
}

fn first_text(response: GenerateResponse) -> Option<String> {
    response
        .candidates
        .into_iter()
        .next()?
        .content
        .parts
        .into_iter()
        .next()
        .map(|p| p.text.trim().to_string())
}

fn category_prompt(description: &str) -> String {
    let names: Vec<&str> = Category::ALL.iter().map(Category::as_str).collect();
    format!(
        "Based on the item name \"{}\", predict the most appropriate expense category.\n\
         Categories: {}.\n\
         Return only one category name in lowercase.",
        description,
        names.join(", ")
    )
}

fn suggestion_prompt(description: &str, category: Category, amount: Money) -> String {
    format!(
        "Analyze this expense:\nItem: {}\nCategory: {}\nAmount: {}\n\n\
         Provide JSON with:\n\
         {{\"health_impact\": \"2-3 sentences on benefits or risks\", \
         \"alternatives\": [\"alt1\", \"alt2\", \"alt3\"], \
         \"smart_tip\": \"one actionable saving/health tip\", \
         \"frequency_suggestion\": \"recommended frequency\"}}",
        description, category, amount
    )
}

/// Anything that is not exactly a known category name maps to `Other`.
pub(crate) fn parse_category(text: &str) -> Category {
    text.parse().unwrap_or(Category::Other)
}

/// Pulls the JSON object out of a reply that may be wrapped in a code fence.
pub(crate) fn parse_suggestions(text: &str) -> Result<ExpenseSuggestions, LedgerError> {
    let body = if let Some(rest) = text.split("```json").nth(1) {
        rest.split("```").next().unwrap_or(rest)
    } else if let Some(rest) = text.split("```").nth(1) {
        rest
    } else {
        text
    };
    serde_json::from_str(body.trim())
        .map_err(|e| LedgerError::EnrichmentError(format!("suggestions were not valid JSON: {}", e)))
}

#[async_trait]
impl Enricher for GeminiEnricher {
    async fn predict_category(&self, description: &str) -> Result<Category, LedgerError> {
        let text = self.generate(category_prompt(description)).await?;
        let category = parse_category(&text);
        debug!("Predicted category {} for '{}'", category, description);
        Ok(category)
    }

    async fn suggest(
        &self,
        description: &str,
        category: Category,
        amount: Money,
    ) -> Result<ExpenseSuggestions, LedgerError> {
        let text = self
            .generate(suggestion_prompt(description, category, amount))
            .await?;
        parse_suggestions(&text)
    }
}
