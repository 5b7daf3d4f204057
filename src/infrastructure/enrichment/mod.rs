pub mod gemini;

use crate::core::errors::LedgerError;
use crate::core::models::expense::{Category, ExpenseSuggestions};
use crate::core::money::Money;
use async_trait::async_trait;

/// Out-of-band category and advice lookup for expenses.
///
/// Callers treat every error as "not available" and fall back to neutral
/// defaults; nothing here may fail a ledger mutation.
#[async_trait]
pub trait Enricher: Send + Sync {
    async fn predict_category(&self, description: &str) -> Result<Category, LedgerError>;
    async fn suggest(
        &self,
        description: &str,
        category: Category,
        amount: Money,
    ) -> Result<ExpenseSuggestions, LedgerError>;
}

/// Used when no model API key is configured.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledEnricher;

#[async_trait]
impl Enricher for DisabledEnricher {
    async fn predict_category(&self, _description: &str) -> Result<Category, LedgerError> {
        Err(LedgerError::EnrichmentError("enrichment is disabled".to_string()))
    }

    async fn suggest(
        &self,
        _description: &str,
        _category: Category,
        _amount: Money,
    ) -> Result<ExpenseSuggestions, LedgerError> {
        Err(LedgerError::EnrichmentError("enrichment is disabled".to_string()))
    }
}

#[async_trait]
impl<T: Enricher + ?Sized> Enricher for Box<T> {
    async fn predict_category(&self, description: &str) -> Result<Category, LedgerError> {
        (**self).predict_category(description).await
    }

    async fn suggest(
        &self,
        description: &str,
        category: Category,
        amount: Money,
    ) -> Result<ExpenseSuggestions, LedgerError> {
        (**self).suggest(description, category, amount).await
    }
}
