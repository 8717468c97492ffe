//! Token endpoints under `/api/tokens`

use super::{require_data, ApiClient};
use crate::error::ApiError;
use crate::types::{CreateTokenDto, Token, TokenPage, TokenQueryParams, TokenStats, UpdateTokenDto};
use reqwest::StatusCode;
use tracing::{debug, info};

const API: &str = "api";
const RESOURCE: &str = "tokens";

#[derive(Clone)]
pub struct TokenApi {
    client: ApiClient,
}

impl TokenApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    pub async fn list(&self, params: &TokenQueryParams) -> Result<TokenPage, ApiError> {
        let response = self
            .client
            .get::<Vec<Token>, _>(&[API, RESOURCE], Some(params))
            .await?;
        let page = TokenPage::from(response);
        debug!(
            count = page.tokens.len(),
            page = ?page.meta.map(|m| m.page),
            "Fetched token page"
        );
        Ok(page)
    }

    pub async fn get(&self, id: &str) -> Result<Token, ApiError> {
        let response = self.client.get::<Token, ()>(&[API, RESOURCE, id], None).await?;
        require_data(response)
    }

    pub async fn get_by_symbol(&self, symbol: &str) -> Result<Token, ApiError> {
        let response = self
            .client
            .get::<Token, ()>(&[API, RESOURCE, "symbol", symbol], None)
            .await?;
        require_data(response)
    }

    /// Fails with `SymbolTaken` when a token already uses `symbol`. A failed
    /// lookup leaves the decision to the server.
    pub async fn ensure_symbol_free(&self, symbol: &str) -> Result<(), ApiError> {
        match self.get_by_symbol(symbol).await {
            Ok(existing) => Err(ApiError::SymbolTaken(existing.symbol)),
            Err(e) => {
                if e.status() != Some(StatusCode::NOT_FOUND) {
                    debug!(symbol, error = %e, "Symbol lookup failed");
                }
                Ok(())
            }
        }
    }

    pub async fn create(&self, dto: &CreateTokenDto) -> Result<Token, ApiError> {
        let response = self.client.post::<Token, _>(&[API, RESOURCE], dto).await?;
        let token = require_data(response)?;
        info!(id = %token.id, symbol = %token.symbol, "Token created");
        Ok(token)
    }

    pub async fn update(&self, id: &str, dto: &UpdateTokenDto) -> Result<Token, ApiError> {
        let response = self.client.put::<Token, _>(&[API, RESOURCE, id], dto).await?;
        let token = require_data(response)?;
        info!(id = %token.id, symbol = %token.symbol, "Token updated");
        Ok(token)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client
            .delete::<serde_json::Value, ()>(&[API, RESOURCE, id], None)
            .await?;
        info!(id, "Token deleted");
        Ok(())
    }

    pub async fn stats(&self) -> Result<TokenStats, ApiError> {
        let response = self
            .client
            .get::<TokenStats, ()>(&[API, RESOURCE, "stats"], None)
            .await?;
        require_data(response)
    }
}
