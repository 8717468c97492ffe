//! Common types and data structures shared with the catalog API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Catalog entry as returned by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: String,
    pub name: String,
    pub symbol: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Token {
    pub fn market_cap(&self) -> Option<f64> {
        match (self.price_usd, self.total_supply) {
            (Some(price), Some(supply)) if price > 0.0 && supply > 0.0 => Some(price * supply),
            _ => None,
        }
    }

    /// First letter of the symbol, shown when the token has no logo
    pub fn initial(&self) -> char {
        self.symbol.chars().next().unwrap_or('?').to_ascii_uppercase()
    }

    pub fn logo_url(&self) -> Option<&str> {
        self.logo.as_deref().filter(|l| !l.is_empty())
    }

    pub fn website_url(&self) -> Option<&str> {
        self.website.as_deref().filter(|w| !w.is_empty())
    }
}

/// Body of `POST /api/tokens`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTokenDto {
    pub name: String,
    pub symbol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Body of `PUT /api/tokens/{id}`; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTokenDto {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_supply: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

impl From<CreateTokenDto> for UpdateTokenDto {
    fn from(dto: CreateTokenDto) -> Self {
        Self {
            name: Some(dto.name),
            symbol: Some(dto.symbol),
            logo: dto.logo,
            total_supply: dto.total_supply,
            price_usd: dto.price_usd,
            description: dto.description,
            website: dto.website,
        }
    }
}

/// Field the server sorts the listing by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortField {
    #[serde(rename = "name")]
    Name,
    #[serde(rename = "symbol")]
    Symbol,
    #[serde(rename = "priceUsd")]
    Price,
    #[serde(rename = "createdAt")]
    CreatedAt,
}

impl SortField {
    /// Choices offered by the browse view, in display order
    pub const BROWSE: [SortField; 3] = [SortField::CreatedAt, SortField::Name, SortField::Price];

    pub fn label(self) -> &'static str {
        match self {
            SortField::Name => "Name",
            SortField::Symbol => "Symbol",
            SortField::Price => "Price",
            SortField::CreatedAt => "Latest",
        }
    }
}

/// Sort direction for listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Query string of `GET /api/tokens`. Also the cache key for listings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
pub struct TokenQueryParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_by: Option<SortField>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<SortOrder>,
}

impl TokenQueryParams {
    pub fn with_page(&self, page: u32) -> Self {
        Self {
            page: Some(page),
            ..self.clone()
        }
    }

    /// Same query with the page dropped, used to key the infinite feed
    pub fn without_page(&self) -> Self {
        Self {
            page: None,
            ..self.clone()
        }
    }
}

/// Pagination metadata attached to list responses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageMeta {
    pub total: u64,
    pub page: u32,
    pub limit: u32,
    pub total_pages: u32,
}

impl PageMeta {
    pub fn next_page(&self) -> Option<u32> {
        (self.page < self.total_pages).then_some(self.page + 1)
    }
}

/// Response envelope used by every JSON endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub meta: Option<PageMeta>,
}

/// One page of a token listing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenPage {
    pub tokens: Vec<Token>,
    pub meta: Option<PageMeta>,
}

impl TokenPage {
    pub fn next_page(&self) -> Option<u32> {
        self.meta.and_then(|m| m.next_page())
    }

    pub fn total_pages(&self) -> u32 {
        self.meta.map(|m| m.total_pages).unwrap_or(1).max(1)
    }
}

impl From<ApiResponse<Vec<Token>>> for TokenPage {
    fn from(response: ApiResponse<Vec<Token>>) -> Self {
        Self {
            tokens: response.data.unwrap_or_default(),
            meta: response.meta,
        }
    }
}

/// Aggregates from `GET /api/tokens/stats`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TokenStats {
    pub total_tokens: u64,
    pub total_market_cap: f64,
    pub average_price: f64,
}

/// Body of `POST /api/upload/presigned-url`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignRequest {
    pub file_name: String,
    pub file_size: u64,
    pub content_type: String,
}

/// Short-lived write URL plus the public URL the object will have
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PresignedUpload {
    pub upload_url: String,
    pub file_url: String,
    pub key: String,
    pub expires_in: u64,
    #[serde(default)]
    pub instructions: Option<UploadInstructions>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadInstructions {
    pub method: String,
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl PresignedUpload {
    /// Content type the storage expects, if the server pinned one
    pub fn content_type(&self) -> Option<&str> {
        self.instructions.as_ref().and_then(|i| {
            i.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
                .map(|(_, v)| v.as_str())
        })
    }
}

/// Body of `DELETE /api/upload/image`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest {
    pub image_url: String,
}

/// Which top-level view is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum View {
    #[default]
    Browse,
    Manage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_deserializes_camel_case_and_missing_optionals() {
        let json = r#"{
            "id": "t1",
            "name": "Bitcoin",
            "symbol": "BTC",
            "priceUsd": 50000.5,
            "totalSupply": 21000000,
            "createdAt": "2024-01-01T00:00:00Z",
            "updatedAt": "2024-02-01T12:30:00.000Z"
        }"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert_eq!(token.symbol, "BTC");
        assert_eq!(token.price_usd, Some(50000.5));
        assert_eq!(token.logo, None);
        assert_eq!(token.market_cap(), Some(50000.5 * 21_000_000.0));
        assert_eq!(token.initial(), 'B');
    }

    #[test]
    fn empty_logo_and_website_count_as_absent() {
        let json = r#"{"id":"t","name":"Nada","symbol":"nd","logo":"","website":"",
            "createdAt":"2024-01-01T00:00:00Z","updatedAt":"2024-01-01T00:00:00Z"}"#;
        let token: Token = serde_json::from_str(json).unwrap();
        assert!(token.logo_url().is_none());
        assert!(token.website_url().is_none());
        assert_eq!(token.initial(), 'N');
    }

    #[test]
    fn query_params_skip_absent_fields() {
        let params = TokenQueryParams {
            page: Some(2),
            limit: Some(12),
            sort_by: Some(SortField::Price),
            sort_order: Some(SortOrder::Desc),
            ..Default::default()
        };
        let value = serde_json::to_value(&params).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"page": 2, "limit": 12, "sort_by": "priceUsd", "sort_order": "desc"})
        );
    }

    #[test]
    fn feed_key_ignores_page() {
        let base = TokenQueryParams {
            search: Some("eth".into()),
            ..Default::default()
        };
        assert_eq!(base.with_page(3).without_page(), base);
    }

    #[test]
    fn page_meta_reports_next_page_until_last() {
        let meta = PageMeta { total: 30, page: 2, limit: 12, total_pages: 3 };
        assert_eq!(meta.next_page(), Some(3));
        let last = PageMeta { page: 3, ..meta };
        assert_eq!(last.next_page(), None);
    }

    #[test]
    fn list_envelope_converts_to_page() {
        let json = r#"{"success":true,"message":"ok","data":[],
            "meta":{"total":0,"page":1,"limit":10,"total_pages":0}}"#;
        let response: ApiResponse<Vec<Token>> = serde_json::from_str(json).unwrap();
        let page = TokenPage::from(response);
        assert!(page.tokens.is_empty());
        assert_eq!(page.total_pages(), 1);
        assert_eq!(page.next_page(), None);
    }

    #[test]
    fn error_envelope_without_data_decodes() {
        let json = r#"{"success":false,"message":"Token not found","error":"Not Found"}"#;
        let response: ApiResponse<Token> = serde_json::from_str(json).unwrap();
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("Not Found"));

        let stats: ApiResponse<TokenStats> = serde_json::from_str(r#"{"success":true}"#).unwrap();
        assert!(stats.data.is_none());
        assert_eq!(stats.message, "");
    }

    #[test]
    fn create_dto_omits_empty_optionals() {
        let dto = CreateTokenDto {
            name: "Bitcoin".into(),
            symbol: "BTC".into(),
            description: Some("Digital gold".into()),
            ..Default::default()
        };
        let value = serde_json::to_value(&dto).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"name": "Bitcoin", "symbol": "BTC", "description": "Digital gold"})
        );
    }

    #[test]
    fn presigned_upload_reads_pinned_content_type() {
        let json = r#"{"uploadUrl":"https://s/put","fileUrl":"https://cdn/x.png","key":"x.png",
            "expiresIn":300,"instructions":{"method":"PUT","headers":{"Content-Type":"image/png"}}}"#;
        let upload: PresignedUpload = serde_json::from_str(json).unwrap();
        assert_eq!(upload.content_type(), Some("image/png"));
        assert_eq!(upload.expires_in, 300);
    }
}
