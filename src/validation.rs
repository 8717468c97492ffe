//! Form input for creating and editing tokens

use crate::types::{CreateTokenDto, Token, UpdateTokenDto};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Field {
    Name,
    Symbol,
    Description,
    TotalSupply,
    PriceUsd,
    Website,
}

impl Field {
    fn from_name(name: &str) -> Option<Self> {
        match name {
            "name" => Some(Field::Name),
            "symbol" => Some(Field::Symbol),
            "description" => Some(Field::Description),
            "total_supply" => Some(Field::TotalSupply),
            "price_usd" => Some(Field::PriceUsd),
            "website" => Some(Field::Website),
            _ => None,
        }
    }
}

/// Per-field messages from a failed validation, first failure per field
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<Field, Cow<'static, str>>);

impl FieldErrors {
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(|message| message.as_ref())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = BTreeMap::new();
        for (name, failures) in errors.field_errors() {
            let (Some(field), Some(first)) = (Field::from_name(name), failures.first()) else {
                continue;
            };
            let message = first.message.clone().unwrap_or_else(|| first.code.clone());
            fields.insert(field, message);
        }
        Self(fields)
    }
}

/// Raw text of the token form, exactly as typed. Rules apply to the
/// trimmed text, see [`TokenForm::validate_create`].
#[derive(Debug, Clone, Default, PartialEq, Validate)]
pub struct TokenForm {
    #[validate(length(min = 2, max = 100, message = "Name must be between 2-100 characters"))]
    pub name: String,
    #[validate(
        length(min = 1, max = 20, message = "Symbol must be between 1-20 characters"),
        custom = "validate_symbol_charset"
    )]
    pub symbol: String,
    #[validate(custom = "validate_description")]
    pub description: String,
    #[validate(custom = "validate_total_supply")]
    pub total_supply: String,
    #[validate(custom = "validate_price")]
    pub price_usd: String,
    pub website: String,
    pub logo: String,
}

impl TokenForm {
    pub fn from_token(token: &Token) -> Self {
        Self {
            name: token.name.clone(),
            symbol: token.symbol.clone(),
            description: token.description.clone().unwrap_or_default(),
            total_supply: token.total_supply.map(|v| v.to_string()).unwrap_or_default(),
            price_usd: token.price_usd.map(|v| v.to_string()).unwrap_or_default(),
            website: token.website.clone().unwrap_or_default(),
            logo: token.logo.clone().unwrap_or_default(),
        }
    }

    fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            symbol: self.symbol.trim().to_string(),
            description: self.description.trim().to_string(),
            total_supply: self.total_supply.trim().to_string(),
            price_usd: self.price_usd.trim().to_string(),
            website: self.website.trim().to_string(),
            logo: self.logo.trim().to_string(),
        }
    }

    pub fn validate_create(&self) -> Result<CreateTokenDto, FieldErrors> {
        let form = self.trimmed();
        form.validate()?;

        Ok(CreateTokenDto {
            symbol: form.symbol.to_ascii_uppercase(),
            logo: non_empty(&form.logo),
            total_supply: parse_number(&form.total_supply),
            price_usd: parse_number(&form.price_usd),
            description: Some(form.description),
            website: non_empty(&form.website),
            name: form.name,
        })
    }

    /// Same rules as create. Logo and website are always sent so that
    /// clearing them in the form clears them on the server.
    pub fn validate_update(&self) -> Result<UpdateTokenDto, FieldErrors> {
        let dto = self.validate_create()?;
        Ok(UpdateTokenDto {
            logo: Some(self.logo.trim().to_string()),
            website: Some(self.website.trim().to_string()),
            ..UpdateTokenDto::from(dto)
        })
    }
}

fn failure(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

fn validate_symbol_charset(symbol: &str) -> Result<(), ValidationError> {
    if symbol.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(failure("alphanumeric", "Symbol must contain only letters and numbers"))
    }
}

fn validate_description(description: &str) -> Result<(), ValidationError> {
    match description.chars().count() {
        0 => Err(failure("required", "Description is required")),
        n if n > 1000 => Err(failure("length", "Description must not exceed 1000 characters")),
        _ => Ok(()),
    }
}

fn validate_total_supply(raw: &str) -> Result<(), ValidationError> {
    check_number(raw, "Total supply must be a valid number")
}

fn validate_price(raw: &str) -> Result<(), ValidationError> {
    check_number(raw, "Price must be a valid number")
}

/// Empty input is fine; anything else must parse to a finite number.
fn check_number(raw: &str, message: &'static str) -> Result<(), ValidationError> {
    if raw.is_empty() || parse_number(raw).is_some() {
        Ok(())
    } else {
        Err(failure("number", message))
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.parse::<f64>().ok().filter(|value| value.is_finite())
}

fn non_empty(raw: &str) -> Option<String> {
    let raw = raw.trim();
    (!raw.is_empty()).then(|| raw.to_string())
}
