//! Domain rules for the product aggregate.
//!
//! The use-case layer calls [`Product::validate`] before handing a product to
//! the store. The store does not call it again; the database constraints are
//! the last line of defense for anything that slips past.

use std::fmt;

use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{Product, SelectionType};

/// A single broken domain rule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("product name cannot be empty")]
    EmptyName,
    #[error("price must be greater than zero")]
    NonPositivePrice,
    #[error("stock cannot be negative")]
    NegativeStock,
    #[error("minimum stock cannot be negative")]
    NegativeMinStock,
    #[error("minimum stock ({min_stock}) cannot exceed stock ({stock})")]
    MinStockExceedsStock { stock: i32, min_stock: i32 },
    #[error("category is required")]
    MissingCategory,
    #[error("promotional price is required for promotional products")]
    MissingPromotionalPrice,
    #[error("promotional price must be greater than zero")]
    NonPositivePromotionalPrice,
    #[error("promotional price must be lower than the regular price")]
    PromotionalPriceNotLower,
    #[error("promotional price is only allowed on promotional products")]
    UnexpectedPromotionalPrice,
    #[error("image {index}: invalid url: {reason}")]
    InvalidImageUrl { index: usize, reason: String },
    #[error("variant {index}: name cannot be empty")]
    EmptyVariantName { index: usize },
    #[error("variant {index}: max selections cannot be negative")]
    NegativeMaxSelections { index: usize },
    #[error("variant {index}: single selection allows at most one option")]
    SingleSelectionLimit { index: usize },
    #[error("variant {index}: display order cannot be negative")]
    NegativeVariantOrder { index: usize },
    #[error("variant {variant} option {index}: name cannot be empty")]
    EmptyOptionName { variant: usize, index: usize },
    #[error("variant {variant} option {index}: price cannot be negative")]
    NegativeOptionPrice { variant: usize, index: usize },
    #[error("variant {variant} option {index}: display order cannot be negative")]
    NegativeOptionOrder { variant: usize, index: usize },
}

/// Every rule a product broke, in the order they were checked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// The individual errors.
    #[must_use]
    pub fn errors(&self) -> &[ValidationError] {
        &self.0
    }

    /// Whether a specific error was reported.
    #[must_use]
    pub fn contains(&self, error: &ValidationError) -> bool {
        self.0.contains(error)
    }

    fn push(&mut self, error: ValidationError) {
        self.0.push(error);
    }

    fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl Product {
    /// Check the product against the catalog's domain rules.
    ///
    /// # Errors
    ///
    /// Returns every broken rule at once so the caller can report them together.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        if self.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName);
        }
        if self.price <= Decimal::ZERO {
            errors.push(ValidationError::NonPositivePrice);
        }
        if self.stock < 0 {
            errors.push(ValidationError::NegativeStock);
        }
        if self.min_stock < 0 {
            errors.push(ValidationError::NegativeMinStock);
        }
        if self.stock > 0 && self.min_stock > self.stock {
            errors.push(ValidationError::MinStockExceedsStock {
                stock: self.stock,
                min_stock: self.min_stock,
            });
        }
        if self.category_id.is_unsaved() {
            errors.push(ValidationError::MissingCategory);
        }

        self.validate_promotion(&mut errors);
        self.validate_images(&mut errors);
        self.validate_variants(&mut errors);

        errors.into_result()
    }

    fn validate_promotion(&self, errors: &mut ValidationErrors) {
        match (self.is_promotional, self.promotional_price) {
            (true, None) => errors.push(ValidationError::MissingPromotionalPrice),
            (true, Some(promo)) if promo <= Decimal::ZERO => {
                errors.push(ValidationError::NonPositivePromotionalPrice);
            }
            (true, Some(promo)) if promo >= self.price => {
                errors.push(ValidationError::PromotionalPriceNotLower);
            }
            (false, Some(_)) => errors.push(ValidationError::UnexpectedPromotionalPrice),
            _ => {}
        }
    }

    fn validate_images(&self, errors: &mut ValidationErrors) {
        for (index, image) in self.images.iter().enumerate() {
            match url::Url::parse(&image.url) {
                Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
                Ok(parsed) => errors.push(ValidationError::InvalidImageUrl {
                    index,
                    reason: format!("unsupported scheme '{}'", parsed.scheme()),
                }),
                Err(e) => errors.push(ValidationError::InvalidImageUrl {
                    index,
                    reason: e.to_string(),
                }),
            }
        }
    }

    fn validate_variants(&self, errors: &mut ValidationErrors) {
        for (index, variant) in self.variants.iter().enumerate() {
            if variant.name.trim().is_empty() {
                errors.push(ValidationError::EmptyVariantName { index });
            }
            if variant.max_selections < 0 {
                errors.push(ValidationError::NegativeMaxSelections { index });
            }
            if variant.selection_type == SelectionType::Single && variant.max_selections > 1 {
                errors.push(ValidationError::SingleSelectionLimit { index });
            }
            if variant.order.is_some_and(|order| order < 0) {
                errors.push(ValidationError::NegativeVariantOrder { index });
            }

            for (option_index, option) in variant.options.iter().enumerate() {
                if option.name.trim().is_empty() {
                    errors.push(ValidationError::EmptyOptionName {
                        variant: index,
                        index: option_index,
                    });
                }
                if option.price < Decimal::ZERO {
                    errors.push(ValidationError::NegativeOptionPrice {
                        variant: index,
                        index: option_index,
                    });
                }
                if option.order.is_some_and(|order| order < 0) {
                    errors.push(ValidationError::NegativeOptionOrder {
                        variant: index,
                        index: option_index,
                    });
                }
            }
        }
    }
}
