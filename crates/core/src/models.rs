//! The product aggregate.
//!
//! A [`Product`] exclusively owns its [`ProductImage`]s and [`Variant`]s, and
//! each variant exclusively owns its [`VariantOption`]s. The aggregate is
//! written and read as one unit by the store; children never outlive or move
//! between parents.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{CategoryId, ImageId, OptionId, ProductId, ShopId, VariantId};

/// A catalog product together with its images and variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Database ID (`ProductId::UNSAVED` until the writer persists it).
    pub id: ProductId,
    /// Shop (tenant) owning the product.
    pub shop_id: ShopId,
    /// Category the product is listed under.
    pub category_id: CategoryId,
    /// Category name, hydrated on read.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_name: Option<String>,
    /// Display name, unique within a shop.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// Unit price.
    pub price: Decimal,
    /// Units in stock.
    pub stock: i32,
    /// Threshold under which stock is considered low.
    pub min_stock: i32,
    /// Whether the product is purchasable.
    pub is_active: bool,
    /// Whether the product is featured in listings.
    pub is_highlighted: bool,
    /// Whether the promotional price applies.
    pub is_promotional: bool,
    /// Promotional price, required when `is_promotional` is set.
    pub promotional_price: Option<Decimal>,
    /// Images in display order.
    pub images: Vec<ProductImage>,
    /// Configurable variants in list order.
    pub variants: Vec<Variant>,
    /// When the product was created (set by the database).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// When the product was last updated (set by the database).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Product {
    /// Create an unsaved product with no images, variants or promotion.
    ///
    /// The shop is supplied to the writer at creation time, so it starts
    /// unset here.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal, category_id: CategoryId) -> Self {
        Self {
            id: ProductId::UNSAVED,
            shop_id: ShopId::UNSAVED,
            category_id,
            category_name: None,
            name: name.into(),
            description: String::new(),
            price,
            stock: 0,
            min_stock: 0,
            is_active: true,
            is_highlighted: false,
            is_promotional: false,
            promotional_price: None,
            images: Vec::new(),
            variants: Vec::new(),
            created_at: None,
            updated_at: None,
        }
    }

    /// Add an image to the end of the image list.
    #[must_use]
    pub fn with_image(mut self, image: ProductImage) -> Self {
        self.images.push(image);
        self
    }

    /// Add a variant to the end of the variant list.
    #[must_use]
    pub fn with_variant(mut self, variant: Variant) -> Self {
        self.variants.push(variant);
        self
    }

    /// Whether the product has been persisted.
    #[must_use]
    pub const fn is_persisted(&self) -> bool {
        !self.id.is_unsaved()
    }

    /// Fill in every unset display order from its zero-based list position.
    ///
    /// Explicit orders (including an explicit `Some(0)`) are kept.
    pub fn resolve_display_orders(&mut self) {
        for (index, variant) in self.variants.iter_mut().enumerate() {
            variant.order = Some(resolve_order(variant.order, index));
            for (option_index, option) in variant.options.iter_mut().enumerate() {
                option.order = Some(resolve_order(option.order, option_index));
            }
        }
    }
}

/// Resolve an optional display order against a list position.
#[must_use]
pub fn resolve_order(order: Option<i32>, position: usize) -> i32 {
    order.unwrap_or_else(|| i32::try_from(position).unwrap_or(i32::MAX))
}

/// An image owned by a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductImage {
    /// Database ID (`ImageId::UNSAVED` for images not yet written).
    pub id: ImageId,
    /// Public image URL.
    pub url: String,
}

impl ProductImage {
    /// Create an unsaved image.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            id: ImageId::UNSAVED,
            url: url.into(),
        }
    }
}

/// How many options of a variant a customer may pick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    /// Exactly one option.
    #[default]
    Single,
    /// Any number of options, bounded by `max_selections` when non-zero.
    #[serde(alias = "unlimited")]
    Multiple,
    /// Free-form customization.
    Custom,
}

impl SelectionType {
    /// Wire and column representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Single => "single",
            Self::Multiple => "multiple",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for SelectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown selection type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown selection type: {0}")]
pub struct ParseSelectionTypeError(pub String);

impl FromStr for SelectionType {
    type Err = ParseSelectionTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "single" => Ok(Self::Single),
            "multiple" | "unlimited" => Ok(Self::Multiple),
            "custom" => Ok(Self::Custom),
            other => Err(ParseSelectionTypeError(other.to_owned())),
        }
    }
}

/// A configurable variant of a product (e.g. "Size").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variant {
    /// Database ID (`VariantId::UNSAVED` for variants not yet written).
    pub id: VariantId,
    /// Display name.
    pub name: String,
    /// Display order; `None` falls back to the list position on write.
    pub order: Option<i32>,
    /// Selection rule for the options.
    pub selection_type: SelectionType,
    /// Maximum number of options a customer may select (0 = no limit).
    pub max_selections: i32,
    /// Options in list order.
    pub options: Vec<VariantOption>,
}

impl Variant {
    /// Create an unsaved variant without options.
    #[must_use]
    pub fn new(name: impl Into<String>, selection_type: SelectionType) -> Self {
        let max_selections = match selection_type {
            SelectionType::Single => 1,
            SelectionType::Multiple | SelectionType::Custom => 0,
        };
        Self {
            id: VariantId::UNSAVED,
            name: name.into(),
            order: None,
            selection_type,
            max_selections,
            options: Vec::new(),
        }
    }

    /// Set an explicit display order.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    /// Add an option to the end of the option list.
    #[must_use]
    pub fn with_option(mut self, option: VariantOption) -> Self {
        self.options.push(option);
        self
    }
}

/// A selectable option of a variant (e.g. "Small", +$0).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantOption {
    /// Database ID (`OptionId::UNSAVED` for options not yet written).
    pub id: OptionId,
    /// Display name.
    pub name: String,
    /// Price delta added to the product price.
    pub price: Decimal,
    /// Display order; `None` falls back to the list position on write.
    pub order: Option<i32>,
}

impl VariantOption {
    /// Create an unsaved option.
    #[must_use]
    pub fn new(name: impl Into<String>, price: Decimal) -> Self {
        Self {
            id: OptionId::UNSAVED,
            name: name.into(),
            price,
            order: None,
        }
    }

    /// Set an explicit display order.
    #[must_use]
    pub const fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }
}
