//! JSON document format for the product's sub-entities.
//!
//! Images, variants and options travel as JSON arrays whenever they are
//! aggregated per product (the store's read queries build them with
//! `jsonb_agg`) or handed to another system. Keys are stable:
//!
//! | entity  | keys                                                          |
//! |---------|---------------------------------------------------------------|
//! | image   | `id`, `url`                                                   |
//! | variant | `id`, `name`, `order`, `selection_type`, `max_selections`, `options` |
//! | option  | `id`, `name`, `price`, `order`                                |
//!
//! Prices are encoded as decimal strings so no precision is lost.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{ProductImage, SelectionType, Variant, VariantOption};
use crate::types::{ImageId, OptionId, VariantId};

/// Errors raised while encoding or decoding sub-entity documents.
#[derive(Debug, Error)]
pub enum CodecError {
    /// A document did not match the expected shape.
    #[error("malformed {what} document: {source}")]
    Malformed {
        /// Which document was being processed.
        what: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}

/// Wire form of a [`ProductImage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageDocument {
    #[serde(default)]
    pub id: i32,
    pub url: String,
}

/// Wire form of a [`VariantOption`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionDocument {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub order: Option<i32>,
}

/// Wire form of a [`Variant`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantDocument {
    #[serde(default)]
    pub id: i32,
    pub name: String,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub selection_type: SelectionType,
    #[serde(default)]
    pub max_selections: i32,
    #[serde(default)]
    pub options: Vec<OptionDocument>,
}

impl From<&ProductImage> for ImageDocument {
    fn from(image: &ProductImage) -> Self {
        Self {
            id: image.id.as_i32(),
            url: image.url.clone(),
        }
    }
}

impl From<ImageDocument> for ProductImage {
    fn from(doc: ImageDocument) -> Self {
        Self {
            id: ImageId::new(doc.id),
            url: doc.url,
        }
    }
}

impl From<&VariantOption> for OptionDocument {
    fn from(option: &VariantOption) -> Self {
        Self {
            id: option.id.as_i32(),
            name: option.name.clone(),
            price: option.price,
            order: option.order,
        }
    }
}

impl From<OptionDocument> for VariantOption {
    fn from(doc: OptionDocument) -> Self {
        Self {
            id: OptionId::new(doc.id),
            name: doc.name,
            price: doc.price,
            order: doc.order,
        }
    }
}

impl From<&Variant> for VariantDocument {
    fn from(variant: &Variant) -> Self {
        Self {
            id: variant.id.as_i32(),
            name: variant.name.clone(),
            order: variant.order,
            selection_type: variant.selection_type,
            max_selections: variant.max_selections,
            options: variant.options.iter().map(OptionDocument::from).collect(),
        }
    }
}

impl From<VariantDocument> for Variant {
    fn from(doc: VariantDocument) -> Self {
        Self {
            id: VariantId::new(doc.id),
            name: doc.name,
            order: doc.order,
            selection_type: doc.selection_type,
            max_selections: doc.max_selections,
            options: doc.options.into_iter().map(VariantOption::from).collect(),
        }
    }
}

/// Encode images as a JSON array.
///
/// # Errors
///
/// Returns `CodecError::Malformed` if serialization fails.
pub fn encode_images(images: &[ProductImage]) -> Result<Value, CodecError> {
    let docs: Vec<ImageDocument> = images.iter().map(ImageDocument::from).collect();
    serde_json::to_value(docs).map_err(|source| CodecError::Malformed {
        what: "image",
        source,
    })
}

/// Encode variants (with their nested options) as a JSON array.
///
/// # Errors
///
/// Returns `CodecError::Malformed` if serialization fails.
pub fn encode_variants(variants: &[Variant]) -> Result<Value, CodecError> {
    let docs: Vec<VariantDocument> = variants.iter().map(VariantDocument::from).collect();
    serde_json::to_value(docs).map_err(|source| CodecError::Malformed {
        what: "variant",
        source,
    })
}

/// Decode a JSON array of images. `null` decodes to an empty list.
///
/// # Errors
///
/// Returns `CodecError::Malformed` if the value is not an array of image documents.
pub fn decode_images(value: Value) -> Result<Vec<ProductImage>, CodecError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let docs: Vec<ImageDocument> =
        serde_json::from_value(value).map_err(|source| CodecError::Malformed {
            what: "image",
            source,
        })?;
    Ok(docs.into_iter().map(ProductImage::from).collect())
}

/// Decode a JSON array of variants. `null` decodes to an empty list.
///
/// # Errors
///
/// Returns `CodecError::Malformed` if the value is not an array of variant documents.
pub fn decode_variants(value: Value) -> Result<Vec<Variant>, CodecError> {
    if value.is_null() {
        return Ok(Vec::new());
    }
    let docs: Vec<VariantDocument> =
        serde_json::from_value(value).map_err(|source| CodecError::Malformed {
            what: "variant",
            source,
        })?;
    Ok(docs.into_iter().map(Variant::from).collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_encode_variants_uses_stable_keys() {
        let variant = Variant::new("Size", SelectionType::Single)
            .with_order(2)
            .with_option(VariantOption::new("Small", Decimal::new(150, 2)));

        let encoded = encode_variants(&[variant]).unwrap();

        assert_eq!(
            encoded,
            json!([{
                "id": 0,
                "name": "Size",
                "order": 2,
                "selection_type": "single",
                "max_selections": 1,
                "options": [{"id": 0, "name": "Small", "price": "1.50", "order": null}]
            }])
        );
    }

    #[test]
    fn test_decode_variants_from_aggregated_row() {
        // Shape produced by the store's jsonb_agg sub-queries.
        let value = json!([{
            "id": 11,
            "name": "Extras",
            "order": 0,
            "selection_type": "unlimited",
            "max_selections": 3,
            "options": [
                {"id": 21, "name": "Cheese", "price": "0.75", "order": 0},
                {"id": 22, "name": "Bacon", "price": "1.25", "order": 1}
            ]
        }]);

        let variants = decode_variants(value).unwrap();

        assert_eq!(variants.len(), 1);
        let extras = &variants[0];
        assert_eq!(extras.id, VariantId::new(11));
        assert_eq!(extras.selection_type, SelectionType::Multiple);
        assert_eq!(extras.options[1].price, Decimal::new(125, 2));
        assert_eq!(extras.options[1].order, Some(1));
    }

    #[test]
    fn test_decode_accepts_numeric_prices() {
        let value = json!([{"id": 1, "name": "Small", "price": 2, "order": 0}]);
        let docs: Vec<OptionDocument> = serde_json::from_value(value).unwrap();
        assert_eq!(docs[0].price, Decimal::new(2, 0));
    }

    #[test]
    fn test_decode_null_is_empty() {
        assert!(decode_images(Value::Null).unwrap().is_empty());
        assert!(decode_variants(Value::Null).unwrap().is_empty());
    }

    #[test]
    fn test_decode_rejects_wrong_shape() {
        let err = decode_images(json!({"url": "https://cdn.example/a.png"})).unwrap_err();
        assert!(err.to_string().starts_with("malformed image document"));
    }

    #[test]
    fn test_images_keep_order_and_ids() {
        let images = vec![
            ProductImage {
                id: ImageId::new(4),
                url: "https://cdn.example/front.png".to_owned(),
            },
            ProductImage::new("https://cdn.example/back.png"),
        ];

        let decoded = decode_images(encode_images(&images).unwrap()).unwrap();
        assert_eq!(decoded, images);
    }
}
