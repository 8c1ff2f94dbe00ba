//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally mixing IDs from different entity types.
//!
//! All catalog identities are assigned by the database. The zero value means
//! "not yet persisted": a product built by a caller starts with
//! `ProductId::UNSAVED` and receives its real ID from the writer.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`, `Default`
/// - Conversion methods: `new()`, `as_i32()`, `is_unsaved()`
/// - `From<i32>` and `Into<i32>` implementations
/// - `sqlx` `Type`, `Encode`, and `Decode` implementations (with `postgres` feature)
///
/// # Example
///
/// ```rust
/// # use catalog_core::define_id;
/// define_id!(WarehouseId);
/// define_id!(BinId);
///
/// let warehouse = WarehouseId::new(1);
/// let bin = BinId::new(1);
/// assert!(BinId::default().is_unsaved());
///
/// // These are different types, so this won't compile:
/// // let _: WarehouseId = bin;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Default,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// The zero ID carried by entities that have not been persisted yet.
            pub const UNSAVED: Self = Self(0);

            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }

            /// Whether this ID is the "not yet persisted" zero value.
            #[must_use]
            pub const fn is_unsaved(&self) -> bool {
                self.0 == 0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Type<::sqlx::Postgres> for $name {
            fn type_info() -> ::sqlx::postgres::PgTypeInfo {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &::sqlx::postgres::PgTypeInfo) -> bool {
                <i32 as ::sqlx::Type<::sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "postgres")]
        impl<'r> ::sqlx::Decode<'r, ::sqlx::Postgres> for $name {
            fn decode(
                value: ::sqlx::postgres::PgValueRef<'r>,
            ) -> ::core::result::Result<Self, ::sqlx::error::BoxDynError> {
                let id = <i32 as ::sqlx::Decode<::sqlx::Postgres>>::decode(value)?;
                Ok(Self(id))
            }
        }

        #[cfg(feature = "postgres")]
        impl ::sqlx::Encode<'_, ::sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut ::sqlx::postgres::PgArgumentBuffer,
            ) -> ::std::result::Result<::sqlx::encode::IsNull, ::sqlx::error::BoxDynError> {
                <i32 as ::sqlx::Encode<::sqlx::Postgres>>::encode_by_ref(&self.0, buf)
            }
        }
    };
}

// Catalog entity IDs
define_id!(ShopId);
define_id!(CategoryId);
define_id!(ProductId);
define_id!(ImageId);
define_id!(VariantId);
define_id!(OptionId);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unsaved() {
        assert!(ProductId::default().is_unsaved());
        assert_eq!(ImageId::default(), ImageId::UNSAVED);
        assert!(!VariantId::new(7).is_unsaved());
    }

    #[test]
    fn test_serde_transparent() {
        let json = serde_json::to_string(&OptionId::new(42)).unwrap();
        assert_eq!(json, "42");

        let id: ShopId = serde_json::from_str("9").unwrap();
        assert_eq!(id.as_i32(), 9);
    }

    #[test]
    fn test_ordering_follows_inner_value() {
        assert!(ProductId::new(3) < ProductId::new(5));
        assert_eq!(ProductId::new(5).to_string(), "5");
    }

    #[cfg(feature = "postgres")]
    #[test]
    fn test_ids_map_to_int4() {
        use sqlx::{Postgres, Type};

        assert_eq!(
            <ProductId as Type<Postgres>>::type_info(),
            <i32 as Type<Postgres>>::type_info()
        );
        assert!(<ShopId as Type<Postgres>>::compatible(
            &<i32 as Type<Postgres>>::type_info()
        ));
    }
}
