//! Firestore REST document decoding.
//!
//! Firestore's REST API wraps every field in a single-key object naming its
//! type, e.g. `{"stringValue": "Vase"}` or `{"integerValue": "25"}` (64-bit
//! integers arrive as strings). [`Value`] mirrors that encoding directly as an
//! externally tagged enum, and [`Document`] exposes typed accessors used by the
//! product/category conversions below. Admin writes go the other way through
//! [`product_fields`], [`category_fields`] and [`hero_fields`].

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use shesha_core::{Category, CategoryId, Price, Product, ProductId, slugify};

use crate::services::{CatalogError, CategoryDraft, ProductDraft};

/// A typed Firestore value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue,
    BooleanValue(bool),
    IntegerValue(String),
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    BytesValue(String),
    ReferenceValue(String),
    GeoPointValue(serde_json::Value),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

/// `arrayValue` payload. Empty arrays omit `values`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    #[serde(default)]
    pub values: Vec<Value>,
}

/// `mapValue` payload. Empty maps omit `fields`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    #[serde(default)]
    pub fields: HashMap<String, Value>,
}

impl Value {
    fn as_str(&self) -> Option<&str> {
        match self {
            Self::StringValue(s) => Some(s),
            _ => None,
        }
    }

    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            Self::IntegerValue(s) => Decimal::from_str(s).ok(),
            Self::DoubleValue(d) => Decimal::try_from(*d).ok().map(|d| d.normalize()),
            // Numeric text.
            Self::StringValue(s) => Decimal::from_str(s.trim()).ok(),
            _ => None,
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Self::BooleanValue(b) => Some(*b),
            _ => None,
        }
    }

    fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::TimestampValue(s) | Self::StringValue(s) => parse_timestamp(s),
            _ => None,
        }
    }
}

/// A Firestore document as returned by `GET` or `runQuery`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name: `projects/{p}/databases/(default)/documents/{collection}/{id}`.
    pub name: String,
    #[serde(default)]
    pub fields: HashMap<String, Value>,
    pub create_time: Option<String>,
    pub update_time: Option<String>,
}

/// One element of a `runQuery` response stream.
///
/// Queries with no results still return a single element carrying only
/// `readTime`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryResponse {
    pub document: Option<Document>,
    pub read_time: Option<String>,
}

impl Document {
    /// Document id: the last segment of the resource name.
    #[must_use]
    pub fn id(&self) -> &str {
        self.name.rsplit('/').next().unwrap_or(&self.name)
    }

    /// A string field.
    #[must_use]
    pub fn string(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(Value::as_str)
    }

    /// A boolean field.
    #[must_use]
    pub fn boolean(&self, field: &str) -> Option<bool> {
        self.fields.get(field).and_then(Value::as_bool)
    }

    /// A numeric field as a decimal (integer, double or numeric text).
    #[must_use]
    pub fn decimal(&self, field: &str) -> Option<Decimal> {
        self.fields.get(field).and_then(Value::as_decimal)
    }

    /// An array of strings; non-string elements are skipped.
    #[must_use]
    pub fn strings(&self, field: &str) -> Vec<String> {
        match self.fields.get(field) {
            Some(Value::ArrayValue(array)) => array
                .values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    /// A timestamp field.
    #[must_use]
    pub fn timestamp(&self, field: &str) -> Option<DateTime<Utc>> {
        self.fields.get(field).and_then(Value::as_timestamp)
    }

    fn decode_error(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::Decode {
            document: self.name.clone(),
            reason: reason.into(),
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|s| !s.is_empty()).map(str::to_string)
}

/// Convert a `products` document.
///
/// # Errors
///
/// Returns `CatalogError::Decode` if `name` or `price` is missing or invalid.
pub fn product_from_document(doc: &Document) -> Result<Product, CatalogError> {
    let name = doc
        .string("name")
        .ok_or_else(|| doc.decode_error("missing name"))?
        .to_string();
    let amount = doc
        .decimal("price")
        .ok_or_else(|| doc.decode_error("missing or non-numeric price"))?;
    let price = Price::new(amount).map_err(|e| doc.decode_error(e.to_string()))?;

    let stock = doc
        .decimal("stock")
        .and_then(|d| d.trunc().to_u32())
        .unwrap_or(0);

    Ok(Product {
        id: ProductId::new(doc.id()),
        name,
        description: doc.string("description").unwrap_or_default().to_string(),
        price,
        stock,
        category: doc.string("category").unwrap_or_default().to_string(),
        cover_image: non_empty(doc.string("coverImage")),
        images: doc.strings("images"),
        featured: doc.boolean("featured").unwrap_or(false),
        created_at: doc
            .timestamp("createdAt")
            .or_else(|| doc.create_time.as_deref().and_then(parse_timestamp)),
        updated_at: doc
            .timestamp("updatedAt")
            .or_else(|| doc.update_time.as_deref().and_then(parse_timestamp)),
    })
}

/// Convert a `categories` document.
///
/// Older documents store the picture under `image`, newer ones under
/// `imageUrl`. A missing slug is derived from the name.
///
/// # Errors
///
/// Returns `CatalogError::Decode` if `name` is missing.
pub fn category_from_document(doc: &Document) -> Result<Category, CatalogError> {
    let name = doc
        .string("name")
        .ok_or_else(|| doc.decode_error("missing name"))?
        .to_string();
    let slug = non_empty(doc.string("slug")).unwrap_or_else(|| slugify(&name));

    Ok(Category {
        id: CategoryId::new(doc.id()),
        name,
        slug,
        image_url: non_empty(doc.string("imageUrl")).or_else(|| non_empty(doc.string("image"))),
    })
}

/// Document fields, as sent in a write body.
pub type Fields = HashMap<String, Value>;

/// Product fields written on create and update, in write-mask form.
pub const PRODUCT_FIELD_PATHS: [&str; 9] = [
    "name",
    "description",
    "price",
    "stock",
    "category",
    "coverImage",
    "images",
    "featured",
    "updatedAt",
];

/// Category fields written on create and update.
pub const CATEGORY_FIELD_PATHS: [&str; 3] = ["name", "slug", "imageUrl"];

fn string_value(value: &str) -> Value {
    Value::StringValue(value.to_string())
}

fn timestamp_value(at: DateTime<Utc>) -> Value {
    Value::TimestampValue(at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Encode a product draft. `updatedAt` is set to `now`; `createdAt` is left
/// to the caller so updates keep the original.
///
/// Prices are stored as doubles, which is what the decoder above accepts
/// alongside integers.
///
/// # Errors
///
/// Returns `CatalogError::Encode` if the price has no double representation.
pub fn product_fields(draft: &ProductDraft, now: DateTime<Utc>) -> Result<Fields, CatalogError> {
    let price = draft
        .price
        .amount()
        .to_f64()
        .filter(|p| p.is_finite())
        .ok_or_else(|| CatalogError::Encode {
            field: "price".to_string(),
            reason: draft.price.amount().to_string(),
        })?;

    Ok(HashMap::from([
        ("name".to_string(), string_value(&draft.name)),
        ("description".to_string(), string_value(&draft.description)),
        ("price".to_string(), Value::DoubleValue(price)),
        ("stock".to_string(), Value::IntegerValue(draft.stock.to_string())),
        ("category".to_string(), string_value(&draft.category)),
        ("coverImage".to_string(), string_value(&draft.cover_image)),
        (
            "images".to_string(),
            Value::ArrayValue(ArrayValue {
                values: draft.images.iter().map(|url| string_value(url)).collect(),
            }),
        ),
        ("featured".to_string(), Value::BooleanValue(draft.featured)),
        ("updatedAt".to_string(), timestamp_value(now)),
    ]))
}

/// Encode a category draft.
#[must_use]
pub fn category_fields(draft: &CategoryDraft) -> Fields {
    HashMap::from([
        ("name".to_string(), string_value(&draft.name)),
        ("slug".to_string(), string_value(&draft.slug)),
        ("imageUrl".to_string(), string_value(&draft.image_url)),
    ])
}

/// Encode the `settings/hero` document.
#[must_use]
pub fn hero_fields(image_url: &str, now: DateTime<Utc>) -> Fields {
    HashMap::from([
        ("imageUrl".to_string(), string_value(image_url)),
        ("updatedAt".to_string(), timestamp_value(now)),
    ])
}

/// Add `createdAt` to freshly created documents.
pub fn with_created_at(mut fields: Fields, now: DateTime<Utc>) -> Fields {
    fields.insert("createdAt".to_string(), timestamp_value(now));
    fields
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn document(json: &str) -> Document {
        serde_json::from_str(json).unwrap()
    }

    const VASE: &str = r#"{
        "name": "projects/shop-shesha/databases/(default)/documents/products/vase-01",
        "fields": {
            "name": {"stringValue": "Blue Vase"},
            "description": {"stringValue": "Hand thrown"},
            "price": {"integerValue": "25"},
            "stock": {"integerValue": "4"},
            "category": {"stringValue": "decor"},
            "coverImage": {"stringValue": ""},
            "images": {"arrayValue": {"values": [
                {"stringValue": "https://res.cloudinary.com/optimage/image/upload/v1/vase.jpg"},
                {"nullValue": null}
            ]}},
            "featured": {"booleanValue": true},
            "createdAt": {"timestampValue": "2024-03-01T10:00:00.123456Z"},
            "dimensions": {"mapValue": {"fields": {"h": {"doubleValue": 30.5}}}}
        },
        "createTime": "2024-03-01T10:00:00Z",
        "updateTime": "2024-03-02T10:00:00Z"
    }"#;

    #[test]
    fn test_product_from_document() {
        let product = product_from_document(&document(VASE)).unwrap();

        assert_eq!(product.id, ProductId::new("vase-01"));
        assert_eq!(product.name, "Blue Vase");
        assert_eq!(product.price, Price::from_units(25));
        assert_eq!(product.stock, 4);
        assert_eq!(product.category, "decor");
        assert_eq!(product.cover_image, None);
        assert_eq!(product.images.len(), 1);
        assert!(product.featured);
        assert!(product.created_at.is_some());
        // Falls back to the document's update time.
        assert_eq!(
            product.updated_at,
            parse_timestamp("2024-03-02T10:00:00Z")
        );
    }

    #[test]
    fn test_double_price() {
        let doc = document(
            r#"{"name": "p/products/lamp", "fields": {
                "name": {"stringValue": "Lamp"},
                "price": {"doubleValue": 19.99}
            }}"#,
        );
        let product = product_from_document(&doc).unwrap();
        assert_eq!(product.price, Price::from_cents(1999));
        assert_eq!(product.stock, 0);
        assert!(product.images.is_empty());
        assert!(!product.featured);
    }

    #[test]
    fn test_missing_price_is_decode_error() {
        let doc = document(
            r#"{"name": "p/products/lamp", "fields": {"name": {"stringValue": "Lamp"}}}"#,
        );
        assert!(matches!(
            product_from_document(&doc),
            Err(CatalogError::Decode { .. })
        ));
    }

    #[test]
    fn test_negative_price_is_decode_error() {
        let doc = document(
            r#"{"name": "p/products/lamp", "fields": {
                "name": {"stringValue": "Lamp"},
                "price": {"integerValue": "-5"}
            }}"#,
        );
        assert!(product_from_document(&doc).is_err());
    }

    #[test]
    fn test_category_from_document() {
        let doc = document(
            r#"{"name": "p/categories/c1", "fields": {
                "name": {"stringValue": "Home Decor"},
                "image": {"stringValue": "https://img/decor.jpg"}
            }}"#,
        );
        let category = category_from_document(&doc).unwrap();
        assert_eq!(category.id, CategoryId::new("c1"));
        assert_eq!(category.slug, "home-decor");
        assert_eq!(category.image_url.as_deref(), Some("https://img/decor.jpg"));
    }

    #[test]
    fn test_empty_run_query_element() {
        let responses: Vec<RunQueryResponse> =
            serde_json::from_str(r#"[{"readTime": "2024-03-01T10:00:00Z"}]"#).unwrap();
        assert!(responses.iter().all(|r| r.document.is_none()));
    }

    #[test]
    fn test_product_fields_encoding() {
        let draft = ProductDraft {
            name: "Blue Vase".to_string(),
            description: String::new(),
            price: Price::from_cents(2550),
            stock: 3,
            category: "decor".to_string(),
            cover_image: "https://img/cover.jpg".to_string(),
            images: vec!["https://img/side.jpg".to_string()],
            featured: true,
        };
        let now = parse_timestamp("2024-05-01T08:30:00Z").unwrap();
        let fields = product_fields(&draft, now).unwrap();

        let json = serde_json::to_value(&fields).unwrap();
        assert_eq!(json["price"], serde_json::json!({"doubleValue": 25.5}));
        assert_eq!(json["stock"], serde_json::json!({"integerValue": "3"}));
        assert_eq!(
            json["images"],
            serde_json::json!({"arrayValue": {"values": [{"stringValue": "https://img/side.jpg"}]}})
        );
        assert_eq!(
            json["updatedAt"],
            serde_json::json!({"timestampValue": "2024-05-01T08:30:00.000Z"})
        );
        assert!(PRODUCT_FIELD_PATHS.iter().all(|path| fields.contains_key(*path)));
        assert!(!fields.contains_key("createdAt"));

        // What the storefront reads back from the written document.
        let doc = Document {
            name: "p/products/blue-vase-1".to_string(),
            fields: with_created_at(fields, now),
            create_time: None,
            update_time: None,
        };
        let product = product_from_document(&doc).unwrap();
        assert_eq!(product.price, draft.price);
        assert_eq!(product.cover_image.as_deref(), Some("https://img/cover.jpg"));
        assert_eq!(product.created_at, Some(now));
    }

    #[test]
    fn test_category_and_hero_fields() {
        let fields = category_fields(&CategoryDraft {
            name: "Lighting".to_string(),
            slug: "lighting".to_string(),
            image_url: "https://img/lamp.jpg".to_string(),
        });
        assert_eq!(fields.len(), CATEGORY_FIELD_PATHS.len());
        assert_eq!(fields.get("imageUrl"), Some(&string_value("https://img/lamp.jpg")));

        let hero = hero_fields("https://img/hero.jpg", Utc::now());
        assert_eq!(hero.get("imageUrl"), Some(&string_value("https://img/hero.jpg")));
        assert!(hero.contains_key("updatedAt"));
    }
}
