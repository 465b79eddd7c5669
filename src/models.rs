use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::{Error, Result};

/// A live inventory record. Identity and timestamps are owned by the item
/// store; the product code is assigned once at creation and never changes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub type_id: i32,
    pub category_id: i32,
    pub product_code: String,
    pub price: Decimal,
    pub quantity: i32,
    pub discount: Decimal,
    pub discount_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Archival copy of an item written when it is deleted. Append-only; the
/// dashboard never reads these back.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedItem {
    #[serde(flatten)]
    pub item: Item,
    pub deleted_at: DateTime<Utc>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemType {
    pub id: i32,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: i32,
    pub name: String,
    pub prefix: String,
    pub type_id: i32,
}

/// An item enriched with resolved type/category display names. Built per
/// read; never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDetails {
    pub id: i32,
    pub name: String,
    pub description: String,
    pub type_id: i32,
    pub type_name: String,
    pub category_id: i32,
    pub category_name: String,
    pub product_code: String,
    pub price: Decimal,
    pub quantity: i32,
    pub discount: Decimal,
    pub discount_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl ItemDetails {
    pub fn new(item: Item, type_name: String, category_name: String) -> Self {
        Self {
            id: item.id,
            name: item.name,
            description: item.description,
            type_id: item.type_id,
            type_name,
            category_id: item.category_id,
            category_name,
            product_code: item.product_code,
            price: item.price,
            quantity: item.quantity,
            discount: item.discount,
            discount_date: item.discount_date,
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

/// Incoming payload for creating or updating an item. Identity, product code
/// and timestamps are never taken from the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDraft {
    pub name: String,
    pub description: String,
    pub type_id: i32,
    pub category_id: i32,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub discount: Decimal,
}

impl ItemDraft {
    /// Field-level checks applied at the API boundary, before any business
    /// rule runs.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.name.chars().count() > 200 {
            return Err(Error::Validation(
                "Name must be between 1 and 200 characters.".to_string(),
            ));
        }
        if self.description.trim().is_empty() || self.description.chars().count() > 1000 {
            return Err(Error::Validation(
                "Description must be between 1 and 1000 characters.".to_string(),
            ));
        }
        if self.type_id < 1 {
            return Err(Error::Validation("TypeId must be a valid type.".to_string()));
        }
        if self.category_id < 1 {
            return Err(Error::Validation(
                "CategoryId must be a valid category.".to_string(),
            ));
        }
        if self.price <= Decimal::ZERO {
            return Err(Error::Validation(
                "Price must be greater than zero.".to_string(),
            ));
        }
        if self.quantity < 0 {
            return Err(Error::Validation("Quantity cannot be negative.".to_string()));
        }
        if self.discount < Decimal::ZERO || self.discount > Decimal::ONE_HUNDRED {
            return Err(Error::Validation(
                "Discount must be between 0 and 100.".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> ItemDraft {
        ItemDraft {
            name: "Phone A".to_string(),
            description: "A phone".to_string(),
            type_id: 1,
            category_id: 1,
            price: Decimal::new(10, 0),
            quantity: 1,
            discount: Decimal::ZERO,
        }
    }

    #[test]
    fn valid_draft_passes() {
        assert!(draft().validate().is_ok());
    }

    #[test]
    fn empty_name_is_rejected() {
        let mut d = draft();
        d.name = "   ".to_string();
        assert!(matches!(d.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn zero_price_is_rejected() {
        let mut d = draft();
        d.price = Decimal::ZERO;
        assert!(matches!(d.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn negative_quantity_is_rejected() {
        let mut d = draft();
        d.quantity = -1;
        assert!(matches!(d.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn discount_above_hundred_is_rejected() {
        let mut d = draft();
        d.discount = Decimal::new(101, 0);
        assert!(matches!(d.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn missing_discount_defaults_to_zero() {
        let json = r#"{
            "name": "Phone A",
            "description": "A phone",
            "typeId": 1,
            "categoryId": 1,
            "price": "10",
            "quantity": 1
        }"#;
        let d: ItemDraft = serde_json::from_str(json).unwrap();
        assert_eq!(d.discount, Decimal::ZERO);
        assert!(d.validate().is_ok());
    }

    #[test]
    fn deleted_item_serializes_flat() {
        let item = Item {
            id: 1,
            name: "Phone A".to_string(),
            description: "A phone".to_string(),
            type_id: 1,
            category_id: 1,
            product_code: "PHN-001".to_string(),
            price: Decimal::new(10, 0),
            quantity: 1,
            discount: Decimal::ZERO,
            discount_date: None,
            created_at: Utc::now(),
            updated_at: None,
        };
        let deleted = DeletedItem {
            item,
            deleted_at: Utc::now(),
        };
        let value = serde_json::to_value(&deleted).unwrap();
        assert_eq!(value["productCode"], "PHN-001");
        assert!(value["deletedAt"].is_string());
    }
}
