pub mod client;
mod errors;
pub mod http;
mod models;
pub mod store;

pub use errors::{Error, Result};
pub use models::{Category, DeletedItem, Item, ItemDetails, ItemDraft, ItemType};

use std::collections::HashMap;

use chrono::Utc;
use rust_decimal::Decimal;

use store::{ItemStore, LookupStore};

/// Display name substituted when a type or category id does not resolve.
const UNKNOWN_NAME: &str = "Unknown";

/// Business-rule engine for the item lifecycle: uniqueness validation,
/// product-code assignment and discount-date transitions.
///
/// The engine is stateless; every mutating operation re-reads the current
/// collection from the store. Uniqueness validation and code generation run
/// against that snapshot and the subsequent write is a separate store call,
/// so concurrent creates/updates must be serialized by the caller if strict
/// consistency is required.
pub struct ItemEngine<S: ItemStore, L: LookupStore> {
    items: S,
    lookups: L,
}

impl<S: ItemStore, L: LookupStore> ItemEngine<S, L> {
    pub fn new(items: S, lookups: L) -> Self {
        Self { items, lookups }
    }

    pub fn lookups(&self) -> &L {
        &self.lookups
    }

    pub async fn list_items(&self) -> Result<Vec<ItemDetails>> {
        let items = self.items.get_all().await?;
        self.enrich_all(items).await
    }

    pub async fn get_item(&self, id: i32) -> Result<Option<ItemDetails>> {
        match self.items.get_by_id(id).await? {
            Some(item) => {
                let (types, categories) = self.lookup_names().await?;
                Ok(Some(enrich(item, &types, &categories)))
            }
            None => Ok(None),
        }
    }

    /// An empty or whitespace query lists everything.
    pub async fn search_items(&self, query: &str) -> Result<Vec<ItemDetails>> {
        let items = if query.trim().is_empty() {
            self.items.get_all().await?
        } else {
            self.items.search(query).await?
        };
        self.enrich_all(items).await
    }

    pub async fn create_item(&self, draft: ItemDraft) -> Result<ItemDetails> {
        let items = self.items.get_all().await?;
        validate_uniqueness(&items, &draft.name, &draft.description, None)?;

        let product_code = self.generate_product_code(draft.category_id, &items).await?;
        let discount_date = if draft.discount > Decimal::ZERO {
            Some(Utc::now())
        } else {
            None
        };

        let created = self
            .items
            .add(Item {
                id: 0,
                name: draft.name,
                description: draft.description,
                type_id: draft.type_id,
                category_id: draft.category_id,
                product_code,
                price: draft.price,
                quantity: draft.quantity,
                discount: draft.discount,
                discount_date,
                created_at: Utc::now(),
                updated_at: None,
            })
            .await?;

        let (types, categories) = self.lookup_names().await?;
        Ok(enrich(created, &types, &categories))
    }

    pub async fn update_item(&self, id: i32, draft: ItemDraft) -> Result<Option<ItemDetails>> {
        let items = self.items.get_all().await?;
        validate_uniqueness(&items, &draft.name, &draft.description, Some(id))?;

        // Three-way transition: a discount newly applied stamps the date, a
        // removed discount clears it, an adjusted one keeps the original.
        let discount_date = match items.iter().find(|i| i.id == id) {
            Some(prior) => {
                if draft.discount > Decimal::ZERO && prior.discount == Decimal::ZERO {
                    Some(Utc::now())
                } else if draft.discount == Decimal::ZERO {
                    None
                } else {
                    prior.discount_date
                }
            }
            None => None,
        };

        let updated = self
            .items
            .update(Item {
                id,
                name: draft.name,
                description: draft.description,
                type_id: draft.type_id,
                category_id: draft.category_id,
                // the store restores the stored code and creation time
                product_code: String::new(),
                price: draft.price,
                quantity: draft.quantity,
                discount: draft.discount,
                discount_date,
                created_at: Utc::now(),
                updated_at: None,
            })
            .await?;

        match updated {
            Some(item) => {
                let (types, categories) = self.lookup_names().await?;
                Ok(Some(enrich(item, &types, &categories)))
            }
            None => Ok(None),
        }
    }

    pub async fn delete_item(&self, id: i32) -> Result<bool> {
        self.items.delete(id).await
    }

    async fn enrich_all(&self, items: Vec<Item>) -> Result<Vec<ItemDetails>> {
        let (types, categories) = self.lookup_names().await?;
        Ok(items
            .into_iter()
            .map(|item| enrich(item, &types, &categories))
            .collect())
    }

    async fn lookup_names(&self) -> Result<(HashMap<i32, String>, HashMap<i32, String>)> {
        let types = self
            .lookups
            .all_types()
            .await?
            .into_iter()
            .map(|t| (t.id, t.name))
            .collect();
        let categories = self
            .lookups
            .all_categories()
            .await?
            .into_iter()
            .map(|c| (c.id, c.name))
            .collect();
        Ok((types, categories))
    }

    async fn generate_product_code(&self, category_id: i32, items: &[Item]) -> Result<String> {
        let category = self
            .lookups
            .category_by_id(category_id)
            .await?
            .ok_or_else(|| {
                Error::Validation(format!("Category with id {category_id} not found."))
            })?;

        let prefix = format!("{}-", category.prefix);
        let max_suffix = items
            .iter()
            .filter(|i| i.product_code.starts_with(&prefix))
            .map(|i| code_suffix(&i.product_code))
            .max()
            .unwrap_or(0);

        Ok(format!("{}-{:03}", category.prefix, max_suffix + 1))
    }
}

fn enrich(
    item: Item,
    types: &HashMap<i32, String>,
    categories: &HashMap<i32, String>,
) -> ItemDetails {
    let type_name = types
        .get(&item.type_id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    let category_name = categories
        .get(&item.category_id)
        .cloned()
        .unwrap_or_else(|| UNKNOWN_NAME.to_string());
    ItemDetails::new(item, type_name, category_name)
}

fn validate_uniqueness(
    items: &[Item],
    name: &str,
    description: &str,
    exclude_id: Option<i32>,
) -> Result<()> {
    let name_lc = name.to_lowercase();
    if items
        .iter()
        .any(|i| exclude_id != Some(i.id) && i.name.to_lowercase() == name_lc)
    {
        return Err(Error::Conflict(format!(
            "An item with the name '{name}' already exists."
        )));
    }

    let description_lc = description.to_lowercase();
    if items
        .iter()
        .any(|i| exclude_id != Some(i.id) && i.description.to_lowercase() == description_lc)
    {
        return Err(Error::Conflict(
            "An item with the same description already exists.".to_string(),
        ));
    }

    Ok(())
}

/// Numeric suffix of a `PREFIX-NNN` code; anything malformed counts as 0.
fn code_suffix(code: &str) -> i32 {
    let mut parts = code.split('-');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), Some(suffix), None) => suffix.parse().unwrap_or(0),
        _ => 0,
    }
}
