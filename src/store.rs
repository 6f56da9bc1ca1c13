//! In-memory item store.
//!
//! Records live in a map keyed by id; a separate sequence of ids keeps
//! insertion order for listing. Both structures always hold the same ids.

use std::collections::HashMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::models::Item;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Item with this ID already exists")]
    Conflict { id: i64 },

    #[error("Item not found")]
    NotFound { id: i64 },

    #[error("invalid value for field '{field}': {reason}")]
    InvalidField { field: String, reason: String },
}

#[derive(Debug, Default, Clone)]
pub struct ItemStore {
    records: HashMap<i64, Item>,
    order: Vec<i64>,
}

impl ItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-filled with the three demo items served at startup.
    pub fn seeded() -> Self {
        let mut store = Self::new();
        let demo = [
            (1, "Pencil", 10.0, false),
            (2, "Notebook", 20.0, true),
            (3, "Bookmark", 30.0, false),
        ];
        for (id, name, price, on_offer) in demo {
            store.records.insert(
                id,
                Item {
                    id,
                    name: name.to_string(),
                    description: Some(format!("Description {id}")),
                    price,
                    on_offer,
                },
            );
            store.order.push(id);
        }
        store
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn create(&mut self, item: Item) -> Result<Item, StoreError> {
        if self.records.contains_key(&item.id) {
            return Err(StoreError::Conflict { id: item.id });
        }
        self.order.push(item.id);
        self.records.insert(item.id, item.clone());
        Ok(item)
    }

    pub fn list(&self, skip: usize, limit: usize) -> Vec<Item> {
        self.order
            .iter()
            .skip(skip)
            .take(limit)
            .filter_map(|id| self.records.get(id))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: i64) -> Result<&Item, StoreError> {
        self.records.get(&id).ok_or(StoreError::NotFound { id })
    }

    /// Overwrites the record at `id` with `item` verbatim, including its id.
    pub fn replace(&mut self, id: i64, item: Item) -> Result<Item, StoreError> {
        self.get(id)?;
        self.overwrite(id, item)
    }

    /// Applies every recognised attribute in `fields` to the record at `id`.
    ///
    /// Unknown keys are ignored. The update is all-or-nothing: a value of the
    /// wrong type for a known attribute leaves the record untouched.
    pub fn patch(&mut self, id: i64, fields: &Map<String, Value>) -> Result<Item, StoreError> {
        let updated = apply_fields(self.get(id)?.clone(), fields)?;
        self.overwrite(id, updated)
    }

    pub fn delete(&mut self, id: i64) -> Result<Item, StoreError> {
        let removed = self
            .records
            .remove(&id)
            .ok_or(StoreError::NotFound { id })?;
        self.order.retain(|existing| *existing != id);
        Ok(removed)
    }

    // Caller has already checked that `id` is present.
    fn overwrite(&mut self, id: i64, item: Item) -> Result<Item, StoreError> {
        if item.id != id {
            if self.records.contains_key(&item.id) {
                return Err(StoreError::Conflict { id: item.id });
            }
            self.records.remove(&id);
            if let Some(slot) = self.order.iter_mut().find(|slot| **slot == id) {
                *slot = item.id;
            }
        }
        self.records.insert(item.id, item.clone());
        Ok(item)
    }
}

fn apply_fields(mut item: Item, fields: &Map<String, Value>) -> Result<Item, StoreError> {
    for (key, value) in fields {
        match key.as_str() {
            "id" => item.id = value.as_i64().ok_or_else(|| invalid(key, "expected an integer"))?,
            "name" => {
                item.name = value
                    .as_str()
                    .ok_or_else(|| invalid(key, "expected a string"))?
                    .to_string()
            }
            "description" => {
                item.description = match value {
                    Value::Null => None,
                    Value::String(text) => Some(text.clone()),
                    _ => return Err(invalid(key, "expected a string or null")),
                }
            }
            "price" => item.price = value.as_f64().ok_or_else(|| invalid(key, "expected a number"))?,
            "on_offer" => {
                item.on_offer = value.as_bool().ok_or_else(|| invalid(key, "expected a boolean"))?
            }
            _ => tracing::debug!(field = %key, "Ignoring unknown item field"),
        }
    }
    Ok(item)
}

fn invalid(field: &str, reason: &str) -> StoreError {
    StoreError::InvalidField {
        field: field.to_string(),
        reason: reason.to_string(),
    }
}
