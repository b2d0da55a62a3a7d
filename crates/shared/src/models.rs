use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

// ============================================================================
// Validation
// ============================================================================

/// Input rejected before any request leaves the client
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Unknown sort option: {0} (expected name, category or date with .asc or .desc)")]
    UnknownSort(String),
}

/// Trim a required text field, rejecting it when nothing is left
pub fn normalize_required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required(field));
    }
    Ok(trimmed.to_string())
}

/// Quantities are whole numbers and never drop below one.
///
/// `f64 as u32` saturates, and NaN maps to zero, so every input lands in `1..=u32::MAX`.
pub fn clamp_quantity(raw: f64) -> u32 {
    (raw.floor() as u32).max(1)
}

// ============================================================================
// Users
// ============================================================================

/// A registered account as stored in the `users` collection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub surname: String,
    #[serde(default)]
    pub cell_number: String,
}

impl User {
    /// Copy of the record without the password hash, for caching on the client
    pub fn without_secret(&self) -> Self {
        Self {
            password_hash: None,
            ..self.clone()
        }
    }
}

/// Body of `POST /users`; the store assigns the id
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub surname: String,
    pub cell_number: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cell_number: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

// ============================================================================
// Shopping lists
// ============================================================================

/// A list owned by exactly one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingList {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Capability granting read-only public access; never rotated once set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
}

impl ShoppingList {
    /// Merge a successful patch into a cached copy
    pub fn apply(&mut self, patch: &ListPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(image_url) = &patch.image_url {
            self.image_url = Some(image_url.clone());
        }
        if let Some(share_code) = &patch.share_code {
            self.share_code = Some(share_code.clone());
        }
    }
}

/// Optional descriptive fields of a list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl ListMeta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_code: Option<String>,
}

impl ListPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl From<ListMeta> for ListPatch {
    fn from(meta: ListMeta) -> Self {
        Self {
            category: meta.category,
            notes: meta.notes,
            image_url: meta.image_url,
            ..Self::default()
        }
    }
}

// ============================================================================
// Shopping items
// ============================================================================

/// An entry on a list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShoppingItem {
    pub id: String,
    pub list_id: String,
    pub name: String,
    #[serde(deserialize_with = "deserialize_quantity")]
    pub quantity: u32,
    #[serde(default)]
    pub purchased: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
    /// Milliseconds since the Unix epoch
    pub created_at: i64,
}

/// Stored quantities may be fractional or below one; they read back clamped
fn deserialize_quantity<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    f64::deserialize(deserializer).map(clamp_quantity)
}

impl ShoppingItem {
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(quantity) = patch.quantity {
            self.quantity = quantity.max(1);
        }
        if let Some(purchased) = patch.purchased {
            self.purchased = purchased;
        }
        if let Some(category) = &patch.category {
            self.category = Some(category.clone());
        }
        if let Some(notes) = &patch.notes {
            self.notes = Some(notes.clone());
        }
        if let Some(images) = &patch.images {
            self.images = Some(images.clone());
        }
    }
}

/// What a user typed when adding an item
#[derive(Debug, Clone, Default)]
pub struct NewItem {
    pub name: String,
    pub quantity: f64,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub images: Option<Vec<String>>,
}

/// Edits requested for an existing item, before validation
#[derive(Debug, Clone, Default)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub quantity: Option<f64>,
    pub purchased: Option<bool>,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub images: Option<Vec<String>>,
}

impl ItemChanges {
    /// Validate the edits and produce the wire patch. Names are trimmed and
    /// quantities re-clamped.
    pub fn into_patch(self) -> Result<ItemPatch, ValidationError> {
        let name = self
            .name
            .map(|name| normalize_required(&name, "Item name"))
            .transpose()?;

        Ok(ItemPatch {
            name,
            quantity: self.quantity.map(clamp_quantity),
            purchased: self.purchased,
            category: self.category,
            notes: self.notes,
            images: self.images,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub purchased: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<String>>,
}

impl ItemPatch {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
