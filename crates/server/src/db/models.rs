use anyhow::Result;
use serde_json::Value;
use sqlx::FromRow;

/// One stored document: the full JSON record, `id` included
#[derive(Debug, Clone, FromRow)]
pub struct ResourceRow {
    pub body: String,
}

impl ResourceRow {
    pub fn into_value(self) -> Result<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
