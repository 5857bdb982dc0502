use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A notification message template
#[derive(Debug, Clone, Default, FromRow, Serialize, Deserialize)]
pub struct Template {
    pub id: u32,
    pub name: String,
    pub body: String,
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct TemplateFilter {
    pub id: Option<u32>,
    pub name: Option<String>,
}

impl Template {
    pub fn matches(&self, filter: &TemplateFilter) -> bool {
        if let Some(id) = filter.id {
            if self.id != id {
                return false;
            }
        }
        if let Some(name) = &filter.name {
            if !self.name.eq_ignore_ascii_case(name) {
                return false;
            }
        }
        true
    }
}
