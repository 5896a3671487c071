//! Product category record.

use serde::{Deserialize, Serialize};

use crate::CategoryId;

/// A product category as listed by `GET /categories`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id")]
    pub id: CategoryId,
    pub name: String,
}
