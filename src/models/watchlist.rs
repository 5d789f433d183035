use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchlistEntry {
    #[serde(rename = "userId")]
    pub owner_id: String,

    // normalized: trimmed + uppercase
    pub symbol: String,
    pub company: String,

    // unix millis, set once on insertion
    #[serde(rename = "addedAt")]
    pub added_at: i64,
}
