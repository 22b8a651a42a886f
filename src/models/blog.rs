use serde::{Deserialize, Serialize};

/// First blog search hit for a place or festival, HTML already stripped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogSnippet {
    pub description: String,
    pub link: String,
}
