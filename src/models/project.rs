use serde::{Deserialize, Serialize};

/// Project narrative. The whole section is omitted from the document
/// when the title is empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectInfo {
    pub title: String,
    pub introduction: String,
    pub development: String,
    pub conclusion: String,
}
