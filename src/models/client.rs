use serde::{Deserialize, Serialize};

/// Client contact block. Address and company are optional; an empty
/// string means the field is absent from the rendered document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub company: String,
}
