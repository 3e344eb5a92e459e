use serde::Deserialize;

/// A user record as served by the users endpoint. Fields other than
/// `name` are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    pub name: String,
}

pub fn decode_users(payload: &[u8]) -> Result<Vec<User>, serde_json::Error> {
    serde_json::from_slice(payload)
}
