use serde::{Deserialize, Serialize};

/// Backend account info object.
///
/// The notes backend returns this under the `user` field.
/// We keep it flexible to avoid breaking when backend fields evolve.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub(crate) struct AccountInfo {
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

/// A note as the store serializes it (camelCase JSON).
///
/// Identity is `uuid`; `created_at` is set once by the store and never
/// changed by the client.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct Note {
    pub uuid: String,
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub created_at: String,
}
