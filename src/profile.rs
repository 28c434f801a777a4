//! The normalized user profile.

use serde::Serialize;
use serde_json::Value;

/// Structured name, following the portable-contacts convention.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Name {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
}

/// One address entry in [`Profile::emails`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Email {
    pub value: String,
}

/// Host-framework-agnostic user record built from the provider's response.
///
/// Produced once per successful authentication and handed to the
/// verification callback by value. Serializes with portable-contacts field
/// names (`displayName`, `givenName`, …); the verbatim provider response is
/// retained in [`raw`](Profile::raw) and [`json`](Profile::json) but kept
/// out of the serialized form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub provider: String,
    /// Principal name returned by the provider.
    pub id: String,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    pub name: Name,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub emails: Vec<Email>,
    /// Direct group memberships, present only when retrieval is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    /// Verbatim body of the authentication response.
    #[serde(skip)]
    pub raw: String,
    /// Parsed body of the authentication response.
    #[serde(skip)]
    pub json: Value,
}
