//! Crowd usermanagement REST protocol: endpoint construction, the Basic
//! `Authorization` header, wire types, and response interpretation shared by
//! the async and blocking strategies.
//!
//! Both strategies buffer a response body in full before anything here looks
//! at it, so each response is interpreted exactly once.

use http::{HeaderValue, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::config::CrowdConfig;
use crate::profile::{Email, Name, Profile};
use crate::{CrowdError, ProviderCall};

pub(crate) const AUTHENTICATION_PATH: &str = "/rest/usermanagement/latest/authentication";
pub(crate) const DIRECT_GROUPS_PATH: &str = "/rest/usermanagement/latest/user/group/direct";

/// Body of the authentication `POST`.
#[derive(Debug, Serialize)]
pub(crate) struct PasswordBody<'a> {
    pub(crate) value: &'a str,
}

#[derive(Debug, Deserialize)]
struct UserResource {
    name: String,
    #[serde(rename = "display-name")]
    display_name: Option<String>,
    #[serde(rename = "first-name")]
    first_name: Option<String>,
    #[serde(rename = "last-name")]
    last_name: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GroupList {
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    #[serde(rename = "GroupEntity")]
    entity: GroupEntity,
}

#[derive(Debug, Deserialize)]
struct GroupEntity {
    name: String,
}

/// Everything retained from a 200 authentication response.
#[derive(Debug)]
pub(crate) struct AuthnPayload {
    resource: UserResource,
    raw: String,
    json: Value,
}

fn base(config: &CrowdConfig) -> &str {
    config.provider_url.as_str().trim_end_matches('/')
}

pub(crate) fn authentication_url(config: &CrowdConfig) -> String {
    format!("{}{}", base(config), AUTHENTICATION_PATH)
}

pub(crate) fn direct_groups_url(config: &CrowdConfig) -> String {
    format!("{}{}", base(config), DIRECT_GROUPS_PATH)
}

/// Basic `Authorization` header for the configured application.
pub(crate) fn authorization(config: &CrowdConfig) -> Result<HeaderValue, CrowdError> {
    let value =
        http_auth::basic::encode_credentials(&config.application_id, &config.application_secret);
    let mut header_value = HeaderValue::try_from(value).map_err(http::Error::from)?;
    header_value.set_sensitive(true);
    Ok(header_value)
}

/// Interpret a buffered authentication response.
///
/// Non-200 is a provider rejection; a 200 that does not parse is a
/// malformed-response error, not a failed login.
pub(crate) fn parse_authentication(
    status: StatusCode,
    body: String,
) -> Result<AuthnPayload, CrowdError> {
    trace!(%status, body = %body, "authentication response");
    if status != StatusCode::OK {
        return Err(CrowdError::Provider {
            call: ProviderCall::Authentication,
            status,
            body,
        });
    }
    let json: Value = serde_json::from_str(&body).map_err(|source| {
        CrowdError::MalformedResponse {
            call: ProviderCall::Authentication,
            source,
        }
    })?;
    let resource: UserResource = serde_json::from_value(json.clone()).map_err(|source| {
        CrowdError::MalformedResponse {
            call: ProviderCall::Authentication,
            source,
        }
    })?;
    Ok(AuthnPayload {
        resource,
        raw: body,
        json,
    })
}

/// Interpret a buffered group-membership response into an ordered name list.
pub(crate) fn parse_groups(status: StatusCode, body: String) -> Result<Vec<String>, CrowdError> {
    trace!(%status, body = %body, "group membership response");
    if status != StatusCode::OK {
        return Err(CrowdError::Provider {
            call: ProviderCall::GroupMembership,
            status,
            body,
        });
    }
    let list: GroupList = serde_json::from_str(&body).map_err(|source| {
        CrowdError::MalformedResponse {
            call: ProviderCall::GroupMembership,
            source,
        }
    })?;
    Ok(list
        .groups
        .into_iter()
        .map(|group| group.entity.name)
        .collect())
}

pub(crate) fn build_profile(provider: &str, payload: AuthnPayload) -> Profile {
    let UserResource {
        name,
        display_name,
        first_name,
        last_name,
        email,
    } = payload.resource;
    Profile {
        provider: provider.to_owned(),
        id: name.clone(),
        username: name,
        display_name,
        name: Name {
            given_name: first_name,
            family_name: last_name,
        },
        email: email.clone(),
        emails: email.into_iter().map(|value| Email { value }).collect(),
        groups: None,
        raw: payload.raw,
        json: payload.json,
    }
}
