//! Credential extraction from the inbound request.

use serde_json::{Map, Value};

/// The request-shaped value a host framework hands to
/// [`CrowdStrategy::authenticate`](crate::CrowdStrategy::authenticate).
///
/// Only the parsed body and query data are relevant to the strategy; the
/// host keeps the rest of its request type to itself.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub body: Map<String, Value>,
    pub query: Map<String, Value>,
}

impl Request {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the body data. Values other than JSON objects are ignored.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        if let Value::Object(map) = body {
            self.body = map;
        }
        self
    }

    /// Replace the query data. Values other than JSON objects are ignored.
    #[must_use]
    pub fn with_query(mut self, query: Value) -> Self {
        if let Value::Object(map) = query {
            self.query = map;
        }
        self
    }
}

/// A username/password pair extracted from a single request.
///
/// Held only for the duration of the attempt, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Extract credentials using the configured field names.
    ///
    /// The body is consulted before the query, for username and password
    /// independently. Returns `None` unless both values resolve to non-empty
    /// scalars.
    pub(crate) fn extract(
        request: &Request,
        username_field: &str,
        password_field: &str,
    ) -> Option<Self> {
        let username = first_match(request, username_field)?;
        let password = first_match(request, password_field)?;
        Some(Self { username, password })
    }
}

fn first_match(request: &Request, field: &str) -> Option<String> {
    // An empty body value does not shadow the query.
    lookup(&request.body, field)
        .filter(|value| !value.is_empty())
        .or_else(|| lookup(&request.query, field).filter(|value| !value.is_empty()))
}

/// Resolve a field name against nested object data.
///
/// Bracket notation (`user[name]`) descends one object level per bracket
/// group. The first scalar found on the chain wins, so a shorter value can
/// shadow a deeper path. A broken chain, or a chain ending on anything other
/// than a scalar, resolves to nothing.
fn lookup(data: &Map<String, Value>, field: &str) -> Option<String> {
    let flattened = field.replace(']', "");
    let mut current = data;
    for key in flattened.split('[') {
        match current.get(key)? {
            Value::String(value) => return Some(value.clone()),
            Value::Number(value) => return Some(value.to_string()),
            Value::Bool(value) => return Some(value.to_string()),
            Value::Object(next) => current = next,
            Value::Array(_) | Value::Null => return None,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn body(value: Value) -> Request {
        Request::new().with_body(value)
    }

    #[test]
    fn plain_field() {
        let request = body(json!({"username": "alice"}));
        assert_eq!(lookup(&request.body, "username").as_deref(), Some("alice"));
    }

    #[test]
    fn nested_field() {
        let request = body(json!({"user": {"name": "alice"}}));
        assert_eq!(
            lookup(&request.body, "user[name]").as_deref(),
            Some("alice")
        );
    }

    #[test]
    fn first_scalar_on_the_chain_wins() {
        // The chain stops at the first scalar even with keys left over.
        let request = body(json!({"user": "bob"}));
        assert_eq!(lookup(&request.body, "user[name]").as_deref(), Some("bob"));
    }

    #[test]
    fn numbers_and_booleans_are_scalars() {
        let request = body(json!({"pin": 1234, "remember": true}));
        assert_eq!(lookup(&request.body, "pin").as_deref(), Some("1234"));
        assert_eq!(lookup(&request.body, "remember").as_deref(), Some("true"));
    }

    #[test]
    fn broken_chain_resolves_to_nothing() {
        let request = body(json!({"user": {"name": "alice"}}));
        assert_eq!(lookup(&request.body, "user[login]"), None);
        assert_eq!(lookup(&request.body, "account[name]"), None);
    }

    #[test]
    fn non_scalar_terminal_resolves_to_nothing() {
        let request = body(json!({"user": {"name": {"first": "alice"}}, "tags": ["a"], "none": null}));
        assert_eq!(lookup(&request.body, "user[name]"), None);
        assert_eq!(lookup(&request.body, "tags"), None);
        assert_eq!(lookup(&request.body, "none"), None);
        assert_eq!(lookup(&request.body, "user"), None);
    }

    #[test]
    fn body_takes_precedence_over_query() {
        let request = body(json!({"username": "from-body"}))
            .with_query(json!({"username": "from-query", "password": "secret"}));
        let credentials = Credentials::extract(&request, "username", "password").unwrap();
        assert_eq!(credentials.username, "from-body");
        assert_eq!(credentials.password, "secret");
    }

    #[test]
    fn empty_values_count_as_missing() {
        let request = body(json!({"username": "alice", "password": ""}));
        assert_eq!(Credentials::extract(&request, "username", "password"), None);
    }

    #[test]
    fn empty_body_value_falls_through_to_the_query() {
        let request = body(json!({"username": "", "password": "secret"}))
            .with_query(json!({"username": "alice"}));
        let credentials = Credentials::extract(&request, "username", "password").unwrap();
        assert_eq!(credentials.username, "alice");
    }

    #[test]
    fn both_fields_are_required() {
        let request = body(json!({"username": "alice"}));
        assert_eq!(Credentials::extract(&request, "username", "password"), None);
        assert_eq!(Credentials::extract(&Request::new(), "username", "password"), None);
    }
}
