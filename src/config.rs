use std::time::Duration;

use url::Url;

use crate::CrowdError;

/// Configuration for a [`CrowdStrategy`](crate::CrowdStrategy).
///
/// Built once, immutable after the strategy is constructed.
#[derive(Debug, Clone)]
pub struct CrowdConfig {
    pub(crate) provider_url: Url,
    pub(crate) provider_name: String,
    pub(crate) application_id: String,
    pub(crate) application_secret: String,
    pub(crate) username_field: String,
    pub(crate) password_field: String,
    pub(crate) pass_request_to_callback: bool,
    pub(crate) retrieve_group_memberships: bool,
    pub(crate) timeout: Duration,
}

impl CrowdConfig {
    /// Create a configuration for the provider at `provider_url`.
    ///
    /// The URL is the base the Crowd REST paths are appended to, so a
    /// context path survives: `http://crowd.example.com:8095/crowd` calls
    /// `http://crowd.example.com:8095/crowd/rest/usermanagement/…`. An
    /// `https` URL uses TLS with the usual default port; any scheme other
    /// than `http` or `https` is refused.
    pub fn new(provider_url: impl AsRef<str>) -> Result<Self, CrowdError> {
        let provider_url = Url::parse(provider_url.as_ref())?;
        match provider_url.scheme() {
            "http" | "https" => {}
            other => return Err(CrowdError::UnsupportedScheme(other.to_owned())),
        }
        Ok(Self {
            provider_url,
            provider_name: "atlassian-crowd".to_owned(),
            application_id: String::new(),
            application_secret: String::new(),
            username_field: "username".to_owned(),
            password_field: "password".to_owned(),
            pass_request_to_callback: false,
            retrieve_group_memberships: false,
            timeout: Duration::from_secs(10),
        })
    }

    /// Application name and password, sent as the Basic `Authorization`
    /// header on every provider call.
    #[must_use]
    pub fn application(mut self, id: impl Into<String>, secret: impl Into<String>) -> Self {
        self.application_id = id.into();
        self.application_secret = secret.into();
        self
    }

    /// Provider tag recorded on produced profiles.
    ///
    /// Defaults to `"atlassian-crowd"`; override it when talking to a
    /// Crowd-compatible service under another name.
    #[must_use]
    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = name.into();
        self
    }

    /// Request field holding the username. Defaults to `"username"`.
    ///
    /// Bracket notation reaches into nested objects: `"user[name]"`.
    #[must_use]
    pub fn username_field(mut self, field: impl Into<String>) -> Self {
        self.username_field = field.into();
        self
    }

    /// Request field holding the password. Defaults to `"password"`.
    #[must_use]
    pub fn password_field(mut self, field: impl Into<String>) -> Self {
        self.password_field = field.into();
        self
    }

    /// Also hand the inbound request to the verification callback.
    #[must_use]
    pub fn pass_request_to_callback(mut self, pass: bool) -> Self {
        self.pass_request_to_callback = pass;
        self
    }

    /// Fetch the user's direct group memberships after a successful
    /// authentication and attach them to the profile.
    #[must_use]
    pub fn retrieve_group_memberships(mut self, retrieve: bool) -> Self {
        self.retrieve_group_memberships = retrieve;
        self
    }

    /// Bound on each outbound provider call. Defaults to 10 seconds.
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
