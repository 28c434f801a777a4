//! # crowd-auth
//!
//! Username/password authentication against an Atlassian Crowd server, or any
//! identity service speaking the Crowd usermanagement REST protocol.
//!
//! [`CrowdStrategy`] extracts credentials from a request-shaped value, validates
//! them against the configured provider, optionally fetches the user's direct
//! group memberships, and hands a normalized [`Profile`] to a caller-supplied
//! verification callback that makes the final accept/reject decision. The host
//! framework receives exactly one [`Outcome`] per attempt.
//!
//! For example, the following code authenticates a login request. (See the
//! repository tests directory for fully working examples against a mock
//! provider.)
//!
//! ```ignore
//! // One-time code:
//! let config = CrowdConfig::new("http://crowd.example.com:8095/crowd")?
//!     .application("my-app", "app-secret")
//!     .retrieve_group_memberships(true);
//!
//! let strategy = CrowdStrategy::new(
//!     config,
//!     verify_fn(|profile: Profile, _request| Ok(Verdict::Accept {
//!         user: profile,
//!         info: None,
//!     })),
//! )?;
//!
//! // Per-request code:
//! let request = Request::new()
//!     .with_body(json!({"username": "alice", "password": "wonderland"}));
//!
//! match strategy.authenticate(&request, &AuthenticateOptions::default()).await {
//!     Outcome::Success { user, .. } => { /* establish the session */ }
//!     Outcome::Fail(failure) => { /* respond 401, optionally with failure.message */ }
//!     Outcome::Error(err) => { /* respond 500 and log err */ }
//! }
//! ```
//!
//! The strategy never decides on its own that a user is signed in: the provider
//! answers whether the password is correct, and the verification callback maps
//! the resulting profile onto an application user (or rejects it). Hosts without
//! an async runtime can enable the `blocking` feature for a synchronous
//! `blocking::CrowdStrategy` with the same behavior.

use std::fmt;

use http::StatusCode;
use thiserror::Error;

#[cfg(feature = "blocking")]
pub mod blocking;
mod config;
mod credential;
mod profile;
mod provider;
mod strategy;

pub use config::CrowdConfig;
pub use credential::{Credentials, Request};
pub use profile::{Email, Name, Profile};
pub use strategy::{
    verify_fn, AuthenticateOptions, CrowdStrategy, Verdict, Verify, VerifyFn, MISSING_CREDENTIALS,
};

/// Boxed error type accepted from verification callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum CrowdError {
    #[error("invalid provider URL")]
    InvalidProviderUrl(#[from] url::ParseError),

    #[error("unsupported provider URL scheme {0:?}")]
    UnsupportedScheme(String),

    #[error("invalid header value")]
    InvalidHeader(#[from] http::Error),

    #[error("error talking to the provider")]
    Transport(#[from] reqwest::Error),

    /// The provider answered the call with a non-200 status.
    ///
    /// [`CrowdStrategy::authenticate`] reports this as [`Outcome::Fail`]
    /// rather than [`Outcome::Error`]: a rejected password is a 401 here.
    #[error("provider returned {status} to the {call} call")]
    Provider {
        call: ProviderCall,
        status: StatusCode,
        body: String,
    },

    /// A 200 response whose body did not parse as the expected JSON shape.
    #[error("malformed {call} response from the provider")]
    MalformedResponse {
        call: ProviderCall,
        #[source]
        source: serde_json::Error,
    },

    #[error("verification callback failed")]
    Verify(#[source] BoxError),
}

/// Which of the two outbound provider calls produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderCall {
    Authentication,
    GroupMembership,
}

impl fmt::Display for ProviderCall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderCall::Authentication => f.write_str("authentication"),
            ProviderCall::GroupMembership => f.write_str("group membership"),
        }
    }
}

/// Terminal result of one authentication attempt.
///
/// Exactly one outcome is produced per call to
/// [`CrowdStrategy::authenticate`].
#[derive(Debug)]
pub enum Outcome<U> {
    /// The provider accepted the credentials and the verification callback
    /// mapped the profile to a user.
    Success { user: U, info: Option<String> },
    /// Authentication failed: missing credentials, a provider rejection, or
    /// a [`Verdict::Reject`] from the verification callback.
    Fail(Failure),
    /// Something went wrong that is not a credential problem.
    Error(CrowdError),
}

impl<U> Outcome<U> {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }
}

/// Detail attached to [`Outcome::Fail`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    /// Human-readable reason, when one exists (missing credentials, or a
    /// message supplied by the verification callback).
    pub message: Option<String>,
    /// Status of the provider response, when the failure came from the
    /// provider rejecting a call.
    pub status: Option<StatusCode>,
}
