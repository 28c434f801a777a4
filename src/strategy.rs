//! The asynchronous authentication strategy.

use std::marker::PhantomData;

use async_trait::async_trait;
use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::credential::{Credentials, Request};
use crate::profile::Profile;
use crate::provider::{self, PasswordBody};
use crate::{BoxError, CrowdConfig, CrowdError, Failure, Outcome};

/// Default failure message when a request carries no usable credentials.
pub const MISSING_CREDENTIALS: &str = "Missing credentials";

/// Decision returned by a verification callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict<U> {
    /// The profile maps to an application user; authentication succeeds.
    Accept { user: U, info: Option<String> },
    /// No user for this profile; authentication fails.
    Reject { message: Option<String> },
}

/// Final accept/reject decision over a normalized [`Profile`].
///
/// The callback is invoked at most once per authentication attempt, and only
/// after all provider data has been gathered. `request` is `Some` only when
/// [`CrowdConfig::pass_request_to_callback`] is enabled.
///
/// Returning `Err` reports the attempt as [`Outcome::Error`]; returning
/// [`Verdict::Reject`] reports it as [`Outcome::Fail`].
#[async_trait]
pub trait Verify: Send + Sync {
    type User: Send;

    async fn verify(
        &self,
        profile: Profile,
        request: Option<&Request>,
    ) -> Result<Verdict<Self::User>, BoxError>;
}

/// Adapter returned by [`verify_fn`].
pub struct VerifyFn<F, U> {
    pub(crate) f: F,
    _user: PhantomData<fn() -> U>,
}

/// Wrap a plain function as a verification callback.
///
/// The adapter serves both the async strategy and, with the `blocking`
/// feature, the blocking one.
///
/// ```ignore
/// let strategy = CrowdStrategy::new(config, verify_fn(|profile: Profile, _request| {
///     Ok(Verdict::Accept { user: profile, info: None })
/// }))?;
/// ```
pub fn verify_fn<F, U>(f: F) -> VerifyFn<F, U>
where
    F: Fn(Profile, Option<&Request>) -> Result<Verdict<U>, BoxError> + Send + Sync,
    U: Send,
{
    VerifyFn {
        f,
        _user: PhantomData,
    }
}

#[async_trait]
impl<F, U> Verify for VerifyFn<F, U>
where
    F: Fn(Profile, Option<&Request>) -> Result<Verdict<U>, BoxError> + Send + Sync,
    U: Send,
{
    type User = U;

    async fn verify(
        &self,
        profile: Profile,
        request: Option<&Request>,
    ) -> Result<Verdict<U>, BoxError> {
        (self.f)(profile, request)
    }
}

/// Per-attempt options for [`CrowdStrategy::authenticate`].
#[derive(Debug, Clone, Default)]
pub struct AuthenticateOptions {
    /// Overrides [`MISSING_CREDENTIALS`] as the failure message when the
    /// request carries no usable credentials.
    pub bad_request_message: Option<String>,
}

/// Authentication strategy validating username/password pairs against an
/// Atlassian Crowd provider.
///
/// The strategy holds no per-attempt state and can serve concurrent
/// [`authenticate`](CrowdStrategy::authenticate) calls.
pub struct CrowdStrategy<V> {
    config: CrowdConfig,
    client: reqwest::Client,
    verifier: V,
}

impl<V: Verify> CrowdStrategy<V> {
    /// Build a strategy from a configuration and a verification callback.
    pub fn new(config: CrowdConfig, verifier: V) -> Result<Self, CrowdError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            client,
            verifier,
        })
    }

    /// Authenticate one request, producing exactly one [`Outcome`].
    ///
    /// Zero, one, or two outbound calls are made: none when credentials are
    /// missing, one when group retrieval is disabled or the authentication
    /// call fails, two otherwise. The group call never starts before the
    /// authentication call has completed successfully.
    pub async fn authenticate(
        &self,
        request: &Request,
        options: &AuthenticateOptions,
    ) -> Outcome<V::User> {
        let credentials = match Credentials::extract(
            request,
            &self.config.username_field,
            &self.config.password_field,
        ) {
            Some(credentials) => credentials,
            None => {
                debug!("request carries no usable credentials");
                let message = options
                    .bad_request_message
                    .clone()
                    .unwrap_or_else(|| MISSING_CREDENTIALS.to_owned());
                return Outcome::Fail(Failure {
                    message: Some(message),
                    status: None,
                });
            }
        };

        match self.run(request, &credentials).await {
            Ok(outcome) => outcome,
            Err(CrowdError::Provider { call, status, .. }) => {
                debug!(%call, %status, "provider rejected the call");
                Outcome::Fail(Failure {
                    message: None,
                    status: Some(status),
                })
            }
            Err(err) => Outcome::Error(err),
        }
    }

    async fn run(
        &self,
        request: &Request,
        credentials: &Credentials,
    ) -> Result<Outcome<V::User>, CrowdError> {
        let authorization = provider::authorization(&self.config)?;

        debug!(username = %credentials.username, "authenticating against the provider");
        let response = self
            .client
            .post(provider::authentication_url(&self.config))
            .query(&[
                ("expand", "attributes"),
                ("username", credentials.username.as_str()),
            ])
            .header(AUTHORIZATION, authorization.clone())
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .json(&PasswordBody {
                value: &credentials.password,
            })
            .send()
            .await?;
        let status = response.status();
        // Buffer the whole body before interpreting it.
        let body = response.text().await?;
        let payload = provider::parse_authentication(status, body)?;
        let mut profile = provider::build_profile(&self.config.provider_name, payload);

        if self.config.retrieve_group_memberships {
            debug!(username = %credentials.username, "fetching direct group memberships");
            let response = self
                .client
                .get(provider::direct_groups_url(&self.config))
                .query(&[("username", credentials.username.as_str())])
                .header(AUTHORIZATION, authorization)
                .header(ACCEPT, "application/json")
                .send()
                .await?;
            let status = response.status();
            let body = response.text().await?;
            profile.groups = Some(provider::parse_groups(status, body)?);
        }

        let request = self.config.pass_request_to_callback.then_some(request);
        match self.verifier.verify(profile, request).await {
            Ok(Verdict::Accept { user, info }) => Ok(Outcome::Success { user, info }),
            Ok(Verdict::Reject { message }) => Ok(Outcome::Fail(Failure {
                message,
                status: None,
            })),
            Err(err) => Err(CrowdError::Verify(err)),
        }
    }
}
