//! Synchronous strategy for hosts without an async runtime.
//! Use the `blocking` feature to enable this.

use http::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use tracing::debug;

use crate::credential::{Credentials, Request};
use crate::profile::Profile;
use crate::provider::{self, PasswordBody};
use crate::strategy::{AuthenticateOptions, Verdict, VerifyFn, MISSING_CREDENTIALS};
use crate::{BoxError, CrowdConfig, CrowdError, Failure, Outcome};

/// Blocking counterpart of [`crate::Verify`].
///
/// [`verify_fn`](crate::verify_fn) adapters serve this trait as well, so the
/// same callback wiring works for both strategies.
pub trait Verify: Send + Sync {
    type User: Send;

    fn verify(
        &self,
        profile: Profile,
        request: Option<&Request>,
    ) -> Result<Verdict<Self::User>, BoxError>;
}

impl<F, U> Verify for VerifyFn<F, U>
where
    F: Fn(Profile, Option<&Request>) -> Result<Verdict<U>, BoxError> + Send + Sync,
    U: Send,
{
    type User = U;

    fn verify(
        &self,
        profile: Profile,
        request: Option<&Request>,
    ) -> Result<Verdict<U>, BoxError> {
        (self.f)(profile, request)
    }
}

/// Blocking counterpart of [`crate::CrowdStrategy`].
///
/// Identical choreography over `reqwest::blocking`; outcome classification
/// matches the async strategy call for call.
pub struct CrowdStrategy<V> {
    config: CrowdConfig,
    client: reqwest::blocking::Client,
    verifier: V,
}

impl<V: Verify> CrowdStrategy<V> {
    /// Build a strategy from a configuration and a verification callback.
    pub fn new(config: CrowdConfig, verifier: V) -> Result<Self, CrowdError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            config,
            client,
            verifier,
        })
    }

    /// Authenticate one request, producing exactly one [`Outcome`].
    pub fn authenticate(
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

        match self.run(request, &credentials) {
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

    fn run(
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
            .send()?;
        let status = response.status();
        let body = response.text()?;
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
                .send()?;
            let status = response.status();
            let body = response.text()?;
            profile.groups = Some(provider::parse_groups(status, body)?);
        }

        let request = self.config.pass_request_to_callback.then_some(request);
        match self.verifier.verify(profile, request) {
            Ok(Verdict::Accept { user, info }) => Ok(Outcome::Success { user, info }),
            Ok(Verdict::Reject { message }) => Ok(Outcome::Fail(Failure {
                message,
                status: None,
            })),
            Err(err) => Err(CrowdError::Verify(err)),
        }
    }
}
