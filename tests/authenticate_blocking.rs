#![cfg(feature = "blocking")]

use crowd_auth::{
    blocking, verify_fn, AuthenticateOptions, CrowdConfig, CrowdError, Outcome, Profile, Request,
    Verdict,
};
use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn accept(profile: Profile, _request: Option<&Request>) -> Result<Verdict<Profile>, BoxError> {
    Ok(Verdict::Accept {
        user: profile,
        info: None,
    })
}

/// Missing credentials fail synchronously, before the client would touch the
/// network.
#[test]
fn missing_credentials_fail_without_a_provider_call() -> Result<(), BoxError> {
    let config = CrowdConfig::new("http://crowd.invalid")?;
    let strategy = blocking::CrowdStrategy::new(config, verify_fn(accept))?;

    let outcome = strategy.authenticate(&Request::new(), &AuthenticateOptions::default());

    match outcome {
        Outcome::Fail(failure) => {
            assert_eq!(failure.message.as_deref(), Some("Missing credentials"))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    Ok(())
}

/// The blocking strategy runs the same two-call choreography and classifies
/// the outcome exactly like the async one.
#[::tokio::test(flavor = "multi_thread")]
async fn blocking_strategy_matches_the_async_classification() -> Result<(), BoxError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/usermanagement/latest/authentication"))
        .and(query_param("expand", "attributes"))
        .and(query_param("username", "alice"))
        .and(body_json(json!({"value": "wonderland"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "alice",
            "display-name": "Alice A",
            "email": "a@x.com",
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/usermanagement/latest/user/group/direct"))
        .and(query_param("username", "alice"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"groups": [{"GroupEntity": {"name": "eng"}}]})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let uri = server.uri();
    // The blocking client may not run on an async worker thread.
    let outcome = tokio::task::spawn_blocking(move || {
        let config = CrowdConfig::new(uri)?
            .application("demo", "s3cret")
            .retrieve_group_memberships(true);
        let strategy = blocking::CrowdStrategy::new(config, verify_fn(accept))?;
        let request =
            Request::new().with_body(json!({"username": "alice", "password": "wonderland"}));
        Ok::<_, CrowdError>(strategy.authenticate(&request, &AuthenticateOptions::default()))
    })
    .await??;

    match outcome {
        Outcome::Success { user, .. } => {
            assert_eq!(user.username, "alice");
            assert_eq!(user.groups, Some(vec!["eng".to_owned()]));
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    Ok(())
}

/// A provider rejection is a failure carrying the status, same as async.
#[::tokio::test(flavor = "multi_thread")]
async fn blocking_provider_rejection_fails() -> Result<(), BoxError> {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/usermanagement/latest/authentication"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let uri = server.uri();
    let outcome = tokio::task::spawn_blocking(move || {
        let config = CrowdConfig::new(uri)?.application("demo", "s3cret");
        let strategy = blocking::CrowdStrategy::new(config, verify_fn(accept))?;
        let request =
            Request::new().with_body(json!({"username": "alice", "password": "wonderland"}));
        Ok::<_, CrowdError>(strategy.authenticate(&request, &AuthenticateOptions::default()))
    })
    .await??;

    match outcome {
        Outcome::Fail(failure) => {
            assert_eq!(failure.status, Some(http::StatusCode::UNAUTHORIZED))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }

    Ok(())
}
