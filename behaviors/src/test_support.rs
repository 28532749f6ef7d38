use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use cloudcafe_clients::RestClient;
use cloudcafe_clients::retry::RetryConfig;
use cloudcafe_types::Secret;
use wiremock::{MockServer, Request, ResponseTemplate};

pub(crate) fn rest_client(server: &MockServer, base_path: &str) -> RestClient {
    RestClient::new(reqwest::Client::new(), &format!("{}{base_path}", server.uri()))
        .unwrap()
        .with_token(Secret::new("tok"))
        .with_retry(RetryConfig::none())
}

/// Answers with each 200 body in turn, repeating the last.
pub(crate) fn sequence(
    bodies: Vec<serde_json::Value>,
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync + 'static {
    let calls = Arc::new(AtomicUsize::new(0));
    move |_: &Request| {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        let body = bodies[n.min(bodies.len() - 1)].clone();
        ResponseTemplate::new(200).set_body_json(body)
    }
}

/// Answers 200 with `body` for the first `times` calls, then 404.
pub(crate) fn present_then_gone(
    body: serde_json::Value,
    times: usize,
) -> impl Fn(&Request) -> ResponseTemplate + Send + Sync + 'static {
    let calls = Arc::new(AtomicUsize::new(0));
    move |_: &Request| {
        if calls.fetch_add(1, Ordering::SeqCst) < times {
            ResponseTemplate::new(200).set_body_json(body.clone())
        } else {
            ResponseTemplate::new(404)
        }
    }
}
