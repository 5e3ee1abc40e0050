//! Scripted transport for unit tests.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::Mutex;

use cadastre_domain::{ApiRequest, ApiResponse, Assertion, AssertionResult, TestResults};

use crate::ports::{HttpTransport, ResponseVerifier, TransportError, TransportFuture};

/// Replays queued responses in order and records every request.
#[derive(Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, response: ApiResponse) {
        self.script.lock().unwrap().push_back(Ok(response));
    }

    pub fn fail(&self, error: TransportError) {
        self.script.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| format!("{} {}", r.method, r.url))
            .collect()
    }
}

impl HttpTransport for ScriptedTransport {
    fn send(&self, request: ApiRequest) -> TransportFuture<'_> {
        self.requests.lock().unwrap().push(request);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(TransportError::Other("script exhausted".into())));
        Box::pin(async move { next })
    }
}

/// Checks status assertions only; everything else passes.
pub struct StatusOnlyVerifier;

impl ResponseVerifier for StatusOnlyVerifier {
    fn verify(&self, assertions: &[Assertion], response: &ApiResponse) -> TestResults {
        let results = assertions
            .iter()
            .map(|assertion| match assertion {
                Assertion::StatusCode { expected } if !expected.matches(response.status) => {
                    AssertionResult::fail(assertion.clone(), format!("got {}", response.status))
                }
                _ => AssertionResult::pass_with_value(assertion.clone(), response.status.to_string()),
            })
            .collect();
        TestResults::new(results)
    }
}
