//! Recording stub transport shared by the stub-driven test suites.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use todoable_core::{ApiError, Client, ClientConfig, HttpRequest, HttpResponse, Transport};

pub const BASE_URL: &str = "http://todoable.teachable.tech";

type Responder = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// Answers every request with `respond` and keeps a copy of each request.
pub struct StubTransport {
    respond: Box<Responder>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl StubTransport {
    pub fn new(
        respond: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            respond: Box::new(respond),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Answer login with `{"token": token}` and everything else with `body`.
    pub fn with_token(token: &str, status: u16, body: &str) -> Arc<Self> {
        let token = token.to_string();
        let body = body.to_string();
        Self::new(move |req| {
            if req.path.ends_with("/api/authenticate") {
                HttpResponse::new(200, format!(r#"{{ "token": "{token}" }}"#))
            } else {
                HttpResponse::new(status, body.clone())
            }
        })
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn last(&self) -> HttpRequest {
        self.requests().pop().expect("no request recorded")
    }
}

impl Transport for StubTransport {
    fn execute(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let response = (self.respond)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

pub fn client_with(transport: Arc<StubTransport>, config: ClientConfig) -> Client {
    Client::with_transport(config, transport).unwrap()
}

/// A client that has already logged in with token `"token"`.
pub fn authenticated(transport: Arc<StubTransport>, config: ClientConfig) -> Client {
    let client = client_with(transport, config);
    client.authenticate("user", "password").unwrap();
    client
}

pub fn auth_headers(token: &str) -> Vec<(String, String)> {
    vec![
        ("Accept".to_string(), "application/json".to_string()),
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Authorization".to_string(), format!("Token token=\"{token}\"")),
    ]
}
