// Copyright 2024 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! The http front end for the evaluator.
//!
//! One POST route. Every malformed request, whether it is bad JSON
//! or a bad expression, collapses to a 422 with the same error
//! envelope so that clients can't distinguish the failure modes,
//! while the logs record the specific kind.

use std::{env, net::SocketAddr, time::Instant};

use anyhow::Context;
use axum::{
    body::Body,
    extract::Request,
    http::{header, header::HeaderValue, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::post,
    Router,
};
use calc_protocol::{CalculateRequest, CalculateResponse, ErrorResponse};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use super::{config, consts, eval};

const METHOD_NOT_ALLOWED_ERROR: &str = "method not allowed";
const INTERNAL_SERVER_ERROR: &str = "internal server error";

/// Resolve the listen port and serve the calculate api until the
/// process gets killed.
#[instrument(skip_all)]
pub fn run(config: config::Config, port_flag: Option<u16>) -> anyhow::Result<()> {
    let env_port = env::var("PORT").ok();
    let port = config::resolve_port(port_flag, env_port.as_deref(), &config)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building server runtime")?;
    runtime.block_on(serve(port))
}

async fn serve(port: u16) -> anyhow::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener =
        tokio::net::TcpListener::bind(addr).await.with_context(|| format!("binding to {addr}"))?;
    info!("listening on {}", addr);

    axum::serve(listener, router()).await.context("serving http")?;
    Ok(())
}

fn router() -> Router {
    Router::new()
        .route(consts::CALCULATE_PATH, post(calculate).fallback(method_not_allowed))
        .layer(middleware::from_fn(log_requests))
}

/// The calculate endpoint.
///
/// The body is decoded by hand rather than through an extractor so
/// that a body that isn't valid JSON gets the same 422 + error
/// envelope treatment as a body that doesn't evaluate.
async fn calculate(body: String) -> Response {
    let req: CalculateRequest = match serde_json::from_str(&body) {
        Ok(req) => req,
        Err(err) => {
            warn!("failed to decode request: {}", err);
            return json_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                &ErrorResponse { error: eval::Error::InvalidExpression.to_string() },
            );
        }
    };

    match eval::evaluate(&req.expression) {
        Ok(value) => {
            // clients get a fixed zero decimal place rendering
            let resp = CalculateResponse { result: format!("{value:.0}") };
            info!("calculated expression, result {}", resp.result);
            json_response(StatusCode::OK, &resp)
        }
        Err(err) => {
            warn!("rejecting expression: {}", err);
            json_response(
                StatusCode::UNPROCESSABLE_ENTITY,
                &ErrorResponse { error: eval::Error::InvalidExpression.to_string() },
            )
        }
    }
}

/// Answers every non-POST method on the calculate route.
async fn method_not_allowed() -> Response {
    json_response(
        StatusCode::METHOD_NOT_ALLOWED,
        &ErrorResponse { error: String::from(METHOD_NOT_ALLOWED_ERROR) },
    )
}

/// Serialize a payload into a JSON response with the given status.
/// If the payload won't serialize, the response degrades to a 500
/// with a static error envelope.
fn json_response<T: Serialize>(status: StatusCode, payload: &T) -> Response {
    let (status, body) = match serde_json::to_string(payload) {
        Ok(body) => (status, body),
        Err(err) => {
            error!("failed to marshal response: {}", err);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!(r#"{{"error":"{INTERNAL_SERVER_ERROR}"}}"#),
            )
        }
    };

    let mut resp = Response::new(Body::from(body));
    *resp.status_mut() = status;
    resp.headers_mut().insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
    resp
}

/// Log the shape of every request on the way in and its status and
/// latency on the way out.
async fn log_requests(req: Request, next: Next) -> Response {
    let start = Instant::now();

    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let user_agent = header_str(&req, header::USER_AGENT);
    let host = header_str(&req, header::HOST);
    info!(%method, %path, %user_agent, %host, "request started");

    let resp = next.run(req).await;

    info!(
        status = %resp.status(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "request completed",
    );
    resp
}

fn header_str(req: &Request, name: header::HeaderName) -> String {
    req.headers().get(&name).and_then(|v| v.to_str().ok()).unwrap_or("").to_string()
}

#[cfg(test)]
mod test {
    use super::*;

    async fn body_string(resp: Response) -> String {
        let bytes =
            axum::body::to_bytes(resp.into_body(), usize::MAX).await.expect("reading body");
        String::from_utf8(bytes.to_vec()).expect("utf8 body")
    }

    #[tokio::test]
    async fn calculates() {
        let cases = vec![
            (r#"{"expression": "2 + 2"}"#, r#"{"result":"4"}"#),
            (r#"{"expression": "(2 + 2 * 18 / 3 - 5) * 0"}"#, r#"{"result":"0"}"#),
            (r#"{"expression": "2 + 2 * 3"}"#, r#"{"result":"8"}"#),
            (r#"{"expression": "(3 + 2) * 2 - 1"}"#, r#"{"result":"9"}"#),
        ];

        for (body, want) in cases {
            let resp = calculate(String::from(body)).await;
            assert_eq!(resp.status(), StatusCode::OK, "wrong status for {body}");
            assert_eq!(body_string(resp).await, want, "wrong body for {body}");
        }
    }

    #[tokio::test]
    async fn rejects_bad_expressions() {
        // division by zero, mismatched parens, unknown operator and
        // a dangling operator all collapse to the same envelope
        let cases = vec![
            r#"{"expression": "1 / 0"}"#,
            r#"{"expression": "2 + 2 * (2 * 3"}"#,
            r#"{"expression": "2 ^ 4"}"#,
            r#"{"expression": "2 + 4 *"}"#,
            r#"{"expression": ""}"#,
        ];

        for body in cases {
            let resp = calculate(String::from(body)).await;
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "wrong status for {body}");
            assert_eq!(
                body_string(resp).await,
                r#"{"error":"expression is not valid"}"#,
                "wrong body for {body}"
            );
        }
    }

    #[tokio::test]
    async fn rejects_bad_json() {
        for body in ["{", r#"{"expr": "2 + 2"}"#, ""] {
            let resp = calculate(String::from(body)).await;
            assert_eq!(
                resp.status(),
                StatusCode::UNPROCESSABLE_ENTITY,
                "wrong status for {body:?}"
            );
            assert_eq!(
                body_string(resp).await,
                r#"{"error":"expression is not valid"}"#,
                "wrong body for {body:?}"
            );
        }
    }

    #[tokio::test]
    async fn answers_other_methods_with_405() {
        let resp = method_not_allowed().await;
        assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body_string(resp).await, r#"{"error":"method not allowed"}"#);
    }

    #[tokio::test]
    async fn responses_are_json() {
        let resp = calculate(String::from(r#"{"expression": "1+1"}"#)).await;
        let content_type =
            resp.headers().get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()).map(String::from);
        assert_eq!(content_type.as_deref(), Some("application/json"));
    }
}
