//! HTTP server for the companion app
//!
//! `runbun serve` → binds, spawns the worker threads, answers until killed

use crate::config::{Config, Variant};
use crate::dispatcher::BatchDispatcher;
use crate::error::{Error, Result};
use crate::locator::CreationOrderLocator;
use crate::model::{validate_init_request, validate_pokemon_cards_request, validate_update_request};
use crate::service::{DocumentLocks, RunService, UpdateSummary};
use crate::sheets::SheetsApi;
use colored::Colorize;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tiny_http::{Header, Method, Request, Response, Server};
use uuid::Uuid;

const LIVENESS_TEXT: &str = "Run&Bun stats service running...";
const SUCCESS_MESSAGE: &str = "Data received successfully";

#[derive(Serialize)]
struct MessageBody<'a> {
    message: &'a str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Shared by every worker thread.
pub struct AppState {
    pub config: Config,
    pub sheets: Box<dyn SheetsApi + Send + Sync>,
    pub locks: DocumentLocks,
}

impl AppState {
    pub fn new(config: Config, sheets: Box<dyn SheetsApi + Send + Sync>) -> Self {
        Self {
            config,
            sheets,
            locks: DocumentLocks::new(),
        }
    }

    fn service(&self) -> RunService<'_, dyn SheetsApi + Send + Sync> {
        RunService::new(
            self.sheets.as_ref(),
            BatchDispatcher::new(self.config.sheets.batch_size),
            &self.locks,
        )
    }
}

/// Status, body and content type of an answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
    pub content_type: &'static str,
}

impl Reply {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            body: body.to_string(),
            content_type: "text/plain; charset=utf-8",
        }
    }

    fn json<T: Serialize>(status: u16, body: &T) -> Self {
        match serde_json::to_string(body) {
            Ok(body) => Self {
                status,
                body,
                content_type: "application/json",
            },
            Err(e) => Self::text(500, &e.to_string()),
        }
    }

    fn success() -> Self {
        Self::json(200, &MessageBody {
            message: SUCCESS_MESSAGE,
        })
    }

    fn error(err: &Error) -> Self {
        let status = err.status();
        if status >= 500 {
            tracing::error!(status, error = %err, "request failed");
        } else {
            tracing::warn!(status, error = %err, "request rejected");
        }
        Self::json(status, &ErrorBody {
            error: err.to_string(),
        })
    }
}

/// Compare `Authorization` against `Bearer {password}` without leaking the
/// position of the first mismatch. An empty password locks the route.
pub fn is_authorized(authorization: Option<&str>, password: &str) -> bool {
    let Some(header) = authorization else {
        return false;
    };
    if password.is_empty() {
        return false;
    }
    let expected = Sha256::digest(format!("Bearer {}", password).as_bytes());
    let actual = Sha256::digest(header.as_bytes());
    expected
        .iter()
        .zip(actual.iter())
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}

fn summarize(result: Result<UpdateSummary>) -> Reply {
    match result {
        Ok(summary) => {
            tracing::info!(
                created = summary.created,
                patched = summary.patched,
                pokemon_cards = summary.pokemon_cards,
                requests = summary.requests,
                chunks = summary.chunks,
                "update applied"
            );
            Reply::success()
        }
        Err(e) => Reply::error(&e),
    }
}

/// Pick the handler for a request. Kept free of socket I/O for tests.
pub fn route(
    state: &AppState,
    method: &Method,
    path: &str,
    authorization: Option<&str>,
    body: &str,
) -> Reply {
    let variant = state.config.server.variant;

    match (method, path, variant) {
        (&Method::Get, "/", _) => Reply::text(200, LIVENESS_TEXT),

        (&Method::Post, "/updateRun", Variant::Locator) => {
            if !is_authorized(authorization, &state.config.auth.api_password) {
                return Reply::error(&Error::Unauthorized);
            }
            summarize(validate_update_request(body).and_then(|req| state.service().update_run(&req)))
        }

        (&Method::Post, "/initRun", Variant::CreationOrder) => {
            summarize(validate_init_request(body).and_then(|req| state.service().init_run(&req)))
        }

        (&Method::Post, "/updatePokemonCards", Variant::CreationOrder) => summarize(
            validate_pokemon_cards_request(body)
                .and_then(|req| state.service().update_pokemon_cards(&req, &CreationOrderLocator)),
        ),

        _ => Reply::text(404, "Not found"),
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "handler panicked".to_string()
    }
}

/// [`route`], with a panicking handler turned into a 500 so the worker
/// thread keeps serving.
pub fn respond(
    state: &AppState,
    method: &Method,
    path: &str,
    authorization: Option<&str>,
    body: &str,
) -> Reply {
    catch_unwind(AssertUnwindSafe(|| {
        route(state, method, path, authorization, body)
    }))
    .unwrap_or_else(|payload| Reply::error(&Error::Internal(panic_message(payload.as_ref()))))
}

fn authorization_header(request: &Request) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Authorization"))
        .map(|h| h.value.as_str().to_string())
}

fn handle_request(mut request: Request, state: &AppState) -> std::io::Result<()> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let method = request.method().clone();
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!("request", %request_id, %method, path);
    let _enter = span.enter();

    let mut body = String::new();
    let reply = match request.as_reader().read_to_string(&mut body) {
        Ok(_) => {
            let authorization = authorization_header(&request);
            respond(state, &method, path, authorization.as_deref(), &body)
        }
        Err(e) => Reply::error(&Error::Validation(format!("Failed to read body: {}", e))),
    };
    tracing::debug!(status = reply.status, "responding");

    let mut response = Response::from_string(reply.body).with_status_code(reply.status);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], reply.content_type.as_bytes()) {
        response.add_header(header);
    }
    request.respond(response)
}

/// Start the HTTP server and block until every worker exits
pub fn start_server(state: AppState) -> std::io::Result<()> {
    let addr = state.config.bind_address();
    let server = Server::http(&addr).map_err(|e| std::io::Error::other(e.to_string()))?;
    let server = Arc::new(server);
    let state = Arc::new(state);
    let workers = state.config.server.workers.max(1);

    eprintln!("\n{}", "Run&Bun stats".green().bold());
    eprintln!("   Listening on: http://{}", addr);
    eprintln!("   Endpoints:    {}", endpoints(state.config.server.variant));
    eprintln!("   Press Ctrl+C to stop\n");
    tracing::info!(%addr, workers, variant = ?state.config.server.variant, "server started");

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            std::thread::spawn(move || {
                for request in server.incoming_requests() {
                    if let Err(e) = handle_request(request, &state) {
                        tracing::error!(worker, error = %e, "failed to send response");
                    }
                }
            })
        })
        .collect();

    // Join every worker; one dying must not stop the others
    let mut panicked = 0;
    for (worker, handle) in handles.into_iter().enumerate() {
        if handle.join().is_err() {
            tracing::error!(worker, "worker thread panicked");
            panicked += 1;
        }
    }
    if panicked == workers {
        return Err(std::io::Error::other("every worker thread panicked"));
    }
    Ok(())
}

fn endpoints(variant: Variant) -> &'static str {
    match variant {
        Variant::Locator => "GET /, POST /updateRun",
        Variant::CreationOrder => "GET /, POST /initRun, POST /updatePokemonCards",
    }
}
