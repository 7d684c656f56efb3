//! HTTP service implementation for hex ID generation.
//!
//! This module defines [`IdService`], which owns the process-wide generator,
//! and the single axum handler that exposes it. Every path and every method
//! is served by the same handler.
//!
//! ## Responsibilities
//!
//! - Clamp the requested `count` into the configured range.
//! - Issue the IDs in one generator call so a batch is contiguous.
//! - Render one lowercase hex ID per line.
//! - Translate generator failures into HTTP statuses.

use std::sync::Arc;

use axum::{
    Form, Router,
    extract::{Query, State, rejection::FormRejection},
    http::Method,
};
use hexflake::{HexFlakeGenerator, HexFlakeId, TimeSource};
use tower_http::trace::TraceLayer;

use crate::server::{
    error::{Error, Result},
    service::count::clamp_count,
    telemetry::{
        increment_ids_generated, increment_requests, increment_unavailable, record_ids_per_request,
    },
};

/// Name of the form or query parameter carrying the requested count.
pub const COUNT_PARAM: &str = "count";

/// Shared state behind every request: the generator and the count limit.
pub struct IdService<T>
where
    T: TimeSource<u64>,
{
    generator: Arc<HexFlakeGenerator<T>>,
    max_ids_per_request: usize,
}

// Derived `Clone` would require `T: Clone`.
impl<T> Clone for IdService<T>
where
    T: TimeSource<u64>,
{
    fn clone(&self) -> Self {
        Self {
            generator: Arc::clone(&self.generator),
            max_ids_per_request: self.max_ids_per_request,
        }
    }
}

impl<T> IdService<T>
where
    T: TimeSource<u64>,
{
    pub fn new(generator: HexFlakeGenerator<T>, max_ids_per_request: usize) -> Self {
        Self {
            generator: Arc::new(generator),
            max_ids_per_request,
        }
    }

    /// Issues IDs for a raw `count` parameter and renders them as
    /// newline-separated hex.
    ///
    /// # Errors
    ///
    /// Returns an error if the generator refuses the batch (clock regression,
    /// sequence exhaustion, poisoned lock).
    pub fn generate(&self, raw_count: Option<&str>) -> Result<String> {
        let count = clamp_count(raw_count, self.max_ids_per_request);
        record_ids_per_request(count as f64);

        let ids = self.generator.produce(count)?;
        increment_ids_generated(ids.len() as u64);

        Ok(render_ids(&ids))
    }
}

/// Joins IDs as 32-character lowercase hex, one per line, with no trailing
/// newline.
pub fn render_ids(ids: &[HexFlakeId]) -> String {
    let mut body = String::with_capacity(ids.len() * (HexFlakeId::HEX_SIZE + 1));
    let mut buf = [0_u8; HexFlakeId::HEX_SIZE];
    for (i, id) in ids.iter().enumerate() {
        if i > 0 {
            body.push('\n');
        }
        id.encode_hex_into(&mut buf);
        body.extend(buf.iter().map(|&b| char::from(b)));
    }
    body
}

/// Handles every request, whatever its path or method.
///
/// `count` is looked up in an `application/x-www-form-urlencoded` body first
/// (POST, PUT and PATCH only), then in the query string. Parameters are read
/// as a list of pairs so duplicate or unknown keys never reject the request;
/// the first `count` in each source wins. A body that is not a form is
/// ignored rather than rejected.
#[tracing::instrument(level = "debug", skip_all, fields(%method))]
pub async fn serve_ids<T>(
    State(service): State<IdService<T>>,
    method: Method,
    Query(query): Query<Vec<(String, String)>>,
    form: core::result::Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<String>
where
    T: TimeSource<u64> + Send + Sync + 'static,
{
    increment_requests();

    let from_body = match &form {
        Ok(Form(pairs)) if carries_form_body(&method) => first_count(pairs),
        _ => None,
    };
    let raw_count = from_body.or_else(|| first_count(&query));

    service.generate(raw_count).inspect_err(|err| {
        report_failure(err);
    })
}

/// Logs a failed request and counts it if a retry can succeed. Returns the
/// level it was logged at.
fn report_failure(err: &Error) -> tracing::Level {
    match err {
        Error::Unavailable(_) => {
            increment_unavailable();
            tracing::warn!(%err, "refusing to issue IDs");
            tracing::Level::WARN
        }
        Error::Internal(_) => {
            tracing::error!(%err, "failed to issue IDs");
            tracing::Level::ERROR
        }
    }
}

/// Only these methods have their form bodies consulted.
fn carries_form_body(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

fn first_count(pairs: &[(String, String)]) -> Option<&str> {
    pairs
        .iter()
        .find(|(key, _)| key == COUNT_PARAM)
        .map(|(_, value)| value.as_str())
}

/// Builds the router: one fallback handler for every path and method.
pub fn router<T>(service: IdService<T>) -> Router
where
    T: TimeSource<u64> + Send + Sync + 'static,
{
    Router::new()
        .fallback(serve_ids::<T>)
        .with_state(service)
        .layer(TraceLayer::new_for_http())
}
