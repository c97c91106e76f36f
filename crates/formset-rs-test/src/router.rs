//! A formset submitting to an Axum application.
//!
//! [`RouterFormset`] posts its data as JSON to an endpoint of an in-process
//! [`Router`], the way a browser formset posts to its Django view. Aborting
//! it drops the in-flight request.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use axum::routing::post;
//! use axum::{Json, Router};
//! use formset_rs_actions::Formset;
//! use formset_rs_test::router::RouterFormset;
//!
//! async fn example() {
//!     let app = Router::new().route(
//!         "/submit/",
//!         post(|| async { Json(serde_json::json!({"success_url": "/thanks/"})) }),
//!     );
//!     let formset = RouterFormset::new(app, "/submit/");
//!     let response = formset.submit(None).await.unwrap().unwrap();
//!     assert_eq!(response.success_url(), Some("/thanks/"));
//! }
//! ```

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::Router;
use bytes::Bytes;
use formset_rs_actions::formset::{Formset, Response};
use formset_rs_core::error::FormsetError;
use http::{header, Method, Request};
use http_body_util::BodyExt;
use tokio::sync::watch;
use tower::ServiceExt;

/// Key under which the form data is posted.
pub const FORMSET_DATA: &str = "formset_data";

#[derive(Debug)]
struct FormState {
    initial: serde_json::Value,
    data: serde_json::Value,
    valid: bool,
    errors_cleared: usize,
}

/// A [`Formset`] backed by an Axum [`Router`].
///
/// The request body is `{"formset_data": <data>}`, with the members of an
/// object passed as extra data merged in at the top level.
#[derive(Clone)]
pub struct RouterFormset {
    app: Router,
    endpoint: String,
    state: Arc<Mutex<FormState>>,
    aborts: Arc<watch::Sender<u64>>,
}

impl std::fmt::Debug for RouterFormset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RouterFormset")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl RouterFormset {
    /// Creates a formset posting to `endpoint` of `app`, with empty data.
    pub fn new(app: Router, endpoint: impl Into<String>) -> Self {
        Self {
            app,
            endpoint: endpoint.into(),
            state: Arc::new(Mutex::new(FormState {
                initial: serde_json::json!({}),
                data: serde_json::json!({}),
                valid: true,
                errors_cleared: 0,
            })),
            aborts: Arc::new(watch::channel(0).0),
        }
    }

    /// Sets both the initial and the current data.
    #[must_use]
    pub fn with_initial(self, data: serde_json::Value) -> Self {
        {
            let mut state = self.lock();
            state.initial = data.clone();
            state.data = data;
        }
        self
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FormState> {
        self.state.lock().expect("RouterFormset lock poisoned")
    }

    /// Replaces the value at the top-level field `name`.
    pub fn set_field(&self, name: &str, value: serde_json::Value) {
        if let serde_json::Value::Object(map) = &mut self.lock().data {
            map.insert(name.to_string(), value);
        }
    }

    /// The current data.
    pub fn data(&self) -> serde_json::Value {
        self.lock().data.clone()
    }

    /// Marks the forms as valid or invalid. An invalid formset sends nothing.
    pub fn set_valid(&self, valid: bool) {
        self.lock().valid = valid;
    }

    /// How often `clear_errors` was called.
    pub fn errors_cleared(&self) -> usize {
        self.lock().errors_cleared
    }

    fn request_body(&self, extra_data: Option<serde_json::Value>) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert(FORMSET_DATA.to_string(), self.data());
        match extra_data {
            Some(serde_json::Value::Object(extra)) => body.extend(extra),
            Some(other) => {
                body.insert("extra_data".to_string(), other);
            }
            None => {}
        }
        serde_json::Value::Object(body)
    }

    async fn send(&self, body: serde_json::Value) -> Result<Response, FormsetError> {
        let payload = serde_json::to_vec(&body)
            .map_err(|e| FormsetError::SerializationError(e.to_string()))?;
        let request = Request::builder()
            .method(Method::POST)
            .uri(&self.endpoint)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json")
            .body(Body::from(payload))
            .map_err(|e| FormsetError::Submission(e.to_string()))?;

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .map_err(|e| FormsetError::Submission(e.to_string()))?;
        let status = response.status();
        let bytes = response
            .into_body()
            .collect()
            .await
            .map_or_else(|_| Bytes::new(), http_body_util::Collected::to_bytes);
        let body = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);

        tracing::debug!(endpoint = %self.endpoint, %status, "formset submitted");
        Ok(Response::new(status, body))
    }
}

#[async_trait]
impl Formset for RouterFormset {
    async fn submit(
        &self,
        extra_data: Option<serde_json::Value>,
    ) -> Result<Option<Response>, FormsetError> {
        let mut aborted = self.aborts.subscribe();
        if !self.lock().valid {
            return Ok(None);
        }
        let body = self.request_body(extra_data);

        tokio::select! {
            response = self.send(body) => response.map(Some),
            Ok(()) = aborted.changed() => {
                tracing::debug!(endpoint = %self.endpoint, "submission aborted");
                Err(FormsetError::Aborted)
            }
        }
    }

    fn reset_to_initial(&self) {
        let mut state = self.lock();
        state.data = state.initial.clone();
    }

    fn abort(&self) {
        self.aborts.send_modify(|generation| *generation += 1);
    }

    fn get_data_value(&self, path: &str) -> Option<serde_json::Value> {
        let state = self.lock();
        path.split('.')
            .try_fold(&state.data, |value, key| value.get(key))
            .cloned()
    }

    fn clear_errors(&self) {
        self.lock().errors_cleared += 1;
    }
}
