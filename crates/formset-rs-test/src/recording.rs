//! Scripted in-memory formset.
//!
//! [`RecordingFormset`] answers submissions from a queue of scripted
//! [`Reply`]s and records every call a button makes on it, so tests can
//! assert on what a chain did without any HTTP involved.
//!
//! ## Example
//!
//! ```rust,no_run
//! use formset_rs_test::recording::{FormsetCall, RecordingFormset, Reply};
//!
//! let formset = RecordingFormset::new()
//!     .reply(Reply::status(422, serde_json::json!({"email": ["Invalid"]})))
//!     .reply(Reply::ok(serde_json::json!({"success_url": "/thanks/"})));
//!
//! assert_eq!(formset.calls(), Vec::<FormsetCall>::new());
//! ```

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use formset_rs_actions::formset::{Formset, Response};
use formset_rs_core::error::FormsetError;
use http::StatusCode;
use tokio::sync::watch;

/// A call made on a [`RecordingFormset`].
#[derive(Debug, Clone, PartialEq)]
pub enum FormsetCall {
    /// `submit` with its extra data.
    Submit(Option<serde_json::Value>),
    /// `reset_to_initial`.
    Reset,
    /// `abort`.
    Abort,
    /// `clear_errors`.
    ClearErrors,
}

/// What the next `submit` does.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply {
    /// Answer with a response.
    Respond(Response),
    /// Send nothing, as when a form does not validate.
    Nothing,
    /// Fail with a submission error.
    Fail(String),
    /// Answer with a response after a pause; an abort during the pause makes
    /// the submission fail as aborted.
    Slow(Duration, Response),
    /// Never answer; only an abort ends the submission.
    Hang,
}

impl Reply {
    /// A `200 OK` reply.
    pub const fn ok(body: serde_json::Value) -> Self {
        Self::Respond(Response::ok(body))
    }

    /// A reply with the given status code.
    ///
    /// # Panics
    ///
    /// Panics if `status` is not a valid HTTP status code.
    pub fn status(status: u16, body: serde_json::Value) -> Self {
        let status = StatusCode::from_u16(status).expect("valid status code");
        Self::Respond(Response::new(status, body))
    }
}

#[derive(Debug)]
struct State {
    replies: VecDeque<Reply>,
    calls: Vec<FormsetCall>,
    data: serde_json::Value,
}

/// An in-memory [`Formset`] with scripted replies.
///
/// Cheap to clone; clones share state. When the reply queue is empty,
/// `submit` answers `200 OK` with an empty object.
#[derive(Debug, Clone)]
pub struct RecordingFormset {
    state: Arc<Mutex<State>>,
    aborts: Arc<watch::Sender<u64>>,
}

impl Default for RecordingFormset {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingFormset {
    /// Creates a formset with no data and no scripted replies.
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                replies: VecDeque::new(),
                calls: Vec::new(),
                data: serde_json::Value::Object(serde_json::Map::new()),
            })),
            aborts: Arc::new(watch::channel(0).0),
        }
    }

    /// Queues `reply` for a later `submit`.
    #[must_use]
    pub fn reply(self, reply: Reply) -> Self {
        self.push_reply(reply);
        self
    }

    /// Sets the data `get_data_value` reads from.
    #[must_use]
    pub fn with_data(self, data: serde_json::Value) -> Self {
        self.set_data(data);
        self
    }

    /// Replaces the data `get_data_value` reads from.
    pub fn set_data(&self, data: serde_json::Value) {
        self.lock().data = data;
    }

    /// Queues `reply` for a later `submit`.
    pub fn push_reply(&self, reply: Reply) {
        self.lock().replies.push_back(reply);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("RecordingFormset lock poisoned")
    }

    fn record(&self, call: FormsetCall) {
        tracing::trace!(?call, "formset call");
        self.lock().calls.push(call);
    }

    /// All calls made so far, in order.
    pub fn calls(&self) -> Vec<FormsetCall> {
        self.lock().calls.clone()
    }

    /// The extra data of every `submit`, in order.
    pub fn submissions(&self) -> Vec<Option<serde_json::Value>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|call| match call {
                FormsetCall::Submit(data) => Some(data.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `abort` calls.
    pub fn abort_count(&self) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|call| **call == FormsetCall::Abort)
            .count()
    }

    /// Number of scripted replies not consumed yet.
    pub fn pending_replies(&self) -> usize {
        self.lock().replies.len()
    }

    async fn wait_for_abort(mut aborted: watch::Receiver<u64>) {
        // A closed channel cannot happen while `self` is alive.
        if aborted.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl Formset for RecordingFormset {
    async fn submit(
        &self,
        extra_data: Option<serde_json::Value>,
    ) -> Result<Option<Response>, FormsetError> {
        let aborted = self.aborts.subscribe();
        self.record(FormsetCall::Submit(extra_data));
        let reply = self.lock().replies.pop_front();

        match reply.unwrap_or_else(|| Reply::ok(serde_json::json!({}))) {
            Reply::Respond(response) => Ok(Some(response)),
            Reply::Nothing => Ok(None),
            Reply::Fail(message) => Err(FormsetError::Submission(message)),
            Reply::Slow(pause, response) => tokio::select! {
                () = tokio::time::sleep(pause) => Ok(Some(response)),
                () = Self::wait_for_abort(aborted) => Err(FormsetError::Aborted),
            },
            Reply::Hang => {
                Self::wait_for_abort(aborted).await;
                Err(FormsetError::Aborted)
            }
        }
    }

    fn reset_to_initial(&self) {
        self.record(FormsetCall::Reset);
    }

    fn abort(&self) {
        self.record(FormsetCall::Abort);
        self.aborts.send_modify(|generation| *generation += 1);
    }

    fn get_data_value(&self, path: &str) -> Option<serde_json::Value> {
        let state = self.lock();
        path.split('.')
            .try_fold(&state.data, |value, key| value.get(key))
            .cloned()
    }

    fn clear_errors(&self) {
        self.record(FormsetCall::ClearErrors);
    }
}
