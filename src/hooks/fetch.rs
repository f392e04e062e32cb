//! Trigger an async call and keep its outcome as observable state.
//!
//! A [`FetchHook`] wraps an async call. Each trigger flips `loading` on, runs
//! the call and stores its outcome: the response on success, an [`ApiError`]
//! when the server rejected the request, or any other [`HighwayError`]. On
//! failure the previous response is kept so it can still be used as a fallback.
//!
//! State changes are published through a `tokio::sync::watch` channel, so UI
//! layers can re-render on [`FetchHook::subscribe`] notifications.

use crate::error::{ApiError, HighwayError};
use futures::future::BoxFuture;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

type CallFn<Req, Res> =
    Arc<dyn Fn(Req) -> BoxFuture<'static, Result<Res, HighwayError>> + Send + Sync>;
type LoadingFn = Arc<dyn Fn() + Send + Sync>;

/// Snapshot of a [`FetchHook`].
#[derive(Debug, Clone)]
pub struct FetchState<Res> {
    /// Whether a call is currently processing.
    pub loading: bool,
    /// The last successful response, or the initial value.
    pub response: Option<Res>,
    /// Set when the last call failed with a non-success status.
    pub api_error: Option<ApiError>,
    /// Set when the last call failed for any other reason.
    pub error: Option<Arc<HighwayError>>,
}

impl<Res> Default for FetchState<Res> {
    fn default() -> Self {
        Self {
            loading: false,
            response: None,
            api_error: None,
            error: None,
        }
    }
}

/// An async call with loading, response and error state.
///
/// Clones share the same call and state.
pub struct FetchHook<Req, Res> {
    call: CallFn<Req, Res>,
    on_loading: Option<LoadingFn>,
    state: Arc<watch::Sender<FetchState<Res>>>,
}

impl<Req, Res> Clone for FetchHook<Req, Res> {
    fn clone(&self) -> Self {
        Self {
            call: Arc::clone(&self.call),
            on_loading: self.on_loading.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<Req, Res> FetchHook<Req, Res>
where
    Req: Send + 'static,
    Res: Clone + Send + Sync + 'static,
{
    /// Creates a hook around `call`. No call is made until triggered.
    pub fn new<F, Fut>(call: F) -> Self
    where
        F: Fn(Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Res, HighwayError>> + Send + 'static,
    {
        let call: CallFn<Req, Res> = Arc::new(move |req| Box::pin(call(req)));
        let (state, _) = watch::channel(FetchState::default());

        Self {
            call,
            on_loading: None,
            state: Arc::new(state),
        }
    }

    /// Sets the value exposed as `response` before any call succeeds.
    pub fn with_initial(self, initial: Res) -> Self {
        self.state.send_modify(|state| state.response = Some(initial));
        self
    }

    /// Registers a handler fired every time loading switches on.
    pub fn on_loading<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_loading = Some(Arc::new(handler));
        self
    }

    /// Runs the call on a background task.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn trigger(&self, req: Req) -> JoinHandle<()> {
        let hook = self.clone();
        tokio::spawn(async move { hook.run(req).await })
    }

    /// Runs the call and waits for the state to be updated.
    pub async fn run(&self, req: Req) {
        self.state.send_modify(|state| state.loading = true);
        if let Some(on_loading) = &self.on_loading {
            on_loading();
        }

        let result = (self.call)(req).await;

        self.state.send_modify(|state| {
            match result {
                Ok(response) => {
                    state.response = Some(response);
                    state.api_error = None;
                    state.error = None;
                }
                Err(HighwayError::Api(api_error)) => state.api_error = Some(api_error),
                Err(error) => state.error = Some(Arc::new(error)),
            }
            state.loading = false;
        });
    }

    /// Current state snapshot.
    pub fn state(&self) -> FetchState<Res> {
        self.state.borrow().clone()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<FetchState<Res>> {
        self.state.subscribe()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn response(&self) -> Option<Res> {
        self.state.borrow().response.clone()
    }

    pub fn api_error(&self) -> Option<ApiError> {
        self.state.borrow().api_error.clone()
    }

    pub fn error(&self) -> Option<Arc<HighwayError>> {
        self.state.borrow().error.clone()
    }

    /// Forces the `response` value.
    pub fn set_response(&self, response: Option<Res>) {
        self.state.send_modify(|state| state.response = response);
    }

    /// Forces the `api_error` value.
    pub fn set_api_error(&self, api_error: Option<ApiError>) {
        self.state.send_modify(|state| state.api_error = api_error);
    }

    /// Forces the `error` value.
    pub fn set_error(&self, error: Option<HighwayError>) {
        self.state
            .send_modify(|state| state.error = error.map(Arc::new));
    }
}
