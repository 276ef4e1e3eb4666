//! Short-lived loopback endpoint that receives the browser redirect at the
//! end of an OAuth sign-in.
//!
//! The listener settles exactly once: the first of a handled callback, a
//! timeout, or a shutdown wins and every later event is ignored. It is shut
//! down on every exit path, including drop.

mod pages;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Html,
    routing::get,
    Router,
};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tower_http::trace::TraceLayer;

pub const CALLBACK_PATH: &str = "/callback";

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackErrorKind {
    PortInUse,
    Timeout,
    CallbackError,
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct CallbackError {
    pub kind: CallbackErrorKind,
    pub message: String,
}

impl CallbackError {
    fn port_in_use(port: u16, err: &std::io::Error) -> Self {
        let message = if err.kind() == std::io::ErrorKind::AddrInUse {
            format!(
                "Port {} is already in use. Use --port to choose another port.",
                port
            )
        } else {
            format!("Could not listen on port {}: {}", port, err)
        };
        Self {
            kind: CallbackErrorKind::PortInUse,
            message,
        }
    }

    fn timeout() -> Self {
        Self {
            kind: CallbackErrorKind::Timeout,
            message: "Login timed out waiting for the browser. Run `urur login` again.".to_string(),
        }
    }

    fn callback(message: impl Into<String>) -> Self {
        Self {
            kind: CallbackErrorKind::CallbackError,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallbackCode {
    pub code: String,
}

type CallbackOutcome = Result<CallbackCode, CallbackError>;

/// Exactly-once completion signal shared by the request handler and the timer
struct Settlement {
    settled: AtomicBool,
    sender: Mutex<Option<oneshot::Sender<CallbackOutcome>>>,
}

impl Settlement {
    fn new(sender: oneshot::Sender<CallbackOutcome>) -> Self {
        Self {
            settled: AtomicBool::new(false),
            sender: Mutex::new(Some(sender)),
        }
    }

    /// Returns false when an earlier event already settled the listener
    fn settle(&self, outcome: CallbackOutcome) -> bool {
        if self.settled.swap(true, Ordering::SeqCst) {
            tracing::debug!("Ignoring event after settlement");
            return false;
        }

        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        if let Some(sender) = sender {
            let _ = sender.send(outcome);
        }
        true
    }

    fn is_settled(&self) -> bool {
        self.settled.load(Ordering::SeqCst)
    }
}

/// First non-empty value for `key`. Later repeats of the same key are ignored.
fn first_value(params: &[(String, String)], key: &str) -> Option<String> {
    params
        .iter()
        .find(|(name, _)| name == key)
        .map(|(_, value)| value.clone())
        .filter(|value| !value.is_empty())
}

async fn handle_callback(
    State(settlement): State<Arc<Settlement>>,
    Query(params): Query<Vec<(String, String)>>,
) -> (StatusCode, Html<String>) {
    if let Some(error) = first_value(&params, "error") {
        let description =
            first_value(&params, "error_description").unwrap_or_else(|| error.clone());
        tracing::warn!(error = %error, "OAuth callback error");

        settlement.settle(Err(CallbackError::callback(description.clone())));
        return (StatusCode::BAD_REQUEST, Html(pages::failure(&description)));
    }

    let Some(code) = first_value(&params, "code") else {
        let message = "The callback did not include an authorization code";
        settlement.settle(Err(CallbackError::callback(message)));
        return (StatusCode::BAD_REQUEST, Html(pages::failure(message)));
    };

    tracing::info!("OAuth callback received");
    settlement.settle(Ok(CallbackCode { code }));
    (StatusCode::OK, Html(pages::success()))
}

async fn not_found() -> (StatusCode, &'static str) {
    (StatusCode::NOT_FOUND, "Not Found")
}

pub struct CallbackListener {
    port: u16,
    // The callback timeout counts from here
    created_at: Instant,
    settlement: Arc<Settlement>,
    outcome_rx: oneshot::Receiver<CallbackOutcome>,
    shutdown_tx: Option<oneshot::Sender<()>>,
    server: Option<JoinHandle<()>>,
}

impl CallbackListener {
    /// Bind `127.0.0.1:<port>` and start serving. Port 0 picks a free port.
    pub async fn bind(port: u16) -> Result<Self, CallbackError> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| CallbackError::port_in_use(port, &e))?;
        let port = listener
            .local_addr()
            .map_err(|e| CallbackError::port_in_use(port, &e))?
            .port();

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let settlement = Arc::new(Settlement::new(outcome_tx));
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let app = Router::new()
            .route(CALLBACK_PATH, get(handle_callback))
            .fallback(not_found)
            .layer(TraceLayer::new_for_http())
            .with_state(settlement.clone());

        let server = tokio::spawn(async move {
            let shutdown = async {
                let _ = shutdown_rx.await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                tracing::warn!("Callback listener stopped with error: {}", e);
            }
        });

        tracing::debug!(port, "Callback listener bound");
        Ok(Self {
            port,
            created_at: Instant::now(),
            settlement,
            outcome_rx,
            shutdown_tx: Some(shutdown_tx),
            server: Some(server),
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{}", self.port, CALLBACK_PATH)
    }

    /// Wait for the redirect or the timeout, whichever settles first, then
    /// release the port. `timeout` is measured from when the listener was
    /// bound.
    pub async fn wait(mut self, timeout: Duration) -> Result<CallbackCode, CallbackError> {
        let deadline = self.created_at + timeout;
        let received = match tokio::time::timeout_at(deadline, &mut self.outcome_rx).await {
            Ok(received) => received,
            Err(_) => {
                // A request that raced the timer may already have settled
                self.settlement.settle(Err(CallbackError::timeout()));
                (&mut self.outcome_rx).await
            }
        };
        let outcome =
            received.unwrap_or_else(|_| Err(CallbackError::callback("Callback listener stopped")));

        self.shutdown().await;
        outcome
    }

    async fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(mut server) = self.server.take() {
            if tokio::time::timeout(SHUTDOWN_GRACE, &mut server).await.is_err() {
                server.abort();
            }
        }
        tracing::debug!(port = self.port, "Callback listener closed");
    }
}

impl Drop for CallbackListener {
    fn drop(&mut self) {
        if !self.settlement.is_settled() {
            self.settlement
                .settle(Err(CallbackError::callback("Callback listener stopped")));
        }
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(server) = self.server.take() {
            server.abort();
        }
    }
}

/// Bind, wait and close in one step
pub async fn wait_for_callback(port: u16, timeout: Duration) -> Result<CallbackCode, CallbackError> {
    CallbackListener::bind(port).await?.wait(timeout).await
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn get(url: String) -> reqwest::Response {
        reqwest::get(url).await.unwrap()
    }

    #[tokio::test]
    async fn receives_authorization_code() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let url = format!("{}?code=auth-code", listener.redirect_uri());

        let request = tokio::spawn(get(url));
        let result = listener.wait(Duration::from_secs(5)).await.unwrap();
        let resp = request.await.unwrap();

        assert_eq!(result.code, "auth-code");
        assert_eq!(resp.status(), reqwest::StatusCode::OK);
        assert!(resp.text().await.unwrap().contains("return to your terminal"));
    }

    #[tokio::test]
    async fn other_paths_get_404_and_keep_listening() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let port = listener.port();

        let resp = get(format!("http://127.0.0.1:{}/favicon.ico", port)).await;
        assert_eq!(resp.status(), reqwest::StatusCode::NOT_FOUND);

        let request = tokio::spawn(get(format!("http://127.0.0.1:{}/callback?code=c", port)));
        let result = listener.wait(Duration::from_secs(5)).await.unwrap();
        request.await.unwrap();

        assert_eq!(result.code, "c");
    }

    #[tokio::test]
    async fn error_parameter_settles_with_description() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let url = format!(
            "{}?error=access_denied&error_description=User%20denied%20access",
            listener.redirect_uri()
        );

        let resp = get(url).await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let err = listener.wait(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind, CallbackErrorKind::CallbackError);
        assert_eq!(err.message, "User denied access");
    }

    #[tokio::test]
    async fn bare_error_code_is_used_without_description() {
        let listener = CallbackListener::bind(0).await.unwrap();
        get(format!("{}?error=access_denied", listener.redirect_uri())).await;

        let err = listener.wait(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.message, "access_denied");
    }

    #[tokio::test]
    async fn missing_code_is_a_callback_error() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let resp = get(listener.redirect_uri()).await;
        assert_eq!(resp.status(), reqwest::StatusCode::BAD_REQUEST);

        let err = listener.wait(Duration::from_secs(5)).await.unwrap_err();
        assert_eq!(err.kind, CallbackErrorKind::CallbackError);
    }

    #[tokio::test]
    async fn first_terminal_request_wins() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let uri = listener.redirect_uri();

        get(format!("{}?code=first", uri)).await;
        // Still served before shutdown, but cannot change the outcome
        let _ = reqwest::get(format!("{}?error=late", uri)).await;

        let result = listener.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(result.code, "first");
    }

    #[tokio::test]
    async fn repeated_parameters_use_the_first_value() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let url = format!("{}?code=first&code=second", listener.redirect_uri());

        let resp = get(url).await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let result = listener.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(result.code, "first");
    }

    #[tokio::test]
    async fn empty_error_parameter_is_ignored() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let url = format!("{}?error=&code=abc", listener.redirect_uri());

        let resp = get(url).await;
        assert_eq!(resp.status(), reqwest::StatusCode::OK);

        let result = listener.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(result.code, "abc");
    }

    #[tokio::test]
    async fn code_received_before_wait_is_returned() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let port = listener.port();
        get(format!("{}?code=early", listener.redirect_uri())).await;

        let result = listener.wait(Duration::from_secs(5)).await.unwrap();
        assert_eq!(result.code, "early");

        // Port is free again once wait returns
        CallbackListener::bind(port).await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_from_bind() {
        let listener = CallbackListener::bind(0).await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        let start = Instant::now();
        let err = listener.wait(Duration::from_secs(60)).await.unwrap_err();

        assert_eq!(err.kind, CallbackErrorKind::Timeout);
        assert!(start.elapsed() < Duration::from_secs(60));
    }

    #[tokio::test]
    async fn times_out_without_callback() {
        let listener = CallbackListener::bind(0).await.unwrap();

        let err = listener.wait(Duration::from_millis(50)).await.unwrap_err();
        assert_eq!(err.kind, CallbackErrorKind::Timeout);
    }

    #[tokio::test]
    async fn occupied_port_reports_port_in_use() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let err = wait_for_callback(port, Duration::from_secs(5))
            .await
            .unwrap_err();

        assert_eq!(err.kind, CallbackErrorKind::PortInUse);
        assert!(err.message.contains(&port.to_string()));
        assert!(err.message.contains("--port"));
    }

    #[tokio::test]
    async fn port_is_released_after_settlement() {
        let listener = CallbackListener::bind(0).await.unwrap();
        let port = listener.port();

        listener.wait(Duration::from_millis(10)).await.unwrap_err();

        let rebound = CallbackListener::bind(port).await.unwrap();
        assert_eq!(rebound.port(), port);
    }

    #[test]
    fn settlement_happens_once() {
        let (tx, mut rx) = oneshot::channel();
        let settlement = Settlement::new(tx);

        assert!(settlement.settle(Ok(CallbackCode { code: "a".into() })));
        assert!(!settlement.settle(Err(CallbackError::timeout())));
        assert_eq!(rx.try_recv().unwrap().unwrap().code, "a");
    }
}
