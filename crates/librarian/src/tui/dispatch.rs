//! Issues backend requests on behalf of the UI
//!
//! Requests run on spawned tasks so the event loop never waits on the
//! network. Each task reports back through the event channel; the event loop
//! hands the completion to `InteractionState`, which stays the only place
//! state is mutated.
//!
//! Every spawned task sends exactly one completion, even when the backend
//! panics, so the in-flight flag can never be left set.

use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use librarian_client::{ApiError, Backend};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, trace};

use super::event::AppEvent;
use super::state::{HealthTicket, InteractionState};

pub struct Dispatcher {
    backend: Arc<dyn Backend>,
    events: UnboundedSender<AppEvent>,
}

impl Dispatcher {
    pub fn new(backend: Arc<dyn Backend>, events: UnboundedSender<AppEvent>) -> Self {
        Self { backend, events }
    }

    /// Submit the current query. Returns false when the submit guard refused it.
    pub fn submit(&self, state: &mut InteractionState) -> bool {
        let Some(request) = state.begin_submit() else {
            return false;
        };

        debug!(k = request.k, "dispatching query");

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = contain_panic(backend.chat(&request)).await;
            // The receiver is gone once the UI has shut down
            if events.send(AppEvent::QueryCompleted(result)).is_err() {
                trace!("query finished after UI shutdown");
            }
        });

        true
    }

    /// Start a health probe. Always issues a request, even if one is pending.
    pub fn check_health(&self, state: &mut InteractionState) -> HealthTicket {
        let ticket = state.begin_health_check();

        debug!(?ticket, "dispatching health check");

        let backend = Arc::clone(&self.backend);
        let events = self.events.clone();
        tokio::spawn(async move {
            let result = contain_panic(backend.health()).await;
            if events
                .send(AppEvent::HealthCompleted { ticket, result })
                .is_err()
            {
                trace!("health check finished after UI shutdown");
            }
        });

        ticket
    }
}

/// Run a backend call, turning a panic into an `Aborted` failure
async fn contain_panic<T>(
    call: impl Future<Output = Result<T, ApiError>>,
) -> Result<T, ApiError> {
    match AssertUnwindSafe(call).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            error!(%message, "backend call panicked");
            Err(ApiError::Aborted(message))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "backend panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_panic_becomes_aborted_error() {
        let result: Result<(), ApiError> = contain_panic(async { panic!("boom") }).await;

        match result {
            Err(ApiError::Aborted(message)) => assert_eq!(message, "boom"),
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_results_pass_through() {
        let ok = contain_panic(async { Ok::<_, ApiError>(7) }).await;
        assert_eq!(ok.unwrap(), 7);

        let err = contain_panic(async {
            Err::<(), _>(ApiError::HttpStatus {
                status: 503,
                body: String::new(),
            })
        })
        .await;
        assert_eq!(err.unwrap_err().status(), Some(503));
    }

    #[test]
    fn test_panic_message_formats() {
        let owned: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(owned.as_ref()), "owned");

        let other: Box<dyn Any + Send> = Box::new(42_u8);
        assert_eq!(panic_message(other.as_ref()), "backend panicked");
    }
}
