//! The host-side future returned by every handle operation.
//!
//! A [`Completion`] is either already settled (a value or error decided on
//! the caller's thread before anything was queued) or waiting on the
//! one-shot reply its lane will send exactly once.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use rigbridge_core::Status;
use rigbridge_core::error::{Error, Result};

use crate::operation::Reply;

type MapReply<T> = Box<dyn FnOnce(Reply) -> Result<T> + Send>;

enum Inner<T> {
    Ready(Option<Result<T>>),
    Pending {
        rx: oneshot::Receiver<Result<Reply>>,
        map: Option<MapReply<T>>,
    },
    Done,
}

/// Future resolving to the outcome of one operation.
///
/// The request has already been queued when the handle method returns;
/// dropping the `Completion` discards the result but does not withdraw the
/// request.
#[must_use = "the operation runs regardless, but its result is lost if the completion is dropped"]
pub struct Completion<T> {
    inner: Inner<T>,
}

impl<T> Completion<T> {
    /// An already-settled completion.
    pub(crate) fn ready(result: Result<T>) -> Self {
        Completion {
            inner: Inner::Ready(Some(result)),
        }
    }

    /// An already-rejected completion.
    pub(crate) fn err(error: Error) -> Self {
        Self::ready(Err(error))
    }

    /// A completion waiting on a lane reply, converted through `map`.
    pub(crate) fn pending<F>(rx: oneshot::Receiver<Result<Reply>>, map: F) -> Self
    where
        F: FnOnce(Reply) -> Result<T> + Send + 'static,
    {
        Completion {
            inner: Inner::Pending {
                rx,
                map: Some(Box::new(map)),
            },
        }
    }

    /// Whether the outcome was decided before anything was queued.
    pub fn is_ready(&self) -> bool {
        matches!(self.inner, Inner::Ready(_))
    }
}

// The output value is never pinned; it is moved out once settled.
impl<T> Unpin for Completion<T> {}

impl<T> Future for Completion<T> {
    type Output = Result<T>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Result<T>> {
        let this = self.get_mut();
        match &mut this.inner {
            Inner::Ready(slot) => {
                let result = slot.take().unwrap_or_else(|| Err(settled_twice()));
                this.inner = Inner::Done;
                Poll::Ready(result)
            }
            Inner::Pending { rx, map } => {
                let outcome = match Pin::new(rx).poll(cx) {
                    Poll::Pending => return Poll::Pending,
                    // The lane went away without answering: the handle was
                    // dropped or destroyed underneath this request.
                    Poll::Ready(Err(_)) => Err(Error::HandleDestroyed),
                    Poll::Ready(Ok(Err(e))) => Err(e),
                    Poll::Ready(Ok(Ok(reply))) => match map.take() {
                        Some(map) => map(reply),
                        None => Err(settled_twice()),
                    },
                };
                this.inner = Inner::Done;
                Poll::Ready(outcome)
            }
            Inner::Done => Poll::Ready(Err(settled_twice())),
        }
    }
}

impl<T> fmt::Debug for Completion<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match self.inner {
            Inner::Ready(_) => "ready",
            Inner::Pending { .. } => "pending",
            Inner::Done => "done",
        };
        f.debug_struct("Completion").field("state", &state).finish()
    }
}

fn settled_twice() -> Error {
    Error::driver(Status::EINTERNAL, "completion polled after it settled")
}
