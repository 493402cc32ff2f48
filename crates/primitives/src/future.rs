use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll, Waker};

/// A pinned, boxed future that is not required to be Send.
pub type BoxFutureLocal<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

/// Polls a future once without registering for wakeups.
///
/// The tool engine drives every continuation explicitly, so a wakeup would
/// never be observed. Returns `None` while the future is still pending.
pub fn poll_once<F: Future + Unpin>(mut fut: F) -> Option<F::Output> {
	let mut cx = Context::from_waker(Waker::noop());
	match Pin::new(&mut fut).poll(&mut cx) {
		Poll::Ready(res) => Some(res),
		Poll::Pending => None,
	}
}
