//! Pending operations as cancellable futures.
//!
//! A [`Flow`] is the caller's view of one connect or send round trip. It
//! resolves when the popup posts the matching message. There is no timeout:
//! if the user closes the popup, the flow stays pending until it is cancelled
//! through a [`CancelHandle`] or dropped. Both tear down the message handler
//! and close the popup, after which the flow resolves to [`Error::Cancelled`].
//!
//! Callers that need a deadline wrap the flow in their own timer.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};
use std::task::{Context, Poll};

use tokio::sync::oneshot;

use crate::channel::Subscription;
use crate::error::{Error, Result};
use crate::popup::Popup;

/// Resources held by a pending flow: its handler registration and popup.
#[derive(Default)]
pub(crate) struct FlowGuard {
	teardown: RefCell<Option<(Subscription, Popup)>>,
	settled: Cell<bool>,
}

impl FlowGuard {
	pub(crate) fn arm(&self, subscription: Subscription, popup: Popup) {
		*self.teardown.borrow_mut() = Some((subscription, popup));
	}

	pub(crate) fn mark_settled(&self) {
		self.settled.set(true);
	}

	fn is_settled(&self) -> bool {
		self.settled.get()
	}

	/// Unregisters the handler and closes the popup. Idempotent.
	fn release(&self) {
		let teardown = self.teardown.borrow_mut().take();
		if let Some((subscription, popup)) = teardown {
			subscription.unsubscribe();
			popup.close();
		}
		self.settled.set(true);
	}
}

enum FlowState<T> {
	Settled(Option<Result<T>>),
	Pending {
		rx: oneshot::Receiver<T>,
		guard: Rc<FlowGuard>,
	},
}

/// In-flight connect or send operation.
///
/// Resolves to the flow's value, or to [`Error::PopupBlocked`] /
/// [`Error::Cancelled`]. Dropping an unsettled flow cancels it.
#[must_use = "dropping a Flow cancels it and closes its popup"]
pub struct Flow<T> {
	state: FlowState<T>,
}

// The value is only ever moved out, never pinned.
impl<T> Unpin for Flow<T> {}

impl<T> Flow<T> {
	/// A flow that is already resolved.
	pub fn ready(value: T) -> Self {
		Self::settled(Ok(value))
	}

	/// A flow that already failed.
	pub fn failed(error: Error) -> Self {
		Self::settled(Err(error))
	}

	fn settled(result: Result<T>) -> Self {
		Self {
			state: FlowState::Settled(Some(result)),
		}
	}

	pub(crate) fn pending(rx: oneshot::Receiver<T>, guard: Rc<FlowGuard>) -> Self {
		Self {
			state: FlowState::Pending { rx, guard },
		}
	}

	/// Returns true once the outcome is fixed: created settled, matching
	/// message received, or cancelled.
	pub fn is_settled(&self) -> bool {
		match &self.state {
			FlowState::Settled(_) => true,
			FlowState::Pending { guard, .. } => guard.is_settled(),
		}
	}

	/// Returns a handle that can cancel this flow from elsewhere.
	pub fn cancel_handle(&self) -> CancelHandle {
		match &self.state {
			FlowState::Settled(_) => CancelHandle { guard: Weak::new() },
			FlowState::Pending { guard, .. } => CancelHandle {
				guard: Rc::downgrade(guard),
			},
		}
	}

	/// Cancels the flow. Equivalent to dropping it.
	pub fn cancel(self) {
		drop(self);
	}
}

impl<T> Future for Flow<T> {
	type Output = Result<T>;

	fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
		match &mut self.state {
			FlowState::Settled(result) => Poll::Ready(result.take().unwrap_or(Err(Error::Cancelled))),
			FlowState::Pending { rx, .. } => match Pin::new(rx).poll(cx) {
				Poll::Ready(Ok(value)) => Poll::Ready(Ok(value)),
				Poll::Ready(Err(_)) => Poll::Ready(Err(Error::Cancelled)),
				Poll::Pending => Poll::Pending,
			},
		}
	}
}

impl<T> Drop for Flow<T> {
	fn drop(&mut self) {
		if let FlowState::Pending { guard, .. } = &self.state {
			guard.release();
		}
	}
}

impl<T> std::fmt::Debug for Flow<T> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Flow")
			.field("settled", &self.is_settled())
			.finish()
	}
}

/// Cancels a pending [`Flow`] without owning it.
///
/// Cancelling closes the popup and unregisters the handler; the flow then
/// resolves to [`Error::Cancelled`]. A no-op once the flow settled or was
/// dropped.
#[derive(Clone)]
pub struct CancelHandle {
	guard: Weak<FlowGuard>,
}

impl CancelHandle {
	pub fn cancel(&self) {
		if let Some(guard) = self.guard.upgrade() {
			if !guard.is_settled() {
				tracing::debug!("Cancelling pending flow");
			}
			guard.release();
		}
	}

	/// Returns true while the flow exists and has not settled.
	pub fn is_active(&self) -> bool {
		self.guard.upgrade().is_some_and(|guard| !guard.is_settled())
	}
}

impl std::fmt::Debug for CancelHandle {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("CancelHandle")
			.field("active", &self.is_active())
			.finish()
	}
}
