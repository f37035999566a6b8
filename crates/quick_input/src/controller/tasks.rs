//! Background work spawned on behalf of sessions.
//!
//! Every task selects on a cancellation token tied to its session and
//! reports back through the controller's message channel. Nothing here
//! touches session state directly.

use std::future::Future;
use std::time::Duration;

use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::BoxStream;
use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use super::msg::QuickInputMsg;
use crate::item::PickItem;
use crate::session::{SessionId, ValidationJob};

/// Spawns `fut` on the ambient tokio runtime. Returns false when called
/// outside one.
pub(super) fn spawn<F>(fut: F) -> bool
where
	F: Future<Output = ()> + Send + 'static,
{
	match tokio::runtime::Handle::try_current() {
		Ok(handle) => {
			handle.spawn(fut);
			true
		}
		Err(_) => {
			tracing::warn!("quick_input.spawn: no tokio runtime, task dropped");
			false
		}
	}
}

pub(super) async fn resolve_items(
	session: SessionId,
	items: BoxFuture<'static, anyhow::Result<Vec<PickItem>>>,
	lifetime: CancellationToken,
	tx: UnboundedSender<QuickInputMsg>,
) {
	let result = tokio::select! {
		_ = lifetime.cancelled() => return,
		result = items => result,
	};
	if lifetime.is_cancelled() {
		return;
	}
	let _ = tx.send(QuickInputMsg::ItemsResolved { session, result });
}

pub(super) async fn stream_items(
	session: SessionId,
	mut batches: BoxStream<'static, anyhow::Result<Vec<PickItem>>>,
	lifetime: CancellationToken,
	tx: UnboundedSender<QuickInputMsg>,
) {
	loop {
		let next = tokio::select! {
			_ = lifetime.cancelled() => return,
			next = batches.next() => next,
		};
		let msg = match next {
			Some(Ok(batch)) => QuickInputMsg::ItemsBatch { session, batch },
			Some(Err(error)) => QuickInputMsg::ItemsFailed { session, error },
			None => QuickInputMsg::ItemsComplete { session },
		};
		let last = !matches!(msg, QuickInputMsg::ItemsBatch { .. });
		if tx.send(msg).is_err() || last {
			return;
		}
	}
}

/// Forwards a request token firing as a message, unless the session goes
/// first.
pub(super) async fn watch_token(
	session: SessionId,
	token: CancellationToken,
	lifetime: CancellationToken,
	tx: UnboundedSender<QuickInputMsg>,
) {
	tokio::select! {
		_ = lifetime.cancelled() => {}
		_ = token.cancelled() => {
			let _ = tx.send(QuickInputMsg::TokenCancelled { session });
		}
	}
}

/// Waits out the debounce, runs the validator, and reports the result.
///
/// The job token is cancelled by a newer run or by disposal; either way the
/// result is dropped here rather than sent.
pub(super) async fn validate(
	session: SessionId,
	job: ValidationJob,
	delay: Duration,
	tx: UnboundedSender<QuickInputMsg>,
) {
	let ValidationJob {
		generation,
		value,
		validator,
		cancel,
	} = job;

	let result = tokio::select! {
		_ = cancel.cancelled() => return,
		result = async {
			if !delay.is_zero() {
				tokio::time::sleep(delay).await;
			}
			validator(value).await
		} => result,
	};
	if cancel.is_cancelled() {
		return;
	}
	let _ = tx.send(QuickInputMsg::Validated {
		session,
		generation,
		result,
	});
}
