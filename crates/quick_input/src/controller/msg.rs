use super::{QuickInputController, QuickInputEvent};
use crate::error::QuickInputError;
use crate::item::PickItem;
use crate::session::{HideReason, Session, SessionId};

/// Results of background work, applied on the controller's task.
#[derive(Debug)]
pub(crate) enum QuickInputMsg {
	ItemsResolved {
		session: SessionId,
		result: anyhow::Result<Vec<PickItem>>,
	},
	ItemsBatch {
		session: SessionId,
		batch: Vec<PickItem>,
	},
	ItemsComplete {
		session: SessionId,
	},
	ItemsFailed {
		session: SessionId,
		error: anyhow::Error,
	},
	Validated {
		session: SessionId,
		generation: u64,
		result: anyhow::Result<String>,
	},
	TokenCancelled {
		session: SessionId,
	},
}

impl QuickInputMsg {
	fn session(&self) -> SessionId {
		match self {
			Self::ItemsResolved { session, .. }
			| Self::ItemsBatch { session, .. }
			| Self::ItemsComplete { session }
			| Self::ItemsFailed { session, .. }
			| Self::Validated { session, .. }
			| Self::TokenCancelled { session } => *session,
		}
	}
}

impl QuickInputController {
	pub(super) fn handle_message(&mut self, msg: QuickInputMsg) {
		let id = msg.session();
		if !self.sessions.contains_key(&id) {
			tracing::trace!(session = id.get(), ?msg, "quick_input.msg_discarded");
			return;
		}

		match msg {
			QuickInputMsg::ItemsResolved { session, result } => match result {
				Ok(items) => {
					tracing::debug!(session = session.get(), count = items.len(), "quick_input.items_resolved");
					if let Some(pick) = self.pick_mut(session) {
						pick.set_items(items);
						pick.core_mut().set_busy(false);
					}
					self.events.push(QuickInputEvent::Updated { session });
				}
				Err(error) => self.fail(session, QuickInputError::Items(error)),
			},
			QuickInputMsg::ItemsBatch { session, batch } => {
				tracing::trace!(session = session.get(), count = batch.len(), "quick_input.items_batch");
				if let Some(pick) = self.pick_mut(session) {
					pick.append_items(batch);
				}
				self.events.push(QuickInputEvent::Updated { session });
			}
			QuickInputMsg::ItemsComplete { session } => {
				if let Some(pick) = self.pick_mut(session) {
					pick.core_mut().set_busy(false);
				}
				self.events.push(QuickInputEvent::Updated { session });
			}
			QuickInputMsg::ItemsFailed { session, error } => self.fail(session, QuickInputError::Items(error)),
			QuickInputMsg::Validated {
				session,
				generation,
				result,
			} => {
				let Some(Session::Input(input)) = self.sessions.get_mut(&session) else {
					return;
				};
				if !input.is_current_validation(generation) {
					tracing::trace!(session = session.get(), generation, "quick_input.validation_stale");
					return;
				}
				match result {
					Ok(message) => {
						input.finish_validation(generation, message);
						self.events.push(QuickInputEvent::Updated { session });
					}
					Err(error) => {
						input.abandon_validation(generation);
						self.fail(session, QuickInputError::Validation(error));
					}
				}
			}
			QuickInputMsg::TokenCancelled { session } => {
				self.cancel_session(session, HideReason::Cancelled);
			}
		}
	}
}
