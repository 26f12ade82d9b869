use super::{RegisterReply, RegisterReplyHandler, ServiceRef};
use crate::errors::DnsServiceError;
use std::{
	panic::{catch_unwind, AssertUnwindSafe},
	sync::{Mutex, PoisonError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationState {
	/// No terminal reply has been delivered yet.
	Pending,

	/// A terminal reply has been delivered. Nothing else will be.
	Completed,
}

/// Delivers replies for a single [`ServiceRef`] to its handler.
///
/// Engines never call a [`RegisterReplyHandler`] directly, they go through a `Notifier`, which
/// makes sure that:
///
/// * replies for the same service are delivered one at a time, in the order they are given;
/// * exactly one terminal reply reaches the handler, anything after it is dropped;
/// * a reply claiming success always carries a name, type and domain;
/// * a panicking handler is contained and does not take the engine down with it;
/// * if the notifier is dropped before a terminal reply, the handler still gets one
///   (`ServiceNotRunning`).
pub struct Notifier {
	service: ServiceRef,
	handler: RegisterReplyHandler,
	state: Mutex<RegistrationState>,
}
impl Notifier {
	pub fn new(service: ServiceRef, handler: RegisterReplyHandler) -> Self {
		Self {
			service,
			handler,
			state: Mutex::new(RegistrationState::Pending),
		}
	}

	#[inline(always)]
	pub fn service(&self) -> ServiceRef {
		self.service
	}

	pub fn state(&self) -> RegistrationState {
		*self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}

	/// Hands `reply` to the handler. Returns `false` if it was dropped because a terminal reply
	/// was already delivered.
	pub fn deliver(&self, reply: RegisterReply<'_>) -> bool {
		// Held across the handler call so deliveries for this service never overlap.
		let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);

		if *state == RegistrationState::Completed {
			log::warn!("Dropping reply for {} delivered after completion: {:?}", self.service, reply.result());
			return false;
		}

		if reply.service() != self.service {
			log::error!("Reply for {} routed to the notifier of {}", reply.service(), self.service);
			return false;
		}

		let reply = if reply.is_success() && (reply.name().is_empty() || reply.regtype().is_empty() || reply.domain().is_empty()) {
			log::error!("Engine reported success for {} without a name, type or domain", self.service);
			RegisterReply {
				result: Err(DnsServiceError::Unknown),
				..reply
			}
		} else {
			reply
		};

		if reply.is_terminal() {
			*state = RegistrationState::Completed;
		}

		log::debug!(
			"Registration {} -> {:?} {:?} name={:?} regtype={:?} domain={:?}",
			self.service,
			reply.result(),
			reply.flags(),
			reply.name(),
			reply.regtype(),
			reply.domain()
		);

		// Handlers run on engine threads and inside C callbacks, neither of which may unwind.
		if catch_unwind(AssertUnwindSafe(|| (self.handler)(reply))).is_err() {
			log::error!("Register reply handler for {} panicked", self.service);
		}
		true
	}

	/// Delivers a terminal failure unless the registration already completed.
	pub fn fail(&self, error: DnsServiceError) -> bool {
		self.deliver(RegisterReply::failed(self.service, error))
	}
}
impl Drop for Notifier {
	fn drop(&mut self) {
		let pending = *self.state.get_mut().unwrap_or_else(PoisonError::into_inner) == RegistrationState::Pending;
		if pending {
			log::debug!("Registration {} abandoned by its engine", self.service);
			self.fail(DnsServiceError::ServiceNotRunning);
		}
	}
}
