use super::{Command, LocalEngine};
use crate::{
	engine::{forget_on_failure, thread::EngineThread, RegistrationEngine},
	errors::ShutdownError,
	register::{Notifier, RegisterReplyHandler, RegisterRequest, ServiceRef},
};
use std::{
	collections::HashSet,
	sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::mpsc::UnboundedSender;

/// A running [`LocalEngine`].
///
/// Dropping the handle shuts the engine down. Registrations that had not completed by then
/// are reported as `ServiceNotRunning`.
pub struct LocalEngineHandle {
	thread: EngineThread,
	commands_tx: UnboundedSender<Command>,
	live: Arc<Mutex<HashSet<ServiceRef>>>,
}
impl LocalEngineHandle {
	pub(super) fn new(thread: EngineThread, commands_tx: UnboundedSender<Command>) -> Self {
		Self {
			thread,
			commands_tx,
			live: Arc::new(Mutex::new(HashSet::new())),
		}
	}

	/// Acts as if another host claimed the name of `service`.
	///
	/// If the registration allows renaming it moves to the next free name, otherwise it fails
	/// with `NameConflict`. Only requests built with
	/// [`watch_conflicts`](crate::register::RegisterRequestBuilder::watch_conflicts) hear about it.
	pub fn announce_conflict(&self, service: ServiceRef) -> bool {
		if !self.live.lock().unwrap_or_else(PoisonError::into_inner).contains(&service) {
			return false;
		}
		LocalEngine::submit(&self.commands_tx, Command::Conflict(service))
	}

	/// Stops the engine thread and waits for it to exit.
	pub fn shutdown(mut self) -> Result<(), ShutdownError> {
		self.thread.shutdown()
	}
}
impl RegistrationEngine for LocalEngineHandle {
	fn register(&self, request: RegisterRequest, handler: RegisterReplyHandler) -> ServiceRef {
		let service = ServiceRef::next();

		let live = Arc::downgrade(&self.live);
		let handler = forget_on_failure(handler, move |service| {
			if let Some(live) = live.upgrade() {
				live.lock().unwrap_or_else(PoisonError::into_inner).remove(&service);
			}
		});
		let notifier = Arc::new(Notifier::new(service, handler));

		self.live.lock().unwrap_or_else(PoisonError::into_inner).insert(service);

		if !LocalEngine::submit(&self.commands_tx, Command::Register { notifier, request }) {
			log::warn!("Local engine is not running, {service} will not be registered");
		}

		service
	}

	fn deregister(&self, service: ServiceRef) -> bool {
		if !self.live.lock().unwrap_or_else(PoisonError::into_inner).remove(&service) {
			return false;
		}
		LocalEngine::submit(&self.commands_tx, Command::Deregister(service));
		true
	}
}
