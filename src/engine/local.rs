//! An in-process engine.
//!
//! [`LocalEngine`] implements the registration side of DNS-SD without a network: names are
//! checked against the other registrations of the same engine, collisions are resolved the
//! way `mDNSResponder` does it (`"Printer"`, `"Printer (2)"`, `"Printer (3)"`, ...), and replies
//! are delivered on a dedicated engine thread, one at a time, in submission order.
//!
//! Handlers run on that thread. A handler that blocks holds up every other registration of
//! the engine.

use super::thread::EngineThread;
use crate::register::{Notifier, RegisterRequest, ServiceRef};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

mod builder;
pub use builder::LocalEngineBuilder;

mod handle;
pub use handle::LocalEngineHandle;

mod registry;
use registry::LocalRegistry;

pub(crate) const DEFAULT_NAME: &str = "Rust DNS-SD";

#[derive(Clone, Debug)]
pub(crate) struct LocalEngineConfig {
	pub(crate) default_name: String,
	pub(crate) default_domain: String,
	pub(crate) available: bool,
}

pub(crate) enum Command {
	Register { notifier: Arc<Notifier>, request: RegisterRequest },
	Deregister(ServiceRef),
	Conflict(ServiceRef),
}

/// A configured, not yet running, in-process engine.
///
/// This can be created using the [`LocalEngineBuilder`].
pub struct LocalEngine {
	config: LocalEngineConfig,
}
impl LocalEngine {
	/// Starts the engine thread.
	pub fn run_background(self) -> Result<LocalEngineHandle, std::io::Error> {
		let LocalEngine { config } = self;

		let (commands_tx, commands_rx) = tokio::sync::mpsc::unbounded_channel();

		let thread = EngineThread::spawn("dnssd-registrar local engine (Tokio)", move |runtime, shutdown_rx| {
			runtime.block_on(async move {
				let mut registry = LocalRegistry::new(config);
				let mut commands_rx = commands_rx;

				tokio::select! {
					biased;
					_ = shutdown_rx => {},
					_ = Self::command_loop(&mut commands_rx, &mut registry) => {},
				}

				log::debug!("Local engine shutting down");
			})
		})?;

		Ok(LocalEngineHandle::new(thread, commands_tx))
	}

	async fn command_loop(commands_rx: &mut UnboundedReceiver<Command>, registry: &mut LocalRegistry) {
		while let Some(command) = commands_rx.recv().await {
			match command {
				Command::Register { notifier, request } => registry.register(notifier, request),
				Command::Deregister(service) => registry.deregister(service),
				Command::Conflict(service) => registry.conflict(service),
			}
		}
	}

	pub(crate) fn submit(commands_tx: &UnboundedSender<Command>, command: Command) -> bool {
		// A failed send drops the command, and with it any pending notifier, which reports
		// the engine as not running.
		commands_tx.send(command).is_ok()
	}
}
