//! An async front end for advertising services.
//!
//! [`Registrar`] wraps an engine, waits for the first reply of each registration and keeps
//! successful registrations alive until they are deregistered or the registrar is dropped.

use crate::{
	engine::RegistrationEngine,
	errors::DnsServiceError,
	flags::ServiceFlags,
	register::{RegisterReply, RegisterRequest, ServiceRef},
};
use std::{
	sync::{Arc, Mutex, PoisonError},
	time::Duration,
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug, PartialEq, Eq)]
/// A service that is currently advertised.
pub struct Registration {
	service: ServiceRef,
	flags: ServiceFlags,
	name: String,
	regtype: String,
	domain: String,
}
impl Registration {
	#[inline(always)]
	pub fn service(&self) -> ServiceRef {
		self.service
	}

	#[inline(always)]
	pub fn flags(&self) -> ServiceFlags {
		self.flags
	}

	#[inline(always)]
	/// The name the service ended up with.
	pub fn name(&self) -> &str {
		&self.name
	}

	#[inline(always)]
	pub fn regtype(&self) -> &str {
		&self.regtype
	}

	#[inline(always)]
	pub fn domain(&self) -> &str {
		&self.domain
	}
}

type FirstReply = Result<Registration, DnsServiceError>;
type Registrations = Arc<Mutex<Vec<Registration>>>;

/// Applies a reply that arrived after the first one to the registration it belongs to.
fn apply_later_reply(registrations: &Mutex<Vec<Registration>>, reply: RegisterReply<'_>) {
	let mut registrations = registrations.lock().unwrap_or_else(PoisonError::into_inner);
	let index = match registrations.iter().position(|registration| registration.service == reply.service()) {
		Some(index) => index,
		None => return,
	};

	if reply.is_success() && reply.flags().contains(ServiceFlags::ADD) {
		let registration = &mut registrations[index];
		log::debug!("Registration {} renamed from {:?} to {:?}", reply.service(), registration.name, reply.name());
		registration.flags = reply.flags();
		registration.name = reply.name().to_owned();
		registration.regtype = reply.regtype().to_owned();
		registration.domain = reply.domain().to_owned();
	} else {
		log::debug!("Registration {} ended: {:?}", reply.service(), reply.result());
		registrations.remove(index);
	}
}

pub struct Registrar<E: RegistrationEngine> {
	engine: E,
	timeout: Duration,
	registrations: Registrations,
}
impl<E: RegistrationEngine> Registrar<E> {
	pub fn new(engine: E) -> Self {
		Self {
			engine,
			timeout: DEFAULT_TIMEOUT,
			registrations: Arc::new(Mutex::new(Vec::new())),
		}
	}

	/// How long [`register`](Registrar::register) waits for the engine to answer. Defaults to 10 seconds.
	pub fn with_timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;
		self
	}

	#[inline(always)]
	pub fn engine(&self) -> &E {
		&self.engine
	}

	/// Registers a service and waits for the engine's answer.
	///
	/// On failure nothing stays registered.
	pub async fn register(&self, request: RegisterRequest) -> Result<Registration, DnsServiceError> {
		let (reply_tx, reply_rx) = tokio::sync::oneshot::channel::<FirstReply>();
		let reply_tx = Mutex::new(Some(reply_tx));
		let registrations = Arc::downgrade(&self.registrations);

		let service = self.engine.register_with(request, move |reply: RegisterReply<'_>| {
			let registrations = match registrations.upgrade() {
				Some(registrations) => registrations,
				None => return,
			};

			let reply_tx = match reply_tx.lock().unwrap_or_else(PoisonError::into_inner).take() {
				Some(reply_tx) => reply_tx,
				None => return apply_later_reply(&registrations, reply),
			};

			let first = reply.result().map(|()| Registration {
				service: reply.service(),
				flags: reply.flags(),
				name: reply.name().to_owned(),
				regtype: reply.regtype().to_owned(),
				domain: reply.domain().to_owned(),
			});

			// Recorded under the lock so a registration that timed out in the meantime is not resurrected.
			let mut registrations = registrations.lock().unwrap_or_else(PoisonError::into_inner);
			let registration = first.as_ref().ok().cloned();
			if reply_tx.send(first).is_ok() {
				registrations.extend(registration);
			}
		});

		let result = match tokio::time::timeout(self.timeout, reply_rx).await {
			Ok(Ok(result)) => result,
			Ok(Err(_)) => Err(DnsServiceError::ServiceNotRunning),
			Err(_) => Err(DnsServiceError::Timeout),
		};

		match result {
			Ok(registration) => {
				log::debug!("Registered {:?} as {}", registration.name, service);
				Ok(registration)
			}
			Err(err) => {
				log::warn!("Registration {service} failed: {err}");
				self.registrations
					.lock()
					.unwrap_or_else(PoisonError::into_inner)
					.retain(|registration| registration.service != service);
				self.engine.deregister(service);
				Err(err)
			}
		}
	}

	/// Withdraws a registration made through this registrar.
	pub fn deregister(&self, service: ServiceRef) -> bool {
		let mut registrations = self.registrations.lock().unwrap_or_else(PoisonError::into_inner);
		let before = registrations.len();
		registrations.retain(|registration| registration.service != service);
		if registrations.len() == before {
			return false;
		}
		drop(registrations);

		self.engine.deregister(service)
	}

	/// The registrations currently held, with renames reported by the engine applied.
	pub fn registrations(&self) -> Vec<Registration> {
		self.registrations.lock().unwrap_or_else(PoisonError::into_inner).clone()
	}
}
impl<E: RegistrationEngine> Drop for Registrar<E> {
	fn drop(&mut self) {
		let registrations = std::mem::take(&mut *self.registrations.lock().unwrap_or_else(PoisonError::into_inner));
		for registration in registrations {
			self.engine.deregister(registration.service);
		}
	}
}
