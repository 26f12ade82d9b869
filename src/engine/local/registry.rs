use super::LocalEngineConfig;
use crate::{
	errors::DnsServiceError,
	flags::ServiceFlags,
	register::{Notifier, RegisterReply, RegisterRequest, ServiceRef},
};
use std::{collections::HashMap, sync::Arc};

struct LocalRegistration {
	notifier: Arc<Notifier>,
	name: String,
	regtype: String,
	domain: String,
	auto_rename: bool,
	shared: bool,
	watch_conflicts: bool,
}
impl LocalRegistration {
	fn deliver(&self, flags: ServiceFlags, result: Result<(), DnsServiceError>) {
		self.notifier
			.deliver(RegisterReply::new(self.notifier.service(), flags, result, &self.name, &self.regtype, &self.domain));
	}

	fn live_flags(&self) -> ServiceFlags {
		if self.watch_conflicts {
			ServiceFlags::ADD | ServiceFlags::MORE_COMING
		} else {
			ServiceFlags::ADD
		}
	}
}

/// Splits `"Printer (3)"` into `("Printer", 3)`. Names without a suffix count as the first one.
fn split_rename_suffix(name: &str) -> (&str, u32) {
	name.strip_suffix(')')
		.and_then(|rest| rest.rsplit_once(" ("))
		.and_then(|(base, n)| Some((base, n.parse::<u32>().ok().filter(|n| *n >= 2)?)))
		.unwrap_or((name, 1))
}

/// The registrations a [`LocalEngine`](super::LocalEngine) currently holds.
///
/// Only ever touched from the engine thread.
pub(super) struct LocalRegistry {
	config: LocalEngineConfig,
	services: HashMap<ServiceRef, LocalRegistration>,
}
impl LocalRegistry {
	pub(super) fn new(config: LocalEngineConfig) -> Self {
		Self {
			config,
			services: HashMap::new(),
		}
	}

	fn is_taken(&self, name: &str, regtype: &str, domain: &str) -> bool {
		self.services.values().any(|service| {
			!service.shared
				&& service.name.eq_ignore_ascii_case(name)
				&& service.regtype.eq_ignore_ascii_case(regtype)
				&& service.domain.eq_ignore_ascii_case(domain)
		})
	}

	fn next_free_name(&self, name: &str, regtype: &str, domain: &str) -> String {
		let (base, n) = split_rename_suffix(name);
		(n.saturating_add(1)..=u32::MAX)
			.map(|n| format!("{base} ({n})"))
			.find(|candidate| !self.is_taken(candidate, regtype, domain))
			.unwrap_or_else(|| format!("{base} ({})", ServiceRef::next()))
	}

	pub(super) fn register(&mut self, notifier: Arc<Notifier>, request: RegisterRequest) {
		if !self.config.available {
			log::debug!("Local engine unavailable, rejecting {}", notifier.service());
			notifier.fail(DnsServiceError::ServiceNotRunning);
			return;
		}

		let mut registration = LocalRegistration {
			name: request.name().unwrap_or(&self.config.default_name).to_owned(),
			regtype: request.regtype().base(),
			domain: request.domain().unwrap_or(&self.config.default_domain).to_owned(),
			auto_rename: request.auto_rename(),
			shared: request.flags().contains(ServiceFlags::SHARED),
			watch_conflicts: request.watch_conflicts(),
			notifier,
		};

		if !registration.shared && self.is_taken(&registration.name, &registration.regtype, &registration.domain) {
			if !registration.auto_rename {
				log::debug!("{:?} is taken, not renaming {}", registration.name, registration.notifier.service());
				registration.deliver(ServiceFlags::NONE, Err(DnsServiceError::NameConflict));
				return;
			}

			let renamed = self.next_free_name(&registration.name, &registration.regtype, &registration.domain);
			log::debug!("{:?} is taken, renaming {} to {renamed:?}", registration.name, registration.notifier.service());
			registration.name = renamed;
		}

		registration.deliver(registration.live_flags(), Ok(()));
		self.services.insert(registration.notifier.service(), registration);
	}

	pub(super) fn deregister(&mut self, service: ServiceRef) {
		if let Some(registration) = self.services.remove(&service) {
			log::debug!("Deregistered {service} ({:?})", registration.name);
			if registration.watch_conflicts {
				registration.deliver(ServiceFlags::NONE, Ok(()));
			}
		}
	}

	/// Acts as if another host on the network claimed the name of `service`.
	pub(super) fn conflict(&mut self, service: ServiceRef) {
		let registration = match self.services.get(&service) {
			Some(registration) => registration,
			None => return,
		};

		if !registration.auto_rename {
			if let Some(registration) = self.services.remove(&service) {
				registration.deliver(ServiceFlags::NONE, Err(DnsServiceError::NameConflict));
			}
			return;
		}

		let renamed = self.next_free_name(&registration.name, &registration.regtype, &registration.domain);
		if let Some(registration) = self.services.get_mut(&service) {
			log::debug!("Conflict on {service}, renaming {:?} to {renamed:?}", registration.name);
			registration.name = renamed;
			if registration.watch_conflicts {
				registration.deliver(registration.live_flags(), Ok(()));
			}
		}
	}
}
