use crate::{
	errors::{DnsServiceError, ErrorClass},
	flags::ServiceFlags,
};
use std::{
	fmt,
	num::NonZeroU64,
	sync::{
		atomic::{AtomicU64, Ordering},
		Arc,
	},
};

static NEXT_SERVICE_REF: AtomicU64 = AtomicU64::new(1);

#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Identifies one outstanding registration.
///
/// The reference is handed out when a request is submitted to an engine and is carried by
/// every [`RegisterReply`] for that request. It stays owned by whoever submitted the
/// request: releasing it means calling
/// [`RegistrationEngine::deregister`](crate::engine::RegistrationEngine::deregister).
pub struct ServiceRef(NonZeroU64);
impl ServiceRef {
	pub(crate) fn next() -> Self {
		let id = NEXT_SERVICE_REF.fetch_add(1, Ordering::Relaxed);
		Self(NonZeroU64::new(id).unwrap_or(NonZeroU64::MIN))
	}

	#[inline(always)]
	pub fn as_u64(&self) -> u64 {
		self.0.get()
	}
}
impl fmt::Debug for ServiceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "ServiceRef(#{})", self.0)
	}
}
impl fmt::Display for ServiceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "#{}", self.0)
	}
}

/// Completion logic for a registration request.
///
/// Invoked by the engine whenever a registration attempt resolves. The engine decides which
/// thread this runs on, so handlers should hand long-running work off instead of blocking.
pub type RegisterReplyHandler = Arc<dyn Fn(RegisterReply<'_>) + Send + Sync + 'static>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// The outcome of one registration attempt, as delivered to a [`RegisterReplyHandler`].
///
/// The strings are borrowed from the engine and only live for the duration of the call.
/// Use [`to_owned`](RegisterReply::to_owned) to keep them.
pub struct RegisterReply<'a> {
	pub(crate) service: ServiceRef,
	pub(crate) flags: ServiceFlags,
	pub(crate) result: Result<(), DnsServiceError>,
	pub(crate) name: &'a str,
	pub(crate) regtype: &'a str,
	pub(crate) domain: &'a str,
}
impl<'a> RegisterReply<'a> {
	pub fn new(
		service: ServiceRef,
		flags: ServiceFlags,
		result: Result<(), DnsServiceError>,
		name: &'a str,
		regtype: &'a str,
		domain: &'a str,
	) -> Self {
		Self {
			service,
			flags,
			result,
			name,
			regtype,
			domain,
		}
	}

	/// A failed reply with no name, type or domain.
	pub fn failed(service: ServiceRef, error: DnsServiceError) -> RegisterReply<'static> {
		RegisterReply {
			service,
			flags: ServiceFlags::NONE,
			result: Err(error),
			name: "",
			regtype: "",
			domain: "",
		}
	}

	#[inline(always)]
	/// The registration this reply belongs to.
	pub fn service(&self) -> ServiceRef {
		self.service
	}

	#[inline(always)]
	pub fn flags(&self) -> ServiceFlags {
		self.flags
	}

	#[inline(always)]
	pub fn result(&self) -> Result<(), DnsServiceError> {
		self.result
	}

	#[inline(always)]
	pub fn class(&self) -> ErrorClass {
		self.result.into()
	}

	#[inline(always)]
	pub fn is_success(&self) -> bool {
		self.result.is_ok()
	}

	#[inline(always)]
	/// The registered instance name. May differ from the requested one after a rename.
	///
	/// On failure this is whatever the engine reported, possibly empty, and should not be
	/// relied upon except to retry.
	pub fn name(&self) -> &'a str {
		self.name
	}

	#[inline(always)]
	/// The registered service type, e.g. `_ipp._tcp`.
	pub fn regtype(&self) -> &'a str {
		self.regtype
	}

	#[inline(always)]
	/// The registered domain, e.g. `local.`.
	pub fn domain(&self) -> &'a str {
		self.domain
	}

	/// Whether the engine has said it will deliver nothing more for this service.
	pub fn is_terminal(&self) -> bool {
		self.result.is_err() || !self.flags.contains(ServiceFlags::MORE_COMING)
	}

	/// Copies the borrowed strings into an owned reply.
	pub fn to_owned(&self) -> OwnedRegisterReply {
		OwnedRegisterReply {
			service: self.service,
			flags: self.flags,
			result: self.result,
			name: self.name.to_owned(),
			regtype: self.regtype.to_owned(),
			domain: self.domain.to_owned(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// An owned copy of a [`RegisterReply`].
pub struct OwnedRegisterReply {
	pub service: ServiceRef,
	pub flags: ServiceFlags,
	pub result: Result<(), DnsServiceError>,
	pub name: String,
	pub regtype: String,
	pub domain: String,
}
impl OwnedRegisterReply {
	#[inline(always)]
	pub fn class(&self) -> ErrorClass {
		self.result.into()
	}

	/// Borrows this reply back into the shape handlers receive.
	pub fn as_reply(&self) -> RegisterReply<'_> {
		RegisterReply::new(self.service, self.flags, self.result, &self.name, &self.regtype, &self.domain)
	}
}
