//! Engines that carry out registrations.
//!
//! The crate does not speak multicast DNS itself. An engine is whatever does: the system's
//! `dns_sd` daemon ([`DnsSdEngine`](dnssd::DnsSdEngine), feature `dns-sd`), or the in-process
//! [`LocalEngine`](local::LocalEngine) (feature `local`), which keeps registrations in memory
//! and is meant for hosts without a daemon and for tests.

use crate::register::{RegisterReply, RegisterReplyHandler, RegisterRequest, ServiceRef};
use std::sync::Arc;

mod thread;

#[cfg(feature = "local")]
#[cfg_attr(docsrs, doc(cfg(feature = "local")))]
pub mod local;

#[cfg(all(feature = "dns-sd", unix))]
#[cfg_attr(docsrs, doc(cfg(all(feature = "dns-sd", unix))))]
pub mod dnssd;

/// Something that can register services on behalf of the caller.
///
/// Implementations must deliver every reply through a [`Notifier`](crate::register::Notifier)
/// built for the returned [`ServiceRef`], and must document which thread replies arrive on.
pub trait RegistrationEngine: Send + Sync {
	/// Submits a registration.
	///
	/// This never fails synchronously. The returned reference identifies the request, and
	/// every outcome, including "the engine is not running", reaches `handler`.
	///
	/// If the engine has already stopped, `handler` receives `ServiceNotRunning` on the calling
	/// thread before this returns. Do not hold a lock across this call that the handler also
	/// takes.
	fn register(&self, request: RegisterRequest, handler: RegisterReplyHandler) -> ServiceRef;

	/// Withdraws a registration. Returns `false` if the reference is unknown to this engine or
	/// its registration already ended in a failure.
	fn deregister(&self, service: ServiceRef) -> bool;

	/// [`register`](RegistrationEngine::register) with a closure.
	fn register_with<F>(&self, request: RegisterRequest, handler: F) -> ServiceRef
	where
		Self: Sized,
		F: Fn(RegisterReply<'_>) + Send + Sync + 'static,
	{
		self.register(request, Arc::new(handler))
	}
}
/// Wraps `handler` so that `forget` runs for a service as soon as a failed reply for it is
/// delivered, before the handler sees it.
pub(crate) fn forget_on_failure<F>(handler: RegisterReplyHandler, forget: F) -> RegisterReplyHandler
where
	F: Fn(ServiceRef) + Send + Sync + 'static,
{
	Arc::new(move |reply: RegisterReply<'_>| {
		if reply.result().is_err() {
			forget(reply.service());
		}
		(handler)(reply)
	})
}

impl<E: RegistrationEngine + ?Sized> RegistrationEngine for Arc<E> {
	#[inline(always)]
	fn register(&self, request: RegisterRequest, handler: RegisterReplyHandler) -> ServiceRef {
		(**self).register(request, handler)
	}

	#[inline(always)]
	fn deregister(&self, service: ServiceRef) -> bool {
		(**self).deregister(service)
	}
}
