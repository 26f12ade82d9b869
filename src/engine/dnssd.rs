//! Registration through the system's DNS-SD daemon (`mDNSResponder` on Apple platforms,
//! `avahi-compat-libdns_sd` or `mDNSResponder` elsewhere).
//!
//! All calls into `dns_sd` happen on one engine thread. Each registration's connection to the
//! daemon is watched with [`AsyncFd`], and replies are delivered from inside
//! `DNSServiceProcessResult` on that thread, so handlers must not block.

use super::{forget_on_failure, thread::EngineThread, RegistrationEngine};
use crate::{
	errors::{DnsServiceError, ShutdownError},
	register::{
		raw::{register_reply_thunk, RawRegisterReply, RawServiceRef},
		Notifier, RegisterReplyHandler, RegisterRequest, ServiceRef,
	},
};
use libc::{c_char, c_int, c_void};
use std::{
	collections::HashMap,
	ffi::CString,
	os::unix::io::{AsRawFd, RawFd},
	ptr::{self, NonNull},
	sync::{Arc, Mutex, PoisonError},
};
use tokio::{
	io::unix::AsyncFd,
	sync::{mpsc::UnboundedSender, oneshot},
};

mod ffi {
	use super::*;

	#[cfg_attr(not(target_vendor = "apple"), link(name = "dns_sd"))]
	extern "C" {
		pub fn DNSServiceRegister(
			sd_ref: *mut RawServiceRef,
			flags: u32,
			interface_index: u32,
			name: *const c_char,
			regtype: *const c_char,
			domain: *const c_char,
			host: *const c_char,
			port: u16,
			txt_len: u16,
			txt_record: *const c_void,
			callback: Option<RawRegisterReply>,
			context: *mut c_void,
		) -> i32;

		pub fn DNSServiceRefSockFD(sd_ref: RawServiceRef) -> c_int;

		pub fn DNSServiceProcessResult(sd_ref: RawServiceRef) -> i32;

		pub fn DNSServiceRefDeallocate(sd_ref: RawServiceRef);
	}
}

/// An initialized `DNSServiceRef`. Deallocating it withdraws the registration.
struct SdRef(NonNull<c_void>);
impl AsRawFd for SdRef {
	fn as_raw_fd(&self) -> RawFd {
		unsafe { ffi::DNSServiceRefSockFD(self.0.as_ptr()) }
	}
}
impl Drop for SdRef {
	fn drop(&mut self) {
		unsafe { ffi::DNSServiceRefDeallocate(self.0.as_ptr()) }
	}
}

struct Registration {
	notifier: Arc<Notifier>,
	request: RegisterRequest,
	stop_rx: oneshot::Receiver<()>,
}

fn c_string(value: Option<&str>) -> Result<Option<CString>, DnsServiceError> {
	value.map(CString::new).transpose().map_err(|_| DnsServiceError::BadParam)
}

fn opt_ptr(value: &Option<CString>) -> *const c_char {
	value.as_ref().map_or(ptr::null(), |value| value.as_ptr())
}

/// A running connection to the system's DNS-SD daemon.
pub struct DnsSdEngine {
	thread: EngineThread,
	registrations_tx: UnboundedSender<Registration>,
	live: Arc<Mutex<HashMap<ServiceRef, oneshot::Sender<()>>>>,
}
impl DnsSdEngine {
	/// Starts the engine thread.
	///
	/// Whether the daemon is reachable is only known once something is registered: if it is
	/// not, the registration fails with `ServiceNotRunning`.
	pub fn new() -> Result<Self, std::io::Error> {
		let (registrations_tx, mut registrations_rx) = tokio::sync::mpsc::unbounded_channel::<Registration>();

		let thread = EngineThread::spawn("dnssd-registrar dns_sd engine (Tokio)", move |runtime, shutdown_rx| {
			let local = tokio::task::LocalSet::new();

			local.block_on(&runtime, async move {
				let start_loop = async {
					while let Some(registration) = registrations_rx.recv().await {
						Self::start(registration);
					}
				};

				tokio::select! {
					biased;
					_ = shutdown_rx => {},
					_ = start_loop => {},
				}
			});

			// Deallocates every remaining DNSServiceRef while the runtime is still around.
			drop(local);
		})?;

		Ok(Self {
			thread,
			registrations_tx,
			live: Arc::new(Mutex::new(HashMap::new())),
		})
	}

	fn start(registration: Registration) {
		let Registration { notifier, request, stop_rx } = registration;

		let (name, regtype, domain, host) = match (
			c_string(request.name()),
			c_string(Some(request.regtype().to_engine_string().as_str())),
			c_string(request.domain()),
			c_string(request.host()),
		) {
			(Ok(name), Ok(Some(regtype)), Ok(domain), Ok(host)) => (name, regtype, domain, host),
			_ => {
				notifier.fail(DnsServiceError::BadParam);
				return;
			}
		};

		let txt = request.txt().to_wire();
		let txt_len = match u16::try_from(txt.len()) {
			Ok(len) => len,
			Err(_) => {
				notifier.fail(DnsServiceError::BadParam);
				return;
			}
		};

		let mut raw: RawServiceRef = ptr::null_mut();
		let code = unsafe {
			ffi::DNSServiceRegister(
				&mut raw,
				request.flags().bits(),
				request.interface().as_raw(),
				opt_ptr(&name),
				regtype.as_ptr(),
				opt_ptr(&domain),
				opt_ptr(&host),
				request.port().to_be(),
				txt_len,
				txt.as_ptr() as *const c_void,
				Some(register_reply_thunk as RawRegisterReply),
				notifier.as_context(),
			)
		};

		if let Err(err) = DnsServiceError::check(code) {
			log::warn!("DNSServiceRegister failed for {}: {err}", notifier.service());
			notifier.fail(err);
			return;
		}

		let sd_ref = match NonNull::new(raw) {
			Some(raw) => SdRef(raw),
			None => {
				notifier.fail(DnsServiceError::Unknown);
				return;
			}
		};

		let fd = match AsyncFd::new(sd_ref) {
			Ok(fd) => fd,
			Err(err) => {
				log::error!("Failed to watch the daemon connection of {}: {err}", notifier.service());
				notifier.fail(DnsServiceError::DefunctConnection);
				return;
			}
		};

		tokio::task::spawn_local(Self::drive(fd, notifier, stop_rx));
	}

	async fn drive(fd: AsyncFd<SdRef>, notifier: Arc<Notifier>, mut stop_rx: oneshot::Receiver<()>) {
		loop {
			tokio::select! {
				biased;
				_ = &mut stop_rx => break,

				guard = fd.readable() => {
					let mut guard = match guard {
						Ok(guard) => guard,
						Err(err) => {
							log::error!("Daemon connection of {} failed: {err}", notifier.service());
							notifier.fail(DnsServiceError::DefunctConnection);
							break;
						}
					};

					// Calls back into register_reply_thunk with `notifier` as the context.
					let code = unsafe { ffi::DNSServiceProcessResult(fd.get_ref().0.as_ptr()) };
					guard.clear_ready();

					if let Err(err) = DnsServiceError::check(code) {
						log::warn!("DNSServiceProcessResult failed for {}: {err}", notifier.service());
						notifier.fail(err);
						break;
					}
				}
			}
		}

		// The daemon can no longer call back once the reference is deallocated.
		drop(fd);
		drop(notifier);
	}

	/// Withdraws every registration and stops the engine thread.
	pub fn shutdown(mut self) -> Result<(), ShutdownError> {
		self.thread.shutdown()
	}
}
impl RegistrationEngine for DnsSdEngine {
	fn register(&self, request: RegisterRequest, handler: RegisterReplyHandler) -> ServiceRef {
		let service = ServiceRef::next();

		let live = Arc::downgrade(&self.live);
		let handler = forget_on_failure(handler, move |service| {
			if let Some(live) = live.upgrade() {
				live.lock().unwrap_or_else(PoisonError::into_inner).remove(&service);
			}
		});
		let notifier = Arc::new(Notifier::new(service, handler));
		let (stop_tx, stop_rx) = oneshot::channel();

		self.live.lock().unwrap_or_else(PoisonError::into_inner).insert(service, stop_tx);

		if self.registrations_tx.send(Registration { notifier, request, stop_rx }).is_err() {
			log::warn!("dns_sd engine is not running, {service} will not be registered");
		}

		service
	}

	fn deregister(&self, service: ServiceRef) -> bool {
		match self.live.lock().unwrap_or_else(PoisonError::into_inner).remove(&service) {
			Some(stop_tx) => {
				stop_tx.send(()).ok();
				true
			}
			None => false,
		}
	}
}
