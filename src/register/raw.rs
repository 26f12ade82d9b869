//! The C-ABI shape of the registration reply callback.
//!
//! `dns_sd` reports completions through a plain function pointer plus an opaque context
//! pointer. [`register_reply_thunk`] is such a function: pass it as the callback and a
//! [`Notifier`] (via [`Notifier::as_context`]) as the context.

use super::{Notifier, RegisterReply};
use crate::{errors::DnsServiceError, flags::ServiceFlags};
use libc::{c_char, c_void};
use std::{borrow::Cow, ffi::CStr};

/// `DNSServiceRef`
pub type RawServiceRef = *mut c_void;

/// `DNSServiceRegisterReply`
pub type RawRegisterReply = unsafe extern "C" fn(
	sd_ref: RawServiceRef,
	flags: u32,
	error_code: i32,
	name: *const c_char,
	regtype: *const c_char,
	domain: *const c_char,
	context: *mut c_void,
);

impl Notifier {
	/// The context pointer to pair with [`register_reply_thunk`].
	///
	/// The pointer borrows `self`: the notifier must stay alive until the engine can no longer
	/// call back, i.e. until the registration is deallocated.
	pub fn as_context(&self) -> *mut c_void {
		self as *const Notifier as *mut c_void
	}
}

unsafe fn borrow_c_str<'a>(ptr: *const c_char) -> Cow<'a, str> {
	if ptr.is_null() {
		Cow::Borrowed("")
	} else {
		CStr::from_ptr(ptr).to_string_lossy()
	}
}

/// Forwards a `dns_sd` registration reply to the [`Notifier`] passed as `context`.
///
/// # Safety
///
/// `context` must come from [`Notifier::as_context`] on a notifier that is still alive, and
/// the string pointers must be null or point to NUL-terminated strings valid for the call.
pub unsafe extern "C" fn register_reply_thunk(
	_sd_ref: RawServiceRef,
	flags: u32,
	error_code: i32,
	name: *const c_char,
	regtype: *const c_char,
	domain: *const c_char,
	context: *mut c_void,
) {
	let notifier = match (context as *const Notifier).as_ref() {
		Some(notifier) => notifier,
		None => {
			log::error!("dns_sd register reply without a context");
			return;
		}
	};

	let result = DnsServiceError::check(error_code);
	let (name, regtype, domain) = (borrow_c_str(name), borrow_c_str(regtype), borrow_c_str(domain));

	let reply = RegisterReply::new(notifier.service(), ServiceFlags::from_bits(flags), result, &name, &regtype, &domain);

	// Handler panics are contained by the notifier, nothing unwinds back into C.
	notifier.deliver(reply);
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::{
		errors::ErrorClass,
		register::{OwnedRegisterReply, RegisterReplyHandler, ServiceRef},
	};
	use std::{
		ffi::CString,
		ptr,
		sync::{Arc, Mutex},
	};

	fn notifier() -> (Notifier, Arc<Mutex<Vec<OwnedRegisterReply>>>) {
		let replies = Arc::new(Mutex::new(Vec::new()));
		let replies_ref = replies.clone();
		let handler: RegisterReplyHandler = Arc::new(move |reply: RegisterReply<'_>| replies_ref.lock().unwrap().push(reply.to_owned()));
		(Notifier::new(ServiceRef::next(), handler), replies)
	}

	#[test]
	fn thunk_copies_c_strings() {
		let (notifier, replies) = notifier();
		let name = CString::new("Printer").unwrap();
		let regtype = CString::new("_ipp._tcp.").unwrap();
		let domain = CString::new("local.").unwrap();

		unsafe {
			register_reply_thunk(
				ptr::null_mut(),
				ServiceFlags::ADD.bits(),
				0,
				name.as_ptr(),
				regtype.as_ptr(),
				domain.as_ptr(),
				notifier.as_context(),
			);
		}
		drop((name, regtype, domain));

		let replies = replies.lock().unwrap();
		assert_eq!(replies.len(), 1);
		assert_eq!(replies[0].service, notifier.service());
		assert_eq!(replies[0].flags, ServiceFlags::ADD);
		assert_eq!(replies[0].name, "Printer");
		assert_eq!(replies[0].regtype, "_ipp._tcp.");
		assert_eq!(replies[0].domain, "local.");
	}

	#[test]
	fn thunk_accepts_null_strings_on_error() {
		let (notifier, replies) = notifier();

		unsafe {
			register_reply_thunk(ptr::null_mut(), 0, -65563, ptr::null(), ptr::null(), ptr::null(), notifier.as_context());
		}

		let replies = replies.lock().unwrap();
		assert_eq!(replies[0].class(), ErrorClass::EngineUnavailable);
		assert_eq!(replies[0].name, "");
	}

	#[test]
	fn thunk_contains_handler_panics() {
		let handler: RegisterReplyHandler = Arc::new(|_reply: RegisterReply<'_>| panic!("handler failure"));
		let notifier = Notifier::new(ServiceRef::next(), handler);

		unsafe {
			register_reply_thunk(ptr::null_mut(), 0, -65548, ptr::null(), ptr::null(), ptr::null(), notifier.as_context());
		}

		assert_eq!(notifier.state(), crate::register::RegistrationState::Completed);
	}

	#[test]
	fn thunk_without_context_does_nothing() {
		unsafe {
			register_reply_thunk(ptr::null_mut(), 0, 0, ptr::null(), ptr::null(), ptr::null(), ptr::null_mut());
		}
	}
}
