//! Registration requests and the completion contract engines report back through.
//!
//! A registration is submitted to a [`RegistrationEngine`](crate::engine::RegistrationEngine)
//! together with a [`RegisterReplyHandler`]. When the attempt resolves, the engine calls the
//! handler with a [`RegisterReply`]:
//!
//! * at most once per [`ServiceRef`] at a time, in the order the engine produced the replies;
//! * exactly once with a terminal reply (an error, or no [`ServiceFlags::MORE_COMING`]);
//! * on success, with the final name, type and domain (which may differ from the request if
//!   the engine renamed the service to avoid a collision).
//!
//! Errors are never raised any other way: the handler is the only channel back to the caller.
//!
//! [`ServiceFlags::MORE_COMING`]: crate::flags::ServiceFlags::MORE_COMING

mod reply;
pub use reply::{OwnedRegisterReply, RegisterReply, RegisterReplyHandler, ServiceRef};

mod notifier;
pub use notifier::{Notifier, RegistrationState};

pub mod raw;

mod request;
pub use request::{RegType, RegisterRequest, RegisterRequestBuilder};

mod txt;
pub use txt::{TxtEntries, TxtRecord};
