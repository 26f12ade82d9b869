#![cfg_attr(docsrs, feature(doc_cfg))]

#[macro_use]
extern crate thiserror;

mod util;

pub mod engine;
pub mod errors;
pub mod flags;
pub mod net;
pub mod register;
pub mod registrar;

/// The domain services are registered in when the request does not name one.
pub const DEFAULT_DOMAIN: &str = "local.";

pub use trust_dns_client as dns;
