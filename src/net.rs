//! Networking utilities and abstractions

use std::{net::IpAddr, num::NonZeroU32};

/// The [`if_addrs`](https://crates.io/crates/if_addrs) crate is used to discover network interfaces on the system.
///
/// Here is a re-export for your convenience.
pub use if_addrs;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// The interface a service is registered on.
///
/// Interfaces are identified by their index, which is unique for the lifetime of the system.
pub enum InterfaceIndex {
	#[default]
	/// Register on all interfaces (`kDNSServiceInterfaceIndexAny`).
	Any,

	/// Only visible to clients on this machine (`kDNSServiceInterfaceIndexLocalOnly`).
	LocalOnly,

	/// Register on the given interface only.
	Specific(NonZeroU32),
}
impl InterfaceIndex {
	const LOCAL_ONLY: u32 = u32::MAX;

	/// Attempts to resolve the interface index from the given interface name.
	pub fn from_name(name: &str) -> Result<Self, std::io::Error> {
		Ok(Self::Specific(crate::util::iface_name_to_index(name)?))
	}

	/// Attempts to resolve the interface index of the interface that owns the given address.
	pub fn from_addr(addr: &IpAddr) -> Result<Self, std::io::Error> {
		if_addrs::get_if_addrs()?
			.into_iter()
			.find_map(|iface| if iface.ip() == *addr { Self::from_name(&iface.name).ok() } else { None })
			.ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "Interface not found"))
	}

	/// Creates an `InterfaceIndex` from the raw value used by the `dns_sd` C API.
	pub fn from_raw(raw: u32) -> Self {
		match raw {
			Self::LOCAL_ONLY => Self::LocalOnly,
			raw => NonZeroU32::new(raw).map(Self::Specific).unwrap_or(Self::Any),
		}
	}

	#[inline(always)]
	/// Returns the raw value used by the `dns_sd` C API.
	pub fn as_raw(&self) -> u32 {
		match self {
			Self::Any => 0,
			Self::LocalOnly => Self::LOCAL_ONLY,
			Self::Specific(index) => index.get(),
		}
	}

	/// Returns the name of the interface, if this is a specific one.
	pub fn name(&self) -> Result<Option<String>, std::io::Error> {
		let index = match self {
			Self::Specific(index) => *index,
			_ => return Ok(None),
		};

		if_addrs::get_if_addrs()?
			.into_iter()
			.find_map(|iface| match crate::util::iface_name_to_index(&iface.name) {
				Ok(found) if found == index => Some(Some(iface.name)),
				_ => None,
			})
			.ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, "Interface not found"))
	}
}
