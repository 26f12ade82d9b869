use std::{
	fmt,
	ops::{BitAnd, BitOr, BitOrAssign, Not},
};

#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
/// A set of `DNSServiceFlags`.
///
/// Only the flags relevant to registration are named here, but any raw value
/// reported by an engine is preserved.
pub struct ServiceFlags(u32);
impl ServiceFlags {
	/// No flags.
	pub const NONE: Self = Self(0);

	/// More events for the same service reference will follow.
	pub const MORE_COMING: Self = Self(0x1);

	/// The service is registered (as opposed to removed).
	pub const ADD: Self = Self(0x2);

	/// Do not pick a new name on conflict, report `NameConflict` instead.
	pub const NO_AUTO_RENAME: Self = Self(0x8);

	/// Allow the same name to be registered more than once.
	pub const SHARED: Self = Self(0x10);

	/// The name must be unique on the network.
	pub const UNIQUE: Self = Self(0x20);

	/// Answer queries coming from outside the local link.
	pub const ALLOW_REMOTE_QUERY: Self = Self(0x200);

	/// Register over all available interfaces, including peer-to-peer ones.
	pub const INCLUDE_P2P: Self = Self(0x20000);

	#[inline(always)]
	pub const fn from_bits(bits: u32) -> Self {
		Self(bits)
	}

	#[inline(always)]
	pub const fn bits(&self) -> u32 {
		self.0
	}

	#[inline(always)]
	pub const fn contains(&self, other: Self) -> bool {
		self.0 & other.0 == other.0
	}

	#[inline(always)]
	pub const fn is_empty(&self) -> bool {
		self.0 == 0
	}

	#[inline(always)]
	pub fn insert(&mut self, other: Self) {
		self.0 |= other.0;
	}

	#[inline(always)]
	pub fn remove(&mut self, other: Self) {
		self.0 &= !other.0;
	}
}
impl BitOr for ServiceFlags {
	type Output = Self;

	#[inline(always)]
	fn bitor(self, rhs: Self) -> Self {
		Self(self.0 | rhs.0)
	}
}
impl BitOrAssign for ServiceFlags {
	#[inline(always)]
	fn bitor_assign(&mut self, rhs: Self) {
		self.0 |= rhs.0;
	}
}
impl BitAnd for ServiceFlags {
	type Output = Self;

	#[inline(always)]
	fn bitand(self, rhs: Self) -> Self {
		Self(self.0 & rhs.0)
	}
}
impl Not for ServiceFlags {
	type Output = Self;

	#[inline(always)]
	fn not(self) -> Self {
		Self(!self.0)
	}
}
impl fmt::Debug for ServiceFlags {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		const NAMES: &[(ServiceFlags, &str)] = &[
			(ServiceFlags::MORE_COMING, "MORE_COMING"),
			(ServiceFlags::ADD, "ADD"),
			(ServiceFlags::NO_AUTO_RENAME, "NO_AUTO_RENAME"),
			(ServiceFlags::SHARED, "SHARED"),
			(ServiceFlags::UNIQUE, "UNIQUE"),
			(ServiceFlags::ALLOW_REMOTE_QUERY, "ALLOW_REMOTE_QUERY"),
			(ServiceFlags::INCLUDE_P2P, "INCLUDE_P2P"),
		];

		if self.is_empty() {
			return f.write_str("ServiceFlags(NONE)");
		}

		let mut rest = self.0;
		let mut names = Vec::new();
		for (flag, name) in NAMES {
			if self.contains(*flag) {
				names.push((*name).to_owned());
				rest &= !flag.0;
			}
		}
		if rest != 0 {
			names.push(format!("{rest:#x}"));
		}

		write!(f, "ServiceFlags({})", names.join(" | "))
	}
}
