use super::TxtRecord;
use crate::{
	errors::{RequestBuilderError, TxtRecordError},
	flags::ServiceFlags,
	net::InterfaceIndex,
	util::fqdn_string,
};
use std::fmt;
use trust_dns_client::rr::Name as DnsName;

const SERVICE_LABEL_MAX_LEN: usize = 15;
const NAME_MAX_LEN: usize = 63;

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// A service type such as `_ipp._tcp`, optionally with subtypes (`_ipp._tcp,_universal`).
pub struct RegType {
	service: String,
	protocol: String,
	subtypes: Vec<String>,
}
impl RegType {
	pub fn parse(regtype: &str) -> Result<Self, RequestBuilderError> {
		let bad = || RequestBuilderError::BadRegType(regtype.to_owned());

		let mut parts = regtype.split(',');
		let base = parts.next().unwrap_or_default();
		let base = base.strip_suffix('.').unwrap_or(base);

		let name = DnsName::from_ascii(base).map_err(|_| bad())?;
		let labels = name.iter().map(|label| String::from_utf8_lossy(label).into_owned()).collect::<Vec<_>>();
		let (service, protocol) = match labels.as_slice() {
			[service, protocol] => (service, protocol),
			_ => return Err(bad()),
		};

		let service_label = service.strip_prefix('_').ok_or_else(bad)?;
		if service_label.is_empty()
			|| service_label.len() > SERVICE_LABEL_MAX_LEN
			|| !service_label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
			|| !service_label.bytes().any(|b| b.is_ascii_alphabetic())
		{
			return Err(bad());
		}

		let protocol = protocol.to_ascii_lowercase();
		if protocol != "_tcp" && protocol != "_udp" {
			return Err(bad());
		}

		let subtypes = parts
			.map(|subtype| match subtype.strip_prefix('_') {
				Some(label) if !label.is_empty() && subtype.len() <= NAME_MAX_LEN && !label.contains('.') => Ok(subtype.to_owned()),
				_ => Err(bad()),
			})
			.collect::<Result<Vec<_>, _>>()?;

		Ok(Self {
			service: service.clone(),
			protocol,
			subtypes,
		})
	}

	#[inline(always)]
	pub fn subtypes(&self) -> &[String] {
		&self.subtypes
	}

	/// The service type without subtypes or trailing dot, e.g. `_ipp._tcp`.
	pub fn base(&self) -> String {
		format!("{}.{}", self.service, self.protocol)
	}

	/// The form `DNSServiceRegister` expects, subtypes included.
	pub fn to_engine_string(&self) -> String {
		let mut regtype = self.base();
		for subtype in &self.subtypes {
			regtype.push(',');
			regtype.push_str(subtype);
		}
		regtype
	}
}
impl fmt::Display for RegType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.to_engine_string())
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Everything an engine needs to register one service.
///
/// This can be created using the [`RegisterRequestBuilder`].
pub struct RegisterRequest {
	name: Option<String>,
	regtype: RegType,
	domain: Option<String>,
	host: Option<String>,
	port: u16,
	txt: TxtRecord,
	flags: ServiceFlags,
	interface: InterfaceIndex,
	watch_conflicts: bool,
}
impl RegisterRequest {
	#[inline(always)]
	/// The requested instance name. `None` lets the engine pick its default name.
	pub fn name(&self) -> Option<&str> {
		self.name.as_deref()
	}

	#[inline(always)]
	pub fn regtype(&self) -> &RegType {
		&self.regtype
	}

	#[inline(always)]
	/// The requested domain. `None` lets the engine pick its default domain(s).
	pub fn domain(&self) -> Option<&str> {
		self.domain.as_deref()
	}

	#[inline(always)]
	/// The target host. `None` means this machine.
	pub fn host(&self) -> Option<&str> {
		self.host.as_deref()
	}

	#[inline(always)]
	/// The port, in host byte order.
	pub fn port(&self) -> u16 {
		self.port
	}

	#[inline(always)]
	pub fn txt(&self) -> &TxtRecord {
		&self.txt
	}

	#[inline(always)]
	pub fn flags(&self) -> ServiceFlags {
		self.flags
	}

	#[inline(always)]
	pub fn interface(&self) -> InterfaceIndex {
		self.interface
	}

	#[inline(always)]
	/// Whether the caller wants to hear about renames after the initial registration.
	pub fn watch_conflicts(&self) -> bool {
		self.watch_conflicts
	}

	#[inline(always)]
	pub fn auto_rename(&self) -> bool {
		!self.flags.contains(ServiceFlags::NO_AUTO_RENAME)
	}
}

/// A builder for [`RegisterRequest`]s.
pub struct RegisterRequestBuilder(RegisterRequest);
impl RegisterRequestBuilder {
	/// Creates a new [`RegisterRequestBuilder`] for a service of the given type on the given port.
	pub fn new(regtype: &str, port: u16) -> Result<Self, RequestBuilderError> {
		Ok(Self(RegisterRequest {
			name: None,
			regtype: RegType::parse(regtype)?,
			domain: None,
			host: None,
			port,
			txt: TxtRecord::new(),
			flags: ServiceFlags::NONE,
			interface: InterfaceIndex::Any,
			watch_conflicts: false,
		}))
	}

	/// Sets the instance name. An empty name means "use the engine's default".
	pub fn name(mut self, name: impl Into<String>) -> Self {
		let name = name.into();
		self.0.name = if name.is_empty() { None } else { Some(name) };
		self
	}

	pub fn domain(mut self, domain: &str) -> Result<Self, RequestBuilderError> {
		self.0.domain = Some(fqdn_string(domain).ok_or_else(|| RequestBuilderError::BadDomain(domain.to_owned()))?);
		Ok(self)
	}

	pub fn host(mut self, host: &str) -> Result<Self, RequestBuilderError> {
		self.0.host = Some(fqdn_string(host).ok_or_else(|| RequestBuilderError::BadHost(host.to_owned()))?);
		Ok(self)
	}

	#[inline(always)]
	pub fn txt(mut self, txt: TxtRecord) -> Self {
		self.0.txt = txt;
		self
	}

	#[inline(always)]
	/// Adds a `key=value` entry to the TXT record.
	pub fn add_txt(mut self, key: &str, value: impl AsRef<[u8]>) -> Result<Self, TxtRecordError> {
		self.0.txt.insert(key, value)?;
		Ok(self)
	}

	#[inline(always)]
	pub fn interface(mut self, interface: InterfaceIndex) -> Self {
		self.0.interface = interface;
		self
	}

	#[inline(always)]
	/// Adds raw flags to the request.
	pub fn flags(mut self, flags: ServiceFlags) -> Self {
		self.0.flags |= flags;
		self
	}

	#[inline(always)]
	/// Report a name conflict instead of letting the engine pick another name.
	pub fn no_auto_rename(self) -> Self {
		self.flags(ServiceFlags::NO_AUTO_RENAME)
	}

	#[inline(always)]
	/// Keep notifying after the initial registration (renames, removal).
	///
	/// Replies carry [`ServiceFlags::MORE_COMING`] until the last one.
	pub fn watch_conflicts(mut self) -> Self {
		self.0.watch_conflicts = true;
		self
	}

	/// Builds the [`RegisterRequest`].
	pub fn build(self) -> Result<RegisterRequest, RequestBuilderError> {
		if self.0.name.as_ref().is_some_and(|name| name.len() > NAME_MAX_LEN) {
			return Err(RequestBuilderError::NameTooLong);
		}

		Ok(self.0)
	}
}
