//! Error types

#[derive(Debug)]
pub struct BadDnsNameError;
impl std::fmt::Display for BadDnsNameError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str("Bad DNS name")
	}
}
impl std::error::Error for BadDnsNameError {}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error)]
/// An error code reported by a DNS-SD engine.
///
/// The numeric values are the ones used by the `dns_sd` C API (`kDNSServiceErr_*`).
pub enum DnsServiceError {
	#[error("Unknown error")]
	Unknown,
	#[error("No such name")]
	NoSuchName,
	#[error("Out of memory")]
	NoMemory,
	#[error("Bad parameter")]
	BadParam,
	#[error("Bad service reference")]
	BadReference,
	#[error("Bad state")]
	BadState,
	#[error("Bad flags")]
	BadFlags,
	#[error("Unsupported")]
	Unsupported,
	#[error("Not initialized")]
	NotInitialized,
	#[error("Already registered")]
	AlreadyRegistered,
	#[error("Name conflict")]
	NameConflict,
	#[error("Invalid")]
	Invalid,
	#[error("Blocked by firewall")]
	Firewall,
	#[error("Client library incompatible with daemon")]
	Incompatible,
	#[error("Bad interface index")]
	BadInterfaceIndex,
	#[error("Refused")]
	Refused,
	#[error("No such record")]
	NoSuchRecord,
	#[error("No auth")]
	NoAuth,
	#[error("No such key")]
	NoSuchKey,
	#[error("NAT traversal")]
	NatTraversal,
	#[error("Double NAT")]
	DoubleNat,
	#[error("Bad time")]
	BadTime,
	#[error("Bad signature")]
	BadSig,
	#[error("Bad key")]
	BadKey,
	#[error("Transient")]
	Transient,
	#[error("Service daemon not running")]
	ServiceNotRunning,
	#[error("NAT port mapping unsupported")]
	NatPortMappingUnsupported,
	#[error("NAT port mapping disabled")]
	NatPortMappingDisabled,
	#[error("No router")]
	NoRouter,
	#[error("Polling mode")]
	PollingMode,
	#[error("Timeout")]
	Timeout,
	#[error("Connection to daemon was lost")]
	DefunctConnection,
	#[error("Denied by policy")]
	PolicyDenied,
	#[error("Not permitted")]
	NotPermitted,
	#[error("Engine error {0}")]
	/// A code this crate does not know about.
	Other(i32),
}

const ERROR_CODES: &[(i32, DnsServiceError)] = &[
	(-65537, DnsServiceError::Unknown),
	(-65538, DnsServiceError::NoSuchName),
	(-65539, DnsServiceError::NoMemory),
	(-65540, DnsServiceError::BadParam),
	(-65541, DnsServiceError::BadReference),
	(-65542, DnsServiceError::BadState),
	(-65543, DnsServiceError::BadFlags),
	(-65544, DnsServiceError::Unsupported),
	(-65545, DnsServiceError::NotInitialized),
	(-65547, DnsServiceError::AlreadyRegistered),
	(-65548, DnsServiceError::NameConflict),
	(-65549, DnsServiceError::Invalid),
	(-65550, DnsServiceError::Firewall),
	(-65551, DnsServiceError::Incompatible),
	(-65552, DnsServiceError::BadInterfaceIndex),
	(-65553, DnsServiceError::Refused),
	(-65554, DnsServiceError::NoSuchRecord),
	(-65555, DnsServiceError::NoAuth),
	(-65556, DnsServiceError::NoSuchKey),
	(-65557, DnsServiceError::NatTraversal),
	(-65558, DnsServiceError::DoubleNat),
	(-65559, DnsServiceError::BadTime),
	(-65560, DnsServiceError::BadSig),
	(-65561, DnsServiceError::BadKey),
	(-65562, DnsServiceError::Transient),
	(-65563, DnsServiceError::ServiceNotRunning),
	(-65564, DnsServiceError::NatPortMappingUnsupported),
	(-65565, DnsServiceError::NatPortMappingDisabled),
	(-65566, DnsServiceError::NoRouter),
	(-65567, DnsServiceError::PollingMode),
	(-65568, DnsServiceError::Timeout),
	(-65569, DnsServiceError::DefunctConnection),
	(-65570, DnsServiceError::PolicyDenied),
	(-65571, DnsServiceError::NotPermitted),
];

impl DnsServiceError {
	/// The `kDNSServiceErr_NoError` sentinel.
	pub const NO_ERROR: i32 = 0;

	/// Interprets a raw `DNSServiceErrorType`.
	///
	/// `0` is the success sentinel and maps to `Ok(())`.
	pub fn check(code: i32) -> Result<(), Self> {
		if code == Self::NO_ERROR {
			return Ok(());
		}

		Err(ERROR_CODES
			.iter()
			.find_map(|(raw, err)| (*raw == code).then_some(*err))
			.unwrap_or(Self::Other(code)))
	}

	/// The raw `DNSServiceErrorType` for this error.
	pub fn code(&self) -> i32 {
		if let Self::Other(code) = self {
			return *code;
		}

		ERROR_CODES
			.iter()
			.find_map(|(raw, err)| (err == self).then_some(*raw))
			.unwrap_or(-65537)
	}

	/// Sorts this error into one of the coarse classes callers usually react to.
	pub fn class(&self) -> ErrorClass {
		match self {
			Self::NameConflict | Self::AlreadyRegistered => ErrorClass::NameCollision,
			Self::ServiceNotRunning | Self::DefunctConnection | Self::NotInitialized | Self::NoRouter => ErrorClass::EngineUnavailable,
			other => ErrorClass::Other(other.code()),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
/// Coarse outcome of a registration attempt.
pub enum ErrorClass {
	/// The service was registered.
	Success,

	/// The requested name is taken and the engine could not (or was told not to) pick another one.
	NameCollision,

	/// The discovery engine could not be reached or lost its connection.
	EngineUnavailable,

	/// Any other engine-specific code.
	Other(i32),
}
impl From<Result<(), DnsServiceError>> for ErrorClass {
	fn from(result: Result<(), DnsServiceError>) -> Self {
		match result {
			Ok(()) => ErrorClass::Success,
			Err(err) => err.class(),
		}
	}
}

#[derive(Debug, Error)]
/// An error occurred while building a [`RegisterRequest`](crate::register::RegisterRequest)
pub enum RequestBuilderError {
	#[error("Bad service type {0:?} (expected _service._tcp or _service._udp)")]
	/// The service type could not be parsed
	BadRegType(String),

	#[error("Bad domain {0:?}")]
	/// The domain is not a valid DNS name
	BadDomain(String),

	#[error("Bad host name {0:?}")]
	/// The target host is not a valid DNS name
	BadHost(String),

	#[error("Service name too long (max 63 bytes)")]
	/// The service instance name does not fit in a single DNS label
	NameTooLong,

	#[error("{0}")]
	/// The TXT record is malformed
	TxtRecord(#[from] TxtRecordError),
}

#[derive(Debug, Error, PartialEq, Eq)]
/// An error occurred while building a [`TxtRecord`](crate::register::TxtRecord)
pub enum TxtRecordError {
	#[error("Bad TXT key {0:?} (must be non-empty printable ASCII without '=')")]
	/// The key is empty, contains `=` or non-printable characters
	BadKey(String),

	#[error("TXT entry too long (max 255 bytes)")]
	/// A single `key=value` entry does not fit in one length-prefixed string
	EntryTooLong,

	#[error("TXT record too long (max 65535 bytes)")]
	/// The whole record does not fit in a DNS rdata field
	RecordTooLong,
}

#[derive(Debug, Error)]
/// An error occurred while shutting down an engine
pub enum ShutdownError {
	#[error("Engine thread panicked")]
	/// The engine's thread panicked
	ThreadJoinError(Box<dyn std::any::Any + Send + 'static>),
}
