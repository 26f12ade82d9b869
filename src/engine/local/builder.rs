use super::{LocalEngine, LocalEngineConfig, DEFAULT_NAME};
use crate::{errors::BadDnsNameError, util::fqdn_string, DEFAULT_DOMAIN};

pub struct LocalEngineBuilder {
	default_name: Option<String>,
	default_domain: String,
	available: bool,
}
impl LocalEngineBuilder {
	pub fn new() -> Self {
		Self {
			default_name: None,
			default_domain: DEFAULT_DOMAIN.to_owned(),
			available: true,
		}
	}

	/// The instance name used for requests that do not specify one.
	///
	/// Defaults to the `HOSTNAME` environment variable, or `"Rust DNS-SD"`.
	pub fn default_name(mut self, name: impl Into<String>) -> Self {
		self.default_name = Some(name.into());
		self
	}

	/// The domain used for requests that do not specify one. Defaults to `local.`.
	pub fn default_domain(mut self, domain: &str) -> Result<Self, BadDnsNameError> {
		self.default_domain = fqdn_string(domain).ok_or(BadDnsNameError)?;
		Ok(self)
	}

	/// Behave like a host whose discovery daemon cannot be reached: every registration fails
	/// with `ServiceNotRunning`.
	pub fn unavailable(mut self) -> Self {
		self.available = false;
		self
	}

	pub fn build(self) -> LocalEngine {
		let LocalEngineBuilder {
			default_name,
			default_domain,
			available,
		} = self;

		let default_name = default_name
			.or_else(|| std::env::var("HOSTNAME").ok())
			.filter(|name| !name.is_empty())
			.unwrap_or_else(|| DEFAULT_NAME.to_owned());

		LocalEngine {
			config: LocalEngineConfig {
				default_name,
				default_domain,
				available,
			},
		}
	}
}
impl Default for LocalEngineBuilder {
	fn default() -> Self {
		Self::new()
	}
}
