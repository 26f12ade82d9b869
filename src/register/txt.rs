use crate::errors::TxtRecordError;

const TXT_ENTRY_MAX_LEN: usize = 255;
const TXT_RECORD_MAX_LEN: usize = u16::MAX as usize;

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
/// DNS-SD TXT record data: a sequence of length-prefixed `key=value` strings.
pub struct TxtRecord(Vec<u8>);
impl TxtRecord {
	pub fn new() -> Self {
		Self::default()
	}

	fn check_key(key: &str) -> Result<(), TxtRecordError> {
		if key.is_empty() || !key.bytes().all(|b| (0x20..=0x7e).contains(&b) && b != b'=') {
			return Err(TxtRecordError::BadKey(key.to_owned()));
		}
		Ok(())
	}

	/// Appends a `key=value` entry. The value may contain arbitrary bytes.
	pub fn insert(&mut self, key: &str, value: impl AsRef<[u8]>) -> Result<(), TxtRecordError> {
		Self::check_key(key)?;
		let value = value.as_ref();

		let mut entry = Vec::with_capacity(key.len() + 1 + value.len());
		entry.extend_from_slice(key.as_bytes());
		entry.push(b'=');
		entry.extend_from_slice(value);
		self.push_raw(&entry)
	}

	/// Appends a boolean attribute: a key with no `=`.
	pub fn insert_flag(&mut self, key: &str) -> Result<(), TxtRecordError> {
		Self::check_key(key)?;
		self.push_raw(key.as_bytes())
	}

	/// Appends an entry as-is.
	pub fn push_raw(&mut self, entry: &[u8]) -> Result<(), TxtRecordError> {
		if entry.len() > TXT_ENTRY_MAX_LEN {
			return Err(TxtRecordError::EntryTooLong);
		}
		if self.0.len() + 1 + entry.len() > TXT_RECORD_MAX_LEN {
			return Err(TxtRecordError::RecordTooLong);
		}

		self.0.push(entry.len() as u8);
		self.0.extend_from_slice(entry);
		Ok(())
	}

	/// Builds a record from `key=value` pairs.
	pub fn from_pairs<K: AsRef<str>, V: AsRef<[u8]>>(pairs: impl IntoIterator<Item = (K, V)>) -> Result<Self, TxtRecordError> {
		let mut record = Self::new();
		for (key, value) in pairs {
			record.insert(key.as_ref(), value)?;
		}
		Ok(record)
	}

	/// Builder-style [`insert`](TxtRecord::insert).
	pub fn with(mut self, key: &str, value: impl AsRef<[u8]>) -> Result<Self, TxtRecordError> {
		self.insert(key, value)?;
		Ok(self)
	}

	#[inline(always)]
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// The encoded entries, without the empty-record padding of [`to_wire`](TxtRecord::to_wire).
	#[inline(always)]
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}

	/// The rdata to hand to an engine. An empty record is a single empty string.
	pub fn to_wire(&self) -> Vec<u8> {
		if self.0.is_empty() {
			vec![0]
		} else {
			self.0.clone()
		}
	}

	/// Iterates the raw entries.
	pub fn entries(&self) -> TxtEntries<'_> {
		TxtEntries(&self.0)
	}

	/// Looks up the value of `key`. Keys are compared case-insensitively.
	///
	/// Returns `Some(None)` for boolean attributes.
	pub fn get(&self, key: &str) -> Option<Option<&[u8]>> {
		self.entries().find_map(|entry| {
			let (entry_key, value) = match entry.iter().position(|b| *b == b'=') {
				Some(split) => (&entry[..split], Some(&entry[split + 1..])),
				None => (entry, None),
			};
			entry_key.eq_ignore_ascii_case(key.as_bytes()).then_some(value)
		})
	}
}

/// Iterator over the entries of a [`TxtRecord`].
pub struct TxtEntries<'a>(&'a [u8]);
impl<'a> Iterator for TxtEntries<'a> {
	type Item = &'a [u8];

	fn next(&mut self) -> Option<Self::Item> {
		let (len, rest) = self.0.split_first()?;
		let len = (*len as usize).min(rest.len());
		let (entry, rest) = rest.split_at(len);
		self.0 = rest;
		Some(entry)
	}
}
