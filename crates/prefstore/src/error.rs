//! Error taxonomy for the settings store.

use std::fmt;

pub type PsResult<T> = std::result::Result<T, Error>;

#[derive(Debug)]
pub enum Error {
	/// Key is empty or malformed. Raised synchronously, before any I/O.
	InvalidKey(Box<str>),
	/// Value rejected by the setting's definition (type mismatch or validator).
	Validation(String),
	/// Registry misuse during setup (duplicate key, incomplete definition).
	Config(String),
	/// The durable medium rejected or failed to complete a commit.
	/// The stored value and all observers are guaranteed unchanged.
	Persistence(String),
	/// The backing medium became unreadable after a subscription was
	/// established. Terminal for the affected observer stream only.
	Observation(String),

	// externals
	Io(std::io::Error),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Error::InvalidKey(key) => write!(f, "invalid setting key: {:?}", key),
			Error::Validation(msg) => write!(f, "validation error: {}", msg),
			Error::Config(msg) => write!(f, "configuration error: {}", msg),
			Error::Persistence(msg) => write!(f, "persistence error: {}", msg),
			Error::Observation(msg) => write!(f, "observation error: {}", msg),
			Error::Io(err) => write!(f, "io error: {}", err),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io(err)
	}
}

impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Persistence(format!("background task failed: {}", err))
	}
}

// vim: ts=4
