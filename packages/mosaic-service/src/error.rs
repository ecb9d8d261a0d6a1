#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("No provider is reachable: {message}")]
	ProviderUnavailable { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl From<sqlx::Error> for Error {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<mosaic_storage::Error> for Error {
	fn from(err: mosaic_storage::Error) -> Self {
		match err {
			mosaic_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			mosaic_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			mosaic_storage::Error::NotFound(message) => Self::NotFound { message },
		}
	}
}

impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
