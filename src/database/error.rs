use diesel::result::{DatabaseErrorKind, Error as DieselError};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// A uniqueness constraint rejected the write
	#[error("{0} already exists")]
	Conflict(String),

	#[error("{0} not found")]
	NotFound(String),

	#[error("pool: {0}")]
	DbPool(#[from] diesel::r2d2::PoolError),

	#[error("query: {0}")]
	Query(#[from] DieselError),
}

impl Error {
	pub const fn is_conflict(&self) -> bool {
		matches!(self, Self::Conflict(_))
	}

	pub const fn is_not_found(&self) -> bool {
		matches!(self, Self::NotFound(_))
	}
}

/// Classifies constraint violations and missing rows into domain errors.
pub(crate) trait QueryResultExt<T> {
	fn or_store_error(self, subject: impl FnOnce() -> String) -> Result<T>;
}

impl<T> QueryResultExt<T> for std::result::Result<T, DieselError> {
	fn or_store_error(self, subject: impl FnOnce() -> String) -> Result<T> {
		self.map_err(|err| match err {
			DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
				Error::Conflict(subject())
			}
			DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
				let constraint = info.constraint_name().unwrap_or("foreign key");
				Error::NotFound(format!("row referenced by {constraint}"))
			}
			DieselError::NotFound => Error::NotFound(subject()),
			err => Error::Query(err),
		})
	}
}
