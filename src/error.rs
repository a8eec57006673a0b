use crate::{config::ConfigError, database, fetcher};

pub type CommandResult<T = ()> = Result<T, CommandError>;

#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	#[error("command '{0}' does not exist")]
	UnknownCommand(String),

	#[error("usage: {0}")]
	Usage(&'static str),

	#[error("no user is logged in, use `login` or `register` first")]
	NotLoggedIn,

	#[error("{0}")]
	InvalidArgument(String),

	#[error(transparent)]
	Store(#[from] database::Error),

	#[error(transparent)]
	Config(#[from] ConfigError),

	#[error(transparent)]
	Fetch(#[from] fetcher::Error),
}
