use std::{
	env::var_os,
	path::{Path, PathBuf},
	sync::Arc,
	time::Duration,
};

use serde::{Deserialize, Serialize};

use crate::database::Store;

const CONFIG_FILE_NAME: &str = ".gatorconfig.json";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("could not locate the home directory")]
	NoHomeDir,

	#[error("could not access {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("config file does not match the expected structure: {0}")]
	Json(#[from] serde_json::Error),

	#[error("poll interval must be greater than zero, got {0:?}")]
	InvalidInterval(Duration),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> ConfigError {
	let path = path.to_path_buf();
	move |source| ConfigError::Io { path, source }
}

/// Local state file, rewritten in full whenever the current user changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	pub db_url: String,

	#[serde(default)]
	pub current_user_name: String,

	#[serde(skip)]
	path: PathBuf,
}

impl Config {
	/// Path of the state file, `GATOR_CONFIG` overrides `~/.gatorconfig.json`
	pub fn file_path_from_env() -> Result<PathBuf, ConfigError> {
		if let Some(path) = var_os("GATOR_CONFIG") {
			return Ok(path.into());
		}

		let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
		Ok(home.join(CONFIG_FILE_NAME))
	}

	pub fn load_file_from_env() -> Result<Self, ConfigError> {
		Self::load_file(Self::file_path_from_env()?)
	}

	pub fn load_file(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
		let path = path.into();
		let content = std::fs::read(&path).map_err(io_error(&path))?;

		let mut config = serde_json::from_slice::<Self>(&content)?;
		config.path = path;

		Ok(config)
	}

	/// A config bound to `path` that has not been written yet
	pub fn new(path: impl Into<PathBuf>, db_url: impl Into<String>) -> Self {
		Self {
			db_url: db_url.into(),
			current_user_name: String::new(),
			path: path.into(),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// The logged in user name, if any
	pub fn current_user(&self) -> Option<&str> {
		Some(self.current_user_name.as_str()).filter(|name| !name.is_empty())
	}

	pub fn set_user(&mut self, name: &str) -> Result<(), ConfigError> {
		name.clone_into(&mut self.current_user_name);
		self.save()
	}

	pub fn save(&self) -> Result<(), ConfigError> {
		let bytes = serde_json::to_vec_pretty(self)?;

		// write then rename so a crash never leaves a truncated file
		let tmp = self.path.with_extension("json.tmp");
		std::fs::write(&tmp, bytes).map_err(io_error(&tmp))?;
		std::fs::rename(&tmp, &self.path).map_err(io_error(&self.path))?;

		tracing::debug!(path = %self.path.display(), "saved config");
		Ok(())
	}
}

/// Shared state handed to every command handler
pub struct Ressources {
	pub config: Config,
	pub store: Arc<dyn Store>,
}

impl Ressources {
	pub fn new(config: Config, store: Arc<dyn Store>) -> Self {
		Self { config, store }
	}
}
