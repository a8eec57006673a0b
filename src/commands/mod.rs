//! Command registry and the handlers behind each command name.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
	config::Ressources,
	database::models::User,
	error::{CommandError, CommandResult},
};

mod aggregate;
mod feeds;
mod posts;
mod users;

pub use self::aggregate::Aggregate;
pub use self::feeds::{AddFeed, Feeds, Follow, Following, Unfollow};
pub use self::posts::{Browse, DEFAULT_BROWSE_LIMIT};
pub use self::users::{Login, Register, Reset, Users};

/// A parsed invocation, `<name> [args...]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
	pub name: String,
	pub args: Vec<String>,
}

impl Command {
	pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			name: name.into(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}

	/// Splits process arguments (without the program name) into a command
	pub fn from_args(mut args: impl Iterator<Item = String>) -> Option<Self> {
		let name = args.next()?;
		Some(Self {
			name,
			args: args.collect(),
		})
	}
}

#[async_trait]
pub trait Handler: Send + Sync {
	async fn run(&self, ressources: &mut Ressources, args: &[String]) -> CommandResult;
}

/// A handler that needs the logged in user, see [`LoggedIn`]
#[async_trait]
pub trait UserHandler: Send + Sync {
	async fn run(&self, ressources: &mut Ressources, args: &[String], user: User)
	-> CommandResult;
}

/// Resolves the current user from the local config before running `H`.
#[derive(Debug, Clone, Copy)]
pub struct LoggedIn<H>(pub H);

impl<H> LoggedIn<H> {
	pub fn current_user(ressources: &Ressources) -> CommandResult<User> {
		let name = ressources
			.config
			.current_user()
			.ok_or(CommandError::NotLoggedIn)?;

		Ok(ressources.store.get_user(name)?)
	}
}

#[async_trait]
impl<H: UserHandler> Handler for LoggedIn<H> {
	async fn run(&self, ressources: &mut Ressources, args: &[String]) -> CommandResult {
		let user = Self::current_user(ressources)?;
		self.0.run(ressources, args, user).await
	}
}

#[derive(Default)]
pub struct Commands {
	handlers: HashMap<String, Box<dyn Handler>>,
}

impl Commands {
	pub fn new() -> Self {
		Self::default()
	}

	/// Every builtin command, protected ones wrapped in [`LoggedIn`]
	pub fn builtin() -> Self {
		let mut commands = Self::new();

		commands.register("login", Login);
		commands.register("register", Register);
		commands.register("reset", Reset);
		commands.register("users", Users);
		commands.register("agg", Aggregate);
		commands.register("addfeed", LoggedIn(AddFeed));
		commands.register("feeds", Feeds);
		commands.register("follow", LoggedIn(Follow));
		commands.register("following", LoggedIn(Following));
		commands.register("unfollow", LoggedIn(Unfollow));
		commands.register("browse", LoggedIn(Browse));

		commands
	}

	/// Registering an existing name replaces its handler
	pub fn register(&mut self, name: impl Into<String>, handler: impl Handler + 'static) {
		self.handlers.insert(name.into(), Box::new(handler));
	}

	pub async fn run(&self, ressources: &mut Ressources, command: &Command) -> CommandResult {
		let handler = self
			.handlers
			.get(&command.name)
			.ok_or_else(|| CommandError::UnknownCommand(command.name.clone()))?;

		tracing::debug!(command = %command.name, args = ?command.args, "running command");
		handler.run(ressources, &command.args).await
	}
}

/// First argument or a usage error
fn required_arg<'a>(args: &'a [String], usage: &'static str) -> CommandResult<&'a str> {
	args.first()
		.map(String::as_str)
		.ok_or(CommandError::Usage(usage))
}
