use async_trait::async_trait;

use super::{Handler, required_arg};
use crate::{config::Ressources, error::CommandResult};

/// Sets an existing user as the current one
pub struct Login;

#[async_trait]
impl Handler for Login {
	async fn run(&self, ressources: &mut Ressources, args: &[String]) -> CommandResult {
		let name = required_arg(args, "login <name>")?;

		let user = ressources.store.get_user(name)?;
		ressources.config.set_user(&user.name)?;

		println!("User has been set to '{}'", user.name);
		Ok(())
	}
}

/// Creates a user and logs it in
pub struct Register;

#[async_trait]
impl Handler for Register {
	async fn run(&self, ressources: &mut Ressources, args: &[String]) -> CommandResult {
		let name = required_arg(args, "register <name>")?;

		let user = ressources.store.create_user(name)?;
		ressources.config.set_user(&user.name)?;

		tracing::info!(user_id = %user.id, name = %user.name, "registered user");
		println!("User '{}' has been created", user.name);
		Ok(())
	}
}

/// Deletes every user, their feeds, follows and posts go with them
pub struct Reset;

#[async_trait]
impl Handler for Reset {
	async fn run(&self, ressources: &mut Ressources, _args: &[String]) -> CommandResult {
		ressources.store.reset()?;

		println!("Reset successful");
		Ok(())
	}
}

pub struct Users;

#[async_trait]
impl Handler for Users {
	async fn run(&self, ressources: &mut Ressources, _args: &[String]) -> CommandResult {
		let current = ressources.config.current_user();

		for user in ressources.store.list_users()? {
			if Some(user.name.as_str()) == current {
				println!("* {} (current)", user.name);
			} else {
				println!("* {}", user.name);
			}
		}

		Ok(())
	}
}
