use async_trait::async_trait;
use time::format_description::well_known::Rfc2822;

use super::UserHandler;
use crate::{
	config::Ressources,
	database::models::{Post, User},
	error::{CommandError, CommandResult},
};

pub const DEFAULT_BROWSE_LIMIT: i64 = 2;

/// Shows the newest posts of the feeds the user follows
pub struct Browse;

impl Browse {
	pub fn limit(args: &[String]) -> CommandResult<i64> {
		let Some(raw) = args.first() else {
			return Ok(DEFAULT_BROWSE_LIMIT);
		};

		match raw.parse::<i64>() {
			Ok(limit) if limit > 0 => Ok(limit),
			_ => Err(CommandError::InvalidArgument(format!(
				"limit must be a positive integer, got '{raw}'"
			))),
		}
	}

	pub fn posts(
		ressources: &Ressources,
		args: &[String],
		user: &User,
	) -> CommandResult<Vec<Post>> {
		let limit = Self::limit(args)?;
		Ok(ressources.store.list_posts_for_user(user.id, limit)?)
	}
}

#[async_trait]
impl UserHandler for Browse {
	async fn run(&self, ressources: &mut Ressources, args: &[String], user: User) -> CommandResult {
		let posts = Self::posts(ressources, args, &user)?;

		for (i, post) in posts.iter().enumerate() {
			if i != 0 {
				println!();
			}

			let published_at = post
				.published_at
				.format(&Rfc2822)
				.unwrap_or_else(|_| post.published_at.to_string());

			println!("Title: {}", post.title);
			println!("Description: {}", post.description);
			println!("Publish Date: {published_at}");
			println!("Link: {}", post.url);
		}

		Ok(())
	}
}
