use async_trait::async_trait;
use itertools::Itertools;
use url::Url;

use super::{Handler, UserHandler, required_arg};
use crate::{
	config::Ressources,
	database::models::User,
	error::{CommandError, CommandResult},
};

/// Registers a feed and follows it
pub struct AddFeed;

#[async_trait]
impl UserHandler for AddFeed {
	async fn run(&self, ressources: &mut Ressources, args: &[String], user: User) -> CommandResult {
		let [name, url, ..] = args else {
			return Err(CommandError::Usage("addfeed <name> <url>"));
		};

		// stored as typed, `follow` and `unfollow` look feeds up by exact url
		let parsed = Url::parse(url).map_err(|err| {
			CommandError::InvalidArgument(format!("invalid feed url '{url}': {err}"))
		})?;
		if !matches!(parsed.scheme(), "http" | "https") {
			return Err(CommandError::InvalidArgument(format!(
				"feed url must use http or https, got '{}'",
				parsed.scheme()
			)));
		}

		let feed = ressources.store.create_feed(name, url, user.id)?;
		println!("Feed '{}' ('{}') has been added", feed.name, feed.url);

		ressources.store.create_feed_follow(user.id, feed.id)?;
		println!("User '{}' is now following feed '{}'", user.name, feed.name);

		Ok(())
	}
}

pub struct Feeds;

#[async_trait]
impl Handler for Feeds {
	async fn run(&self, ressources: &mut Ressources, _args: &[String]) -> CommandResult {
		for (feed, creator) in ressources.store.list_feeds()? {
			println!("* {} ({}) by {creator}", feed.name, feed.url);
		}

		Ok(())
	}
}

pub struct Follow;

#[async_trait]
impl UserHandler for Follow {
	async fn run(&self, ressources: &mut Ressources, args: &[String], user: User) -> CommandResult {
		let url = required_arg(args, "follow <url>")?;

		let feed = ressources.store.get_feed(url)?;
		ressources.store.create_feed_follow(user.id, feed.id)?;

		println!("User '{}' is now following feed '{}'", user.name, feed.name);
		Ok(())
	}
}

pub struct Following;

#[async_trait]
impl UserHandler for Following {
	async fn run(
		&self,
		ressources: &mut Ressources,
		_args: &[String],
		user: User,
	) -> CommandResult {
		let feeds = ressources.store.list_followed_feeds(user.id)?;
		if feeds.is_empty() {
			println!("User '{}' does not follow any feed", user.name);
			return Ok(());
		}

		println!(
			"{}",
			feeds.iter().map(|feed| format!("* {}", feed.name)).join("\n")
		);
		Ok(())
	}
}

pub struct Unfollow;

#[async_trait]
impl UserHandler for Unfollow {
	async fn run(&self, ressources: &mut Ressources, args: &[String], user: User) -> CommandResult {
		let url = required_arg(args, "unfollow <url>")?;

		let feed = ressources.store.get_feed(url)?;
		if ressources.store.delete_feed_follow(user.id, feed.id)? {
			println!("User '{}' unfollowed feed '{}'", user.name, feed.name);
		} else {
			println!("User '{}' was not following feed '{}'", user.name, feed.name);
		}

		Ok(())
	}
}
