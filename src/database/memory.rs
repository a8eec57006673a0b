use parking_lot::Mutex;
use time::OffsetDateTime;

use super::models::{
	Feed, FeedFollow, FeedId, NewFeed, NewPost, NewUser, Post, PostRow, User, UserId,
};
use super::{Error, Result, Store};

#[derive(Debug, Default)]
struct Tables {
	users: Vec<User>,
	feeds: Vec<Feed>,
	feed_follows: Vec<FeedFollow>,
	posts: Vec<Post>,
}

impl Tables {
	fn user_exists(&self, id: UserId) -> bool {
		self.users.iter().any(|user| user.id == id)
	}

	fn feed_exists(&self, id: FeedId) -> bool {
		self.feeds.iter().any(|feed| feed.id == id)
	}
}

/// In-process [`Store`] holding the same constraints as the relational schema.
#[derive(Debug, Default)]
pub struct MemoryStore {
	tables: Mutex<Tables>,
}

impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}
}

impl Store for MemoryStore {
	fn create_user(&self, name: &str) -> Result<User> {
		let mut tables = self.tables.lock();
		if tables.users.iter().any(|user| user.name == name) {
			return Err(Error::Conflict(format!("user '{name}'")));
		}

		let user = User::from(NewUser::new(name, OffsetDateTime::now_utc()));
		tables.users.push(user.clone());
		Ok(user)
	}

	fn get_user(&self, name: &str) -> Result<User> {
		self.tables
			.lock()
			.users
			.iter()
			.find(|user| user.name == name)
			.cloned()
			.ok_or_else(|| Error::NotFound(format!("user '{name}'")))
	}

	fn list_users(&self) -> Result<Vec<User>> {
		let mut users = self.tables.lock().users.clone();
		users.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(users)
	}

	fn reset(&self) -> Result<()> {
		*self.tables.lock() = Tables::default();
		Ok(())
	}

	fn create_feed(&self, name: &str, url: &str, creator: UserId) -> Result<Feed> {
		let mut tables = self.tables.lock();
		if tables.feeds.iter().any(|feed| feed.url == url) {
			return Err(Error::Conflict(format!("feed with url '{url}'")));
		}
		if !tables.user_exists(creator) {
			return Err(Error::NotFound(format!("user {creator}")));
		}

		let feed = Feed::from(NewFeed::new(name, url, creator, OffsetDateTime::now_utc()));
		tables.feeds.push(feed.clone());
		Ok(feed)
	}

	fn get_feed(&self, url: &str) -> Result<Feed> {
		self.tables
			.lock()
			.feeds
			.iter()
			.find(|feed| feed.url == url)
			.cloned()
			.ok_or_else(|| Error::NotFound(format!("feed with url '{url}'")))
	}

	fn list_feeds(&self) -> Result<Vec<(Feed, String)>> {
		let tables = self.tables.lock();
		let feeds = tables
			.feeds
			.iter()
			.filter_map(|feed| {
				let creator = tables.users.iter().find(|user| user.id == feed.user_id)?;
				Some((feed.clone(), creator.name.clone()))
			})
			.collect();
		Ok(feeds)
	}

	fn get_next_feed_to_fetch(&self) -> Result<Feed> {
		// `None < Some(_)`, so never-fetched feeds come first
		self.tables
			.lock()
			.feeds
			.iter()
			.min_by_key(|feed| (feed.last_fetched_at, feed.created_at))
			.cloned()
			.ok_or_else(|| Error::NotFound("feed to fetch".to_owned()))
	}

	fn mark_feed_fetched(&self, id: FeedId, at: OffsetDateTime) -> Result<()> {
		let mut tables = self.tables.lock();
		let feed = tables
			.feeds
			.iter_mut()
			.find(|feed| feed.id == id)
			.ok_or_else(|| Error::NotFound(format!("feed {id}")))?;

		feed.last_fetched_at = Some(at);
		feed.updated_at = at;
		Ok(())
	}

	fn create_post(&self, post: &NewPost<'_>) -> Result<Post> {
		let mut tables = self.tables.lock();
		if tables.posts.iter().any(|existing| existing.url == post.url) {
			return Err(Error::Conflict(format!("post with url '{}'", post.url)));
		}
		if !tables.feed_exists(post.feed_id) {
			return Err(Error::NotFound(format!("feed {}", post.feed_id)));
		}

		let post = Post::from(PostRow::new(post, OffsetDateTime::now_utc()));
		tables.posts.push(post.clone());
		Ok(post)
	}

	fn create_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> Result<FeedFollow> {
		let mut tables = self.tables.lock();
		if tables
			.feed_follows
			.iter()
			.any(|follow| follow.user_id == user_id && follow.feed_id == feed_id)
		{
			return Err(Error::Conflict("feed follow".to_owned()));
		}
		if !tables.user_exists(user_id) {
			return Err(Error::NotFound(format!("user {user_id}")));
		}
		if !tables.feed_exists(feed_id) {
			return Err(Error::NotFound(format!("feed {feed_id}")));
		}

		let follow = FeedFollow::new(user_id, feed_id, OffsetDateTime::now_utc());
		tables.feed_follows.push(follow.clone());
		Ok(follow)
	}

	fn delete_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> Result<bool> {
		let mut tables = self.tables.lock();
		let before = tables.feed_follows.len();
		tables
			.feed_follows
			.retain(|follow| !(follow.user_id == user_id && follow.feed_id == feed_id));
		Ok(tables.feed_follows.len() != before)
	}

	fn list_followed_feeds(&self, user_id: UserId) -> Result<Vec<Feed>> {
		let tables = self.tables.lock();
		let mut feeds = tables
			.feed_follows
			.iter()
			.filter(|follow| follow.user_id == user_id)
			.filter_map(|follow| tables.feeds.iter().find(|feed| feed.id == follow.feed_id))
			.cloned()
			.collect::<Vec<_>>();
		feeds.sort_by(|a, b| a.name.cmp(&b.name));
		Ok(feeds)
	}

	fn list_posts_for_user(&self, user_id: UserId, limit: i64) -> Result<Vec<Post>> {
		let tables = self.tables.lock();
		let mut posts = tables
			.posts
			.iter()
			.filter(|post| {
				tables
					.feed_follows
					.iter()
					.any(|follow| follow.user_id == user_id && follow.feed_id == post.feed_id)
			})
			.cloned()
			.collect::<Vec<_>>();

		posts.sort_by(|a, b| b.published_at.cmp(&a.published_at));
		posts.truncate(usize::try_from(limit).unwrap_or(0));
		Ok(posts)
	}
}
