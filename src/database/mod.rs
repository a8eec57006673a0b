use diesel::{dsl, prelude::*, r2d2};
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use eyre::WrapErr;
use time::OffsetDateTime;

use self::error::QueryResultExt;
use self::models::{
	Feed, FeedFollow, FeedId, NewFeed, NewPost, NewUser, Post, PostRow, User, UserId,
};

mod error;
mod memory;
pub mod models;
#[rustfmt::skip]
pub mod schema;

pub use self::error::{Error, Result};
pub use self::memory::MemoryStore;

pub type PoolConnection = r2d2::Pool<r2d2::ConnectionManager<PgConnection>>;
pub type PooledConnection = r2d2::PooledConnection<r2d2::ConnectionManager<PgConnection>>;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

/// Typed access to users, feeds, follows and posts.
///
/// Every method is a single, individually committed operation. Uniqueness
/// violations surface as [`Error::Conflict`] and missing rows (or dangling
/// references) as [`Error::NotFound`].
pub trait Store: Send + Sync {
	fn create_user(&self, name: &str) -> Result<User>;
	fn get_user(&self, name: &str) -> Result<User>;
	/// All users, ordered by name
	fn list_users(&self) -> Result<Vec<User>>;
	/// Removes every user, cascading to feeds, follows and posts
	fn reset(&self) -> Result<()>;

	fn create_feed(&self, name: &str, url: &str, creator: UserId) -> Result<Feed>;
	fn get_feed(&self, url: &str) -> Result<Feed>;
	/// All feeds along with the name of the user who added them
	fn list_feeds(&self) -> Result<Vec<(Feed, String)>>;

	/// The feed fetched the longest time ago, never-fetched feeds first.
	fn get_next_feed_to_fetch(&self) -> Result<Feed>;
	fn mark_feed_fetched(&self, id: FeedId, at: OffsetDateTime) -> Result<()>;

	fn create_post(&self, post: &NewPost<'_>) -> Result<Post>;

	fn create_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> Result<FeedFollow>;
	/// Returns whether a follow was actually removed
	fn delete_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> Result<bool>;
	fn list_followed_feeds(&self, user_id: UserId) -> Result<Vec<Feed>>;

	/// Posts of the feeds followed by `user_id`, newest `published_at` first.
	fn list_posts_for_user(&self, user_id: UserId, limit: i64) -> Result<Vec<Post>>;
}

/// [`Store`] backed by PostgreSQL through a r2d2 connection pool.
#[derive(Debug, Clone)]
pub struct PgStore {
	pool: PoolConnection,
}

impl PgStore {
	pub fn connect(database_url: &str) -> Result<Self> {
		let manager = r2d2::ConnectionManager::<PgConnection>::new(database_url);
		let pool = r2d2::Pool::builder().build(manager)?;
		Ok(Self { pool })
	}

	pub fn run_migrations(&self) -> eyre::Result<()> {
		let mut conn = self
			.pool
			.get()
			.wrap_err("could not obtain a connection handle")?;

		let applied = conn
			.run_pending_migrations(MIGRATIONS)
			.map_err(|err| eyre::eyre!(err))
			.wrap_err("could not run pending migrations")?;

		for version in applied {
			tracing::info!(%version, "applied migration");
		}

		Ok(())
	}

	fn conn(&self) -> Result<PooledConnection> {
		Ok(self.pool.get()?)
	}
}

impl Store for PgStore {
	fn create_user(&self, name: &str) -> Result<User> {
		use self::schema::*;

		dsl::insert_into(users::table)
			.values(NewUser::new(name, OffsetDateTime::now_utc()))
			.returning(User::as_returning())
			.get_result(&mut self.conn()?)
			.or_store_error(|| format!("user '{name}'"))
	}

	fn get_user(&self, name: &str) -> Result<User> {
		use self::schema::*;

		users::table
			.filter(users::name.eq(name))
			.select(User::as_select())
			.first(&mut self.conn()?)
			.or_store_error(|| format!("user '{name}'"))
	}

	fn list_users(&self) -> Result<Vec<User>> {
		use self::schema::*;

		Ok(users::table
			.select(User::as_select())
			.order(users::name.asc())
			.load(&mut self.conn()?)?)
	}

	fn reset(&self) -> Result<()> {
		use self::schema::*;

		let deleted = dsl::delete(users::table).execute(&mut self.conn()?)?;
		tracing::info!(deleted, "deleted all users");
		Ok(())
	}

	fn create_feed(&self, name: &str, url: &str, creator: UserId) -> Result<Feed> {
		use self::schema::*;

		dsl::insert_into(feeds::table)
			.values(NewFeed::new(name, url, creator, OffsetDateTime::now_utc()))
			.returning(Feed::as_returning())
			.get_result(&mut self.conn()?)
			.or_store_error(|| format!("feed with url '{url}'"))
	}

	fn get_feed(&self, url: &str) -> Result<Feed> {
		use self::schema::*;

		feeds::table
			.filter(feeds::url.eq(url))
			.select(Feed::as_select())
			.first(&mut self.conn()?)
			.or_store_error(|| format!("feed with url '{url}'"))
	}

	fn list_feeds(&self) -> Result<Vec<(Feed, String)>> {
		use self::schema::*;

		Ok(feeds::table
			.inner_join(users::table)
			.select((Feed::as_select(), users::name))
			.order(feeds::created_at.asc())
			.load(&mut self.conn()?)?)
	}

	fn get_next_feed_to_fetch(&self) -> Result<Feed> {
		use self::schema::*;

		feeds::table
			.select(Feed::as_select())
			.order((
				feeds::last_fetched_at.asc().nulls_first(),
				feeds::created_at.asc(),
			))
			.first(&mut self.conn()?)
			.or_store_error(|| "feed to fetch".to_owned())
	}

	fn mark_feed_fetched(&self, id: FeedId, at: OffsetDateTime) -> Result<()> {
		use self::schema::*;

		let updated = dsl::update(feeds::table.filter(feeds::id.eq(id)))
			.set((feeds::last_fetched_at.eq(at), feeds::updated_at.eq(at)))
			.execute(&mut self.conn()?)?;

		if updated == 0 {
			return Err(Error::NotFound(format!("feed {id}")));
		}

		Ok(())
	}

	fn create_post(&self, post: &NewPost<'_>) -> Result<Post> {
		use self::schema::*;

		dsl::insert_into(posts::table)
			.values(PostRow::new(post, OffsetDateTime::now_utc()))
			.returning(Post::as_returning())
			.get_result(&mut self.conn()?)
			.or_store_error(|| format!("post with url '{}'", post.url))
	}

	fn create_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> Result<FeedFollow> {
		use self::schema::*;

		dsl::insert_into(feed_follows::table)
			.values(FeedFollow::new(user_id, feed_id, OffsetDateTime::now_utc()))
			.returning(FeedFollow::as_returning())
			.get_result(&mut self.conn()?)
			.or_store_error(|| "feed follow".to_owned())
	}

	fn delete_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> Result<bool> {
		use self::schema::*;

		let deleted = dsl::delete(
			feed_follows::table
				.filter(feed_follows::user_id.eq(user_id))
				.filter(feed_follows::feed_id.eq(feed_id)),
		)
		.execute(&mut self.conn()?)?;

		Ok(deleted > 0)
	}

	fn list_followed_feeds(&self, user_id: UserId) -> Result<Vec<Feed>> {
		use self::schema::*;

		Ok(feed_follows::table
			.inner_join(feeds::table)
			.filter(feed_follows::user_id.eq(user_id))
			.select(Feed::as_select())
			.order(feeds::name.asc())
			.load(&mut self.conn()?)?)
	}

	fn list_posts_for_user(&self, user_id: UserId, limit: i64) -> Result<Vec<Post>> {
		use self::schema::*;

		Ok(posts::table
			.inner_join(feed_follows::table.on(feed_follows::feed_id.eq(posts::feed_id)))
			.filter(feed_follows::user_id.eq(user_id))
			.select(Post::as_select())
			.order(posts::published_at.desc())
			.limit(limit)
			.load(&mut self.conn()?)?)
	}
}
