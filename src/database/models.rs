use diesel::prelude::*;
use diesel_derive_newtype::DieselNewType;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::database::schema::*;

macro_rules! id_newtype {
	($($(#[$meta:meta])* $name:ident;)+) => {
		$(
			$(#[$meta])*
			#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, DieselNewType)]
			pub struct $name(Uuid);

			impl $name {
				#[must_use]
				pub fn new() -> Self {
					Self(Uuid::new_v4())
				}
			}

			impl Default for $name {
				fn default() -> Self {
					Self::new()
				}
			}

			impl std::fmt::Display for $name {
				fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
					self.0.fmt(f)
				}
			}
		)+
	};
}

id_newtype! {
	UserId;
	FeedId;
	FeedFollowId;
	PostId;
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = users)]
pub struct User {
	pub id: UserId,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub name: String,
}

#[derive(Insertable)]
#[diesel(table_name = users)]
pub struct NewUser<'a> {
	pub id: UserId,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub name: &'a str,
}

impl<'a> NewUser<'a> {
	pub fn new(name: &'a str, now: OffsetDateTime) -> Self {
		Self {
			id: UserId::new(),
			created_at: now,
			updated_at: now,
			name,
		}
	}
}

impl From<NewUser<'_>> for User {
	fn from(value: NewUser<'_>) -> Self {
		Self {
			id: value.id,
			created_at: value.created_at,
			updated_at: value.updated_at,
			name: value.name.to_owned(),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = feeds)]
pub struct Feed {
	pub id: FeedId,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub name: String,
	pub url: String,
	/// Creator of the feed, informational only
	pub user_id: UserId,
	/// Scheduling key of the aggregator, `None` until the first fetch
	pub last_fetched_at: Option<OffsetDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = feeds)]
pub struct NewFeed<'a> {
	pub id: FeedId,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub name: &'a str,
	pub url: &'a str,
	pub user_id: UserId,
}

impl<'a> NewFeed<'a> {
	pub fn new(name: &'a str, url: &'a str, user_id: UserId, now: OffsetDateTime) -> Self {
		Self {
			id: FeedId::new(),
			created_at: now,
			updated_at: now,
			name,
			url,
			user_id,
		}
	}
}

impl From<NewFeed<'_>> for Feed {
	fn from(value: NewFeed<'_>) -> Self {
		Self {
			id: value.id,
			created_at: value.created_at,
			updated_at: value.updated_at,
			name: value.name.to_owned(),
			url: value.url.to_owned(),
			user_id: value.user_id,
			last_fetched_at: None,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable, Insertable)]
#[diesel(table_name = feed_follows)]
pub struct FeedFollow {
	pub id: FeedFollowId,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub user_id: UserId,
	pub feed_id: FeedId,
}

impl FeedFollow {
	pub fn new(user_id: UserId, feed_id: FeedId, now: OffsetDateTime) -> Self {
		Self {
			id: FeedFollowId::new(),
			created_at: now,
			updated_at: now,
			user_id,
			feed_id,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq, Queryable, Selectable)]
#[diesel(table_name = posts)]
pub struct Post {
	pub id: PostId,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub title: String,
	/// Globally unique, used to deduplicate re-fetched items
	pub url: String,
	pub description: String,
	pub published_at: OffsetDateTime,
	pub feed_id: FeedId,
}

/// A post as extracted from a fetched feed, before it is stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost<'a> {
	pub feed_id: FeedId,
	pub title: &'a str,
	pub url: &'a str,
	pub description: &'a str,
	pub published_at: OffsetDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = posts)]
pub struct PostRow<'a> {
	pub id: PostId,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub title: &'a str,
	pub url: &'a str,
	pub description: &'a str,
	pub published_at: OffsetDateTime,
	pub feed_id: FeedId,
}

impl<'a> PostRow<'a> {
	pub fn new(post: &NewPost<'a>, now: OffsetDateTime) -> Self {
		Self {
			id: PostId::new(),
			created_at: now,
			updated_at: now,
			title: post.title,
			url: post.url,
			description: post.description,
			published_at: post.published_at,
			feed_id: post.feed_id,
		}
	}
}

impl From<PostRow<'_>> for Post {
	fn from(value: PostRow<'_>) -> Self {
		Self {
			id: value.id,
			created_at: value.created_at,
			updated_at: value.updated_at,
			title: value.title.to_owned(),
			url: value.url.to_owned(),
			description: value.description.to_owned(),
			published_at: value.published_at,
			feed_id: value.feed_id,
		}
	}
}
