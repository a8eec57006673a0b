use std::{sync::Arc, time::Duration};

use gator::{
	database::{
		self, MemoryStore, Store,
		models::{Feed, FeedFollow, FeedId, NewPost, Post, User, UserId},
	},
	fetcher::Fetcher,
	scheduler::{Aggregator, IngestReport, TickOutcome},
};
use time::{OffsetDateTime, macros::datetime};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mod common;

fn aggregator(store: &Arc<MemoryStore>) -> Aggregator {
	Aggregator::new(store.clone(), Fetcher::new().unwrap(), Duration::from_secs(60)).unwrap()
}

/// Wraps a [`MemoryStore`] and fails selected writes with a non-conflict error
#[derive(Default)]
struct FaultyStore {
	inner: MemoryStore,
	broken_post_url: Option<&'static str>,
	broken_mark: bool,
}

fn broken_query() -> database::Error {
	database::Error::Query(diesel::result::Error::BrokenTransactionManager)
}

impl Store for FaultyStore {
	fn create_user(&self, name: &str) -> database::Result<User> {
		self.inner.create_user(name)
	}

	fn get_user(&self, name: &str) -> database::Result<User> {
		self.inner.get_user(name)
	}

	fn list_users(&self) -> database::Result<Vec<User>> {
		self.inner.list_users()
	}

	fn reset(&self) -> database::Result<()> {
		self.inner.reset()
	}

	fn create_feed(&self, name: &str, url: &str, creator: UserId) -> database::Result<Feed> {
		self.inner.create_feed(name, url, creator)
	}

	fn get_feed(&self, url: &str) -> database::Result<Feed> {
		self.inner.get_feed(url)
	}

	fn list_feeds(&self) -> database::Result<Vec<(Feed, String)>> {
		self.inner.list_feeds()
	}

	fn get_next_feed_to_fetch(&self) -> database::Result<Feed> {
		self.inner.get_next_feed_to_fetch()
	}

	fn mark_feed_fetched(&self, id: FeedId, at: OffsetDateTime) -> database::Result<()> {
		if self.broken_mark {
			return Err(broken_query());
		}
		self.inner.mark_feed_fetched(id, at)
	}

	fn create_post(&self, post: &NewPost<'_>) -> database::Result<Post> {
		if self.broken_post_url == Some(post.url) {
			return Err(broken_query());
		}
		self.inner.create_post(post)
	}

	fn create_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> database::Result<FeedFollow> {
		self.inner.create_feed_follow(user_id, feed_id)
	}

	fn delete_feed_follow(&self, user_id: UserId, feed_id: FeedId) -> database::Result<bool> {
		self.inner.delete_feed_follow(user_id, feed_id)
	}

	fn list_followed_feeds(&self, user_id: UserId) -> database::Result<Vec<Feed>> {
		self.inner.list_followed_feeds(user_id)
	}

	fn list_posts_for_user(&self, user_id: UserId, limit: i64) -> database::Result<Vec<Post>> {
		self.inner.list_posts_for_user(user_id, limit)
	}
}

#[tokio::test]
async fn second_tick_on_same_document_inserts_nothing() {
	let server = MockServer::start().await;
	let url = common::serve_feed(&server, "/rss", common::three_items()).await;

	let store = Arc::new(MemoryStore::new());
	let user = store.create_user("ana").unwrap();
	let feed = store.create_feed("HN", &url, user.id).unwrap();
	store.create_feed_follow(user.id, feed.id).unwrap();
	let aggregator = aggregator(&store);

	let TickOutcome::Ingested { report, .. } = aggregator.tick().await else {
		panic!("first tick should ingest");
	};
	assert_eq!(
		report,
		IngestReport {
			inserted: 3,
			duplicates: 0,
			failed: 0
		}
	);

	let TickOutcome::Ingested { report, .. } = aggregator.tick().await else {
		panic!("second tick should ingest");
	};
	assert_eq!(report.inserted, 0);
	assert_eq!(report.duplicates, 3);

	assert_eq!(store.list_posts_for_user(user.id, 100).unwrap().len(), 3);
}

#[tokio::test]
async fn unparsable_dates_fall_back_to_ingestion_time() {
	let server = MockServer::start().await;
	let body = common::rss(&[
		("Bad", "https://news.example/bad", "sometime last week"),
		("Good", "https://news.example/good", "Mon, 02 Jan 2006 15:04:05 -0700"),
	]);
	let url = common::serve_feed(&server, "/rss", body).await;

	let store = Arc::new(MemoryStore::new());
	let user = store.create_user("ana").unwrap();
	let feed = store.create_feed("HN", &url, user.id).unwrap();
	store.create_feed_follow(user.id, feed.id).unwrap();

	let started_at = OffsetDateTime::now_utc();
	let outcome = aggregator(&store).tick().await;
	assert!(matches!(outcome, TickOutcome::Ingested { report, .. } if report.inserted == 2));

	let posts = store.list_posts_for_user(user.id, 10).unwrap();
	let bad = posts.iter().find(|post| post.title == "Bad").unwrap();
	let good = posts.iter().find(|post| post.title == "Good").unwrap();
	assert!(bad.published_at >= started_at);
	assert_eq!(good.published_at, datetime!(2006-01-02 15:04:05 -07:00));
}

#[tokio::test]
async fn failed_fetch_still_rotates_the_feed() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/down"))
		.respond_with(ResponseTemplate::new(500))
		.mount(&server)
		.await;
	let healthy_url = common::serve_feed(&server, "/rss", common::three_items()).await;

	let store = Arc::new(MemoryStore::new());
	let user = store.create_user("ana").unwrap();
	let broken = store
		.create_feed("broken", &format!("{}/down", server.uri()), user.id)
		.unwrap();
	let healthy = store.create_feed("healthy", &healthy_url, user.id).unwrap();
	let aggregator = aggregator(&store);

	let first = aggregator.tick().await;
	assert!(matches!(first, TickOutcome::FetchFailed { ref feed } if feed.id == broken.id));
	assert!(store.get_feed(&broken.url).unwrap().last_fetched_at.is_some());

	let second = aggregator.tick().await;
	assert!(matches!(second, TickOutcome::Ingested { ref feed, .. } if feed.id == healthy.id));

	// both fetched once, the broken one is due again
	assert_eq!(store.get_next_feed_to_fetch().unwrap().id, broken.id);
}

#[tokio::test]
async fn duplicate_urls_across_feeds_are_skipped() {
	let server = MockServer::start().await;
	let first_url = common::serve_feed(&server, "/a", common::three_items()).await;
	let second_url = common::serve_feed(&server, "/b", common::three_items()).await;

	let store = Arc::new(MemoryStore::new());
	let user = store.create_user("ana").unwrap();
	store.create_feed("a", &first_url, user.id).unwrap();
	store.create_feed("b", &second_url, user.id).unwrap();
	let aggregator = aggregator(&store);

	aggregator.tick().await;
	let outcome = aggregator.tick().await;

	assert!(matches!(
		outcome,
		TickOutcome::Ingested { report, .. } if report.inserted == 0 && report.duplicates == 3
	));
}

#[tokio::test]
async fn run_ticks_immediately_and_stops_on_shutdown() {
	let server = MockServer::start().await;
	let url = common::serve_feed(&server, "/rss", common::three_items()).await;

	let store = Arc::new(MemoryStore::new());
	let user = store.create_user("ana").unwrap();
	let feed = store.create_feed("HN", &url, user.id).unwrap();
	store.create_feed_follow(user.id, feed.id).unwrap();

	let aggregator = aggregator(&store);
	let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

	let run = aggregator.run(async move {
		let _ = stop_rx.await;
	});
	let watched = store.clone();
	let stop = async move {
		// the first tick happens right away, the next one is a minute out
		while watched.list_posts_for_user(user.id, 10).unwrap().len() < 3 {
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		let _ = stop_tx.send(());
	};

	tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(run, stop) })
		.await
		.expect("aggregator did not stop");

	assert!(store.get_feed(&url).unwrap().last_fetched_at.is_some());
}

#[tokio::test]
async fn run_returns_right_away_when_already_shut_down() {
	let store = Arc::new(MemoryStore::new());
	let user = store.create_user("ana").unwrap();
	store
		.create_feed("HN", "http://127.0.0.1:9/rss", user.id)
		.unwrap();

	aggregator(&store).run(std::future::ready(())).await;

	// the shutdown won the race against the first tick
	let feed = store.get_next_feed_to_fetch().unwrap();
	assert!(feed.last_fetched_at.is_none());
}

#[tokio::test]
async fn failing_post_write_skips_only_that_item() {
	let server = MockServer::start().await;
	let url = common::serve_feed(&server, "/rss", common::three_items()).await;

	let store = Arc::new(FaultyStore {
		broken_post_url: Some("https://news.example/2"),
		..FaultyStore::default()
	});
	let user = store.create_user("ana").unwrap();
	let feed = store.create_feed("HN", &url, user.id).unwrap();
	store.create_feed_follow(user.id, feed.id).unwrap();
	let aggregator =
		Aggregator::new(store.clone(), Fetcher::new().unwrap(), Duration::from_secs(60)).unwrap();

	let TickOutcome::Ingested { report, .. } = aggregator.tick().await else {
		panic!("tick should ingest");
	};
	assert_eq!(
		report,
		IngestReport {
			inserted: 2,
			duplicates: 0,
			failed: 1
		}
	);

	let posts = store.list_posts_for_user(user.id, 10).unwrap();
	let mut urls = posts.iter().map(|post| post.url.as_str()).collect::<Vec<_>>();
	urls.sort_unstable();
	assert_eq!(urls, ["https://news.example/1", "https://news.example/3"]);
}

#[tokio::test]
async fn unmarkable_feed_is_skipped_without_fetching() {
	let server = MockServer::start().await;
	Mock::given(method("GET"))
		.and(path("/rss"))
		.respond_with(ResponseTemplate::new(200).set_body_string(common::three_items()))
		.expect(0)
		.mount(&server)
		.await;

	let store = Arc::new(FaultyStore {
		broken_mark: true,
		..FaultyStore::default()
	});
	let user = store.create_user("ana").unwrap();
	let feed = store
		.create_feed("HN", &format!("{}/rss", server.uri()), user.id)
		.unwrap();
	let aggregator =
		Aggregator::new(store.clone(), Fetcher::new().unwrap(), Duration::from_secs(60)).unwrap();

	let outcome = aggregator.tick().await;

	assert!(matches!(outcome, TickOutcome::Skipped { feed: ref skipped } if skipped.id == feed.id));
	assert!(store.get_feed(&feed.url).unwrap().last_fetched_at.is_none());
	server.verify().await;
}

#[tokio::test]
async fn run_keeps_ticking_after_idle_ticks() {
	let server = MockServer::start().await;
	let url = common::serve_feed(&server, "/rss", common::three_items()).await;

	let store = Arc::new(MemoryStore::new());
	let aggregator =
		Aggregator::new(store.clone(), Fetcher::new().unwrap(), Duration::from_millis(20)).unwrap();
	let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();

	let run = aggregator.run(async move {
		let _ = stop_rx.await;
	});
	let watched = store.clone();
	let stop = async move {
		// let a few ticks find nothing before a feed shows up
		tokio::time::sleep(Duration::from_millis(100)).await;
		let user = watched.create_user("ana").unwrap();
		let feed = watched.create_feed("HN", &url, user.id).unwrap();
		watched.create_feed_follow(user.id, feed.id).unwrap();

		while watched.list_posts_for_user(user.id, 10).unwrap().len() < 3 {
			tokio::time::sleep(Duration::from_millis(10)).await;
		}
		let _ = stop_tx.send(());
	};

	tokio::time::timeout(Duration::from_secs(5), async { tokio::join!(run, stop) })
		.await
		.expect("aggregator did not pick up the new feed");
}
