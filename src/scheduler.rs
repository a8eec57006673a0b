use std::{future::Future, sync::Arc, time::Duration};

use time::{OffsetDateTime, format_description::BorrowedFormatItem, macros::format_description};
use tokio::time::MissedTickBehavior;

use crate::{
	config::ConfigError,
	database::{
		Store,
		models::{Feed, NewPost},
	},
	fetcher::{FeedDocument, Fetcher},
};

/// `Mon, 02 Jan 2006 15:04:05 -0700`
const PUB_DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!(
	"[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] [offset_hour sign:mandatory][offset_minute]"
);

/// Parses an item `pubDate`, RFC 1123 with a numeric zone only.
pub fn parse_pub_date(raw: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(raw.trim(), PUB_DATE_FORMAT).ok()
}

/// What happened to the items of a fetched document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
	pub inserted: usize,
	/// Already stored under the same url
	pub duplicates: usize,
	pub failed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
	/// No feed could be selected
	Idle,
	/// The feed could not be marked as fetched, nothing was fetched
	Skipped { feed: Feed },
	FetchFailed { feed: Feed },
	Ingested { feed: Feed, report: IngestReport },
}

/// Polls one feed per tick, least recently fetched first.
pub struct Aggregator {
	store: Arc<dyn Store>,
	fetcher: Fetcher,
	interval: Duration,
}

impl Aggregator {
	pub fn new(
		store: Arc<dyn Store>,
		fetcher: Fetcher,
		interval: Duration,
	) -> Result<Self, ConfigError> {
		if interval.is_zero() {
			return Err(ConfigError::InvalidInterval(interval));
		}

		Ok(Self {
			store,
			fetcher,
			interval,
		})
	}

	pub const fn interval(&self) -> Duration {
		self.interval
	}

	/// Ticks right away, then every `interval` until `shutdown` resolves.
	///
	/// Ticks never overlap. A tick that overruns the interval makes the next
	/// one start as soon as it returns, later ticks keep their initial
	/// schedule. `shutdown` is observed between ticks and while waiting, an
	/// in-flight tick always runs to completion.
	pub async fn run(&self, shutdown: impl Future<Output = ()>) {
		tokio::pin!(shutdown);

		let mut ticker = tokio::time::interval(self.interval);
		ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

		tracing::info!(interval = ?self.interval, "starting aggregator");

		loop {
			tokio::select! {
				biased;
				() = &mut shutdown => {
					tracing::info!("aggregator shutdown requested");
					break;
				}
				_ = ticker.tick() => {}
			}

			self.tick().await;
		}
	}

	pub async fn tick(&self) -> TickOutcome {
		let feed = match self.store.get_next_feed_to_fetch() {
			Ok(feed) => feed,
			Err(err) => {
				tracing::warn!(err = %err, "no feed to fetch");
				return TickOutcome::Idle;
			}
		};

		// marked before fetching so a slow or failing feed rotates out
		if let Err(err) = self
			.store
			.mark_feed_fetched(feed.id, OffsetDateTime::now_utc())
		{
			tracing::error!(err = %err, feed_id = %feed.id, "could not mark feed as fetched");
			return TickOutcome::Skipped { feed };
		}

		tracing::info!(feed = %feed.name, url = %feed.url, "fetching feed");

		let document = match self.fetcher.fetch_feed(&feed.url).await {
			Ok(document) => document,
			Err(err) => {
				tracing::warn!(err = %err, feed_id = %feed.id, "could not fetch feed");
				return TickOutcome::FetchFailed { feed };
			}
		};

		let report = self.ingest(&feed, &document);
		tracing::info!(
			feed = %feed.name,
			inserted = report.inserted,
			duplicates = report.duplicates,
			failed = report.failed,
			"ingested feed"
		);

		TickOutcome::Ingested { feed, report }
	}

	/// Stores every item of `document` as a post of `feed`, in document order.
	pub fn ingest(&self, feed: &Feed, document: &FeedDocument) -> IngestReport {
		let mut report = IngestReport::default();

		for item in &document.items {
			let published_at = parse_pub_date(&item.pub_date).unwrap_or_else(|| {
				tracing::debug!(
					pub_date = %item.pub_date,
					link = %item.link,
					"unparsable publication date"
				);
				OffsetDateTime::now_utc()
			});

			let post = NewPost {
				feed_id: feed.id,
				title: &item.title,
				url: &item.link,
				description: &item.description,
				published_at,
			};

			match self.store.create_post(&post) {
				Ok(post) => {
					tracing::debug!(title = %post.title, "created post");
					report.inserted += 1;
				}
				Err(err) if err.is_conflict() => {
					tracing::debug!(link = %item.link, "post already stored");
					report.duplicates += 1;
				}
				Err(err) => {
					tracing::error!(err = %err, link = %item.link, "could not store post");
					report.failed += 1;
				}
			}
		}

		report
	}
}
