use bytes::Buf;
use reqwest::Client;

mod error;

pub use self::error::{Error, Result};

/// Sent with every request, some hosts reject anonymous clients
pub const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// A parsed RSS channel
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedDocument {
	pub title: String,
	pub link: String,
	pub description: String,
	/// In document order
	pub items: Vec<FeedItem>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedItem {
	pub title: String,
	pub link: String,
	pub description: String,
	/// Raw `pubDate`, left unparsed
	pub pub_date: String,
}

impl From<rss::Channel> for FeedDocument {
	fn from(channel: rss::Channel) -> Self {
		let items = channel
			.items()
			.iter()
			.map(|item| FeedItem {
				title: item.title().unwrap_or_default().to_owned(),
				link: item.link().unwrap_or_default().to_owned(),
				description: item.description().unwrap_or_default().to_owned(),
				pub_date: item.pub_date().unwrap_or_default().to_owned(),
			})
			.collect();

		Self {
			title: channel.title().to_owned(),
			link: channel.link().to_owned(),
			description: channel.description().to_owned(),
			items,
		}
	}
}

/// HTTP client for RSS documents. Never retries, the aggregator simply comes
/// back to the feed on a later tick.
#[derive(Debug, Clone)]
pub struct Fetcher {
	client: Client,
}

impl Fetcher {
	pub fn new() -> Result<Self> {
		let client = Client::builder()
			.user_agent(USER_AGENT)
			.build()
			.map_err(Error::Client)?;

		Ok(Self { client })
	}

	pub async fn fetch_feed(&self, url: &str) -> Result<FeedDocument> {
		let request_error = |source| Error::Request {
			url: url.to_owned(),
			source,
		};

		let body = self
			.client
			.get(url)
			.send()
			.await
			.and_then(reqwest::Response::error_for_status)
			.map_err(request_error)?
			.bytes()
			.await
			.map_err(request_error)?;

		let channel = rss::Channel::read_from(body.reader()).map_err(|source| Error::Parse {
			url: url.to_owned(),
			source,
		})?;

		tracing::debug!(url = %url, items = channel.items().len(), "successfully fetched feed");

		Ok(channel.into())
	}
}
