pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("could not build http client: {0}")]
	Client(#[source] reqwest::Error),

	/// Transport failure or non-success status
	#[error("request to {url} failed: {source}")]
	Request {
		url: String,
		#[source]
		source: reqwest::Error,
	},

	#[error("could not parse feed at {url}: {source}")]
	Parse {
		url: String,
		#[source]
		source: rss::Error,
	},
}
