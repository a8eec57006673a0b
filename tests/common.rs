#![allow(dead_code)]

use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// An RSS document with one `<item>` per `(title, link, pub_date)`
pub fn rss(items: &[(&str, &str, &str)]) -> String {
	let items = items
		.iter()
		.map(|(title, link, pub_date)| {
			format!(
				"<item><title>{title}</title><link>{link}</link>\
				 <description>About {title}</description><pubDate>{pub_date}</pubDate></item>"
			)
		})
		.collect::<String>();

	format!(
		r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test Feed</title><link>http://example.com/</link><description>Test</description>{items}</channel></rss>"#
	)
}

pub fn three_items() -> String {
	rss(&[
		("One", "https://news.example/1", "Mon, 02 Jan 2006 15:04:05 -0700"),
		("Two", "https://news.example/2", "Tue, 03 Jan 2006 15:04:05 -0700"),
		("Three", "https://news.example/3", "Wed, 04 Jan 2006 15:04:05 -0700"),
	])
}

/// Serves `body` at `route` and returns the full feed url
pub async fn serve_feed(server: &MockServer, route: &str, body: String) -> String {
	Mock::given(method("GET"))
		.and(path(route))
		.respond_with(
			ResponseTemplate::new(200)
				.insert_header("content-type", "application/rss+xml")
				.set_body_string(body),
		)
		.mount(server)
		.await;

	format!("{}{route}", server.uri())
}
