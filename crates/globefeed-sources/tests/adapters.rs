//! Integration tests for the source adapters using wiremock HTTP mocks.

use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use globefeed_sources::{AggregateOptions, ForumClient, LinkAggClient, NewsSources, SourceSet};

const FEED_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Mock Markets Wire</title>
    <item>
      <title>Stocks rally into the close</title>
      <link>https://example.com/rally</link>
      <description>Equities finished higher.</description>
      <pubDate>Wed, 01 May 2024 20:00:00 GMT</pubDate>
    </item>
    <item>
      <title>Gold steadies after slide</title>
      <link>https://example.com/gold</link>
      <description>Bullion held near support.</description>
      <pubDate>Wed, 01 May 2024 18:00:00 GMT</pubDate>
    </item>
  </channel>
</rss>"#;

fn forum_listing() -> serde_json::Value {
    serde_json::json!({
        "data": {
            "children": [
                {
                    "data": {
                        "id": "p1",
                        "title": "NVDA earnings megathread",
                        "selftext": "Discuss here",
                        "url": "",
                        "permalink": "/r/mock/comments/p1/nvda/",
                        "created_utc": 1_714_590_000.0,
                        "stickied": false
                    }
                },
                {
                    "data": {
                        "id": "p2",
                        "title": "Daily sticky",
                        "selftext": "rules",
                        "url": "",
                        "permalink": "/r/mock/comments/p2/sticky/",
                        "created_utc": 1_714_590_100.0,
                        "stickied": true
                    }
                }
            ]
        }
    })
}

#[tokio::test]
async fn forum_client_keeps_valid_posts_and_drops_stickies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/mock/hot.json"))
        .and(query_param("raw_json", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forum_listing()))
        .mount(&server)
        .await;

    let client = ForumClient::new(&server.uri(), "mock", 5).expect("client");
    let items = client.fetch_ranked(10).await.expect("listing parses");

    assert_eq!(items.len(), 1, "sticky must be dropped");
    assert_eq!(items[0].title.as_deref(), Some("NVDA earnings megathread"));
    assert_eq!(items[0].symbols, vec!["NVDA".to_string()]);
}

#[tokio::test]
async fn forum_client_surfaces_non_2xx_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/mock/hot.json"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = ForumClient::new(&server.uri(), "mock", 5).expect("client");
    let err = client.fetch_ranked(10).await.expect_err("503 is an error");
    assert!(err.to_string().contains("503"), "got: {err}");
}

#[tokio::test]
async fn linkagg_client_filters_by_finance_allowlist() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([1, 2])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 1,
            "title": "Why the stock market is weird",
            "url": "https://example.com/weird-market",
            "time": 1_714_590_000,
            "by": "alice",
            "type": "story"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 2,
            "title": "Show HN: my window manager",
            "url": "https://example.com/wm",
            "time": 1_714_590_100,
            "by": "bob",
            "type": "story"
        })))
        .mount(&server)
        .await;

    let client = LinkAggClient::new(&server.uri(), 5).expect("client");
    let items = client.fetch_top(10).await.expect("fetch");

    assert_eq!(items.len(), 1, "non-finance title must be filtered");
    assert_eq!(items[0].id.as_deref(), Some("1"));
}

#[tokio::test]
async fn linkagg_client_skips_items_that_fail_to_resolve() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([7, 8])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/7.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/item/8.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "id": 8,
            "title": "Bank earnings preview",
            "url": "https://example.com/banks",
            "time": 1_714_590_200,
            "by": "carol",
            "type": "story"
        })))
        .mount(&server)
        .await;

    let client = LinkAggClient::new(&server.uri(), 5).expect("client");
    let items = client.fetch_top(10).await.expect("fetch");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id.as_deref(), Some("8"));
}

#[tokio::test]
async fn aggregate_tolerates_a_dead_adapter() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/feed.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_string(FEED_XML))
        .mount(&server)
        .await;
    // forum and linkagg endpoints are not mounted: both adapters fail, the
    // batch must still carry the RSS contribution.
    Mock::given(method("GET"))
        .and(path("/r/mock/hot.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/topstories.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let sources = NewsSources::new(
        vec![format!("{}/feed.xml", server.uri())],
        &server.uri(),
        "mock",
        &server.uri(),
        5,
    )
    .expect("sources");

    let items = sources
        .aggregate(&AggregateOptions {
            limit: 9,
            sources: SourceSet::default(),
            category: None,
            symbols: Vec::new(),
        })
        .await;

    assert_eq!(items.len(), 2, "RSS items survive the dead adapters");
    assert!(items[0].published_at > items[1].published_at);
    assert_eq!(items[0].source, "Mock Markets Wire");
}

#[tokio::test]
async fn aggregate_respects_source_selection() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/r/mock/hot.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forum_listing()))
        .mount(&server)
        .await;

    let sources = NewsSources::new(
        vec![format!("{}/feed.xml", server.uri())],
        &server.uri(),
        "mock",
        &server.uri(),
        5,
    )
    .expect("sources");

    let items = sources
        .aggregate(&AggregateOptions {
            limit: 10,
            sources: SourceSet::parse("forum"),
            category: None,
            symbols: Vec::new(),
        })
        .await;

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].source, "r/mock");
}
