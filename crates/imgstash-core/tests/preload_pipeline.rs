#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use bytes::Bytes;
use imgstash_core::{
    Config, DiskStore, HtmlDocument, Preloader, Rect, Store, StoreConfig, ViewportSize,
    build_queue, discover_urls, partition,
};
use imgstash_core::discovery::discover_all;
use tempfile::TempDir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

const PAGE: &str = r#"
<html>
  <body>
    <img src="a.jpg" alt="hero">
    <img src="b.png" alt="footer">
    <a href="c.webp">full resolution</a>
    <a href="about.html">about</a>
  </body>
</html>
"#;

async fn image_server() -> MockServer {
    let server = MockServer::start().await;
    for (route, body) in [
        ("/a.jpg", &b"bytes of a"[..]),
        ("/b.png", &b"bytes of b"[..]),
        ("/c.webp", &b"bytes of c"[..]),
    ] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
            .mount(&server)
            .await;
    }
    server
}

fn page(base: &str) -> HtmlDocument {
    HtmlDocument::parse(PAGE, base)
        .unwrap()
        .with_rects([
            (0, Rect::from_xywh(0.0, 0.0, 800.0, 300.0)),
            (1, Rect::from_xywh(0.0, 2400.0, 800.0, 300.0)),
        ])
}

#[tokio::test]
async fn discovery_and_queue_order() {
    let base = "https://example.com/";
    let document = page(base);
    let viewport = ViewportSize::new(1024.0, 768.0);

    let discovered = discover_all(&document);
    assert_eq!(
        discover_urls(&document),
        [
            "https://example.com/a.jpg",
            "https://example.com/b.png",
            "https://example.com/c.webp",
        ]
    );

    let parts = partition(&discovered, &document, &viewport);
    assert_eq!(parts.visible, ["https://example.com/a.jpg"]);
    assert_eq!(
        parts.offscreen,
        ["https://example.com/b.png", "https://example.com/c.webp"]
    );

    assert_eq!(
        build_queue(parts),
        [
            "https://example.com/a.jpg",
            "https://example.com/b.png",
            "https://example.com/c.webp",
        ]
    );
}

#[tokio::test]
async fn page_images_land_in_disk_store() {
    let server = image_server().await;
    let base = format!("{}/", server.uri());
    let temp = TempDir::new().unwrap();
    let store = Arc::new(DiskStore::open(temp.path()).await.unwrap());

    let preloader = Preloader::builder()
        .store(Arc::clone(&store) as Arc<dyn Store>)
        .build()
        .unwrap();
    let stats = preloader
        .start(&page(&base), &ViewportSize::new(1024.0, 768.0))
        .await;

    assert_eq!(stats.claimed, 3);
    assert_eq!(stats.cached, 3);
    assert_eq!(stats.batches, 1);
    assert_eq!(stats.fetch_failures, 0);
    assert_eq!(stats.timeouts, 0);
    // The served bytes are not real images.
    assert_eq!(stats.decode_failures, 3);
    assert!(preloader.queued().is_empty());

    // A fresh handle on the same directory sees the entries.
    let reopened = DiskStore::open(temp.path()).await.unwrap();
    for (name, body) in [
        ("a.jpg", &b"bytes of a"[..]),
        ("b.png", &b"bytes of b"[..]),
        ("c.webp", &b"bytes of c"[..]),
    ] {
        let url = format!("{base}{name}");
        assert_eq!(
            reopened.get(&url).await.unwrap(),
            Some(Bytes::copy_from_slice(body)),
            "missing entry for {url}"
        );
    }
}

#[tokio::test]
async fn new_session_preloads_again() {
    let server = image_server().await;
    let base = format!("{}/", server.uri());
    let temp = TempDir::new().unwrap();
    let store: Arc<dyn Store> = Arc::new(DiskStore::open(temp.path()).await.unwrap());
    let viewport = ViewportSize::new(1024.0, 768.0);

    for _ in 0..2 {
        let preloader = Preloader::builder()
            .store(Arc::clone(&store))
            .build()
            .unwrap();
        let stats = preloader.start(&page(&base), &viewport).await;
        assert_eq!(stats.claimed, 3);
        assert_eq!(stats.duplicates, 0);
    }
}

#[tokio::test]
async fn unavailable_store_degrades_to_memory_only() {
    let server = image_server().await;
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("occupied");
    std::fs::write(&blocker, b"not a directory").unwrap();

    let config = Config {
        store: StoreConfig {
            enabled: true,
            root: blocker,
        },
        ..Config::default()
    };
    let preloader = Preloader::from_config(&config).await.unwrap();

    let stats = preloader
        .start(
            &page(&format!("{}/", server.uri())),
            &ViewportSize::new(1024.0, 768.0),
        )
        .await;

    assert_eq!(stats.claimed, 3);
    assert_eq!(stats.cached, 0);
    assert_eq!(stats.fetch_failures, 0);
    assert_eq!(stats.store_failures, 0);
}
