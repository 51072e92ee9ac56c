use std::sync::Arc;

use listing_monitor::config::ScraperConfig;
use listing_monitor::fetcher::HttpFetcher;
use listing_monitor::web::PullBuffer;
use listing_monitor::{NotificationFormatter, Poller, SearchSpec, SeenIndex};
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::{RecordingNotifier, item_page, search_page, test_settings};

async fn mount_page(server: &MockServer, page_path: &str, status: u16, body: String) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(status).set_body_string(body))
        .mount(server)
        .await;
}

fn build_poller(search_url: &str, seen: SeenIndex, notifier: &RecordingNotifier) -> Poller {
    let fetcher = HttpFetcher::new(&ScraperConfig::default()).unwrap();
    Poller::new(
        vec![SearchSpec::new(search_url, "USD")],
        test_settings(),
        Box::new(fetcher),
        Arc::new(notifier.clone()),
        NotificationFormatter::from_source("{{.Title}} | {{.SellerName}} | {{.Price}} {{.Currency}} | {{.Url}}"),
        seen,
    )
}

#[tokio::test]
async fn test_cycle_reports_exactly_the_unseen_listing() {
    let server = MockServer::start().await;
    let search_url = format!("{}/sch/i.html?_nkw=rolleiflex", server.uri());
    let item = |id: u32| format!("{}/itm/{}", server.uri(), id);

    mount_page(
        &server,
        "/sch/i.html",
        200,
        search_page(&[
            format!("{}?hash=item1", item(1001)),
            format!("{}?hash=item2", item(1002)),
            format!("{}?hash=item3", item(1003)),
        ]),
    )
    .await;
    mount_page(&server, "/itm/1002", 200, item_page("Rolleiflex 2.8F", "classiccams", "US $1,850.00")).await;

    let dir = tempdir().unwrap();
    let store = dir.path().join("scraped.json");
    let mut seen = SeenIndex::load(&store);
    seen.mark_seen(&search_url, &item(1001));
    seen.mark_seen(&search_url, &item(1003));

    let notifier = RecordingNotifier::default();
    let mut poller = build_poller(&search_url, seen, &notifier);
    let report = poller.run_cycle().await;

    assert_eq!(report.new_listings, 1);
    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    assert_eq!(
        messages[0],
        format!("Rolleiflex 2.8F | classiccams | 1850.00 USD | {}", item(1002))
    );

    // The new listing was persisted as soon as it was processed
    let reloaded = SeenIndex::load(&store);
    assert!(reloaded.has(&search_url, &item(1002)));
}

#[tokio::test]
async fn test_seen_listings_survive_restart() {
    let server = MockServer::start().await;
    let search_url = format!("{}/sch/i.html?_nkw=hasselblad", server.uri());
    let item = format!("{}/itm/2001", server.uri());

    mount_page(&server, "/sch/i.html", 200, search_page(&[item.clone()])).await;
    mount_page(&server, "/itm/2001", 200, item_page("Hasselblad 500CM", "nordicfoto", "1.299,00 EUR")).await;

    let dir = tempdir().unwrap();
    let store = dir.path().join("scraped.json");
    let notifier = RecordingNotifier::default();

    let mut first = build_poller(&search_url, SeenIndex::load(&store), &notifier);
    assert_eq!(first.run_cycle().await.new_listings, 1);
    drop(first);

    let mut second = build_poller(&search_url, SeenIndex::load(&store), &notifier);
    let report = second.run_cycle().await;

    assert_eq!(report.new_listings, 0);
    assert!(!report.notified);
    assert_eq!(notifier.messages().len(), 1);
    assert!(notifier.messages()[0].contains("1299.00"));
}

#[tokio::test]
async fn test_failing_item_page_does_not_hide_other_listings() {
    let server = MockServer::start().await;
    let search_url = format!("{}/sch/i.html?_nkw=pentax", server.uri());
    let item = |id: u32| format!("{}/itm/{}", server.uri(), id);

    mount_page(&server, "/sch/i.html", 200, search_page(&[item(3001), item(3002), item(3003)])).await;
    mount_page(&server, "/itm/3001", 200, item_page("Pentax 67", "seller-a", "$900.00")).await;
    mount_page(&server, "/itm/3002", 500, "Internal Server Error".to_string()).await;
    mount_page(&server, "/itm/3003", 200, item_page("Pentax K1000", "seller-c", "$150.00")).await;

    let notifier = RecordingNotifier::default();
    let buffer = PullBuffer::new();
    let mut poller = build_poller(&search_url, SeenIndex::in_memory(), &notifier).with_pull_buffer(buffer.clone());
    let report = poller.run_cycle().await;

    assert_eq!(report.new_listings, 2);
    assert_eq!(report.listings_failed, 1);

    let messages = notifier.messages();
    assert_eq!(messages.len(), 1);
    let lines: Vec<&str> = messages[0].split("\r\n").collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("Pentax 67"));
    assert!(lines[1].starts_with("Pentax K1000"));

    let titles: Vec<String> = buffer.drain().into_iter().map(|l| l.title).collect();
    assert_eq!(titles, vec!["Pentax 67".to_string(), "Pentax K1000".to_string()]);
}

#[tokio::test]
async fn test_unreachable_search_sends_nothing() {
    let server = MockServer::start().await;
    let search_url = format!("{}/sch/i.html?_nkw=mamiya", server.uri());
    mount_page(&server, "/sch/i.html", 404, String::new()).await;

    let notifier = RecordingNotifier::default();
    let mut poller = build_poller(&search_url, SeenIndex::in_memory(), &notifier);
    let report = poller.run_cycle().await;

    assert_eq!(report.searches_failed, 1);
    assert!(notifier.messages().is_empty());
}

#[tokio::test]
async fn test_relative_item_links_are_followed_on_the_same_host() {
    let server = MockServer::start().await;
    let search_url = format!("{}/sch/i.html?_nkw=hasselblad", server.uri());

    mount_page(&server, "/sch/i.html", 200, search_page(&["/itm/4001?hash=item4".to_string()])).await;
    mount_page(&server, "/itm/4001", 200, item_page("Hasselblad 500CM", "swedecams", "$1,200.00")).await;

    let notifier = RecordingNotifier::default();
    let mut poller = build_poller(&search_url, SeenIndex::in_memory(), &notifier);
    let report = poller.run_cycle().await;

    let item_url = format!("{}/itm/4001", server.uri());
    assert_eq!(report.new_listings, 1);
    assert_eq!(
        notifier.messages(),
        vec![format!("Hasselblad 500CM | swedecams | 1200.00 USD | {}", item_url)]
    );
    assert!(poller.seen().has(&search_url, &item_url));
}
