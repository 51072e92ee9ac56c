use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use tower::ServiceExt;

use listing_monitor::Listing;
use listing_monitor::web::{AppState, PullBuffer, create_router};

async fn pull(buffer: &PullBuffer) -> Vec<Listing> {
    let app = create_router(AppState { buffer: buffer.clone() });
    let response = app
        .oneshot(Request::builder().uri("/pull_listings").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_pull_returns_listings_in_insertion_order_then_clears() {
    let buffer = PullBuffer::new();
    let mut first = Listing::new("https://www.ebay.com/itm/1", "USD");
    first.title = "Canon AE-1".to_string();
    buffer.push(first.clone());
    buffer.push(Listing::new("https://www.ebay.com/itm/2", "USD"));

    let pulled = pull(&buffer).await;
    assert_eq!(pulled.len(), 2);
    assert_eq!(pulled[0], first);
    assert_eq!(pulled[1].url, "https://www.ebay.com/itm/2");

    assert!(pull(&buffer).await.is_empty());
}

#[tokio::test]
async fn test_listings_pushed_after_pull_are_kept_for_next_pull() {
    let buffer = PullBuffer::new();
    buffer.push(Listing::new("https://www.ebay.com/itm/1", "GBP"));
    assert_eq!(pull(&buffer).await.len(), 1);

    buffer.push(Listing::new("https://www.ebay.com/itm/3", "GBP"));
    let pulled = pull(&buffer).await;
    assert_eq!(pulled.len(), 1);
    assert_eq!(pulled[0].currency, "GBP");
}
