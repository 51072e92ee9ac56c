// Shared fixtures for the integration tests

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use listing_monitor::Result;
use listing_monitor::config::PollerConfig;
use listing_monitor::notifier::Notifier;
use listing_monitor::poller::PollSettings;

pub mod cycle_tests;
pub mod pull_endpoint_tests;

/// Notifier that keeps every message body it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<String>>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, body: &str) -> Result<()> {
        self.sent.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

pub fn test_settings() -> PollSettings {
    PollSettings::from_config(&PollerConfig::default()).unwrap()
}

/// A search results page linking to `hrefs` in order.
pub fn search_page(hrefs: &[String]) -> String {
    let items: String = hrefs
        .iter()
        .map(|href| {
            format!(
                r#"<li class="s-item"><div class="s-item__info"><a class="s-item__link" href="{}"><span>listing</span></a></div></li>"#,
                href
            )
        })
        .collect();
    format!(r#"<html><body><ul class="srp-results">{}</ul></body></html>"#, items)
}

pub fn item_page(title: &str, seller: &str, price: &str) -> String {
    format!(
        r#"<html><body>
            <div class="ux-image-carousel-item active"><img src="https://i.ebayimg.com/images/g/{title}/s-l1600.jpg"></div>
            <h1 class="x-item-title__mainTitle"><span class="ux-textspans">{title}</span></h1>
            <div class="x-sellercard-atf__info__about-seller"><a href="/str/{seller}"><span class="ux-textspans">{seller}</span></a></div>
            <div class="x-price-primary"><span class="ux-textspans">{price}</span></div>
        </body></html>"#
    )
}
