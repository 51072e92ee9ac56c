use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;

/// Owned snapshot of a matched element: its attributes and its text content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    attributes: HashMap<String, String>,
    text: String,
}

impl Node {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            attributes: HashMap::new(),
            text: text.into(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn from_element(element: ElementRef<'_>) -> Self {
        let attributes = element
            .value()
            .attrs()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        let text = element.text().collect::<Vec<_>>().join("").trim().to_string();

        Self { attributes, text }
    }
}

/// Structural queries over a fetched page.
///
/// The extractor and the poller only depend on this trait, so any HTML parser
/// (or a canned fake in tests) can back it.
pub trait QueryableDocument {
    fn find_first(&self, selector: &str) -> Option<Node>;
    fn find_all(&self, selector: &str) -> Vec<Node>;

    fn exists(&self, selector: &str) -> bool {
        self.find_first(selector).is_some()
    }
}

/// [`QueryableDocument`] backed by a parsed `scraper::Html` tree.
pub struct HtmlDocument {
    html: Html,
}

impl HtmlDocument {
    pub fn parse(content: &str) -> Self {
        Self {
            html: Html::parse_document(content),
        }
    }

    fn selector(selector: &str) -> Option<Selector> {
        match Selector::parse(selector) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                tracing::warn!("Invalid CSS selector '{}': {:?}", selector, e);
                None
            }
        }
    }
}

impl QueryableDocument for HtmlDocument {
    fn find_first(&self, selector: &str) -> Option<Node> {
        let selector = Self::selector(selector)?;
        self.html.select(&selector).next().map(Node::from_element)
    }

    fn find_all(&self, selector: &str) -> Vec<Node> {
        match Self::selector(selector) {
            Some(selector) => self.html.select(&selector).map(Node::from_element).collect(),
            None => Vec::new(),
        }
    }
}
