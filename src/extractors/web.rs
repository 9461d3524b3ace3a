//! Web page scraping.

use scraper::{Html, Node};
use tracing::{debug, warn};

use crate::envelope::Envelope;
use crate::http_client::HttpClient;
use crate::models::{IngestionResult, InputType, Warning};
use crate::quality::{Artifact, Assessor, Sample, WebContentAssessor};

/// Elements whose text never counts as page content.
const BOILERPLATE_TAGS: &[&str] = &[
    "script", "style", "nav", "footer", "header", "aside", "iframe", "noscript",
];

/// Language recorded in `source_meta`; no detection is attempted.
const ASSUMED_LANGUAGE: &str = "en";

/// Fetches a page and scores its visible text.
///
/// Network failures become zero-confidence results, never errors.
#[derive(Clone)]
pub struct WebExtractor {
    client: HttpClient,
    assessor: WebContentAssessor,
}

impl WebExtractor {
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            assessor: WebContentAssessor::new(),
        }
    }

    pub async fn extract(&self, url: &str) -> IngestionResult {
        let envelope = Envelope::new(InputType::WebPage).source(url, ASSUMED_LANGUAGE);

        let response = match self.client.get(url).await {
            Ok(response) => response,
            Err(e) => return envelope.empty(request_warning(&e)),
        };

        let status = response.status();
        if status.as_u16() >= 400 {
            warn!(url, status = status.as_u16(), "Page fetch failed");
            return envelope.empty(Warning::HttpError(status.as_u16()));
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => return envelope.empty(request_warning(&e)),
        };

        let text = collapse_whitespace(&visible_text(&body));
        debug!(url, chars = text.len(), "Scraped page");
        if text.is_empty() {
            return envelope.empty(Warning::EmptyPageContent);
        }

        let assessment = self
            .assessor
            .assess(&Sample::new(&text, Artifact::Remote, 1));
        envelope.build(text, assessment)
    }
}

fn request_warning(e: &reqwest::Error) -> Warning {
    warn!("Page request failed: {}", e);
    if e.is_timeout() {
        Warning::ConnectionTimeout
    } else if e.is_connect() {
        Warning::ConnectionError
    } else {
        Warning::ScrapeError(e.to_string())
    }
}

/// Text of every node outside boilerplate elements, space separated.
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut parts = Vec::new();

    for node in document.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };
        let in_boilerplate = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| BOILERPLATE_TAGS.contains(&el.name()))
        });
        if !in_boilerplate {
            parts.push(&**text);
        }
    }

    parts.join(" ")
}

/// Collapse every whitespace run to one space and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boilerplate_removed() {
        let html = r#"<html><head><style>body{}</style><script>var x=1;</script></head>
            <body><header>Site</header><nav><a>Home</a></nav>
            <main><h1>Title</h1><p>First   para.</p><aside>ad</aside><p>Second</p></main>
            <noscript>enable js</noscript><footer>(c)</footer></body></html>"#;
        let text = collapse_whitespace(&visible_text(html));
        assert_eq!(text, "Title First para. Second");
    }

    #[test]
    fn test_adjacent_elements_are_separated() {
        let text = collapse_whitespace(&visible_text("<p>one</p><p>two</p>"));
        assert_eq!(text, "one two");
    }

    #[test]
    fn test_collapse_whitespace() {
        assert_eq!(collapse_whitespace("  a\n\n b\t c  "), "a b c");
        assert_eq!(collapse_whitespace(" \n "), "");
    }
}
