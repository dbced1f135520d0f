use serde::Serialize;
use tracing::debug;

use crate::dom::{Document, DomNode};
use crate::error::DomError;
use crate::parser::selectors::{
    FEED_AUTHORS, FEED_BODIES, FEED_CHROME, FEED_CONTAINERS, FEED_ITEMS, FEED_TIMES,
};
use crate::parser::text::normalize_text;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChatterEntry {
    pub author: String,
    pub time: String,
    pub text: String,
}

/// Most recent feed posts, at most `max` of them.
pub fn extract<D: Document>(doc: &D, max: usize) -> Vec<ChatterEntry> {
    match read_feed(doc, max) {
        Ok(entries) => entries,
        Err(e) => {
            debug!(error = %e, "chatter feed unreadable");
            Vec::new()
        }
    }
}

fn read_feed<D: Document>(doc: &D, max: usize) -> Result<Vec<ChatterEntry>, DomError> {
    let containers = doc.query_all(&FEED_CONTAINERS)?;
    let Some(feed) = FEED_CONTAINERS
        .each()
        .find_map(|(_, selector)| containers.iter().find(|c| c.matches(selector)))
    else {
        return Ok(Vec::new());
    };

    let entries: Vec<ChatterEntry> = feed
        .select(FEED_ITEMS.group())
        .iter()
        .filter_map(read_item)
        .take(max)
        .collect();
    debug!(entries = entries.len(), "chatter collected");
    Ok(entries)
}

fn read_item<N: DomNode>(item: &N) -> Option<ChatterEntry> {
    let author = FEED_AUTHORS
        .each()
        .filter_map(|(_, selector)| item.select_first(selector))
        .map(|el| normalize_text(&el.text()))
        .find(|t| !t.is_empty())
        .unwrap_or_default();

    let time = FEED_TIMES
        .each()
        .find_map(|(_, selector)| item.select_first(selector))
        .map(|el| {
            ["title", "data-original-title"]
                .into_iter()
                .filter_map(|name| el.attribute(name))
                .find(|t| !t.trim().is_empty())
                .map(normalize_text)
                .unwrap_or_else(|| normalize_text(&el.text()))
        })
        .unwrap_or_default();

    let body = item
        .select_first(FEED_BODIES.group())
        .unwrap_or_else(|| item.clone());
    let text = normalize_text(&body.text_excluding(FEED_CHROME.group()));

    if author.is_empty() && time.is_empty() && text.is_empty() {
        return None;
    }
    Some(ChatterEntry { author, time, text })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Snapshot;

    const FEED: &str = r#"<body>
        <div class="cuf-feed">
            <article class="cuf-feedElement">
                <a class="actorName profileLink" href="/005A">Dana Ortiz</a>
                <a class="timestamp"><time title="2024-01-08 10:15">Jan 8</time></a>
                <div class="feedBody">
                    Assets uploaded to the shared folder.
                    <button class="slds-button">Like</button>
                    <div class="feed-actions">Comment Share</div>
                </div>
            </article>
            <article class="cuf-feedElement">
                <span class="publisher-name">  </span>
                <a class="profileLink" href="/005B">Sam Lee</a>
                <span class="feedDate">Yesterday at 4:02 PM</span>
                <div class="cuf-feedItemContent">Approved for launch<script>track()</script></div>
            </article>
            <article class="cuf-feedElement"><div class="moreActions">More</div></article>
        </div>
    </body>"#;

    #[test]
    fn reads_author_time_and_body() {
        let entries = extract(&Snapshot::parse(FEED), 20);
        assert_eq!(
            entries,
            vec![
                ChatterEntry {
                    author: "Dana Ortiz".into(),
                    time: "2024-01-08 10:15".into(),
                    text: "Assets uploaded to the shared folder.".into(),
                },
                ChatterEntry {
                    author: "Sam Lee".into(),
                    time: "Yesterday at 4:02 PM".into(),
                    text: "Approved for launch".into(),
                },
            ]
        );
    }

    #[test]
    fn empty_title_falls_back_to_tooltip_attribute() {
        let html = r#"<body><div class="cuf-feed"><div class="feedItem">
            <span class="actorName">Dana Ortiz</span>
            <abbr class="timestamp" title="" data-original-title="2024-01-08 10:15">2h</abbr>
        </div></div></body>"#;
        let entries = extract(&Snapshot::parse(html), 20);
        assert_eq!(entries[0].time, "2024-01-08 10:15");
    }

    #[test]
    fn respects_limit() {
        let entries = extract(&Snapshot::parse(FEED), 1);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].author, "Dana Ortiz");
    }

    #[test]
    fn container_priority_beats_document_order() {
        let html = r#"<body>
            <div class="cuf-feed"><div class="feedItem"><span class="actorName">Later Feed</span></div></div>
            <div class="feedContainer"><div class="feedItem"><span class="actorName">Primary Feed</span></div></div>
        </body>"#;
        let entries = extract(&Snapshot::parse(html), 20);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].author, "Primary Feed");
    }

    #[test]
    fn no_feed() {
        assert!(extract(&Snapshot::parse("<body><p>nothing</p></body>"), 20).is_empty());
    }
}
