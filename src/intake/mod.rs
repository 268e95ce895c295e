use crate::config::FeaturesConfig;
use crate::directory::{Directory, LinkHit, resolve};
use crate::recency::RecencyFilter;
use std::sync::Arc;

/// First line of every keyword reply.
pub const REPLY_PREAMBLE: &str = "Возможно это поможет разобраться:";

/// Turn a free-text group message into the list of links to reply with.
///
/// Commands and empty messages yield nothing. Matches go through the recency
/// filter when the cooldown feature is on; with the cooldown off the matches
/// pass through untouched (no marking, no expiry scheduling). An empty result
/// means "stay silent", never an error.
pub fn handle(
    directory: &Directory,
    filter: &Arc<RecencyFilter>,
    features: &FeaturesConfig,
    chat_id: i64,
    raw_text: &str,
) -> Vec<LinkHit> {
    let text = raw_text.trim();
    if text.is_empty() {
        tracing::debug!(chat_id, "empty message, skipped");
        return Vec::new();
    }
    if text.starts_with('/') {
        tracing::debug!(chat_id, %text, "command, not a keyword");
        return Vec::new();
    }

    let hits = resolve(directory, text);
    if hits.is_empty() || !features.recency_cooldown {
        return hits;
    }

    filter.filter_and_mark(chat_id, hits, features.cooldown())
}

/// One combined reply listing every surviving link, one per line.
pub fn format_reply(hits: &[LinkHit]) -> String {
    let mut reply = String::from(REPLY_PREAMBLE);
    for hit in hits {
        reply.push('\n');
        reply.push_str(&hit.name);
        reply.push_str(": ");
        reply.push_str(&hit.url);
    }
    reply
}
