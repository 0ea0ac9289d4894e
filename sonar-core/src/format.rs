use html_escape::decode_html_entities;

use crate::models::SearchResult;

/// Render a hit as `"<text>" -- <series> #<episode> @<seconds>`.
///
/// The search index stores HTML-escaped text, so entities are decoded here.
pub fn format_event(event: &SearchResult) -> String {
    format!(
        "\"{}\" -- {} #{} @{:.1}",
        decode_html_entities(&event.plaintext),
        decode_html_entities(&event.episode.series_name).trim(),
        decode_html_entities(&event.episode.episode_number).trim(),
        event.episode.timestamp,
    )
}
