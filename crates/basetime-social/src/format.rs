//! Cast text assembly.

use basetime_store::PostContent;

/// Format post content as cast text for the social feed.
///
/// The header and description become separate paragraphs. When an image is
/// attached its URL is appended as a final paragraph: the feed detects
/// media URLs in the text and renders them as embeds.
pub fn format_cast_text(content: &PostContent) -> String {
    match &content.image {
        Some(image) => format!("{}\n\n{}\n\n{}", content.header, content.description, image),
        None => format!("{}\n\n{}", content.header, content.description),
    }
}
