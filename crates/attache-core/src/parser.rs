use crate::model::EmbedRef;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd};
use std::path::Path;

/// Lowercased file extension of a link target, anchors and aliases
/// ignored.
pub(crate) fn link_extension(link: &str) -> Option<String> {
    let target = link.split(['#', '|']).next().unwrap_or(link);
    Path::new(target.trim())
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// Extract the embeds of a note: `![[target]]` wiki embeds and
/// `![alt](target)` markdown image links. Both surface as image events
/// once wikilink parsing is enabled.
pub(crate) fn parse_embeds(text: &str) -> Vec<EmbedRef> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_WIKILINKS);

    let parser = Parser::new_ext(text, options);

    let mut embeds = Vec::new();
    let mut pending: Option<(String, usize)> = None;

    for (event, range) in parser.into_offset_iter() {
        match event {
            Event::Start(Tag::Image { dest_url, .. }) => {
                pending = Some((dest_url.to_string(), range.start));
            }
            Event::End(TagEnd::Image) => {
                if let Some((link, start)) = pending.take() {
                    // pulldown_cmark may report a wiki embed range ending
                    // before the closing brackets
                    let mut end = range.end;
                    while end < text.len() && text.as_bytes()[end] == b']' {
                        end += 1;
                    }

                    embeds.push(EmbedRef {
                        link,
                        raw: text[start..end].to_string(),
                        span: start..end,
                    });
                }
            }
            _ => {}
        }
    }

    embeds
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_wiki_embeds() {
        let embeds = parse_embeds("Before\n\n![[photo.png]]\n\nAfter");
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].link, "photo.png");
        assert_eq!(embeds[0].raw, "![[photo.png]]");
    }

    #[test]
    fn finds_markdown_image_links() {
        let text = "A shot: ![caption](photos/shot%201.png) inline.";
        let embeds = parse_embeds(text);
        assert_eq!(embeds.len(), 1);
        assert_eq!(embeds[0].link, "photos/shot%201.png");
        assert_eq!(embeds[0].raw, "![caption](photos/shot%201.png)");
    }

    #[test]
    fn keeps_discovery_order() {
        let text = "![[b.png]]\n\n![[a.mp3]]\n\n![[c.png]]";
        let embeds = parse_embeds(text);
        let links: Vec<&str> = embeds.iter().map(|e| e.link.as_str()).collect();
        assert_eq!(links, vec!["b.png", "a.mp3", "c.png"]);
    }

    #[test]
    fn spans_cover_the_source_text() {
        let text = "x ![[photo.png]] y";
        let embeds = parse_embeds(text);
        assert_eq!(&text[embeds[0].span.clone()], embeds[0].raw);
    }

    #[test]
    fn plain_links_are_not_embeds() {
        let embeds = parse_embeds("See [[other note]] and [a doc](doc.pdf).");
        assert!(embeds.is_empty());
    }
}
