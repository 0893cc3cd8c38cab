use pulldown_cmark::{html, Options, Parser};
use serde::{Deserialize, Serialize};
use super::model::{non_empty, ContentBlock};
use super::sequence::BlockSequence;
use crate::sections::markup::{escape_html, render_markup};

/// Which content family owns a sequence; decides how text bodies are read
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ContentFamily {
    /// General markdown
    Blog,
    /// Constrained inline grammar shared with case-study sections
    CaseStudy,
}

/// Render blocks in sequence order. Image blocks without a url are skipped.
pub fn render_blocks(sequence: &BlockSequence, family: ContentFamily) -> String {
    let mut out = String::new();
    for block in sequence {
        match block {
            ContentBlock::Text { body } => match family {
                ContentFamily::Blog => out.push_str(&render_markdown(body)),
                ContentFamily::CaseStudy => out.push_str(&render_markup(body)),
            },
            ContentBlock::Image { url, caption, source } => {
                if url.trim().is_empty() {
                    continue;
                }
                out.push_str(&render_figure(url, non_empty(caption), non_empty(source)));
            }
        }
    }
    out
}

pub fn render_markdown(text: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut out = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut out, Parser::new_ext(text, options));
    out
}

fn render_figure(url: &str, caption: Option<&str>, source: Option<&str>) -> String {
    let mut out = format!(
        "<figure class=\"content-image\"><img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
        escape_html(url.trim()),
        escape_html(caption.unwrap_or(""))
    );
    if let Some(caption) = caption {
        out.push_str(&format!("<figcaption>{}</figcaption>", escape_html(caption)));
    }
    if let Some(source) = source {
        out.push_str(&format!(
            "<p class=\"image-source\">Source: {}</p>",
            escape_html(source)
        ));
    }
    out.push_str("</figure>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(blocks: Vec<ContentBlock>) -> BlockSequence {
        BlockSequence::try_from(blocks).unwrap()
    }

    #[test]
    fn blog_text_is_general_markdown() {
        let html = render_blocks(
            &seq(vec![ContentBlock::text("Intro with [a link](https://example.com)")]),
            ContentFamily::Blog,
        );
        assert!(html.contains("<a href=\"https://example.com\">a link</a>"));
    }

    #[test]
    fn case_study_text_uses_inline_grammar() {
        let html = render_blocks(&seq(vec![ContentBlock::text("## Brief\n- **fast**")]), ContentFamily::CaseStudy);
        assert!(html.contains("<h2>Brief</h2>"));
        assert!(html.contains("<li><strong>fast</strong></li>"));
    }

    #[test]
    fn image_without_caption_has_no_figcaption() {
        let html = render_blocks(&seq(vec![ContentBlock::image("https://x/y.webp", None, None)]), ContentFamily::Blog);
        assert!(html.contains("src=\"https://x/y.webp\""));
        assert!(!html.contains("figcaption"));
    }

    #[test]
    fn image_with_caption_and_source() {
        let html = render_blocks(
            &seq(vec![ContentBlock::image("u.webp", Some("Crew <on set>".into()), Some("Studio".into()))]),
            ContentFamily::Blog,
        );
        assert!(html.contains("<figcaption>Crew &lt;on set&gt;</figcaption>"));
        assert!(html.contains("Source: Studio"));
    }

    #[test]
    fn image_without_url_is_skipped() {
        let html = render_blocks(
            &seq(vec![ContentBlock::text("before"), ContentBlock::image("", Some("lost".into()), None)]),
            ContentFamily::Blog,
        );
        assert!(!html.contains("<img"));
        assert!(!html.contains("lost"));
        assert!(html.contains("before"));
    }

    #[test]
    fn blocks_render_in_sequence_order() {
        let mut sequence = seq(vec![ContentBlock::text("first"), ContentBlock::text("second")]);
        sequence.move_down(0).unwrap();
        let html = render_blocks(&sequence, ContentFamily::Blog);
        assert!(html.find("second").unwrap() < html.find("first").unwrap());
    }
}
