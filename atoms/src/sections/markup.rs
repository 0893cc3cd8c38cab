//! Constrained line grammar used by case-study text.
//!
//! Block level: `#`, `##`, `###` headers, `> ` quotes, `- ` and `N. ` list
//! items, everything else is paragraph text (consecutive lines are joined).
//! Inline: `**bold**`, `*italic*`, `` `code` ``. All text is HTML-escaped.

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Inline emphasis and code; unmatched markers are kept literally
pub fn render_inline(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix('`') {
            if let Some(end) = after.find('`') {
                out.push_str("<code>");
                out.push_str(&escape_html(&after[..end]));
                out.push_str("</code>");
                rest = &after[end + 1..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix("**") {
            if let Some(end) = after.find("**").filter(|&end| end > 0) {
                out.push_str("<strong>");
                out.push_str(&render_inline(&after[..end]));
                out.push_str("</strong>");
                rest = &after[end + 2..];
                continue;
            }
        } else if let Some(after) = rest.strip_prefix('*') {
            if let Some(end) = after.find('*').filter(|&end| end > 0) {
                out.push_str("<em>");
                out.push_str(&render_inline(&after[..end]));
                out.push_str("</em>");
                rest = &after[end + 1..];
                continue;
            }
        }

        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            out.push_str(&escape_html(ch.encode_utf8(&mut [0u8; 4])));
        }
        rest = chars.as_str();
    }

    out
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ListKind {
    Ordered,
    Unordered,
}

enum Line<'a> {
    Blank,
    Heading(u8, &'a str),
    Quote(&'a str),
    Item(ListKind, &'a str),
    Text(&'a str),
}

fn classify(line: &str) -> Line<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Line::Blank;
    }
    if let Some(text) = trimmed.strip_prefix("### ") {
        return Line::Heading(3, text);
    }
    if let Some(text) = trimmed.strip_prefix("## ") {
        return Line::Heading(2, text);
    }
    if let Some(text) = trimmed.strip_prefix("# ") {
        return Line::Heading(1, text);
    }
    if let Some(text) = trimmed.strip_prefix("> ") {
        return Line::Quote(text);
    }
    if let Some(text) = trimmed.strip_prefix("- ") {
        return Line::Item(ListKind::Unordered, text);
    }
    let digits = trimmed.bytes().take_while(u8::is_ascii_digit).count();
    if digits > 0 {
        if let Some(text) = trimmed[digits..].strip_prefix(". ") {
            return Line::Item(ListKind::Ordered, text);
        }
    }
    Line::Text(trimmed)
}

#[derive(Default)]
struct Writer {
    out: String,
    list: Option<ListKind>,
    paragraph: Vec<String>,
}

impl Writer {
    fn flush_paragraph(&mut self) {
        if !self.paragraph.is_empty() {
            self.out.push_str("<p>");
            self.out.push_str(&self.paragraph.join(" "));
            self.out.push_str("</p>\n");
            self.paragraph.clear();
        }
    }

    fn close_list(&mut self) {
        match self.list.take() {
            Some(ListKind::Ordered) => self.out.push_str("</ol>\n"),
            Some(ListKind::Unordered) => self.out.push_str("</ul>\n"),
            None => {}
        }
    }

    fn close_all(&mut self) {
        self.flush_paragraph();
        self.close_list();
    }
}

pub fn render_markup(text: &str) -> String {
    let mut w = Writer::default();

    for line in text.lines() {
        match classify(line) {
            Line::Blank => w.close_all(),
            Line::Heading(level, content) => {
                w.close_all();
                w.out.push_str(&format!("<h{0}>{1}</h{0}>\n", level, render_inline(content)));
            }
            Line::Quote(content) => {
                w.close_all();
                w.out.push_str(&format!("<blockquote>{}</blockquote>\n", render_inline(content)));
            }
            Line::Item(kind, content) => {
                w.flush_paragraph();
                if w.list != Some(kind) {
                    w.close_list();
                    w.out.push_str(match kind {
                        ListKind::Ordered => "<ol>\n",
                        ListKind::Unordered => "<ul>\n",
                    });
                    w.list = Some(kind);
                }
                w.out.push_str(&format!("<li>{}</li>\n", render_inline(content)));
            }
            Line::Text(content) => {
                w.close_list();
                w.paragraph.push(render_inline(content));
            }
        }
    }

    w.close_all();
    w.out
}
