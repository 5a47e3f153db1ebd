use ammonia::Builder;
use comrak::{markdown_to_html, Options};
use std::collections::HashSet;

/// Render article/question Markdown to sanitized HTML.
///
/// comrak parses GFM (tables, task lists, strikethrough, autolinks); ammonia
/// strips anything that could execute in the reader's browser.
pub fn render_markdown(raw: &str) -> String {
    let html = markdown_to_html(raw, &markdown_options());
    sanitize_html(&html)
}

/// Plain-text preview of Markdown content, cut at `max_chars` characters.
pub fn excerpt(raw: &str, max_chars: usize) -> String {
    let html = markdown_to_html(raw, &markdown_options());
    let text = Builder::empty().clean(&html).to_string();
    let text = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if text.chars().count() <= max_chars {
        return text;
    }
    let mut cut: String = text.chars().take(max_chars).collect();
    cut.truncate(cut.trim_end().len());
    cut.push('…');
    cut
}

fn markdown_options() -> Options<'static> {
    let mut options = Options::default();
    options.extension.strikethrough = true;
    options.extension.table = true;
    options.extension.autolink = true;
    options.extension.tasklist = true;
    options.render.unsafe_ = true; // ammonia sanitizes afterwards
    options
}

fn sanitize_html(html: &str) -> String {
    let extra_tags: HashSet<&str> = [
        "h1", "h2", "h3", "h4", "h5", "h6", "pre", "code", "blockquote", "hr", "table", "thead",
        "tbody", "tr", "th", "td", "img", "input", "del", "s",
    ]
    .iter()
    .copied()
    .collect();

    let url_schemes: HashSet<&str> = ["http", "https", "mailto"].iter().copied().collect();

    let mut builder = Builder::default();
    builder.add_tags(&extra_tags);
    builder.add_tag_attributes("a", &["href", "title"]);
    builder.add_tag_attributes("img", &["src", "alt", "title"]);
    builder.add_tag_attributes("code", &["class"]);
    builder.add_tag_attributes("input", &["type", "checked", "disabled"]);
    builder.url_schemes(url_schemes);
    builder.link_rel(Some("noopener noreferrer"));

    builder.clean(html).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_basic_markdown() {
        let html = render_markdown("# Ownership\n\nBorrow **once**, move *never*.");
        assert!(html.contains("<h1>Ownership</h1>"));
        assert!(html.contains("<strong>once</strong>"));
        assert!(html.contains("<em>never</em>"));
    }

    #[test]
    fn renders_gfm_table() {
        let html = render_markdown("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<td>1</td>"));
    }

    #[test]
    fn strips_script_tags() {
        let html = render_markdown("<script>alert('xss')</script>");
        assert!(!html.contains("<script>"));
        assert!(!html.contains("alert"));
    }

    #[test]
    fn strips_javascript_links() {
        let html = render_markdown("[click](javascript:alert(1))");
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn strips_event_handlers() {
        let html = render_markdown("<img src=x onerror=alert(1)>");
        assert!(!html.contains("onerror"));
    }

    #[test]
    fn excerpt_drops_markup() {
        let text = excerpt("## Title\n\nSome **bold** text", 100);
        assert_eq!(text, "Title Some bold text");
    }

    #[test]
    fn excerpt_truncates_on_char_boundary() {
        let text = excerpt("héllo wörld again", 7);
        assert_eq!(text, "héllo w…");
    }

    #[test]
    fn excerpt_of_short_text_is_unchanged() {
        assert_eq!(excerpt("short", 10), "short");
    }
}
