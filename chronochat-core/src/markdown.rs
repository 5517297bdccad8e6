//! Markdown rendering at the display boundary.
//!
//! Model output is treated as untrusted markdown. Raw angle brackets are
//! escaped before parsing so literal markup in a reply can never become
//! live markup in the rendered transcript.

use pulldown_cmark::{html, Options, Parser};

/// Escape raw `<` and `>` in model or user text.
pub fn escape_angle_brackets(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Render untrusted markdown to HTML.
///
/// If the renderer fails, the escaped source text is returned unrendered,
/// so a bad reply degrades to plain text instead of disappearing.
pub fn render_markdown(text: &str) -> String {
    let sanitized = escape_angle_brackets(text);
    std::panic::catch_unwind(|| render(&sanitized)).unwrap_or(sanitized)
}

fn render(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, Options::empty());
    let mut out = String::with_capacity(markdown.len() * 2);
    html::push_html(&mut out, parser);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_brackets_never_survive_raw() {
        let rendered = render_markdown("see <script>alert(1)</script> here");
        assert!(!rendered.contains("<script>"));
        assert!(rendered.contains("&lt;script&gt;"));
    }

    #[test]
    fn test_markdown_structure_renders() {
        let rendered = render_markdown("some **bold** and *italic* text");
        assert!(rendered.contains("<strong>bold</strong>"));
        assert!(rendered.contains("<em>italic</em>"));
    }

    #[test]
    fn test_code_blocks_render() {
        let rendered = render_markdown("```\nlet x = 1;\n```");
        assert!(rendered.contains("<pre><code>"));
        assert!(rendered.contains("let x = 1;"));
    }

    #[test]
    fn test_plain_text_passes_through() {
        let rendered = render_markdown("Greetings, traveler.");
        assert_eq!(rendered.trim(), "<p>Greetings, traveler.</p>");
    }

    #[test]
    fn test_escape_is_idempotent_on_clean_text() {
        assert_eq!(escape_angle_brackets("no markup here"), "no markup here");
        assert_eq!(escape_angle_brackets("a < b > c"), "a &lt; b &gt; c");
    }
}
