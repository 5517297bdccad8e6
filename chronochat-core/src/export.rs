//! Transcript export as a standalone HTML page.

use std::path::Path;

use crate::markdown;
use crate::session::{ChatLine, LineKind};

/// Render the display feed as a self-contained HTML document.
///
/// Markdown lines go through the renderer; everything else is escaped
/// verbatim, matching how the feed is displayed live.
pub fn export_html(title: &str, lines: &[ChatLine]) -> String {
    let mut body = String::new();
    for line in lines {
        let class = match line.kind {
            LineKind::User => "user-message",
            LineKind::Counterpart => "ai-message",
            LineKind::System => "system-message",
        };
        body.push_str(&format!("    <div class=\"message {class}\">\n"));
        if !line.sender.is_empty() {
            let sender = markdown::escape_angle_brackets(&line.sender);
            let sender = match line.kind {
                LineKind::Counterpart => format!("{sender}:"),
                _ => sender,
            };
            body.push_str(&format!("      <strong>{sender}</strong>\n"));
        }
        let content = if line.markdown {
            markdown::render_markdown(&line.text)
        } else {
            markdown::escape_angle_brackets(&line.text)
        };
        body.push_str(&format!(
            "      <div class=\"message-content\">{content}</div>\n"
        ));
        body.push_str("    </div>\n");
    }

    format!(
        "<!DOCTYPE html>\n\
         <html lang=\"en\">\n\
         <head>\n\
         <meta charset=\"utf-8\">\n\
         <title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; max-width: 48rem; margin: 2rem auto; }}\n\
         .message {{ margin: 0.75rem 0; padding: 0.5rem 0.75rem; border-radius: 6px; }}\n\
         .user-message {{ background: #e8f0fe; }}\n\
         .ai-message {{ background: #f1f3f4; }}\n\
         .system-message {{ color: #666; font-style: italic; }}\n\
         </style>\n\
         </head>\n\
         <body>\n\
         <h1>{heading}</h1>\n{body}\
         </body>\n\
         </html>\n",
        title = markdown::escape_angle_brackets(title),
        heading = markdown::escape_angle_brackets(title),
        body = body
    )
}

/// Render the feed and write it to `path`.
pub async fn write_html(
    path: impl AsRef<Path>,
    title: &str,
    lines: &[ChatLine],
) -> std::io::Result<()> {
    tokio::fs::write(path, export_html(title, lines)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(kind: LineKind, sender: &str, text: &str, markdown: bool) -> ChatLine {
        ChatLine {
            kind,
            sender: sender.to_string(),
            text: text.to_string(),
            markdown,
        }
    }

    #[test]
    fn test_export_renders_markdown_lines() {
        let lines = vec![line(
            LineKind::Counterpart,
            "Leonardo da Vinci",
            "Observe the **sfumato** technique.",
            true,
        )];

        let html = export_html("ChronoChat transcript", &lines);
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<strong>Leonardo da Vinci:</strong>"));
        assert!(html.contains("<strong>sfumato</strong>"));
    }

    #[test]
    fn test_export_escapes_non_markdown_lines() {
        let lines = vec![line(
            LineKind::System,
            "",
            "literal <tags> stay inert",
            false,
        )];

        let html = export_html("t", &lines);
        assert!(html.contains("literal &lt;tags&gt; stay inert"));
        assert!(!html.contains("literal <tags>"));
    }

    #[test]
    fn test_user_sender_has_no_colon() {
        let lines = vec![line(LineKind::User, "You (as Prospector)", "hello", true)];
        let html = export_html("t", &lines);
        assert!(html.contains("<strong>You (as Prospector)</strong>"));
    }

    #[tokio::test]
    async fn test_write_html_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("transcript.html");
        write_html(&path, "t", &[]).await.unwrap();
        assert!(path.exists());
    }
}
