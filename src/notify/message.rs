//! Rendering of the "access granted" notification.

use crate::email::SenderIdentity;
use crate::models::AccessGrantEntry;

use super::i18n::{Translator, KEY_CLOSING, KEY_GREETING, KEY_INTRO, KEY_SIGNATURE, KEY_SUBJECT};

/// A rendered notification, ready to hand to a mail sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationMessage {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Renders the notification for one user's pending grants.
pub fn render<T: Translator>(
    translator: &T,
    locale: &str,
    recipient_name: &str,
    sender: &SenderIdentity,
    entries: &[AccessGrantEntry],
) -> NotificationMessage {
    let t = |key: &str| translator.translate(key, locale);

    let subject = t(KEY_SUBJECT);
    let greeting_template = t(KEY_GREETING);
    let intro = t(KEY_INTRO);
    let closing = t(KEY_CLOSING);
    let signature = t(KEY_SIGNATURE);

    let greeting = greeting_template.replace("{name}", recipient_name.trim());

    let mut items = String::new();
    for entry in entries {
        items.push_str(&format!("  - {} ({})\n", entry.display_title(), entry.record_id));
    }

    let text = format!(
        "{greeting}\n\n{intro}\n\n{items}\n{closing}\n\n{signature}\n{sender}\n",
        sender = sender.name,
    );

    let mut html_items = String::new();
    for entry in entries {
        html_items.push_str(&format!(
            "<li>{} <small>({})</small></li>\n",
            escape_html(entry.display_title()),
            escape_html(&entry.record_id)
        ));
    }

    let html = format!(
        "<!DOCTYPE html>\n<html lang=\"{lang}\">\n<body>\n<p>{greeting}</p>\n<p>{intro}</p>\n<ul>\n{html_items}</ul>\n<p>{closing}</p>\n<p>{signature}<br>\n{sender}</p>\n</body>\n</html>\n",
        lang = escape_html(locale),
        greeting = escape_html(&greeting),
        intro = escape_html(&intro),
        closing = escape_html(&closing),
        signature = escape_html(&signature),
        sender = escape_html(&sender.name),
    );

    NotificationMessage {
        subject,
        text,
        html,
    }
}

fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::i18n::Catalog;

    fn sender() -> SenderIdentity {
        SenderIdentity {
            email: "digital@example.org".to_string(),
            name: "Digital Collections".to_string(),
        }
    }

    fn entries() -> Vec<AccessGrantEntry> {
        vec![
            AccessGrantEntry::pending(1, 7, "rec-1").with_title("Stadtchronik 1850"),
            AccessGrantEntry::pending(2, 7, "rec-2"),
        ]
    }

    #[test]
    fn test_render_lists_every_entry() {
        let catalog = Catalog::builtin("en");
        let message = render(&catalog, "en", "Ada Reader", &sender(), &entries());

        assert_eq!(message.subject, "Access to requested documents granted");
        assert!(message.text.starts_with("Dear Ada Reader,"));
        assert!(message.text.contains("Stadtchronik 1850 (rec-1)"));
        assert!(message.text.contains("rec-2 (rec-2)"));
        assert!(message.text.contains("Digital Collections"));

        assert!(message.html.contains("<li>Stadtchronik 1850 <small>(rec-1)</small></li>"));
        assert!(message.html.contains("<html lang=\"en\">"));
    }

    #[test]
    fn test_render_uses_locale() {
        let catalog = Catalog::builtin("en");
        let message = render(&catalog, "de", "Ada Reader", &sender(), &entries());

        assert_eq!(message.subject, "Zugriff auf angefragte Dokumente freigegeben");
        assert!(message.text.starts_with("Guten Tag Ada Reader,"));
        assert!(message.html.contains("Mit freundlichen Grüßen"));
    }

    #[test]
    fn test_render_escapes_html() {
        let catalog = Catalog::builtin("en");
        let entries = vec![AccessGrantEntry::pending(1, 7, "rec-<1>").with_title("Tom & \"Jerry\"")];
        let message = render(&catalog, "en", "<script>", &sender(), &entries);

        assert!(message.html.contains("Tom &amp; &quot;Jerry&quot;"));
        assert!(message.html.contains("rec-&lt;1&gt;"));
        assert!(message.html.contains("Dear &lt;script&gt;,"));
        assert!(!message.html.contains("<script>"));
        // Plain text stays verbatim
        assert!(message.text.contains("Tom & \"Jerry\""));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a<b>&'c'"), "a&lt;b&gt;&amp;&#39;c&#39;");
        assert_eq!(escape_html("plain"), "plain");
    }
}
