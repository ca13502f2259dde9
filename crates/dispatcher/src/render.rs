//! MessageRenderer - personalizes the body template for one recipient

use contracts::Recipient;

/// Signature and disclaimer appended to every message body
pub const FOOTER: &str = concat!(
    "<hr/>",
    "<p><strong>Thank you for reading our newsletter.</strong></p>",
    "<p>",
    "<strong>Disclaimer Notice</strong><br/>",
    "The information contained in or accompanying this e-mail is intended for the use of ",
    "the stated recipient and may contain information that is confidential or privileged. ",
    "If you are not the intended recipient, any dissemination or distribution of this e-mail ",
    "is strictly prohibited. If you have received this e-mail in error, please notify the sender ",
    "immediately.",
    "</p>",
);

/// A rendered message for one recipient
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedMessage {
    pub subject: String,
    pub html_body: String,
}

/// Substitutes `{title}`/`{0}` and `{name}`/`{1}`, then appends [`FOOTER`]
///
/// Placeholders are matched exactly; anything else in braces is kept as
/// written. Substituted values are not scanned again.
#[derive(Debug, Clone, Copy, Default)]
pub struct MessageRenderer;

impl MessageRenderer {
    pub fn new() -> Self {
        Self
    }

    pub fn render(&self, subject: &str, template: &str, recipient: &Recipient) -> RenderedMessage {
        let mut body = substitute(template, recipient);
        body.push_str(FOOTER);
        RenderedMessage {
            subject: subject.to_string(),
            html_body: body,
        }
    }
}

fn placeholder<'r>(key: &str, recipient: &'r Recipient) -> Option<&'r str> {
    match key {
        "title" | "0" => Some(&recipient.title),
        "name" | "1" => Some(&recipient.name),
        _ => None,
    }
}

fn substitute(template: &str, recipient: &Recipient) -> String {
    let mut out = String::with_capacity(template.len() + 32);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => match placeholder(&after[..close], recipient) {
                Some(value) => {
                    out.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            },
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bello() -> Recipient {
        Recipient::new("Dr", "A. Bello", "a@x.com")
    }

    #[test]
    fn test_named_placeholders() {
        let msg = MessageRenderer::new().render("Update", "Hello {title} {name}", &bello());
        assert_eq!(msg.subject, "Update");
        assert_eq!(msg.html_body, format!("Hello Dr A. Bello{FOOTER}"));
    }

    #[test]
    fn test_positional_placeholders() {
        let msg = MessageRenderer::new().render("s", "Dear {0} {1},<br>", &bello());
        assert!(msg.html_body.starts_with("Dear Dr A. Bello,<br>"));
    }

    #[test]
    fn test_unknown_placeholders_stay_literal() {
        let msg = MessageRenderer::new().render("s", "Hi {first} {name} {", &bello());
        assert!(msg.html_body.starts_with("Hi {first} A. Bello {"));
    }

    #[test]
    fn test_values_are_not_rescanned() {
        let recipient = Recipient::new("{name}", "Eve", "e@x.com");
        let msg = MessageRenderer::new().render("s", "{title}", &recipient);
        assert!(msg.html_body.starts_with("{name}<hr/>"));
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let renderer = MessageRenderer::new();
        let a = renderer.render("Update", "Hello {title} {name}", &bello());
        let b = renderer.render("Update", "Hello {title} {name}", &bello());
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_fields_render_empty() {
        let recipient = Recipient::new("", "", "x@x.com");
        let msg = MessageRenderer::new().render("s", "Hello {title} {name}!", &recipient);
        assert!(msg.html_body.starts_with("Hello  !"));
    }
}
