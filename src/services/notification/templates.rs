//! HTML bodies for the confirmation and alert emails.
//!
//! Bodies are assembled with [`Markup`], which escapes every pushed string unless it
//! is static layout markup known at compile time.

use crate::domain::notification::{NotificationKind, NotificationMessage};
use crate::domain::submission::{RecordId, SubmissionRecord};

/// Sender branding shown in subjects and message footers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branding {
    pub name: String,
    pub contact_address: Option<String>,
}

/// An HTML document under construction.
#[derive(Debug, Default)]
pub struct Markup(String);

impl Markup {
    #[must_use]
    pub const fn new() -> Self {
        Self(String::new())
    }

    /// Appends static markup verbatim. Only string literals qualify.
    pub fn trusted(&mut self, markup: &'static str) -> &mut Self {
        self.0.push_str(markup);
        self
    }

    /// Appends text with HTML special characters escaped.
    pub fn text(&mut self, text: &str) -> &mut Self {
        escape_into(&mut self.0, text);
        self
    }

    /// Appends escaped text, turning line breaks into `<br>`.
    pub fn multiline(&mut self, text: &str) -> &mut Self {
        for (i, line) in text.lines().enumerate() {
            if i > 0 {
                self.0.push_str("<br>");
            }
            escape_into(&mut self.0, line);
        }
        self
    }

    /// Appends escaped text, or an em dash placeholder when the text is blank.
    pub fn text_or_dash(&mut self, text: &str) -> &mut Self {
        if text.trim().is_empty() { self.trusted("&mdash;") } else { self.text(text) }
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
}

/// Escapes `text` for inclusion in HTML.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    escape_into(&mut out, text);
    out
}

/// Collapses control characters so user text cannot break out of a header line.
fn header_safe(text: &str) -> String {
    text.chars().map(|c| if c.is_control() { ' ' } else { c }).collect::<String>().trim().to_string()
}

const HEADER_OPEN: &str = "<div style=\"font-family:'Segoe UI',Tahoma,Geneva,Verdana,sans-serif;color:#333;\
max-width:650px;margin:auto;border:1px solid #e0e0e0;border-radius:12px;overflow:hidden;\">\
<div style=\"background:linear-gradient(135deg,#5B2C91,#7B3CB8);color:#fff;padding:22px 20px;text-align:center;\">\
<h1 style=\"margin:0;font-size:22px;\">";
const HEADER_CLOSE: &str = "</h1></div><div style=\"padding:22px 20px;background:#fafafa;\">";
const FOOTER_OPEN: &str =
    "</div><div style=\"background:#2A1448;color:#FFD700;padding:14px;text-align:center;font-size:13px;\"><p style=\"margin:0;\">";
const FOOTER_CLOSE: &str = "</p></div></div>";

fn field(markup: &mut Markup, label: &'static str, value: &str) {
    markup.trusted("<p><strong>").trusted(label).trusted(":</strong> ").text_or_dash(value).trusted("</p>");
}

/// Renders the "we received your request" message sent to the submitter.
#[must_use]
pub fn confirmation(record: &SubmissionRecord, branding: &Branding) -> NotificationMessage {
    let mut body = Markup::new();
    body.trusted(HEADER_OPEN).text(&branding.name).trusted(HEADER_CLOSE);
    body.trusted("<h2 style=\"color:#5B2C91;\">Thank you, ").text(&record.full_name).trusted("!</h2>");
    body.trusted(
        "<p style=\"font-size:15px;line-height:1.6;\">We&rsquo;ve received your inquiry and our team will respond \
         within <strong>24 hours</strong>.</p>",
    );
    body.trusted("<div style=\"background:#fff;border-radius:10px;padding:15px 20px;margin-top:15px;\">");
    field(&mut body, "Company", &record.company);
    field(&mut body, "Product Interest", &record.products.joined());
    body.trusted("<p><strong>Message:</strong><br>").multiline(&record.message).trusted("</p></div>");
    if let Some(contact) = &branding.contact_address {
        body.trusted("<p style=\"margin-top:25px;font-size:15px;\">You can reply directly to this email or reach us at ")
            .text(contact)
            .trusted(".</p>");
    }
    body.trusted(FOOTER_OPEN).text(&branding.name).trusted(FOOTER_CLOSE);

    NotificationMessage {
        kind: NotificationKind::Confirmation,
        to: vec![record.email.clone()],
        reply_to: branding.contact_address.clone(),
        subject: header_safe(&format!("We received your request \u{2013} {}", branding.name)),
        html_body: body.into_string(),
    }
}

/// Renders the new-lead alert sent to the operators.
#[must_use]
pub fn alert(
    record: &SubmissionRecord,
    record_id: &RecordId,
    operators: &[String],
    branding: &Branding,
) -> NotificationMessage {
    let mut body = Markup::new();
    body.trusted(HEADER_OPEN).trusted("New Website Inquiry").trusted(HEADER_CLOSE);
    field(&mut body, "Full Name", &record.full_name);
    field(&mut body, "Email Address", &record.email);
    field(&mut body, "Phone Number", &record.phone);
    field(&mut body, "Company Name", &record.company);
    field(&mut body, "Interested Products", &record.products.joined());
    body.trusted("<p><strong>Message / Request:</strong><br>").multiline(&record.message).trusted("</p>");
    field(&mut body, "Submitted", &record.submitted_at_iso());
    field(&mut body, "Record", record_id.as_str());
    body.trusted(FOOTER_OPEN).trusted("Lead Source: ").text(record.lead_source).trusted(FOOTER_CLOSE);

    NotificationMessage {
        kind: NotificationKind::Alert,
        to: operators.to_vec(),
        reply_to: Some(record.email.clone()),
        subject: header_safe(&format!("New form submission from {}", record.full_name)),
        html_body: body.into_string(),
    }
}
