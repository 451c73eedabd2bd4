//! Confirmation email content.

use chrono::{Datelike, Utc};

const STYLES: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; }
  .header { background-color: #1a1a1a; color: white; padding: 20px; text-align: center; }
  .content { padding: 20px; }
  .footer { background-color: #f4f4f4; padding: 15px; text-align: center; font-size: 12px; }
  .highlight { background-color: #e8f5e8; padding: 15px; border-left: 4px solid #28a745; margin: 20px 0; }";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

/// Escape text for inclusion in HTML element content or quoted attributes.
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}

pub fn demo_submission_confirmation(
    label_name: &str,
    artist_name: &str,
    track_title: &str,
    demo_id: &str,
) -> EmailContent {
    let subject = format!("Demo Submission Confirmation - {}", track_title);
    let year = Utc::now().year();

    let label = escape_html(label_name);
    let artist = escape_html(artist_name);
    let track = escape_html(track_title);
    let reference = escape_html(demo_id);

    let html_body = format!(
        r#"<html>
<head><style>{STYLES}</style></head>
<body>
  <div class="header">
    <h1>{label}</h1>
  </div>
  <div class="content">
    <h2>Thank you for your submission!</h2>
    <p>Dear {artist},</p>
    <p>Thank you for sharing your demo "<strong>{track}</strong>" with {label}.</p>
    <p>We appreciate your interest and the time you took to submit your music.</p>
    <p>Our team carefully reviews all submissions.</p>
    <p>While we can't provide individual feedback due to the high volume of demos, please know that we listen to everything we receive.</p>
    <div class="highlight">
      <h3>Submission Guidelines</h3>
      <ul>
        <li><strong>Full tracks only</strong> - complete versions work best</li>
        <li><strong>Maximum 3 tracks</strong> - quality over quantity</li>
        <li><strong>Clear file naming</strong> - include artist name and track title</li>
      </ul>
    </div>
    <p>If your track fits our vision, we'll contact you to discuss next steps.</p>
    <p>Submission reference: {reference}</p>
    <p>Best regards,<br><strong>{label} Family</strong></p>
  </div>
  <div class="footer">
    <p>&copy; {year} {label}. All rights reserved.</p>
  </div>
</body>
</html>
"#
    );

    let text_body = format!(
        "{label_name}

Thank you for your submission!

Dear {artist_name},

Thank you for sharing your demo \"{track_title}\" with {label_name}.
We appreciate your interest and the time you took to submit your music.

Our team carefully reviews all submissions.

While we can't provide individual feedback due to the high volume of demos, please know that we listen to everything we receive.

Submission Guidelines:
- Full tracks only - complete versions work best
- Maximum 3 tracks - quality over quantity
- Clear file naming - include artist name and track title

If your track fits our vision, we'll contact you to discuss next steps.

Submission reference: {demo_id}

Best regards,
{label_name} Family
"
    );

    EmailContent {
        subject,
        html_body,
        text_body,
    }
}
