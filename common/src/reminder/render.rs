// Pure notification rendering. No I/O here: these functions turn a
// threshold and its batch of licenses into strings, and the transports
// decide what to do with them.

use crate::models::ExpiringLicense;
use crate::reminder::Threshold;

/// Human-readable headline for a threshold's notification
pub fn title(threshold: &Threshold) -> String {
    if threshold.is_expired_marker() {
        "Expired licenses".to_string()
    } else {
        format!("Licenses expiring in {} days", threshold.days_before_expiry)
    }
}

/// Email subject line
pub fn email_subject(title: &str) -> String {
    format!("[Licenses] {}", title)
}

/// HTML email body: the headline followed by one table row per license,
/// each linking back into the tracker
pub fn email_body(title: &str, licenses: &[ExpiringLicense], base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');

    let mut rows = String::new();
    for license in licenses {
        let seats = license.seats.map(|s| s.to_string()).unwrap_or_default();
        let key = license.license_key.as_deref().unwrap_or_default();
        rows.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td>\
             <td><a href=\"{}/licenses/{}\">Details</a></td></tr>",
            escape_html(&license.customer_name),
            escape_html(&license.product_name),
            license.end_date,
            seats,
            escape_html(key),
            base,
            license.public_id,
        ));
    }

    format!(
        "<p>{}</p>\
         <table border=\"1\" cellpadding=\"6\" cellspacing=\"0\">\
         <thead><tr><th>Customer</th><th>Product</th><th>End date</th>\
         <th>Seats</th><th>Key</th><th>Link</th></tr></thead>\
         <tbody>{}</tbody></table>",
        escape_html(title),
        rows,
    )
}

/// Plain-text chat message: the headline and one bullet per license
pub fn chat_text(title: &str, licenses: &[ExpiringLicense]) -> String {
    let mut text = format!("{}:\n", title);
    let bullets: Vec<String> = licenses
        .iter()
        .map(|l| {
            format!(
                "\u{2022} {} - {} (until {})",
                l.customer_name, l.product_name, l.end_date
            )
        })
        .collect();
    text.push_str(&bullets.join("\n"));
    text
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
