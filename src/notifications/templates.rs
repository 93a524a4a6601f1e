//! Branded HTML bodies for lead notifications

use chrono::{DateTime, Utc};

use crate::common::{escape_html, format_submitted_at};

pub const COMPANY_PHONE: &str = "+1 (850) 777-3797";
pub const COMPANY_WHATSAPP: &str = "+1 (813) 200-6088";
pub const COMPANY_EMAIL: &str = "info@americanironus.com";
pub const COMPANY_WEBSITE: &str = "https://www.americanironus.com";

const BUTTON_STYLE: &str = "display:inline-block;background:#FFCD11;color:#000;padding:10px 24px;text-decoration:none;border-radius:4px;font-weight:bold;font-size:14px;";

/// Quote request fields as submitted
#[derive(Debug, Clone, Copy)]
pub struct QuoteLead<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub ship_to: Option<&'a str>,
    pub items: Option<&'a str>,
    pub notes: Option<&'a str>,
}

fn layout(subtitle: &str, content: &str) -> String {
    format!(
        r#"
<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="margin:0;padding:0;background:#f4f4f4;font-family:Arial,Helvetica,sans-serif;">
  <table width="100%" cellpadding="0" cellspacing="0" style="max-width:600px;margin:0 auto;background:#ffffff;">
    <tr>
      <td style="background:#000000;padding:24px 32px;">
        <h1 style="margin:0;color:#FFCD11;font-size:22px;font-weight:bold;">AMERICAN IRON LLC</h1>
        <p style="margin:4px 0 0;color:#cccccc;font-size:13px;">{subtitle}</p>
      </td>
    </tr>
    <tr>
      <td style="padding:32px;">
{content}
      </td>
    </tr>
    <tr>
      <td style="background:#f4f4f4;padding:16px 32px;text-align:center;">
        <p style="margin:0;color:#999;font-size:11px;">American Iron LLC — Tampa, Florida | {phone}</p>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        subtitle = subtitle,
        content = content,
        phone = COMPANY_PHONE,
    )
}

fn field_row(label: &str, value_html: &str, shaded: bool) -> String {
    let background = if shaded { "background:#f9f9f9;" } else { "" };
    format!(
        r#"<tr><td style="padding:12px 16px;{background}border-bottom:1px solid #eee;"><span style="color:#888;font-size:13px;display:inline-block;width:100px;">{label}</span>{value_html}</td></tr>"#
    )
}

fn text_value(value: &str) -> String {
    format!(
        r#"<span style="color:#000;font-size:14px;font-weight:600;">{}</span>"#,
        escape_html(value)
    )
}

fn email_value(email: &str) -> String {
    let email = escape_html(email);
    format!(
        r#"<a href="mailto:{email}" style="color:#FFCD11;font-size:14px;font-weight:600;text-decoration:none;">{email}</a>"#
    )
}

fn block_row(label: &str, value: &str, shaded: bool, monospace: bool, last: bool) -> String {
    let background = if shaded { "background:#f9f9f9;" } else { "" };
    let border = if last { "" } else { "border-bottom:1px solid #eee;" };
    let font = if monospace { "font-family:monospace;" } else { "" };
    format!(
        r#"<tr><td style="padding:16px;{background}{border}"><span style="color:#888;font-size:13px;display:block;margin-bottom:8px;">{label}</span><p style="margin:0;color:#000;font-size:14px;line-height:1.5;{font}white-space:pre-wrap;">{value}</p></td></tr>"#,
        value = escape_html(value),
    )
}

fn details_table(rows: &str) -> String {
    format!(
        r#"        <table width="100%" cellpadding="0" cellspacing="0" style="border:1px solid #e0e0e0;border-radius:6px;overflow:hidden;">
          {rows}
        </table>"#
    )
}

fn reply_footer(email: &str, name: &str, subject: &str, submitted_at: DateTime<Utc>) -> String {
    format!(
        r#"        <p style="margin:24px 0 0;color:#888;font-size:12px;">Submitted on {submitted}</p>
        <p style="margin:12px 0 0;"><a href="mailto:{email}?subject={subject}" style="{BUTTON_STYLE}">Reply to {name}</a></p>"#,
        submitted = format_submitted_at(submitted_at),
        email = escape_html(email),
        subject = escape_html(subject),
        name = escape_html(name),
    )
}

fn reach_us(intro: &str, button_href: &str, button_label: &str) -> String {
    format!(
        r#"        <p style="margin:24px 0 0;color:#666;font-size:13px;">{intro}</p>
        <p style="margin:8px 0 0;color:#000;font-size:13px;">Phone: {COMPANY_PHONE}</p>
        <p style="margin:4px 0 0;color:#000;font-size:13px;">WhatsApp: {COMPANY_WHATSAPP}</p>
        <p style="margin:16px 0 0;"><a href="{button_href}" style="{BUTTON_STYLE}">{button_label}</a></p>"#
    )
}

/// Notice to the business inbox about a new parts quote request
pub fn quote_business_html(lead: &QuoteLead<'_>, submitted_at: DateTime<Utc>) -> String {
    let optional_rows = [
        lead.phone.map(|phone| field_row("Phone", &text_value(phone), true)),
        lead.ship_to.map(|ship_to| field_row("Ship To", &text_value(ship_to), false)),
        lead.items.map(|items| block_row("Parts Requested", items, true, true, false)),
        lead.notes.map(|notes| block_row("Notes", notes, false, false, true)),
    ];
    let mut rows = vec![
        field_row("Name", &text_value(lead.name), true),
        field_row("Email", &email_value(lead.email), false),
    ];
    rows.extend(optional_rows.into_iter().flatten());

    let content = format!(
        "        <h2 style=\"margin:0 0 16px;color:#000;font-size:18px;\">Parts Quote Request</h2>\n{}\n{}",
        details_table(&rows.join("\n          ")),
        reply_footer(
            lead.email,
            lead.name,
            "RE: Your Parts Quote Request — American Iron LLC",
            submitted_at
        ),
    );
    layout("New Quote Request Received", &content)
}

/// Confirmation sent to the customer who requested a parts quote
pub fn quote_confirmation_html(lead: &QuoteLead<'_>) -> String {
    let items = lead
        .items
        .map(|items| details_table(&block_row("Parts Requested", items, true, true, true)))
        .unwrap_or_default();

    let content = format!(
        r#"        <h2 style="margin:0 0 8px;color:#000;font-size:18px;">Quote Request Received</h2>
        <p style="margin:0 0 20px;color:#666;font-size:14px;line-height:1.5;">Thank you, {name}. We've received your parts quote request and will respond within one business day with pricing and availability.</p>
{items}
{reach}"#,
        name = escape_html(lead.name),
        items = items,
        reach = reach_us(
            "Need immediate assistance?",
            &format!("{}/parts", COMPANY_WEBSITE),
            "Browse Parts Catalog"
        ),
    );
    layout("Heavy Equipment &amp; Industrial Parts", &content)
}

/// Notice to the business inbox about a contact form submission
pub fn contact_business_html(
    name: &str,
    email: &str,
    message: &str,
    submitted_at: DateTime<Utc>,
) -> String {
    let rows = [
        field_row("Name", &text_value(name), true),
        field_row("Email", &email_value(email), false),
        block_row("Message", message, true, false, true),
    ];
    let content = format!(
        "        <h2 style=\"margin:0 0 16px;color:#000;font-size:18px;\">New Inquiry Received</h2>\n{}\n{}",
        details_table(&rows.join("\n          ")),
        reply_footer(email, name, "RE: Your Inquiry — American Iron LLC", submitted_at),
    );
    layout("New Contact Form Submission", &content)
}

/// Confirmation sent to the customer who used the contact form
pub fn contact_confirmation_html(name: &str, message: &str) -> String {
    let content = format!(
        r#"        <h2 style="margin:0 0 8px;color:#000;font-size:18px;">Thank You, {name}</h2>
        <p style="margin:0 0 20px;color:#666;font-size:14px;line-height:1.5;">We've received your inquiry and a specialist will respond within one business day.</p>
{table}
{reach}"#,
        name = escape_html(name),
        table = details_table(&block_row("Your Message", message, true, false, true)),
        reach = reach_us(
            "In the meantime, you can reach us directly:",
            COMPANY_WEBSITE,
            "Browse Our Inventory"
        ),
    );
    layout("Heavy Equipment &amp; Industrial Parts", &content)
}
