use super::QuoteDocument;
use crate::common::escape_html;
use crate::notifications::templates::{COMPANY_EMAIL, COMPANY_PHONE, COMPANY_WEBSITE};

/// HTML email body that accompanies the PDF quotation
pub fn render_html(doc: &QuoteDocument) -> String {
    let spec_rows: String = doc
        .specs
        .iter()
        .enumerate()
        .map(|(i, spec)| {
            let background = if i % 2 == 0 { "#ffffff" } else { "#fafafa" };
            format!(
                r#"
          <tr>
            <td style="padding:10px 16px;border-top:1px solid #eee;background:{background};">
              <span style="color:#888;font-size:13px;display:inline-block;width:140px;">{label}</span>
              <span style="color:#000;font-size:13px;font-weight:600;">{value}</span>
            </td>
          </tr>"#,
                label = escape_html(&spec.label),
                value = escape_html(&spec.value),
            )
        })
        .collect();

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
        <p style="margin:4px 0 0;color:#cccccc;font-size:13px;">Heavy Equipment &amp; Industrial Parts</p>
      </td>
    </tr>
    <tr>
      <td style="padding:32px;">
        <h2 style="margin:0 0 8px;color:#000;font-size:20px;">Your Equipment Quote</h2>
        <p style="margin:0 0 24px;color:#666;font-size:14px;">Quote #{number} | {date}</p>
        <table width="100%" cellpadding="0" cellspacing="0" style="border:1px solid #e0e0e0;border-radius:6px;overflow:hidden;">
          <tr>
            <td style="background:#f9f9f9;padding:16px;">
              <p style="margin:0 0 4px;font-size:11px;color:#FFCD11;font-weight:bold;text-transform:uppercase;">{category}</p>
              <h3 style="margin:0 0 4px;color:#000;font-size:16px;">{title}</h3>
              <p style="margin:0;color:#888;font-size:13px;">{identifier}</p>
            </td>
          </tr>{spec_rows}
          <tr>
            <td style="background:#000;padding:14px 16px;">
              <span style="color:#fff;font-size:14px;font-weight:bold;">Total: </span>
              <span style="color:#FFCD11;font-size:16px;font-weight:bold;">{price}</span>
            </td>
          </tr>
        </table>
        <p style="margin:24px 0 0;color:#888;font-size:12px;">This quote is valid for 30 days. Shipping charges not included. Please reply to this email or call {phone} to proceed.</p>
        <p style="margin:16px 0 0;">
          <a href="{website}" style="display:inline-block;background:#FFCD11;color:#000;padding:10px 24px;text-decoration:none;border-radius:4px;font-weight:bold;font-size:14px;">Visit Our Website</a>
        </p>
      </td>
    </tr>
    <tr>
      <td style="background:#f4f4f4;padding:20px 32px;text-align:center;">
        <p style="margin:0;color:#999;font-size:11px;">American Iron LLC — Tampa, Florida</p>
        <p style="margin:4px 0 0;color:#999;font-size:11px;">{phone} | {email}</p>
      </td>
    </tr>
  </table>
</body>
</html>"#,
        number = escape_html(&doc.quote_number),
        date = doc.formatted_date(),
        category = escape_html(&doc.category),
        title = escape_html(&doc.title),
        identifier = escape_html(&doc.identifier),
        spec_rows = spec_rows,
        price = escape_html(&doc.price),
        phone = COMPANY_PHONE,
        website = COMPANY_WEBSITE,
        email = COMPANY_EMAIL,
    )
}
