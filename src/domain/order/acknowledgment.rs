use serde::Serialize;

use super::states::PricedOrder;

/// Rendered acknowledgment letter (HTML body)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcknowledgmentLetter(String);

impl AcknowledgmentLetter {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Render the acknowledgment for a priced order.
///
/// The output depends only on the order, so rendering the same order twice
/// yields the same letter.
pub(crate) fn render_acknowledgment(order: &PricedOrder) -> AcknowledgmentLetter {
    let customer = order.customer_info();
    let mut html = format!(
        "<p>Dear {} {},</p>\n<p>We have received order {}.</p>\n<table>\n",
        escape(customer.first_name.as_str()),
        escape(customer.last_name.as_str()),
        escape(order.order_id().as_str())
    );

    for line in order.lines() {
        html.push_str(&format!(
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>\n",
            escape(line.product_code().as_str()),
            line.quantity().value(),
            line.unit_price(),
            line.line_price()
        ));
    }

    html.push_str(&format!(
        "</table>\n<p>Total: {}</p>\n<p>Shipping to: {}</p>\n",
        order.amount_to_bill(),
        escape(&order.shipping_address().to_string())
    ));

    AcknowledgmentLetter(html)
}

fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
