//! Handing an order to a courier: a driver link and a pre-filled WhatsApp
//! message carrying it.

use std::fmt::Write;

use crate::domain::Order;

pub fn driver_link(origin: &str, order_id: &str) -> String {
    format!("{}/driver/{}", origin.trim_end_matches('/'), order_id)
}

pub fn whatsapp_message(order: &Order, origin: &str) -> String {
    let mut message = format!(
        "Pedido #{}\nCliente: {}\n",
        order.order_number, order.customer_name
    );
    if let Some(address) = &order.delivery_address {
        let _ = writeln!(message, "Dirección: {}", address);
    }
    if let Some(notes) = order.delivery_notes.as_deref().filter(|n| !n.is_empty()) {
        let _ = writeln!(message, "Notas: {}", notes);
    }
    if order.payment_method.is_some() {
        let _ = writeln!(message, "Pago: {}", order.payment_kind().label());
    }
    let _ = writeln!(message, "Total: ${:.2}", order.total);
    message.push_str(&driver_link(origin, &order.id));
    message
}

/// `wa.me` deep link; with no phone the user picks the chat.
pub fn whatsapp_link(order: &Order, origin: &str, phone: Option<&str>) -> String {
    let digits: String = phone
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_digit)
        .collect();
    format!(
        "https://wa.me/{}?text={}",
        digits,
        urlencoding::encode(&whatsapp_message(order, origin))
    )
}
