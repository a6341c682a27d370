//! Order records (read-only from the admin panel).

use serde::{Deserialize, Serialize};

use super::{OrderId, OrderStatus, Price};

/// An order row from the orders sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub customer_name: String,
    /// Order date exactly as written in the sheet.
    pub date: String,
    pub item_count: u32,
    pub total: Price,
    pub status: OrderStatus,
}

/// Count orders that are still pending.
#[must_use]
pub fn pending_count(orders: &[Order]) -> usize {
    orders.iter().filter(|o| o.status.is_pending()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(id: i64, status: OrderStatus) -> Order {
        Order {
            id: OrderId::new(id),
            customer_name: "Asha".to_string(),
            date: "2024-03-01".to_string(),
            item_count: 2,
            total: Price::ZERO,
            status,
        }
    }

    #[test]
    fn test_pending_count() {
        let orders = vec![
            order(1, OrderStatus::Pending),
            order(2, OrderStatus::Shipped),
            order(3, OrderStatus::Pending),
            order(4, OrderStatus::Other("on hold".to_string())),
        ];
        assert_eq!(pending_count(&orders), 2);
        assert_eq!(pending_count(&[]), 0);
    }
}
