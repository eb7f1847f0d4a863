//! Analytics engine for the admin dashboard
//!
//! Pure business logic over order, product and user rows

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::{Money, OrderStatus, ProductId, Role};
use std::collections::{BTreeMap, HashMap};

use crate::types::{Order, Product, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub orders_by_status: BTreeMap<String, usize>,
    pub total_orders: usize,
    pub revenue: Money,
    pub revenue_recent: Money,
    pub recent_window_days: i64,
    pub customers: usize,
    pub top_products: Vec<TopProduct>,
    pub low_stock: Vec<LowStockProduct>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopProduct {
    pub product_id: ProductId,
    pub name: String,
    pub quantity_sold: u32,
    pub revenue: Money,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LowStockProduct {
    pub product_id: ProductId,
    pub name: String,
    pub stock: u32,
}

/// Analytics engine for back-office figures
pub struct AnalyticsEngine {
    /// Products at or below this stock level are flagged
    low_stock_threshold: u32,

    /// How many best sellers to report
    top_products: usize,

    /// Window for the "recent revenue" figure
    recent_window_days: i64,
}

impl AnalyticsEngine {
    pub fn new() -> Self {
        Self {
            low_stock_threshold: 5,
            top_products: 5,
            recent_window_days: 30,
        }
    }

    /// Create with custom configuration
    pub fn with_config(low_stock_threshold: u32, top_products: usize, recent_window_days: i64) -> Self {
        Self {
            low_stock_threshold,
            top_products,
            recent_window_days,
        }
    }

    /// Compute dashboard figures as of `now`
    pub fn dashboard(&self, orders: &[Order], products: &[Product], users: &[User], now: DateTime<Utc>) -> DashboardStats {
        let mut orders_by_status: BTreeMap<String, usize> =
            OrderStatus::ALL.iter().map(|status| (status.to_string(), 0)).collect();
        for order in orders {
            *orders_by_status.entry(order.status.to_string()).or_default() += 1;
        }

        let completed: Vec<&Order> = orders.iter().filter(|o| o.status == OrderStatus::Completed).collect();
        let revenue = completed.iter().map(|o| o.total).sum();

        let window_start = now - Duration::days(self.recent_window_days);
        let revenue_recent = completed
            .iter()
            .filter(|o| o.delivered_at.unwrap_or(o.updated_at) >= window_start)
            .map(|o| o.total)
            .sum();

        DashboardStats {
            orders_by_status,
            total_orders: orders.len(),
            revenue,
            revenue_recent,
            recent_window_days: self.recent_window_days,
            customers: users.iter().filter(|u| u.role == Role::Customer).count(),
            top_products: self.top_products(&completed),
            low_stock: self.low_stock(products),
        }
    }

    fn top_products(&self, completed: &[&Order]) -> Vec<TopProduct> {
        let mut totals: HashMap<ProductId, TopProduct> = HashMap::new();
        for line in completed.iter().flat_map(|o| o.lines.iter()) {
            let entry = totals.entry(line.product_id).or_insert_with(|| TopProduct {
                product_id: line.product_id,
                name: line.product_name.clone(),
                quantity_sold: 0,
                revenue: Money::ZERO,
            });
            entry.quantity_sold += line.quantity;
            entry.revenue += line.line_total;
        }

        let mut ranked: Vec<TopProduct> = totals.into_values().collect();
        ranked.sort_by(|a, b| {
            b.quantity_sold
                .cmp(&a.quantity_sold)
                .then(b.revenue.cmp(&a.revenue))
                .then(a.product_id.cmp(&b.product_id))
        });
        ranked.truncate(self.top_products);
        ranked
    }

    fn low_stock(&self, products: &[Product]) -> Vec<LowStockProduct> {
        let mut low: Vec<LowStockProduct> = products
            .iter()
            .filter(|p| p.active && p.stock <= self.low_stock_threshold)
            .map(|p| LowStockProduct {
                product_id: p.id,
                name: p.name.clone(),
                stock: p.stock,
            })
            .collect();
        low.sort_by(|a, b| a.stock.cmp(&b.stock).then(a.product_id.cmp(&b.product_id)));
        low
    }
}

impl Default for AnalyticsEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{OrderLine, ShippingInfo};
    use shared::{CategoryId, OrderId, PaymentMethod, PaymentStatus, UserId};

    fn order(id: u64, status: OrderStatus, lines: &[(u64, u32, u64)], delivered_days_ago: i64) -> Order {
        let now = Utc::now();
        let lines: Vec<OrderLine> = lines
            .iter()
            .map(|&(product, quantity, price)| OrderLine {
                product_id: ProductId(product),
                product_name: format!("Product {product}"),
                unit_price: Money(price),
                quantity,
                line_total: Money(price).times(quantity),
            })
            .collect();
        let total = lines.iter().map(|l| l.line_total).sum();
        Order {
            id: OrderId(id),
            customer_id: UserId(10),
            shipper_id: None,
            status,
            payment_method: PaymentMethod::CashOnDelivery,
            payment_status: PaymentStatus::Unpaid,
            txn_ref: None,
            lines,
            subtotal: total,
            shipping_fee: Money::ZERO,
            total,
            shipping: ShippingInfo {
                recipient_name: "A".to_string(),
                phone: "1".to_string(),
                address: "2".to_string(),
                note: None,
            },
            cancel_reason: None,
            history: Vec::new(),
            created_at: now,
            updated_at: now,
            shipped_at: None,
            delivered_at: Some(now - Duration::days(delivered_days_ago)),
        }
    }

    fn product(id: u64, stock: u32) -> Product {
        Product {
            id: ProductId(id),
            category_id: CategoryId(1),
            name: format!("Product {id}"),
            slug: format!("product-{id}"),
            description: String::new(),
            price: Money(100),
            stock,
            image_path: None,
            active: true,
            sold: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_revenue_counts_only_completed_orders() {
        let orders = vec![
            order(1, OrderStatus::Completed, &[(1, 2, 500)], 1),
            order(2, OrderStatus::Completed, &[(2, 1, 300)], 90),
            order(3, OrderStatus::Cancelled, &[(1, 5, 500)], 1),
            order(4, OrderStatus::Pending, &[(1, 1, 500)], 1),
        ];

        let stats = AnalyticsEngine::new().dashboard(&orders, &[], &[], Utc::now());

        assert_eq!(stats.revenue, Money(1300));
        assert_eq!(stats.revenue_recent, Money(1000));
        assert_eq!(stats.total_orders, 4);
        assert_eq!(stats.orders_by_status["completed"], 2);
        assert_eq!(stats.orders_by_status["shipped"], 0);
    }

    #[test]
    fn test_top_products_ranked_by_quantity() {
        let orders = vec![
            order(1, OrderStatus::Completed, &[(1, 2, 500), (2, 5, 100)], 1),
            order(2, OrderStatus::Completed, &[(3, 1, 900)], 1),
        ];

        let stats = AnalyticsEngine::with_config(5, 2, 30).dashboard(&orders, &[], &[], Utc::now());

        let ids: Vec<u64> = stats.top_products.iter().map(|p| p.product_id.value()).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(stats.top_products[0].revenue, Money(500));
    }

    #[test]
    fn test_low_stock_threshold() {
        let mut hidden = product(4, 0);
        hidden.active = false;
        let products = vec![product(1, 10), product(2, 5), product(3, 0), hidden];

        let stats = AnalyticsEngine::new().dashboard(&[], &products, &[], Utc::now());

        let ids: Vec<u64> = stats.low_stock.iter().map(|p| p.product_id.value()).collect();
        assert_eq!(ids, vec![3, 2]);
    }
}
