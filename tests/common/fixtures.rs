//! Test fixtures for integration tests.

#![allow(dead_code)]

use mongodb::bson::{Document, doc};

/// Orders spread over a few statuses and customers.
pub fn generate_orders(count: usize) -> Vec<Document> {
    const STATUSES: [&str; 3] = ["open", "shipped", "cancelled"];
    (0..count)
        .map(|i| {
            doc! {
                "orderNo": i as i32,
                "status": STATUSES[i % STATUSES.len()],
                "customerId": (i % 7) as i32,
                "total": (i * 10) as i32,
                "shipping": { "country": if i % 2 == 0 { "DE" } else { "FR" } },
            }
        })
        .collect()
}
