//! Synthetic raw data for local runs and tests.

use chrono::{DateTime, Utc};
use rand::Rng;

use crate::entity::{raw_interaction, raw_product};

pub const DEMO_USERS: i64 = 20;
pub const DEMO_ITEMS: i64 = 20;

/// `n` random interactions sharing one `ingested_at`: user and item ids in
/// `1..=20`, ratings in `1..=5`.
pub fn generate_interactions<R: Rng + ?Sized>(
    rng: &mut R,
    n: usize,
    ingested_at: DateTime<Utc>,
) -> Vec<raw_interaction::Model> {
    let ingested_at = ingested_at.fixed_offset();
    (0..n)
        .map(|_| raw_interaction::Model {
            user_id: rng.random_range(1..=DEMO_USERS),
            item_id: rng.random_range(1..=DEMO_ITEMS),
            rating: Some(rng.random_range(1..=5)),
            ingested_at,
        })
        .collect()
}

pub fn product_catalog() -> Vec<raw_product::Model> {
    [
        (1, "Electronics", 199.99),
        (2, "Books", 15.50),
        (3, "Clothing", 29.99),
        (4, "Sports", 99.99),
        (5, "Home", 49.99),
    ]
    .into_iter()
    .map(|(item_id, category, price)| raw_product::Model {
        item_id,
        category: Some(category.to_string()),
        price: Some(price),
    })
    .collect()
}
