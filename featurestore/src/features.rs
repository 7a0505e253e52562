//! Feature computation over screened interactions.
//!
//! Everything here is pure: the same input slice always yields the same rows in
//! the same order, which is what makes a refresh idempotent.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDateTime;

use crate::entity::feature_row;

/// An interaction that passed screening.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interaction {
    pub user_id: i64,
    pub item_id: i64,
    pub rating: i64,
    /// `ingested_at` converted to UTC.
    pub ingested_at: NaiveDateTime,
}

/// Provenance of one `feature_store` column, mirrored into `feature_metadata`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureDefinition {
    pub name: &'static str,
    pub source_table: &'static str,
    pub transformation: &'static str,
    /// Key columns identify a row and are not lookup targets.
    pub is_key: bool,
}

pub const RAW_INTERACTIONS: &str = "raw_interactions";

/// One entry per `feature_store` column, in table order.
pub const FEATURE_DEFINITIONS: [FeatureDefinition; 7] = [
    FeatureDefinition {
        name: "user_id",
        source_table: RAW_INTERACTIONS,
        transformation: "user key of each distinct user-item pair",
        is_key: true,
    },
    FeatureDefinition {
        name: "item_id",
        source_table: RAW_INTERACTIONS,
        transformation: "item key of each distinct user-item pair",
        is_key: true,
    },
    FeatureDefinition {
        name: "avg_user_rating",
        source_table: RAW_INTERACTIONS,
        transformation: "mean rating per user",
        is_key: false,
    },
    FeatureDefinition {
        name: "avg_item_rating",
        source_table: RAW_INTERACTIONS,
        transformation: "mean rating per item",
        is_key: false,
    },
    FeatureDefinition {
        name: "user_activity_count",
        source_table: RAW_INTERACTIONS,
        transformation: "count of interactions per user",
        is_key: false,
    },
    FeatureDefinition {
        name: "co_occurrence_count",
        source_table: RAW_INTERACTIONS,
        transformation: "count of interactions per user-item pair",
        is_key: false,
    },
    FeatureDefinition {
        name: "last_updated",
        source_table: RAW_INTERACTIONS,
        transformation: "latest ingested_at (UTC) per user-item pair",
        is_key: false,
    },
];

pub fn definition(name: &str) -> Option<&'static FeatureDefinition> {
    FEATURE_DEFINITIONS.iter().find(|d| d.name == name)
}

#[derive(Debug, Default, Clone, Copy)]
struct RatingTally {
    // Wide enough that no count of i64 ratings can overflow it.
    sum: i128,
    count: i64,
}

impl RatingTally {
    fn add(&mut self, rating: i64) {
        self.sum += i128::from(rating);
        self.count += 1;
    }

    // Integer sum divided once: [3, 5] is exactly 4.0.
    fn mean(&self) -> f64 {
        self.sum as f64 / self.count as f64
    }
}

#[derive(Debug, Clone, Copy)]
struct PairTally {
    count: i64,
    latest: NaiveDateTime,
}

/// Aggregate `interactions` into one feature row per (user, item) pair,
/// ordered by `(user_id, item_id)`.
pub fn compute(interactions: &[Interaction]) -> Vec<feature_row::Model> {
    let mut users: HashMap<i64, RatingTally> = HashMap::new();
    let mut items: HashMap<i64, RatingTally> = HashMap::new();
    let mut pairs: BTreeMap<(i64, i64), PairTally> = BTreeMap::new();

    for i in interactions {
        users.entry(i.user_id).or_default().add(i.rating);
        items.entry(i.item_id).or_default().add(i.rating);
        pairs
            .entry((i.user_id, i.item_id))
            .and_modify(|p| {
                p.count += 1;
                p.latest = p.latest.max(i.ingested_at);
            })
            .or_insert(PairTally {
                count: 1,
                latest: i.ingested_at,
            });
    }

    pairs
        .into_iter()
        .map(|((user_id, item_id), pair)| {
            let user = users[&user_id];
            let item = items[&item_id];
            feature_row::Model {
                user_id,
                item_id,
                avg_user_rating: user.mean(),
                avg_item_rating: item.mean(),
                user_activity_count: user.count,
                co_occurrence_count: pair.count,
                last_updated: pair.latest,
            }
        })
        .collect()
}
