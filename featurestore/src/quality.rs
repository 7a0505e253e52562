//! Data-quality screening of the raw store.
//!
//! An interaction row is *offending* when its rating is NULL or falls outside
//! the configured range. Under [`Strictness::Lenient`] offending rows are
//! dropped from every aggregate (averages and counts alike) and counted in the
//! [`QualityReport`]; under [`Strictness::Strict`] a single offending row fails
//! the run before anything is written.
//!
//! Product problems are reported only. Products never feed feature values.

use std::collections::HashSet;
use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use sea_orm::ConnectionTrait;
use serde::Serialize;

use crate::entity::{raw_interaction, raw_product};
use crate::error::{StoreError, StoreResult};
use crate::features::Interaction;
use crate::raw;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Skip offending rows and count them.
    #[default]
    Lenient,
    /// Fail the whole run on the first offending row.
    Strict,
}

impl Strictness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strictness::Lenient => "lenient",
            Strictness::Strict => "strict",
        }
    }
}

impl fmt::Display for Strictness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strictness {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Strictness::Lenient),
            "strict" => Ok(Strictness::Strict),
            other => Err(format!("expected 'lenient' or 'strict', got '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualityPolicy {
    pub strictness: Strictness,
    pub rating_range: RangeInclusive<i64>,
}

impl Default for QualityPolicy {
    fn default() -> Self {
        Self {
            strictness: Strictness::Lenient,
            rating_range: 1..=5,
        }
    }
}

impl QualityPolicy {
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
            ..Self::default()
        }
    }

    /// Accept a rating or say why it is rejected.
    pub fn check_rating(&self, rating: Option<i64>) -> Result<i64, RowIssue> {
        match rating {
            None => Err(RowIssue::MissingRating),
            Some(r) if !self.rating_range.contains(&r) => Err(RowIssue::RatingOutOfRange(r)),
            Some(r) => Ok(r),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowIssue {
    MissingRating,
    RatingOutOfRange(i64),
}

/// Counts of everything the screening looked at. Serialized as-is by the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QualityReport {
    pub interaction_rows: u64,
    /// Exact repeats of an earlier row. They are kept: the raw store is
    /// append-only and repeated events are legitimate.
    pub duplicate_interactions: u64,
    pub missing_rating: u64,
    pub invalid_rating: u64,
    pub product_rows: u64,
    pub missing_price: u64,
    pub invalid_price: u64,
    pub missing_category: u64,
    /// Distinct interacted items with no row in `raw_products`.
    pub items_without_product: u64,
}

impl QualityReport {
    pub fn rejected_interactions(&self) -> u64 {
        self.missing_rating + self.invalid_rating
    }

    pub fn accepted_interactions(&self) -> u64 {
        self.interaction_rows - self.rejected_interactions()
    }
}

/// Output of [`screen`]: rows that may feed aggregates, plus the report.
#[derive(Debug, Clone)]
pub struct Screened {
    pub accepted: Vec<Interaction>,
    pub report: QualityReport,
}

/// Apply `policy` to raw rows.
///
/// Returns [`StoreError::DataQuality`] in strict mode when any interaction row
/// is offending; otherwise the accepted rows in input order.
pub fn screen(
    interactions: &[raw_interaction::Model],
    products: &[raw_product::Model],
    policy: &QualityPolicy,
) -> StoreResult<Screened> {
    let mut report = assess_products(products);
    report.interaction_rows = interactions.len() as u64;

    let mut seen = HashSet::with_capacity(interactions.len());
    let mut accepted = Vec::with_capacity(interactions.len());

    for row in interactions {
        if !seen.insert((row.user_id, row.item_id, row.rating, row.ingested_at)) {
            report.duplicate_interactions += 1;
        }

        match policy.check_rating(row.rating) {
            Ok(rating) => accepted.push(Interaction {
                user_id: row.user_id,
                item_id: row.item_id,
                rating,
                ingested_at: row.ingested_at.naive_utc(),
            }),
            Err(RowIssue::MissingRating) => report.missing_rating += 1,
            Err(RowIssue::RatingOutOfRange(_)) => report.invalid_rating += 1,
        }
    }

    let catalog: HashSet<i64> = products.iter().map(|p| p.item_id).collect();
    let interacted: HashSet<i64> = interactions.iter().map(|r| r.item_id).collect();
    report.items_without_product = interacted.difference(&catalog).count() as u64;

    let rejected = report.rejected_interactions();
    if rejected > 0 {
        match policy.strictness {
            Strictness::Strict => {
                return Err(StoreError::DataQuality {
                    total: report.interaction_rows,
                    rejected,
                    missing_rating: report.missing_rating,
                    invalid_rating: report.invalid_rating,
                });
            }
            Strictness::Lenient => {
                tracing::warn!(
                    skipped = rejected,
                    missing_rating = report.missing_rating,
                    invalid_rating = report.invalid_rating,
                    "skipping interaction rows that failed screening"
                );
            }
        }
    }

    Ok(Screened { accepted, report })
}

fn assess_products(products: &[raw_product::Model]) -> QualityReport {
    let mut report = QualityReport {
        product_rows: products.len() as u64,
        ..Default::default()
    };
    for p in products {
        match p.price {
            None => report.missing_price += 1,
            Some(price) if !price.is_finite() || price < 0.0 => report.invalid_price += 1,
            Some(_) => {}
        }
        if p.category.as_deref().is_none_or(|c| c.trim().is_empty()) {
            report.missing_category += 1;
        }
    }
    report
}

/// Screen the current raw tables without writing anything.
///
/// Always lenient: a report is the point, so offending rows are counted
/// rather than turned into an error.
pub async fn validate<C: ConnectionTrait>(
    conn: &C,
    policy: &QualityPolicy,
) -> StoreResult<QualityReport> {
    let interactions = raw::load_interactions(conn, None).await?;
    let products = raw::load_products(conn).await?;
    let lenient = QualityPolicy {
        strictness: Strictness::Lenient,
        ..policy.clone()
    };
    let screened = screen(&interactions, &products, &lenient)?;
    tracing::info!(
        interaction_rows = screened.report.interaction_rows,
        rejected = screened.report.rejected_interactions(),
        product_rows = screened.report.product_rows,
        "raw store validated"
    );
    Ok(screened.report)
}
