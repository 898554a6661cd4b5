//! Bounding pass over persisted forecast documents.
//!
//! Runs over the whole collection, not just the last batch, because other
//! writers may have stored loosely-typed values. Each field is repaired
//! independently:
//!
//! - `year` / `month`: coerced to integers (floats truncate, integer strings parse)
//! - `occupancyPercent`: clamped to the policy range, then rounded
//! - `averageRate` / `revenue`: rounded to the configured precision
//!
//! A field that cannot be coerced is left as it is. Absent fields stay absent.
//! Documents are never removed.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::BoundingPolicy;
use crate::domain::Metric;
use crate::domain::coerce::{as_f64, as_integer};
use crate::error::PipelineError;
use crate::math::{clamp, round_to};
use crate::store::{Document, DocumentStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EvaluateReport {
    /// Documents scanned.
    pub seen: usize,
    /// Documents with at least one field that could be bounded.
    pub updated: usize,
    /// Documents whose stored values actually differed and were rewritten.
    pub changed: usize,
}

/// Bound every document in `collection` according to `policy`.
pub fn evaluate(
    store: &dyn DocumentStore,
    collection: &str,
    policy: &BoundingPolicy,
) -> Result<EvaluateReport, PipelineError> {
    let documents = store.find_all(collection)?;
    let mut report = EvaluateReport::default();

    for stored in documents {
        report.seen += 1;
        let bounded = bound_document(&stored.fields, policy);
        if bounded.is_empty() {
            debug!(id = %stored.id, "no boundable fields");
            continue;
        }
        report.updated += 1;

        let differs = bounded.iter().any(|(k, v)| stored.fields.get(k) != Some(v));
        if differs {
            store.set_fields(collection, stored.id, bounded)?;
            report.changed += 1;
        }
    }

    info!(
        collection,
        seen = report.seen,
        updated = report.updated,
        changed = report.changed,
        "bounding pass complete"
    );
    Ok(report)
}

/// Compute the repaired values for every boundable field present on `doc`.
///
/// Returns only the fields that could be coerced; the caller merges them back.
pub fn bound_document(doc: &Document, policy: &BoundingPolicy) -> Document {
    let mut out = Document::new();

    for key in ["year", "month"] {
        let Some(raw) = doc.get(key) else { continue };
        match as_integer(raw) {
            Some(v) => {
                if key == "month" && !(1..=12).contains(&v) {
                    warn!(month = v, "month outside 1..=12 after coercion");
                }
                out.insert(key.to_string(), Value::from(v));
            }
            None => warn!(field = key, value = %raw, "cannot coerce to integer; leaving as is"),
        }
    }

    let fields = [
        (Metric::Occupancy, policy.occupancy_decimals),
        (Metric::AverageRate, policy.rate_decimals),
        (Metric::Revenue, policy.revenue_decimals),
    ];
    for (metric, decimals) in fields {
        let key = metric.field_name();
        let Some(raw) = doc.get(key) else { continue };
        let Some(mut v) = as_f64(raw) else {
            warn!(field = key, value = %raw, "cannot coerce to number; leaving as is");
            continue;
        };
        if metric == Metric::Occupancy {
            v = clamp(v, policy.occupancy_min, policy.occupancy_max);
        }
        out.insert(key.to_string(), number(round_to(v, decimals), decimals));
    }

    out
}

// Zero decimals means the field is stored as an integer.
fn number(value: f64, decimals: u32) -> Value {
    if decimals == 0 {
        Value::from(value as i64)
    } else {
        Value::from(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn coerces_keys_and_clamps_together() {
        let input = doc(json!({
            "year": "2024",
            "month": 2024.0,
            "occupancyPercent": 130.4,
            "averageRate": 199.999
        }));
        let out = bound_document(&input, &BoundingPolicy::default());
        assert_eq!(
            out,
            doc(json!({
                "year": 2024,
                "month": 2024,
                "occupancyPercent": 100.0,
                "averageRate": 200.0
            }))
        );
    }

    #[test]
    fn absent_and_unconvertible_fields_are_left_alone() {
        let input = doc(json!({"year": "twenty", "revenue": 10.456, "note": "x"}));
        let out = bound_document(&input, &BoundingPolicy::default());
        assert_eq!(out, doc(json!({"revenue": 10.46})));
    }

    #[test]
    fn integer_rate_precision_stores_integers() {
        let policy = BoundingPolicy {
            rate_decimals: 0,
            ..BoundingPolicy::default()
        };
        let out = bound_document(&doc(json!({"averageRate": 149.6})), &policy);
        assert_eq!(out["averageRate"], json!(150));
        assert!(out["averageRate"].is_i64());
    }

    #[test]
    fn oversized_precision_never_nulls_a_value() {
        let policy = BoundingPolicy {
            revenue_decimals: 400,
            ..BoundingPolicy::default()
        };
        let out = bound_document(&doc(json!({"revenue": 140000.5})), &policy);
        assert_eq!(out["revenue"], json!(140000.5));
    }

    #[test]
    fn negative_occupancy_is_clamped_to_zero() {
        let out = bound_document(&doc(json!({"occupancyPercent": "-3.2"})), &BoundingPolicy::default());
        assert_eq!(out["occupancyPercent"], json!(0.0));
    }

    #[test]
    fn pass_counts_seen_updated_and_changed() {
        let store = MemoryStore::new();
        store
            .insert_many(
                "p",
                vec![
                    doc(json!({"year": 2024, "month": 1, "occupancyPercent": 130.4})),
                    doc(json!({"year": 2024, "month": 2, "occupancyPercent": 50.0})),
                    doc(json!({"comment": "nothing to bound"})),
                ],
            )
            .unwrap();

        let report = evaluate(&store, "p", &BoundingPolicy::default()).unwrap();
        assert_eq!(
            report,
            EvaluateReport {
                seen: 3,
                updated: 2,
                changed: 1
            }
        );

        let docs = store.find_all("p").unwrap();
        assert_eq!(docs.len(), 3);
        for d in &docs {
            if let Some(occ) = d.fields.get("occupancyPercent").and_then(Value::as_f64) {
                assert!((0.0..=100.0).contains(&occ));
            }
        }

        // Second pass finds nothing left to fix.
        let again = evaluate(&store, "p", &BoundingPolicy::default()).unwrap();
        assert_eq!(again.changed, 0);
    }
}
