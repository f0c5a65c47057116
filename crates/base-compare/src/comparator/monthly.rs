//! Month-over-month comparison of request sets.

use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

use crate::config::ComparatorConfig;
use crate::dataset::Dataset;
use crate::dates::{DateCell, classify_date, month_key};
use crate::error::Result;
use crate::normalize::normalize_identifier;
use crate::types::{
    ComparisonResult, MonthComparison, MonthOnly, UnbucketedReason, UnbucketedRow,
};

#[derive(Debug, Default)]
struct MonthBucket {
    requests: BTreeSet<String>,
    rows: usize,
}

impl MonthBucket {
    fn into_month_only(self, month: String) -> MonthOnly {
        MonthOnly {
            month,
            requests: self.requests,
            row_count: self.rows,
        }
    }
}

#[derive(Debug, Default)]
struct Buckets {
    months: BTreeMap<String, MonthBucket>,
    unbucketed: Vec<UnbucketedRow>,
}

/// Compare the request sets of every month between the two bases.
///
/// Months present in both get both set differences. Months only the current
/// base has are reported under `new_months` and never as missing requests;
/// months only the historical base has go to `dropped_months`. Rows without a
/// usable month or request number are listed in `unbucketed`.
pub fn compare_months(
    historical: &Dataset,
    current: &Dataset,
    config: &ComparatorConfig,
) -> Result<ComparisonResult> {
    let mut hist = bucket_by_month(historical, config)?;
    let mut curr = bucket_by_month(current, config)?;

    let mut result = ComparisonResult::default();

    let labels: BTreeSet<String> = hist.months.keys().chain(curr.months.keys()).cloned().collect();
    for month in labels {
        match (hist.months.remove(&month), curr.months.remove(&month)) {
            (Some(h), Some(c)) => result.months.push(MonthComparison {
                missing_in_current: h.requests.difference(&c.requests).cloned().collect(),
                new_in_current: c.requests.difference(&h.requests).cloned().collect(),
                historical_rows: h.rows,
                current_rows: c.rows,
                month,
            }),
            (None, Some(c)) => result.new_months.push(c.into_month_only(month)),
            (Some(h), None) => result.dropped_months.push(h.into_month_only(month)),
            (None, None) => {}
        }
    }

    result.unbucketed.append(&mut hist.unbucketed);
    result.unbucketed.append(&mut curr.unbucketed);

    info!(
        "Monthly comparison: {} common, {} new, {} dropped months, {} unbucketed rows",
        result.months.len(),
        result.new_months.len(),
        result.dropped_months.len(),
        result.unbucketed.len()
    );
    Ok(result)
}

/// Partition a dataset's request numbers by month.
fn bucket_by_month(dataset: &Dataset, config: &ComparatorConfig) -> Result<Buckets> {
    let requests = dataset.string_values(&config.request_column)?;
    let months = month_labels(dataset, config)?;

    let mut buckets = Buckets::default();
    for (row_index, (request, month)) in requests.iter().zip(months).enumerate() {
        let Some(request_key) = request
            .as_deref()
            .and_then(|r| normalize_identifier(r, config.case_insensitive_keys))
        else {
            buckets.unbucketed.push(UnbucketedRow {
                role: dataset.role(),
                row_index,
                value: request.clone(),
                reason: UnbucketedReason::MissingRequestNumber,
            });
            continue;
        };

        match month {
            Ok(label) => {
                let bucket = buckets.months.entry(label).or_default();
                bucket.requests.insert(request_key);
                bucket.rows += 1;
            }
            Err((reason, value)) => buckets.unbucketed.push(UnbucketedRow {
                role: dataset.role(),
                row_index,
                value,
                reason,
            }),
        }
    }

    debug!(
        "'{}' bucketed into {} months, {} rows left out",
        dataset.name(),
        buckets.months.len(),
        buckets.unbucketed.len()
    );
    Ok(buckets)
}

type MonthLabel = std::result::Result<String, (UnbucketedReason, Option<String>)>;

/// Month label of every row, from the month column when configured,
/// otherwise from the parsed date.
fn month_labels(dataset: &Dataset, config: &ComparatorConfig) -> Result<Vec<MonthLabel>> {
    if let Some(month_column) = config.month_column.as_deref() {
        let values = dataset.string_values(month_column)?;
        return Ok(values
            .into_iter()
            .map(|value| {
                match value.as_deref().and_then(|v| normalize_identifier(v, true)) {
                    Some(label) => Ok(label),
                    None => Err((UnbucketedReason::MissingDate, value)),
                }
            })
            .collect());
    }

    // validate() guarantees a date column when no month column is set
    let date_column = config.date_column.as_deref().unwrap_or_default();
    let values = dataset.string_values(date_column)?;
    Ok(values
        .into_iter()
        .map(|value| match classify_date(value.as_deref(), &config.date_formats) {
            DateCell::Valid(date) => Ok(month_key(date)),
            DateCell::Malformed => Err((UnbucketedReason::MalformedDate, value)),
            DateCell::Missing => Err((UnbucketedReason::MissingDate, value)),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DatasetRole;
    use polars::prelude::*;

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn dataset(role: DatasetRole, rows: &[(&str, &str)]) -> Dataset {
        let requests: Vec<&str> = rows.iter().map(|(r, _)| *r).collect();
        let dates: Vec<&str> = rows.iter().map(|(_, d)| *d).collect();
        let df = df![
            "numero_da_solicitacao" => requests,
            "data" => dates,
        ]
        .unwrap();
        Dataset::new(role.label(), role, df).unwrap()
    }

    fn march_april() -> (Dataset, Dataset) {
        let historical = dataset(
            DatasetRole::Historical,
            &[("A", "2024-03-01"), ("B", "2024-03-10"), ("C", "2024-03-20")],
        );
        let current = dataset(
            DatasetRole::Current,
            &[
                ("A", "2024-03-01"),
                ("B", "2024-03-10"),
                ("D", "2024-03-22"),
                ("E", "2024-04-02"),
            ],
        );
        (historical, current)
    }

    #[test]
    fn test_missing_and_new_months() {
        let (historical, current) = march_april();
        let result = compare_months(&historical, &current, &ComparatorConfig::default()).unwrap();

        assert_eq!(result.missing("2024-03"), Some(&set(&["c"])));
        assert_eq!(result.added("2024-03"), Some(&set(&["d"])));
        assert_eq!(result.new_month_labels(), set(&["2024-04"]));
        assert!(result.missing("2024-04").is_none());
        assert!(result.dropped_months.is_empty());

        let march = result.month("2024-03").unwrap();
        assert_eq!((march.historical_rows, march.current_rows), (3, 3));
    }

    #[test]
    fn test_unbucketed_rows_follow_permutation() {
        let historical = dataset(DatasetRole::Historical, &[("A", "2024-03-01")]);
        let rows = [
            ("A", "2024-03-01"),
            ("X", "2024-13-40"),
            ("", "2024-03-02"),
            ("B", "2024-04-01"),
        ];
        let mut reversed = rows;
        reversed.reverse();
        let config = ComparatorConfig::default();

        let first =
            compare_months(&historical, &dataset(DatasetRole::Current, &rows), &config).unwrap();
        let permuted =
            compare_months(&historical, &dataset(DatasetRole::Current, &reversed), &config)
                .unwrap();

        assert_eq!(first.months, permuted.months);
        assert_eq!(first.new_months, permuted.new_months);
        assert_eq!(first.dropped_months, permuted.dropped_months);

        let reasons = |result: &ComparisonResult| {
            let mut seen: Vec<(String, UnbucketedReason)> = result
                .unbucketed
                .iter()
                .map(|r| (r.value.clone().unwrap_or_default(), r.reason))
                .collect();
            seen.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.as_str().cmp(b.1.as_str())));
            seen
        };
        assert_eq!(reasons(&first), reasons(&permuted));
        assert_eq!(first.unbucketed.len(), 2);
        assert_eq!(
            permuted.unbucketed.iter().map(|r| r.row_index).collect::<Vec<_>>(),
            vec![1, 2]
        );
    }

    #[test]
    fn test_dropped_months() {
        let historical = dataset(
            DatasetRole::Historical,
            &[("A", "2024-01-05"), ("B", "2024-02-05")],
        );
        let current = dataset(DatasetRole::Current, &[("B", "2024-02-05")]);

        let result = compare_months(&historical, &current, &ComparatorConfig::default()).unwrap();

        assert_eq!(result.dropped_month_labels(), set(&["2024-01"]));
        assert_eq!(result.dropped_months[0].requests, set(&["a"]));
        assert_eq!(result.missing("2024-02"), Some(&BTreeSet::new()));
    }

    #[test]
    fn test_malformed_date_is_unbucketed() {
        let historical = dataset(DatasetRole::Historical, &[("A", "2024-03-01")]);
        let current = dataset(
            DatasetRole::Current,
            &[("A", "2024-03-01"), ("X", "2024-13-40"), ("", "2024-03-02")],
        );

        let result = compare_months(&historical, &current, &ComparatorConfig::default()).unwrap();

        assert_eq!(result.added("2024-03"), Some(&BTreeSet::new()));
        assert_eq!(
            result.unbucketed,
            vec![
                UnbucketedRow {
                    role: DatasetRole::Current,
                    row_index: 1,
                    value: Some("2024-13-40".to_string()),
                    reason: UnbucketedReason::MalformedDate,
                },
                UnbucketedRow {
                    role: DatasetRole::Current,
                    row_index: 2,
                    value: Some(String::new()),
                    reason: UnbucketedReason::MissingRequestNumber,
                },
            ]
        );
    }

    #[test]
    fn test_month_column_overrides_date() {
        let df_h = df![
            "numero_da_solicitacao" => ["1", "2"],
            "mes" => ["Março", "Abril"],
        ]
        .unwrap();
        let df_c = df![
            "numero_da_solicitacao" => ["1"],
            "mes" => [" março "],
        ]
        .unwrap();
        let historical = Dataset::new("h", DatasetRole::Historical, df_h).unwrap();
        let current = Dataset::new("c", DatasetRole::Current, df_c).unwrap();

        let config = ComparatorConfig::builder()
            .without_date_column()
            .month_column("mes")
            .build()
            .unwrap();
        let result = compare_months(&historical, &current, &config).unwrap();

        assert_eq!(result.missing("marco"), Some(&BTreeSet::new()));
        assert_eq!(result.dropped_month_labels(), set(&["abril"]));
    }

    #[test]
    fn test_missing_request_column_fails() {
        let historical = dataset(DatasetRole::Historical, &[("A", "2024-03-01")]);
        let df = df!["data" => ["2024-03-01"]].unwrap();
        let current = Dataset::new("c", DatasetRole::Current, df).unwrap();

        let err = compare_months(&historical, &current, &ComparatorConfig::default()).unwrap_err();
        assert!(err.is_missing_column());
    }

    #[test]
    fn test_comparison_is_idempotent_and_order_independent() {
        let (historical, current) = march_april();
        let config = ComparatorConfig::default();

        let first = compare_months(&historical, &current, &config).unwrap();
        let second = compare_months(&historical, &current, &config).unwrap();
        assert_eq!(first, second);

        let reversed = dataset(
            DatasetRole::Current,
            &[
                ("E", "2024-04-02"),
                ("D", "2024-03-22"),
                ("B", "2024-03-10"),
                ("A", "2024-03-01"),
            ],
        );
        let permuted = compare_months(&historical, &reversed, &config).unwrap();
        assert_eq!(first, permuted);
    }
}
