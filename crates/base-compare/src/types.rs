use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::ComparatorConfig;

// ============================================================================
// Datasets
// ============================================================================

/// Which side of the comparison a dataset represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetRole {
    /// The prior snapshot.
    Historical,
    /// The latest snapshot.
    Current,
}

impl DatasetRole {
    /// Lowercase label used in logs and file names.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Historical => "historical",
            Self::Current => "current",
        }
    }

    /// Human-readable name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Historical => "Historical Base",
            Self::Current => "Current Base",
        }
    }
}

// ============================================================================
// Profiling and quality
// ============================================================================

/// Primitive type inferred from a column's values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InferredType {
    Date,
    Numeric,
    Text,
    /// No non-null values to infer from.
    Empty,
}

impl InferredType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Numeric => "numeric",
            Self::Text => "text",
            Self::Empty => "empty",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnProfile {
    pub name: String,
    /// Physical polars dtype, or "absent" for a designated column missing from the frame.
    pub dtype: String,
    /// Whether the column exists in the dataset.
    pub present: bool,
    pub null_count: usize,
    /// Share of missing values, 0.0 - 100.0.
    pub null_percentage: f64,
    pub unique_count: usize,
    pub inferred_type: InferredType,
    pub sample_values: Vec<String>,
}

/// Kind of row-level data problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// A date value that cannot be parsed into a calendar date.
    MalformedDate,
    /// A negative value in a magnitude-only numeric column.
    NegativeValue,
}

impl IssueKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MalformedDate => "Malformed Date",
            Self::NegativeValue => "Negative Value",
        }
    }
}

/// A single row flagged by the quality analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedRow {
    /// 0-based row index within the dataset.
    pub row_index: usize,
    pub column: String,
    /// The offending value as it appears in the data.
    pub value: String,
    pub kind: IssueKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

impl Severity {
    /// Severity of an issue affecting `percentage` % of the rows.
    pub fn from_percentage(percentage: f64) -> Self {
        if percentage > 10.0 {
            Severity::High
        } else if percentage > 1.0 {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Per-column summary of flagged rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataQualityIssue {
    pub kind: IssueKind,
    pub column: String,
    pub count: usize,
    pub percentage: f64,
    pub severity: Severity,
    pub description: String,
    /// Up to five offending values.
    pub examples: Vec<String>,
}

/// Profiler output for one dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub dataset: String,
    pub role: DatasetRole,
    pub row_count: usize,
    pub column_count: usize,
    pub columns: Vec<ColumnProfile>,
    pub flagged_rows: Vec<FlaggedRow>,
    pub issues: Vec<DataQualityIssue>,
}

impl QualityReport {
    /// Profile of a column by normalized name.
    pub fn column(&self, name: &str) -> Option<&ColumnProfile> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Null percentage of a column, if it was profiled.
    pub fn null_percentage(&self, name: &str) -> Option<f64> {
        self.column(name).map(|c| c.null_percentage)
    }

    /// Row indices flagged with `kind`, in dataset order.
    pub fn flagged_indices(&self, kind: IssueKind) -> Vec<usize> {
        self.flagged_rows
            .iter()
            .filter(|r| r.kind == kind)
            .map(|r| r.row_index)
            .collect()
    }

    /// Count of rows flagged with `kind`.
    pub fn flagged_count(&self, kind: IssueKind) -> usize {
        self.flagged_rows.iter().filter(|r| r.kind == kind).count()
    }
}

// ============================================================================
// Duplicates
// ============================================================================

/// Attribute(s) used to group records as duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyMode {
    /// Request number only.
    RequestNumber,
    /// Task identifier only.
    Task,
    /// Request number and task identifier together.
    Both,
}

impl KeyMode {
    pub const ALL: [KeyMode; 3] = [KeyMode::RequestNumber, KeyMode::Task, KeyMode::Both];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RequestNumber => "request_number",
            Self::Task => "task",
            Self::Both => "both",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::RequestNumber => "By Request Number",
            Self::Task => "By Task",
            Self::Both => "By Request Number + Task",
        }
    }

    /// Whether this mode needs the task column.
    pub fn uses_task(&self) -> bool {
        matches!(self, Self::Task | Self::Both)
    }
}

/// Records sharing the same normalized key. Always holds at least two rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    /// Normalized key parts, one per key column.
    pub key: Vec<String>,
    /// Row indices in dataset order.
    pub row_indices: Vec<usize>,
}

impl DuplicateGroup {
    /// Key rendered for display, parts joined by ` | `.
    pub fn display_key(&self) -> String {
        self.key.join(" | ")
    }

    pub fn len(&self) -> usize {
        self.row_indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.row_indices.is_empty()
    }
}

/// Duplicate groups of one dataset under every key mode.
///
/// Task-based modes are `None` when the dataset carries no task column.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DuplicateAnalysis {
    pub dataset: String,
    pub by_request_number: Vec<DuplicateGroup>,
    pub by_task: Option<Vec<DuplicateGroup>>,
    pub by_both: Option<Vec<DuplicateGroup>>,
}

impl DuplicateAnalysis {
    /// Groups for a key mode, if that mode was evaluated.
    pub fn groups(&self, mode: KeyMode) -> Option<&[DuplicateGroup]> {
        match mode {
            KeyMode::RequestNumber => Some(&self.by_request_number),
            KeyMode::Task => self.by_task.as_deref(),
            KeyMode::Both => self.by_both.as_deref(),
        }
    }

    /// Number of rows involved in a duplicate under `mode`.
    pub fn duplicated_row_count(&self, mode: KeyMode) -> usize {
        self.groups(mode)
            .map(|groups| groups.iter().map(DuplicateGroup::len).sum())
            .unwrap_or(0)
    }
}

// ============================================================================
// Monthly comparison
// ============================================================================

/// Why a record could not be placed in a month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnbucketedReason {
    MalformedDate,
    MissingDate,
    MissingRequestNumber,
}

impl UnbucketedReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedDate => "malformed_date",
            Self::MissingDate => "missing_date",
            Self::MissingRequestNumber => "missing_request_number",
        }
    }
}

/// A record excluded from month bucketing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnbucketedRow {
    pub role: DatasetRole,
    /// Position in the input frame; it follows the input row order.
    pub row_index: usize,
    pub value: Option<String>,
    pub reason: UnbucketedReason,
}

/// Set differences for a month present in both datasets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthComparison {
    pub month: String,
    /// Requests in the historical bucket but absent from the current one.
    pub missing_in_current: BTreeSet<String>,
    /// Requests in the current bucket but absent from the historical one.
    pub new_in_current: BTreeSet<String>,
    /// Rows in the historical bucket.
    pub historical_rows: usize,
    /// Rows in the current bucket.
    pub current_rows: usize,
}

/// A month present in only one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthOnly {
    pub month: String,
    pub requests: BTreeSet<String>,
    pub row_count: usize,
}

/// Outcome of the month-over-month comparison.
///
/// Every collection is sorted by month, and request sets are sorted by
/// identifier, so two runs over the same data serialize identically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComparisonResult {
    /// Months present in both datasets.
    pub months: Vec<MonthComparison>,
    /// Months present only in the current dataset.
    pub new_months: Vec<MonthOnly>,
    /// Months present only in the historical dataset.
    pub dropped_months: Vec<MonthOnly>,
    /// Records excluded from bucketing, historical first, each in input
    /// order. Reordering the input rows changes the indices and order here
    /// but not the multiset of (role, value, reason).
    pub unbucketed: Vec<UnbucketedRow>,
}

impl ComparisonResult {
    /// Requests of `month` that the current dataset lost.
    pub fn missing(&self, month: &str) -> Option<&BTreeSet<String>> {
        self.month(month).map(|m| &m.missing_in_current)
    }

    /// Requests of `month` that only the current dataset has.
    pub fn added(&self, month: &str) -> Option<&BTreeSet<String>> {
        self.month(month).map(|m| &m.new_in_current)
    }

    /// Comparison of a common month.
    pub fn month(&self, month: &str) -> Option<&MonthComparison> {
        self.months.iter().find(|m| m.month == month)
    }

    /// Labels of the months present only in the current dataset.
    pub fn new_month_labels(&self) -> BTreeSet<String> {
        self.new_months.iter().map(|m| m.month.clone()).collect()
    }

    /// Labels of the months present only in the historical dataset.
    pub fn dropped_month_labels(&self) -> BTreeSet<String> {
        self.dropped_months.iter().map(|m| m.month.clone()).collect()
    }

    /// Flatten into rows sorted by month, then request identifier.
    pub fn to_rows(&self) -> Vec<ComparisonRow> {
        let mut rows = Vec::new();

        for month in &self.months {
            rows.extend(month.missing_in_current.iter().map(|r| {
                ComparisonRow::new(&month.month, r, RequestStatus::MissingInCurrent)
            }));
            rows.extend(
                month
                    .new_in_current
                    .iter()
                    .map(|r| ComparisonRow::new(&month.month, r, RequestStatus::NewInCurrent)),
            );
        }
        for month in &self.new_months {
            rows.extend(
                month
                    .requests
                    .iter()
                    .map(|r| ComparisonRow::new(&month.month, r, RequestStatus::NewMonth)),
            );
        }
        for month in &self.dropped_months {
            rows.extend(
                month
                    .requests
                    .iter()
                    .map(|r| ComparisonRow::new(&month.month, r, RequestStatus::DroppedMonth)),
            );
        }

        rows.sort();
        rows
    }
}

/// Where a request stands in the monthly comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    MissingInCurrent,
    NewInCurrent,
    NewMonth,
    DroppedMonth,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingInCurrent => "missing_in_current",
            Self::NewInCurrent => "new_in_current",
            Self::NewMonth => "new_month",
            Self::DroppedMonth => "dropped_month",
        }
    }
}

/// One row of the flattened comparison table.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub month: String,
    pub request: String,
    pub status: RequestStatus,
}

impl ComparisonRow {
    fn new(month: &str, request: &str, status: RequestStatus) -> Self {
        Self {
            month: month.to_string(),
            request: request.to_string(),
            status,
        }
    }
}

// ============================================================================
// Full run
// ============================================================================

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// Local timestamp of the run, RFC 3339.
    pub generated_at: String,
    pub duration_ms: u64,
    pub config: ComparatorConfig,
    pub historical: QualityReport,
    pub current: QualityReport,
    pub historical_duplicates: DuplicateAnalysis,
    pub current_duplicates: DuplicateAnalysis,
    pub comparison: ComparisonResult,
}

impl AnalysisReport {
    /// Quality report of one side.
    pub fn quality(&self, role: DatasetRole) -> &QualityReport {
        match role {
            DatasetRole::Historical => &self.historical,
            DatasetRole::Current => &self.current,
        }
    }

    /// Duplicate analysis of one side.
    pub fn duplicates(&self, role: DatasetRole) -> &DuplicateAnalysis {
        match role {
            DatasetRole::Historical => &self.historical_duplicates,
            DatasetRole::Current => &self.current_duplicates,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
