//! Rendering of scenario results.
//!
//! Scenario functions return plain data. This module turns that data into
//! a [`Report`] (a title, a few key/value facts and some tables) and
//! renders it either as aligned text or as JSON.
//!
//! Text output rounds every float to a fixed number of decimal places
//! ([`DEFAULT_PRECISION`] unless configured, at most [`MAX_PRECISION`]).
//! JSON output is the unrounded result struct itself.

use std::fmt::Write as _;

use serde::Serialize;

use crate::scenarios::clt::{BookStackResult, SumDistribution};
use crate::scenarios::combinatorics::{
    EqualSplitResult, FourKindResult, LotteryResult, PartyResult,
};
use crate::scenarios::curves::{CurveTable, DiscreteUniformResult, GaussianResult};
use crate::scenarios::dice::{CoinResult, RollsResult, UnfairDieResult};
use crate::scenarios::intervals::{CoverageResult, SweepResult};

/// Decimal places used for floats in text output.
pub const DEFAULT_PRECISION: usize = 4;
pub const MAX_PRECISION: usize = 10;

/// Marker printed where a probability is undefined (no included trials).
pub const UNDEFINED: &str = "undefined";

// ============================================================================
// Report model
// ============================================================================

/// One table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Int(i128),
    Float(f64),
    /// Undefined value, e.g. a probability over zero trials.
    Missing,
}

impl Cell {
    pub fn render(&self, precision: usize) -> String {
        match self {
            Cell::Text(s) => s.clone(),
            Cell::Int(n) => n.to_string(),
            Cell::Float(x) => format!("{x:.precision$}"),
            Cell::Missing => UNDEFINED.to_string(),
        }
    }

    fn is_numeric(&self) -> bool {
        !matches!(self, Cell::Text(_))
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_string())
    }
}

impl From<String> for Cell {
    fn from(s: String) -> Self {
        Cell::Text(s)
    }
}

macro_rules! int_cell {
    ($($t:ty),*) => {
        $(impl From<$t> for Cell {
            fn from(n: $t) -> Self {
                Cell::Int(n as i128)
            }
        })*
    };
}

int_cell!(u32, u64, usize, i64);

impl From<f64> for Cell {
    fn from(x: f64) -> Self {
        Cell::Float(x)
    }
}

impl<T: Into<Cell>> From<Option<T>> for Cell {
    fn from(v: Option<T>) -> Self {
        v.map_or(Cell::Missing, Into::into)
    }
}

/// A titled table with a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    pub title: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Table {
    pub fn new<S: Into<String>>(title: S, headers: &[&str]) -> Self {
        Self {
            title: title.into(),
            headers: headers.iter().map(|h| h.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, row: Vec<Cell>) {
        self.rows.push(row);
    }

    /// Renders the table with columns padded to their widest cell.
    /// Numeric columns are right-aligned.
    pub fn render(&self, precision: usize) -> String {
        let rendered: Vec<Vec<String>> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|c| c.render(precision)).collect())
            .collect();
        let columns = self.headers.len();
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &rendered {
            for (i, cell) in row.iter().enumerate().take(columns) {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        if !self.title.is_empty() {
            let _ = writeln!(out, "{}", self.title);
        }
        let header: Vec<String> = self
            .headers
            .iter()
            .zip(&widths)
            .map(|(h, &w)| format!("{h:<w$}"))
            .collect();
        let _ = writeln!(out, "{}", header.join("  ").trim_end());
        let rule: Vec<String> = widths.iter().map(|&w| "-".repeat(w)).collect();
        let _ = writeln!(out, "{}", rule.join("  "));
        for (row, cells) in rendered.iter().zip(&self.rows) {
            let line: Vec<String> = row
                .iter()
                .zip(cells)
                .zip(&widths)
                .map(|((text, cell), &w)| {
                    if cell.is_numeric() {
                        format!("{text:>w$}")
                    } else {
                        format!("{text:<w$}")
                    }
                })
                .collect();
            let _ = writeln!(out, "{}", line.join("  ").trim_end());
        }
        out
    }
}

/// Everything shown for one scenario run.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub facts: Vec<(String, Cell)>,
    pub tables: Vec<Table>,
}

impl Report {
    pub fn new<S: Into<String>>(title: S) -> Self {
        Self {
            title: title.into(),
            facts: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn fact<V: Into<Cell>>(mut self, key: &str, value: V) -> Self {
        self.facts.push((key.to_string(), value.into()));
        self
    }

    pub fn table(mut self, table: Table) -> Self {
        self.tables.push(table);
        self
    }
}

/// Conversion of a scenario result into a [`Report`].
pub trait ToReport {
    fn to_report(&self) -> Report;
}

/// Renders a report as plain text.
///
/// `precision` is clamped to [`MAX_PRECISION`].
///
/// # Examples
/// ```
/// use probsim::report::{render_text, Report};
/// let text = render_text(&Report::new("Demo").fact("p", 0.123456), 3);
/// assert!(text.contains("p: 0.123"));
/// ```
pub fn render_text(report: &Report, precision: usize) -> String {
    let precision = precision.min(MAX_PRECISION);
    let mut out = String::new();
    let _ = writeln!(out, "{}", report.title);
    let _ = writeln!(out, "{}", "=".repeat(report.title.chars().count()));
    let key_width = report
        .facts
        .iter()
        .map(|(k, _)| k.chars().count() + 1)
        .max()
        .unwrap_or(0);
    for (key, value) in &report.facts {
        let label = format!("{key}:");
        let _ = writeln!(out, "{label:<key_width$} {}", value.render(precision));
    }
    for table in &report.tables {
        out.push('\n');
        out.push_str(&table.render(precision));
    }
    out
}

/// Pretty-printed JSON of any result.
pub fn render_json<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Rounds `x` to `digits` decimal places.
///
/// # Examples
/// ```
/// use probsim::report::round_to;
/// assert_eq!(round_to(0.062124, 4), 0.0621);
/// ```
pub fn round_to(x: f64, digits: usize) -> f64 {
    let factor = 10f64.powi(digits.min(MAX_PRECISION) as i32);
    (x * factor).round() / factor
}

// ============================================================================
// Scenario reports
// ============================================================================

impl ToReport for PartyResult {
    fn to_report(&self) -> Report {
        let mut table = Table::new(
            "Unanimous groups",
            &["party", "supporters", "count", "estimated", "exact"],
        );
        for row in &self.rows {
            table.push(vec![
                row.party.as_str().into(),
                row.supporters.into(),
                row.count.into(),
                row.estimated.into(),
                row.exact.into(),
            ]);
        }
        Report::new("Party support")
            .fact("population", self.population)
            .fact("group size", self.group)
            .fact("trials", self.trials)
            .table(table)
    }
}

impl ToReport for EqualSplitResult {
    fn to_report(&self) -> Report {
        Report::new("Equal split")
            .fact("group size", self.group)
            .fact("trials", self.trials)
            .fact("equal splits", self.count)
            .fact("estimated", self.estimated)
            .fact("exact", self.exact)
    }
}

impl ToReport for LotteryResult {
    fn to_report(&self) -> Report {
        let ticket: Vec<String> = self.ticket.iter().map(u32::to_string).collect();
        Report::new("Lottery")
            .fact("pool", self.pool)
            .fact("draw", self.draw)
            .fact("ticket", ticket.join(" "))
            .fact("trials", self.trials)
            .fact("wins", self.wins)
            .fact("estimated", self.estimated)
            .fact("exact", self.exact)
            .fact("standard error", self.standard_error)
    }
}

impl ToReport for FourKindResult {
    fn to_report(&self) -> Report {
        Report::new("Four of a kind")
            .fact("hand size", self.hand)
            .fact("four-of-a-kind hands", self.favourable_hands as u64)
            .fact("total hands", self.total_hands as u64)
            .fact("exact", self.exact)
            .fact("trials", self.trials)
            .fact("hits", self.count)
            .fact("estimated", self.estimated)
    }
}

impl ToReport for CoinResult {
    fn to_report(&self) -> Report {
        let mut table = Table::new("Heads distribution", &["heads", "count", "estimated", "exact"]);
        for row in &self.distribution {
            table.push(vec![
                row.heads.into(),
                row.count.into(),
                row.estimated.into(),
                row.exact.into(),
            ]);
        }
        Report::new("Coin tosses")
            .fact("flips per trial", self.flips)
            .fact("trials", self.trials)
            .fact("target heads", self.target)
            .fact("trials on target", self.target_count)
            .fact("estimated", self.target_estimated)
            .fact("exact", self.target_exact)
            .fact("average heads", self.average_heads)
            .fact("expected heads", self.expected_heads)
            .table(table)
    }
}

impl ToReport for UnfairDieResult {
    fn to_report(&self) -> Report {
        let mut table = Table::new("Faces", &["face", "weight", "count", "estimated", "exact"]);
        for face in &self.faces {
            table.push(vec![
                face.face.into(),
                face.weight.into(),
                face.count.into(),
                face.estimated.into(),
                face.exact.into(),
            ]);
        }
        Report::new("Unfair die")
            .fact("rolls", self.trials)
            .table(table)
    }
}

impl ToReport for RollsResult {
    fn to_report(&self) -> Report {
        let mut table = Table::new("Rolls needed", &["rolls", "count", "estimated"]);
        for row in &self.distribution {
            table.push(vec![row.rolls.into(), row.count.into(), row.estimated.into()]);
        }
        Report::new("Rolls to target")
            .fact("target sum", self.target)
            .fact("dice", self.dice)
            .fact("attempt cap", self.max_attempts)
            .fact("included trials", self.included)
            .fact("discarded trials", self.discarded)
            .fact("expected discard fraction", self.expected_discard_fraction)
            .fact("average rolls", self.average_rolls)
            .fact("expected rolls", self.expected_rolls)
            .fact("minimum rolls", self.min_rolls)
            .fact("maximum rolls", self.max_rolls)
            .table(table)
    }
}

impl ToReport for DiscreteUniformResult {
    fn to_report(&self) -> Report {
        let mut table = Table::new(
            "Empirical PMF and CDF",
            &["x", "count", "f(x)", "F(x)", "exact f(x)", "exact F(x)"],
        );
        for row in &self.rows {
            table.push(vec![
                row.value.into(),
                row.count.into(),
                row.pmf.into(),
                row.cdf.into(),
                row.exact_pmf.into(),
                row.exact_cdf.into(),
            ]);
        }
        Report::new(format!("Discrete uniform on [{}, {}]", self.low, self.high))
            .fact("values drawn", self.trials)
            .table(table)
    }
}

fn curve_table(curve: &CurveTable) -> Table {
    let mut table = Table::new(curve.label.clone(), &["x", "f(x)", "F(x)"]);
    for p in &curve.points {
        table.push(vec![p.x.into(), p.pdf.into(), p.cdf.into()]);
    }
    table
}

impl ToReport for CurveTable {
    fn to_report(&self) -> Report {
        Report::new(format!("Uniform distribution {}", self.label)).table(curve_table(self))
    }
}

impl ToReport for GaussianResult {
    fn to_report(&self) -> Report {
        let v = &self.verification;
        let mut report = Report::new("Gaussian distributions")
            .fact("x", v.x)
            .fact("pdf", v.pdf)
            .fact("pdf reference", v.pdf_reference)
            .fact("cdf", v.cdf)
            .fact("cdf via erf", v.cdf_erf)
            .fact("cdf reference", v.cdf_reference);
        for curve in &self.curves {
            report = report.table(curve_table(curve));
        }
        report
    }
}

fn sum_table(title: String, dist: &SumDistribution) -> Table {
    let mut table = Table::new(
        title,
        &["lower", "upper", "count", "density", "normal pdf", "F(x)"],
    );
    for b in &dist.bins {
        table.push(vec![
            b.lower.into(),
            b.upper.into(),
            b.count.into(),
            b.density.into(),
            b.normal_pdf.into(),
            b.cdf.into(),
        ]);
    }
    table
}

fn sum_facts(report: Report, dist: &SumDistribution) -> Report {
    report
        .fact("samples", dist.summary.count)
        .fact("theoretical mean", dist.theoretical_mean)
        .fact("sample mean", dist.summary.mean)
        .fact("theoretical std dev", dist.theoretical_std_dev)
        .fact("sample std dev", dist.summary.std_dev)
        .fact("sample skewness", dist.summary.skewness)
        .fact("sample excess kurtosis", dist.summary.kurtosis)
}

impl ToReport for BookStackResult {
    fn to_report(&self) -> Report {
        let mut stacks = Table::new(
            "Stacks",
            &["books", "mean", "sample mean", "std dev", "sample std dev"],
        );
        for s in &self.stacks {
            stacks.push(vec![
                s.n.into(),
                s.theoretical_mean.into(),
                s.summary.mean.into(),
                s.theoretical_std_dev.into(),
                s.summary.std_dev.into(),
            ]);
        }
        let mut report = Report::new(format!("Book stack, thickness U({}, {})", self.a, self.b))
            .fact("single book mean", self.book_mean)
            .fact("single book std dev", self.book_std_dev)
            .table(stacks);
        for s in &self.stacks {
            report = report.table(sum_table(format!("Stack of {} books", s.n), s));
        }
        report
    }
}

impl ToReport for SumDistribution {
    fn to_report(&self) -> Report {
        let report = Report::new(format!("Battery carton of {}", self.n));
        sum_facts(report, self).table(sum_table("Carton lifetime".to_string(), self))
    }
}

impl ToReport for SweepResult {
    fn to_report(&self) -> Report {
        let mut headers = vec!["n".to_string(), "sample mean".to_string()];
        for level in &self.levels {
            headers.push(format!("lower {level}"));
            headers.push(format!("upper {level}"));
        }
        let header_refs: Vec<&str> = headers.iter().map(String::as_str).collect();
        let mut table = Table::new("Sample means", &header_refs);
        for p in &self.points {
            let mut row: Vec<Cell> = vec![p.n.into(), p.sample_mean.into()];
            for li in &p.intervals {
                row.push(li.interval.lower.into());
                row.push(li.interval.upper.into());
            }
            table.push(row);
        }
        let mut report = Report::new("Sample size and confidence")
            .fact("mu", self.mu)
            .fact("sigma", self.sigma);
        for (level, frac) in self.levels.iter().zip(&self.inside_fraction) {
            report = report.fact(&format!("inside {level} band"), *frac);
        }
        report.table(table)
    }
}

impl ToReport for CoverageResult {
    fn to_report(&self) -> Report {
        Report::new("Confidence interval coverage")
            .fact("method", self.method.to_string())
            .fact("level", self.level)
            .fact("sample size", self.n)
            .fact("critical value", self.critical_value)
            .fact("trials", self.trials)
            .fact("covered", self.covered)
            .fact("missed", self.missed)
            .fact("coverage", self.coverage)
    }
}
