//! Extraction of top holdings from fund archive documents.
//!
//! The archive endpoint answers with a small script whose `content` string
//! holds escaped HTML. That markup contains one `.box` section per disclosure
//! period, each with a date label and a holdings table. Two table layouts are
//! in circulation:
//!
//! | layout   | columns | code | name | weight |
//! |----------|---------|------|------|--------|
//! | extended | 9       | 1    | 2    | 6      |
//! | legacy   | 7       | 1    | 2    | 4      |
//!
//! Nothing in here fails: missing or malformed input yields an empty or
//! partial [`FundHoldings`].

use crate::core::fund::{Holding, MAX_HOLDINGS};
use crate::core::holdings::{FundHoldings, default_display_name};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

static PAYLOAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"content:"((?:[^"\\]|\\.)*)""#).expect("payload pattern is valid")
});

static TITLED: LazyLock<Selector> = LazyLock::new(|| selector("a[title]"));
static SECTION: LazyLock<Selector> = LazyLock::new(|| selector(".box"));
static DATE_LABEL: LazyLock<Selector> = LazyLock::new(|| selector(".right.lab2 font, .right font"));
static ROW: LazyLock<Selector> = LazyLock::new(|| selector("table tbody tr"));
static CELL: LazyLock<Selector> = LazyLock::new(|| selector("td"));

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

const CODE_COLUMN: usize = 1;
const NAME_COLUMN: usize = 2;

/// Column layout of a holdings table, resolved once per table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TableLayout {
    /// Adds latest price and daily change columns before the weight.
    Extended,
    Legacy,
}

impl TableLayout {
    fn from_column_count(columns: usize) -> Option<Self> {
        match columns {
            9 => Some(TableLayout::Extended),
            7 => Some(TableLayout::Legacy),
            _ => None,
        }
    }

    fn column_count(&self) -> usize {
        match self {
            TableLayout::Extended => 9,
            TableLayout::Legacy => 7,
        }
    }

    fn weight_column(&self) -> usize {
        match self {
            TableLayout::Extended => 6,
            TableLayout::Legacy => 4,
        }
    }

    fn parse_row(&self, cells: &[String]) -> Option<Holding> {
        if cells.len() != self.column_count() {
            return None;
        }
        let code = &cells[CODE_COLUMN];
        let name = &cells[NAME_COLUMN];
        if code.is_empty() || name.is_empty() {
            return None;
        }
        let weight = parse_weight(&cells[self.weight_column()])?;
        Some(Holding::new(code, name, weight))
    }
}

/// Parses a cell such as `"6.50%"`; placeholders like `"—"` yield `None`.
fn parse_weight(cell: &str) -> Option<f64> {
    cell.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|weight| weight.is_finite())
}

/// Turns the script-escaped payload back into markup.
fn unescape_payload(raw: &str) -> String {
    raw.replace(r#"\""#, "\"")
        .replace(r"\/", "/")
        .replace(r"\r\n", "")
        .replace(r"\n", "")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn extract_section_holdings(section: ElementRef<'_>) -> Vec<Holding> {
    let rows: Vec<Vec<String>> = section
        .select(&ROW)
        .map(|row| row.select(&CELL).map(element_text).collect())
        .collect();

    let Some(layout) = rows
        .iter()
        .find_map(|cells| TableLayout::from_column_count(cells.len()))
    else {
        return Vec::new();
    };

    rows.iter()
        .filter_map(|cells| layout.parse_row(cells))
        .take(MAX_HOLDINGS)
        .collect()
}

/// Extracts the fund name, disclosure date and up to ten holdings from `document`.
///
/// Sections are visited in document order and the first one with at least one
/// valid row wins; holdings are never merged across sections.
pub fn extract_holdings(document: &str, code: &str) -> FundHoldings {
    let Some(payload) = PAYLOAD.captures(document).and_then(|c| c.get(1)) else {
        debug!(code, "No holdings payload found in archive document");
        return FundHoldings::empty(code, "holdings payload not found");
    };

    let fragment = Html::parse_fragment(&unescape_payload(payload.as_str()));

    let display_name = fragment
        .select(&TITLED)
        .next()
        .and_then(|link| link.value().attr("title"))
        .map(str::trim)
        .filter(|title| !title.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| default_display_name(code));

    for (index, section) in fragment.select(&SECTION).enumerate() {
        let disclosure_date_label = section
            .select(&DATE_LABEL)
            .next()
            .map(element_text)
            .unwrap_or_default();
        let holdings = extract_section_holdings(section);

        debug!(
            code,
            section = index + 1,
            date = %disclosure_date_label,
            holdings = holdings.len(),
            "Parsed disclosure section"
        );

        if !holdings.is_empty() {
            return FundHoldings {
                display_name,
                disclosure_date_label,
                holdings,
                error: None,
            };
        }
    }

    FundHoldings {
        display_name,
        disclosure_date_label: String::new(),
        holdings: Vec::new(),
        error: Some("no holdings rows parsed".to_string()),
    }
}
