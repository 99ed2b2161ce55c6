use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use csv::{QuoteStyle, WriterBuilder};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::database::models::TransactionDetail;

pub const CSV_HEADER: [&str; 9] = [
    "Date",
    "Description",
    "Department",
    "Department Code",
    "Category",
    "Vendor",
    "Amount",
    "Status",
    "Invoice Number",
];

const NOT_AVAILABLE: &str = "N/A";

// form fields arrive as "" when left blank
pub(crate) fn blank_as_none<'de, D, T>(de: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: Display,
{
    let raw: Option<String> = Option::deserialize(de)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some).map_err(de::Error::custom),
    }
}

/// Criteria for the transaction browser. Every set field must match.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TransactionFilter {
    pub search: Option<String>,
    pub status: Option<String>,
    #[serde(deserialize_with = "blank_as_none")]
    pub date_from: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_as_none")]
    pub date_to: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_as_none")]
    pub amount_min: Option<Decimal>,
    #[serde(deserialize_with = "blank_as_none")]
    pub amount_max: Option<Decimal>,
    pub department_code: Option<String>,
    pub category: Option<String>,
}

// "all" in a dropdown means the predicate is off
fn selected(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("all"))
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack
        .map(|h| h.to_lowercase().contains(needle))
        .unwrap_or(false)
}

impl TransactionFilter {
    pub fn search_term(&self) -> Option<String> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_lowercase)
    }

    pub fn matches(&self, t: &TransactionDetail) -> bool {
        if let Some(term) = self.search_term() {
            let hit = contains_ci(Some(&t.description), &term)
                || contains_ci(t.vendor_name.as_deref(), &term)
                || contains_ci(t.invoice_number.as_deref(), &term)
                || contains_ci(t.department_name.as_deref(), &term);
            if !hit {
                return false;
            }
        }
        if let Some(status) = selected(&self.status) {
            if !t.status.as_str().eq_ignore_ascii_case(status) {
                return false;
            }
        }
        if self.date_from.is_some_and(|from| t.transaction_date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| t.transaction_date > to) {
            return false;
        }
        if self.amount_min.is_some_and(|min| t.amount < min) {
            return false;
        }
        if self.amount_max.is_some_and(|max| t.amount > max) {
            return false;
        }
        if let Some(code) = selected(&self.department_code) {
            match t.department_code.as_deref() {
                Some(c) if c.eq_ignore_ascii_case(code) => {}
                _ => return false,
            }
        }
        if let Some(category) = selected(&self.category) {
            if t.category.as_deref() != Some(category) {
                return false;
            }
        }
        true
    }

    /// Matching rows, input order preserved.
    pub fn apply<'a, I>(&self, rows: I) -> Vec<TransactionDetail>
    where
        I: IntoIterator<Item = &'a TransactionDetail>,
    {
        rows.into_iter().filter(|t| self.matches(t)).cloned().collect()
    }

    pub fn active_filters(&self) -> Vec<&'static str> {
        let mut active = Vec::new();
        if self.search_term().is_some() {
            active.push("search");
        }
        if selected(&self.status).is_some() {
            active.push("status");
        }
        if self.date_from.is_some() || self.date_to.is_some() {
            active.push("date");
        }
        if self.amount_min.is_some() || self.amount_max.is_some() {
            active.push("amount");
        }
        if selected(&self.department_code).is_some() {
            active.push("department");
        }
        if selected(&self.category).is_some() {
            active.push("category");
        }
        active
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepartmentOption {
    pub code: String,
    pub name: String,
}

/// Distinct departments by code, in first-seen order.
pub fn unique_departments(rows: &[TransactionDetail]) -> Vec<DepartmentOption> {
    let mut out: Vec<DepartmentOption> = Vec::new();
    for t in rows {
        if let (Some(code), Some(name)) = (&t.department_code, &t.department_name) {
            if !out.iter().any(|d| &d.code == code) {
                out.push(DepartmentOption {
                    code: code.clone(),
                    name: name.clone(),
                });
            }
        }
    }
    out
}

pub fn unique_categories(rows: &[TransactionDetail]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for category in rows.iter().filter_map(|t| t.category.as_ref()) {
        if !out.contains(category) {
            out.push(category.clone());
        }
    }
    out
}

/// Display label for a category key; only the first underscore becomes a space.
pub fn category_label(category: Option<&str>) -> String {
    match category {
        Some(c) if !c.is_empty() => c.replacen('_', " ", 1).to_uppercase(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn or_na(value: Option<&str>) -> String {
    match value {
        Some(v) if !v.is_empty() => v.to_string(),
        _ => NOT_AVAILABLE.to_string(),
    }
}

fn csv_record(t: &TransactionDetail) -> [String; 9] {
    [
        t.transaction_date.format("%Y-%m-%d").to_string(),
        t.description.clone(),
        or_na(t.department_name.as_deref()),
        or_na(t.department_code.as_deref()),
        category_label(t.category.as_deref()),
        or_na(t.vendor_name.as_deref()),
        t.amount.to_string(),
        t.status.as_str().to_string(),
        or_na(t.invoice_number.as_deref()),
    ]
}

fn write_rows<W: std::io::Write>(out: W, rows: &[TransactionDetail]) -> anyhow::Result<W> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .from_writer(out);
    writer.write_record(CSV_HEADER)?;
    for t in rows {
        writer.write_record(csv_record(t))?;
    }
    writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("failed to flush CSV output: {}", e.error()))
}

/// Header plus one fully quoted record per row.
pub fn export_csv(rows: &[TransactionDetail]) -> anyhow::Result<String> {
    let bytes = write_rows(Vec::new(), rows)?;
    Ok(String::from_utf8(bytes)?)
}

pub fn export_csv_file(path: &Path, rows: &[TransactionDetail]) -> anyhow::Result<()> {
    let file = std::fs::File::create(path)?;
    write_rows(file, rows)?;
    Ok(())
}

pub fn export_file_name(date: NaiveDate) -> String {
    format!("transactions_{}.csv", date.format("%Y-%m-%d"))
}
