use std::fmt::Write as _;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use csv::{QuoteStyle, WriterBuilder};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::{Pool, Sqlite};
use tracing::info;

use crate::analytics::{budget_health, fund_utilization, utilization_rate};
use crate::auth::{BudgetReach, CurrentUser, Role};
use crate::database::db::queries::{self, FundOrder, TxnScope};
use crate::database::models::{AllocationDetail, NewAuditLog, Report, TransactionStatus};
use crate::error::{AppError, AppResult};
use crate::filter::{blank_as_none, category_label};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    BudgetSummary,
    SpendingAnalysis,
    DepartmentPerformance,
    FundUtilization,
    ComplianceAudit,
    VarianceAnalysis,
}

impl ReportType {
    pub const ALL: [ReportType; 6] = [
        ReportType::BudgetSummary,
        ReportType::SpendingAnalysis,
        ReportType::DepartmentPerformance,
        ReportType::FundUtilization,
        ReportType::ComplianceAudit,
        ReportType::VarianceAnalysis,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportType::BudgetSummary => "budget_summary",
            ReportType::SpendingAnalysis => "spending_analysis",
            ReportType::DepartmentPerformance => "department_performance",
            ReportType::FundUtilization => "fund_utilization",
            ReportType::ComplianceAudit => "compliance_audit",
            ReportType::VarianceAnalysis => "variance_analysis",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ReportType::BudgetSummary => "Budget Summary",
            ReportType::SpendingAnalysis => "Spending Analysis",
            ReportType::DepartmentPerformance => "Department Performance",
            ReportType::FundUtilization => "Fund Utilization",
            ReportType::ComplianceAudit => "Compliance Audit",
            ReportType::VarianceAnalysis => "Variance Analysis",
        }
    }
}

impl FromStr for ReportType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ReportType::ALL
            .into_iter()
            .find(|t| t.as_str() == s.trim())
            .ok_or_else(|| format!("Unknown report type: {s}"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    Csv,
    Txt,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "csv",
            ReportFormat::Txt => "txt",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Csv => "text/csv; charset=utf-8",
            ReportFormat::Txt => "text/plain; charset=utf-8",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(ReportFormat::Csv),
            "" | "txt" | "text" => Ok(ReportFormat::Txt),
            other => Err(format!("Unsupported report format: {other} (supported: csv, txt)")),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DateRange {
    #[serde(deserialize_with = "blank_as_none")]
    pub from: Option<NaiveDate>,
    #[serde(deserialize_with = "blank_as_none")]
    pub to: Option<NaiveDate>,
}

impl DateRange {
    fn contains(&self, date: NaiveDate) -> bool {
        self.from.map_or(true, |f| date >= f) && self.to.map_or(true, |t| date <= t)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportRequest {
    pub report_type: String,
    #[serde(default)]
    pub date_range: DateRange,
    #[serde(default)]
    pub departments: Vec<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedReport {
    pub id: String,
    #[serde(rename = "type")]
    pub report_type: String,
    pub generated_by: String,
    pub generated_at: DateTime<Utc>,
    pub parameters: serde_json::Value,
    pub status: &'static str,
    pub download_url: String,
}

impl GeneratedReport {
    pub fn from_report(r: &Report) -> Self {
        Self {
            id: format!("report_{}", r.id),
            report_type: r.report_type.clone(),
            generated_by: r.generator.clone(),
            generated_at: r.created_at,
            parameters: r.parameters.clone(),
            status: "completed",
            download_url: format!("/api/reports/download/{}", r.id),
        }
    }
}

#[derive(Debug)]
pub struct ReportDownload {
    pub file_name: String,
    pub content_type: &'static str,
    pub content: String,
}

/// A rendered table: column names, rows, and trailing summary lines.
#[derive(Debug, Clone, Default)]
pub struct ReportTable {
    pub columns: Vec<&'static str>,
    pub rows: Vec<Vec<String>>,
    pub summary: Vec<(String, String)>,
}

struct Scope<'a> {
    range: &'a DateRange,
    departments: Vec<String>,
    categories: Vec<String>,
    transactions: TxnScope,
    reach: BudgetReach,
}

impl Scope<'_> {
    fn department_ok(&self, code: Option<&str>) -> bool {
        self.departments.is_empty()
            || code.map_or(false, |c| self.departments.iter().any(|d| d.eq_ignore_ascii_case(c)))
    }

    fn category_ok(&self, category: Option<&str>) -> bool {
        self.categories.is_empty() || category.map_or(false, |c| self.categories.iter().any(|x| x == c))
    }

    fn reachable(&self, department_id: i64) -> bool {
        match self.reach {
            BudgetReach::Institution => true,
            BudgetReach::Department(id) => id == department_id,
            BudgetReach::Nothing => false,
        }
    }

    fn allocation_ok(&self, a: &AllocationDetail) -> bool {
        self.reachable(a.department_id)
            && self.department_ok(Some(&a.department_code))
            && self.category_ok(Some(&a.category))
    }
}

fn money(d: Decimal) -> String {
    d.round_dp(2).to_string()
}

fn pct(d: Decimal) -> String {
    format!("{}%", d.round_dp(1))
}

fn budget_summary(allocations: &[AllocationDetail]) -> ReportTable {
    let mut t = ReportTable {
        columns: vec!["Department", "Code", "Category", "Fund Source", "Allocated", "Spent", "Remaining", "Utilization"],
        ..Default::default()
    };
    for a in allocations {
        t.rows.push(vec![
            a.department_name.clone(),
            a.department_code.clone(),
            category_label(Some(&a.category)),
            a.fund_name.clone(),
            money(a.allocated_amount),
            money(a.spent_amount),
            money(a.remaining()),
            pct(utilization_rate(a.allocated_amount, a.spent_amount)),
        ]);
    }
    let totals = crate::analytics::totals(allocations);
    t.summary = vec![
        ("Total allocated".into(), money(totals.allocated)),
        ("Total spent".into(), money(totals.spent)),
        ("Remaining".into(), money(totals.remaining)),
        ("Utilization".into(), pct(totals.utilization)),
    ];
    t
}

fn department_performance(allocations: &[AllocationDetail]) -> ReportTable {
    let mut t = ReportTable {
        columns: vec!["Department", "Code", "Type", "Allocated", "Spent", "Utilization", "Health"],
        ..Default::default()
    };
    let mut seen: Vec<(&str, &str, &str, Decimal, Decimal)> = Vec::new();
    for a in allocations {
        match seen.iter_mut().find(|row| row.1 == a.department_code) {
            Some(row) => {
                row.3 += a.allocated_amount;
                row.4 += a.spent_amount;
            }
            None => seen.push((
                &a.department_name,
                &a.department_code,
                a.department_type.as_str(),
                a.allocated_amount,
                a.spent_amount,
            )),
        }
    }
    seen.sort_by(|x, y| y.3.cmp(&x.3));
    for (name, code, kind, allocated, spent) in seen {
        t.rows.push(vec![
            name.to_string(),
            code.to_string(),
            kind.to_string(),
            money(allocated),
            money(spent),
            pct(utilization_rate(allocated, spent)),
            budget_health(allocated, spent).label().to_string(),
        ]);
    }
    t
}

fn variance_analysis(allocations: &[AllocationDetail]) -> ReportTable {
    let mut t = ReportTable {
        columns: vec!["Department", "Category", "Allocated", "Spent", "Variance", "Variance %", "Health"],
        ..Default::default()
    };
    let mut over = 0usize;
    for a in allocations {
        let variance = a.allocated_amount - a.spent_amount;
        let variance_pct = if a.allocated_amount > Decimal::ZERO {
            variance / a.allocated_amount * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        if variance < Decimal::ZERO {
            over += 1;
        }
        t.rows.push(vec![
            a.department_name.clone(),
            category_label(Some(&a.category)),
            money(a.allocated_amount),
            money(a.spent_amount),
            money(variance),
            pct(variance_pct),
            budget_health(a.allocated_amount, a.spent_amount).label().to_string(),
        ]);
    }
    t.summary = vec![("Overspent allocations".into(), over.to_string())];
    t
}

async fn spending_analysis(pool: &Pool<Sqlite>, scope: &Scope<'_>) -> AppResult<ReportTable> {
    let mut t = ReportTable {
        columns: vec!["Date", "Description", "Department", "Category", "Vendor", "Amount", "Status"],
        ..Default::default()
    };
    let rows = queries::list_transaction_details(pool, scope.transactions, None).await?;
    let mut completed = Decimal::ZERO;
    let mut counts = [0usize; 5];
    for tx in rows.iter().filter(|tx| {
        scope.range.contains(tx.transaction_date)
            && scope.department_ok(tx.department_code.as_deref())
            && scope.category_ok(tx.category.as_deref())
    }) {
        if tx.status == TransactionStatus::Completed {
            completed += tx.amount;
        }
        if let Some(i) = TransactionStatus::ALL.iter().position(|s| *s == tx.status) {
            counts[i] += 1;
        }
        t.rows.push(vec![
            tx.transaction_date.to_string(),
            tx.description.clone(),
            tx.department_name.clone().unwrap_or_else(|| "N/A".into()),
            category_label(tx.category.as_deref()),
            tx.vendor_name.clone().unwrap_or_else(|| "N/A".into()),
            money(tx.amount),
            tx.status.as_str().to_string(),
        ]);
    }
    t.summary.push(("Transactions".into(), t.rows.len().to_string()));
    t.summary.push(("Completed spend".into(), money(completed)));
    for (status, n) in TransactionStatus::ALL.iter().zip(counts) {
        t.summary.push((format!("Status {}", status.as_str()), n.to_string()));
    }
    Ok(t)
}

async fn fund_report(pool: &Pool<Sqlite>) -> AppResult<ReportTable> {
    let mut t = ReportTable {
        columns: vec!["Fund Source", "Type", "Total", "Available", "Utilized", "Utilization"],
        ..Default::default()
    };
    let funds = queries::list_fund_sources(pool, FundOrder::LargestTotal).await?;
    let mut total = Decimal::ZERO;
    let mut available = Decimal::ZERO;
    for f in &funds {
        total += f.total_amount;
        available += f.available_amount;
        t.rows.push(vec![
            f.name.clone(),
            f.fund_type.as_str().to_string(),
            money(f.total_amount),
            money(f.available_amount),
            money(f.total_amount - f.available_amount),
            pct(fund_utilization(f.total_amount, f.available_amount)),
        ]);
    }
    t.summary = vec![
        ("Total funding".into(), money(total)),
        ("Overall utilization".into(), pct(fund_utilization(total, available))),
    ];
    Ok(t)
}

async fn compliance_audit(pool: &Pool<Sqlite>, scope: &Scope<'_>) -> AppResult<ReportTable> {
    let mut t = ReportTable {
        columns: vec!["Kind", "Date", "Subject", "Detail", "Severity"],
        ..Default::default()
    };
    let alerts = queries::list_unresolved_alerts(pool, 500).await?;
    let logs = queries::list_audit_logs(pool, 500).await?;
    let flagged =
        queries::list_transaction_details(pool, TxnScope::Status(TransactionStatus::Flagged), None).await?;

    let mut alert_count = 0;
    for a in alerts.iter().filter(|a| scope.range.contains(a.created_at.date_naive())) {
        alert_count += 1;
        t.rows.push(vec![
            "alert".into(),
            a.created_at.date_naive().to_string(),
            a.title.clone(),
            a.description.clone(),
            a.severity.clone(),
        ]);
    }
    let mut flagged_count = 0;
    for tx in flagged.iter().filter(|tx| {
        scope.range.contains(tx.transaction_date) && scope.department_ok(tx.department_code.as_deref())
    }) {
        flagged_count += 1;
        t.rows.push(vec![
            "flagged_transaction".into(),
            tx.transaction_date.to_string(),
            tx.description.clone(),
            format!("{} {}", tx.invoice_number.as_deref().unwrap_or("N/A"), money(tx.amount)),
            "high".into(),
        ]);
    }
    for l in logs.iter().filter(|l| scope.range.contains(l.created_at.date_naive())) {
        t.rows.push(vec![
            "audit".into(),
            l.created_at.date_naive().to_string(),
            l.action.clone(),
            format!("{}: {}", l.entity, l.details),
            l.severity.clone(),
        ]);
    }
    t.summary = vec![
        ("Unresolved alerts".into(), alert_count.to_string()),
        ("Flagged transactions".into(), flagged_count.to_string()),
    ];
    Ok(t)
}

/// Header, data rows, then the summary as trailing two-field records.
pub fn render_csv(table: &ReportTable) -> AppResult<String> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Always)
        .flexible(true)
        .from_writer(Vec::new());
    let write = |e: csv::Error| AppError::Internal(format!("CSV error: {e}"));
    writer.write_record(&table.columns).map_err(write)?;
    for row in &table.rows {
        writer.write_record(row).map_err(write)?;
    }
    for (key, value) in &table.summary {
        writer.write_record([key, value]).map_err(write)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::Internal(format!("CSV error: {}", e.error())))?;
    String::from_utf8(bytes).map_err(|e| AppError::Internal(e.to_string()))
}

/// Fixed-width text rendering with a header block and a summary section.
pub fn render_text(table: &ReportTable, title: &str, generated_by: &str, at: DateTime<Utc>) -> String {
    let mut widths: Vec<usize> = table.columns.iter().map(|c| c.chars().count()).collect();
    for row in &table.rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "Financial Report: {title}");
    let _ = writeln!(out, "Generated: {}", at.to_rfc3339());
    let _ = writeln!(out, "Generated by: {generated_by}");
    out.push('\n');

    let line = |cells: Vec<&str>| -> String {
        cells
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<width$}", width = *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    out.push_str(&line(table.columns.clone()));
    out.push('\n');
    out.push_str(&"-".repeat(widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1)));
    out.push('\n');
    for row in &table.rows {
        out.push_str(&line(row.iter().map(String::as_str).collect()));
        out.push('\n');
    }
    if table.rows.is_empty() {
        out.push_str("(no matching records)\n");
    }
    if !table.summary.is_empty() {
        out.push('\n');
        for (k, v) in &table.summary {
            let _ = writeln!(out, "{k}: {v}");
        }
    }
    out
}

async fn scoped_allocations(
    pool: &Pool<Sqlite>,
    fiscal_year: i32,
    scope: &Scope<'_>,
) -> AppResult<Vec<AllocationDetail>> {
    let all = queries::list_allocation_details(pool, fiscal_year, None).await?;
    Ok(all.into_iter().filter(|a| scope.allocation_ok(a)).collect())
}

/// Report rows, held to what `user` may browse elsewhere in the service.
pub async fn build_table(
    pool: &Pool<Sqlite>,
    user: &CurrentUser,
    report_type: ReportType,
    fiscal_year: i32,
    req: &ReportRequest,
) -> AppResult<ReportTable> {
    let scope = Scope {
        range: &req.date_range,
        departments: req.departments.iter().map(|d| d.trim().to_string()).filter(|d| !d.is_empty()).collect(),
        categories: req.categories.iter().map(|c| c.trim().to_string()).filter(|c| !c.is_empty()).collect(),
        transactions: user.transaction_scope(),
        reach: user.budget_reach(),
    };

    let table = match report_type {
        ReportType::BudgetSummary => budget_summary(&scoped_allocations(pool, fiscal_year, &scope).await?),
        ReportType::DepartmentPerformance => {
            department_performance(&scoped_allocations(pool, fiscal_year, &scope).await?)
        }
        ReportType::VarianceAnalysis => {
            variance_analysis(&scoped_allocations(pool, fiscal_year, &scope).await?)
        }
        ReportType::SpendingAnalysis => spending_analysis(pool, &scope).await?,
        ReportType::FundUtilization => fund_report(pool).await?,
        ReportType::ComplianceAudit => compliance_audit(pool, &scope).await?,
    };
    Ok(table)
}

const AUDIT_ROLES: [Role; 3] = [Role::SuperAdmin, Role::FinancialAdmin, Role::Auditor];

pub async fn generate(
    pool: &Pool<Sqlite>,
    user: &CurrentUser,
    fiscal_year: i32,
    req: ReportRequest,
) -> AppResult<GeneratedReport> {
    let report_type: ReportType = req.report_type.parse().map_err(AppError::Validation)?;
    let format: ReportFormat = req.format.as_deref().unwrap_or("txt").parse().map_err(AppError::Validation)?;
    if report_type == ReportType::ComplianceAudit {
        user.require_any(&AUDIT_ROLES)?;
    }

    let table = build_table(pool, user, report_type, fiscal_year, &req).await?;
    let generator = user.profile.display_name().to_string();
    let now = Utc::now();
    let content = match format {
        ReportFormat::Csv => render_csv(&table)?,
        ReportFormat::Txt => render_text(&table, report_type.title(), &generator, now),
    };

    let parameters = json!({
        "dateRange": req.date_range,
        "departments": req.departments,
        "categories": req.categories,
        "format": format.as_str(),
    });
    let report = queries::insert_report(
        pool,
        report_type.as_str(),
        format.as_str(),
        user.user_id,
        &generator,
        &parameters,
        &content,
    )
    .await?;

    queries::append_audit(
        pool,
        &NewAuditLog::info(Some(&user.email), "Report Generated", "report", format!("report_{} {}", report.id, report_type.as_str())),
    )
    .await?;
    info!(report_id = report.id, report_type = report_type.as_str(), rows = table.rows.len(), "report generated");

    Ok(GeneratedReport::from_report(&report))
}

/// Accepts `7` or `report_7`.
pub fn parse_report_id(raw: &str) -> Option<i64> {
    raw.trim().trim_start_matches("report_").parse().ok()
}

pub async fn download(pool: &Pool<Sqlite>, user: &CurrentUser, raw_id: &str) -> AppResult<ReportDownload> {
    let id = parse_report_id(raw_id).ok_or_else(|| AppError::not_found("Report"))?;
    let report = queries::get_report(pool, id).await?.ok_or_else(|| AppError::not_found("Report"))?;

    if report.generated_by != user.user_id && !user.has_any(&AUDIT_ROLES) {
        return Err(AppError::Forbidden("You do not have access to this report".into()));
    }

    let format: ReportFormat = report.format.parse().unwrap_or(ReportFormat::Txt);
    Ok(ReportDownload {
        file_name: format!("report_{}.{}", report.id, format.as_str()),
        content_type: format.content_type(),
        content: report.content,
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct PrebuiltReport {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub frequency: &'static str,
    pub access: &'static [&'static str],
}

pub const PREBUILT: [PrebuiltReport; 6] = [
    PrebuiltReport {
        id: "monthly_summary",
        title: "Monthly Financial Summary",
        description: "Comprehensive overview of monthly spending, budget utilization, and key metrics",
        category: "Summary",
        frequency: "Monthly",
        access: &["super_admin", "financial_admin", "department_head"],
    },
    PrebuiltReport {
        id: "budget_variance",
        title: "Budget vs Actual Variance Report",
        description: "Detailed analysis of budget variances across all departments and categories",
        category: "Analysis",
        frequency: "Quarterly",
        access: &["super_admin", "financial_admin", "auditor"],
    },
    PrebuiltReport {
        id: "fund_utilization",
        title: "Fund Source Utilization",
        description: "Track utilization rates and remaining balances across all funding sources",
        category: "Funding",
        frequency: "Monthly",
        access: &["super_admin", "financial_admin"],
    },
    PrebuiltReport {
        id: "department_performance",
        title: "Department Performance Dashboard",
        description: "Individual department spending patterns, efficiency metrics, and comparisons",
        category: "Performance",
        frequency: "Monthly",
        access: &["super_admin", "financial_admin", "department_head"],
    },
    PrebuiltReport {
        id: "compliance_audit",
        title: "Financial Compliance Audit",
        description: "Comprehensive audit report covering compliance, anomalies, and recommendations",
        category: "Compliance",
        frequency: "Quarterly",
        access: &["super_admin", "financial_admin", "auditor"],
    },
    PrebuiltReport {
        id: "transparency_report",
        title: "Public Transparency Report",
        description: "Public-facing financial transparency report for stakeholders and community",
        category: "Public",
        frequency: "Quarterly",
        access: &["super_admin", "financial_admin", "public"],
    },
];

/// Prebuilt reports visible to a role: listed explicitly, or open to "public".
pub fn prebuilt_catalog(role: Option<&str>) -> Vec<PrebuiltReport> {
    PREBUILT
        .into_iter()
        .filter(|r| r.access.contains(&"public") || role.map_or(false, |role| r.access.contains(&role)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_other_than_csv_and_txt_are_rejected() {
        assert_eq!("CSV".parse::<ReportFormat>(), Ok(ReportFormat::Csv));
        assert_eq!("".parse::<ReportFormat>(), Ok(ReportFormat::Txt));
        assert!("pdf".parse::<ReportFormat>().is_err());
        assert!("excel".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn report_types_parse_from_snake_case() {
        for t in ReportType::ALL {
            assert_eq!(t.as_str().parse::<ReportType>().unwrap(), t);
        }
        assert!("budget".parse::<ReportType>().is_err());
    }

    #[test]
    fn catalog_filters_by_role_and_public_access() {
        let ids = |role| prebuilt_catalog(role).iter().map(|r| r.id).collect::<Vec<_>>();
        assert_eq!(ids(Some("student")), vec!["transparency_report"]);
        assert_eq!(
            ids(Some("auditor")),
            vec!["budget_variance", "compliance_audit", "transparency_report"]
        );
        assert_eq!(ids(Some("financial_admin")).len(), 6);
        assert_eq!(ids(None), vec!["transparency_report"]);
    }

    #[test]
    fn report_ids_accept_prefix() {
        assert_eq!(parse_report_id("report_12"), Some(12));
        assert_eq!(parse_report_id("12"), Some(12));
        assert_eq!(parse_report_id("abc"), None);
    }

    #[test]
    fn text_rendering_aligns_columns_and_lists_summary() {
        let table = ReportTable {
            columns: vec!["Name", "Amount"],
            rows: vec![vec!["Library".into(), "10".into()], vec!["CS".into(), "2000".into()]],
            summary: vec![("Total".into(), "2010".into())],
        };
        let at = DateTime::parse_from_rfc3339("2024-07-01T00:00:00Z").unwrap().with_timezone(&Utc);
        let text = render_text(&table, "Budget Summary", "Finance Office", at);
        assert!(text.starts_with("Financial Report: Budget Summary\n"));
        assert!(text.contains("Name     Amount\n"));
        assert!(text.contains("CS       2000\n"));
        assert!(text.contains("Total: 2010"));
    }

    #[test]
    fn csv_rendering_quotes_every_cell() {
        let table = ReportTable {
            columns: vec!["A", "B"],
            rows: vec![vec!["x".into(), "1,5".into()]],
            summary: vec![],
        };
        let out = render_csv(&table).unwrap();
        assert_eq!(out, "\"A\",\"B\"\n\"x\",\"1,5\"\n");
    }

    #[test]
    fn csv_keeps_the_summary_after_the_rows() {
        let table = ReportTable {
            columns: vec!["Department", "Allocated", "Spent"],
            rows: vec![vec!["CS".into(), "10".into(), "4".into()]],
            summary: vec![("Total allocated".into(), "10".into()), ("Total spent".into(), "4".into())],
        };
        let out = render_csv(&table).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2], "\"Total allocated\",\"10\"");
        assert_eq!(lines[3], "\"Total spent\",\"4\"");
    }
}
