use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{BarChart, Block, Borders, Cell, Paragraph, Row, Table, Tabs, Wrap},
    Frame,
};
use rust_decimal::prelude::ToPrimitive;

use crate::analytics::{budget_health, BudgetHealth};
use crate::cli::state::{App, Tab};
use crate::cli::util::{ellipsize, fmt_money, fmt_pct, iso};
use crate::currency::{format_money, Currency};
use crate::filter::category_label;

pub fn draw(f: &mut Frame, app: &mut App) {
    let size = f.size();

    // tabs | content | status line
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(10), Constraint::Length(1)])
        .split(size);

    let titles = Tab::ALL
        .iter()
        .map(|t| Line::from(Span::raw(t.title())))
        .collect::<Vec<_>>();
    let title = format!(
        "ACEAR Financial Transparency  FY {}  [{}]",
        app.api.fiscal_year(),
        app.currency.code()
    );
    let tabs = Tabs::new(titles)
        .select(app.tab.index())
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));
    f.render_widget(tabs, root[0]);

    match app.tab {
        Tab::Overview => draw_overview(f, root[1], app),
        Tab::Departments => draw_departments(f, root[1], app),
        Tab::Funds => draw_funds(f, root[1], app),
        Tab::Transactions => draw_txns(f, root[1], app),
        Tab::Help => draw_help(f, root[1]),
    }

    f.render_widget(Paragraph::new(app.status.as_str()), root[2]);
}

fn health_style(h: BudgetHealth) -> Style {
    match h {
        BudgetHealth::Overspent => Style::default().fg(Color::Red),
        BudgetHealth::Moderate => Style::default().fg(Color::Yellow),
        BudgetHealth::Healthy => Style::default().fg(Color::Green),
    }
}

fn draw_overview(f: &mut Frame, area: Rect, app: &App) {
    let Some(o) = &app.overview else {
        f.render_widget(
            Paragraph::new("No data loaded. Press r to refresh.")
                .block(Block::default().borders(Borders::ALL).title("Overview")),
            area,
        );
        return;
    };

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let cur = o.currency;
    let lines = vec![
        format!("Total allocated : {}", format_money(o.stats.total_allocated, cur)),
        format!("Total spent     : {}", format_money(o.stats.total_spent, cur)),
        format!("Utilization     : {}", fmt_pct(o.stats.utilization)),
        format!("Departments     : {}", o.stats.departments_count),
        format!("Fund sources    : {}", o.stats.fund_sources_count),
        format!("Total funding   : {}", format_money(o.fund_sources.total_funding, cur)),
        String::new(),
        format!(
            "Academic : {} ({}, {} depts)",
            format_money(o.breakdown.academic_total, cur),
            fmt_pct(o.breakdown.academic_percent),
            o.breakdown.academic_count
        ),
        format!(
            "Support  : {} ({}, {} depts)",
            format_money(o.breakdown.support_total, cur),
            fmt_pct(o.breakdown.support_percent),
            o.breakdown.support_count
        ),
    ]
    .join("\n");
    f.render_widget(
        Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Summary")),
        cols[0],
    );

    // bars are in thousands so they fit a u64 scale comfortably
    let bars: Vec<(String, u64)> = o
        .spending_trends
        .iter()
        .map(|p| {
            let label = p.month.split_whitespace().next().unwrap_or("").to_string();
            let value = (p.amount / rust_decimal::Decimal::from(1000)).to_u64().unwrap_or(0);
            (label, value)
        })
        .collect();
    let data: Vec<(&str, u64)> = bars.iter().map(|(l, v)| (l.as_str(), *v)).collect();
    let unit = match cur {
        Currency::Inr => "₹ thousands",
        Currency::Usd => "$ thousands",
    };
    let chart = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Completed spending per month ({unit})")),
        )
        .data(data.as_slice())
        .bar_width(5)
        .bar_gap(1)
        .bar_style(Style::default().fg(Color::Cyan));
    f.render_widget(chart, cols[1]);
}

fn draw_departments(f: &mut Frame, area: Rect, app: &mut App) {
    let cur = app.currency;
    let header = Row::new(vec!["Code", "Department", "Type", "Allocated", "Spent", "Used", "Health"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let body: Vec<Row> = app
        .departments()
        .iter()
        .map(|d| {
            let health = budget_health(d.allocated, d.spent);
            Row::new(vec![
                Cell::from(d.code.clone()),
                Cell::from(d.name.clone()),
                Cell::from(d.dept_type.as_str()),
                Cell::from(format_money(d.allocated, cur)),
                Cell::from(format_money(d.spent, cur)),
                Cell::from(fmt_pct(d.utilization)),
                Cell::from(health.label()).style(health_style(health)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(6),
        Constraint::Min(20),
        Constraint::Length(9),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(10),
    ];

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(6), Constraint::Length(5)])
        .split(area);

    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Departments (↑/↓)"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, chunks[0], &mut app.dsel);

    let detail = app
        .dsel
        .selected()
        .and_then(|i| app.departments().get(i))
        .map(|d| {
            let vendors = if d.vendors.is_empty() { "none".to_string() } else { d.vendors.join(", ") };
            format!("{}\nVendors: {}", d.description, vendors)
        })
        .unwrap_or_default();
    f.render_widget(
        Paragraph::new(detail)
            .wrap(Wrap { trim: true })
            .block(Block::default().borders(Borders::ALL).title("Details")),
        chunks[1],
    );
}

fn draw_funds(f: &mut Frame, area: Rect, app: &mut App) {
    let cur = app.currency;
    let header = Row::new(vec!["Fund source", "Type", "Total", "Available", "Used", "Grant period"])
        .style(Style::default().add_modifier(Modifier::BOLD));

    let body: Vec<Row> = app
        .funds()
        .iter()
        .map(|fund| {
            let period = match (fund.grant_period_start, fund.grant_period_end) {
                (Some(s), Some(e)) => format!("{} → {}", iso(&s), iso(&e)),
                (Some(s), None) => format!("from {}", iso(&s)),
                _ => "-".to_string(),
            };
            Row::new(vec![
                Cell::from(ellipsize(&fund.name, 28)),
                Cell::from(category_label(Some(fund.fund_type.as_str()))),
                Cell::from(format_money(fund.total, cur)),
                Cell::from(format_money(fund.available, cur)),
                Cell::from(fmt_pct(fund.utilization)),
                Cell::from(period),
            ])
        })
        .collect();

    let widths = [
        Constraint::Min(20),
        Constraint::Length(18),
        Constraint::Length(16),
        Constraint::Length(16),
        Constraint::Length(8),
        Constraint::Length(25),
    ];

    let table = Table::new(body, widths)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Fund sources (largest first)"))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, area, &mut app.fsel);
}

fn draw_txns(f: &mut Frame, area: Rect, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)])
        .split(area);

    let cursor = if app.txn.editing_search { "▏" } else { "" };
    let filters = app.txn.filter.active_filters().join(", ");
    let bar = format!(
        "Search: {}{}   Status: {}   Active: {}",
        app.txn.search.value,
        cursor,
        app.txn.filter.status.as_deref().unwrap_or("all"),
        if filters.is_empty() { "none" } else { filters.as_str() }
    );
    let search_style = if app.txn.editing_search {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    f.render_widget(
        Paragraph::new(bar)
            .style(search_style)
            .block(Block::default().borders(Borders::ALL).title("Filter (/ search, s status, x clear, e export)")),
        chunks[0],
    );

    let rate = app.api.usd_rate();
    let cur = app.currency;
    let rows = app.txn.visible();
    let header = Row::new(vec!["Date", "Description", "Dept", "Category", "Vendor", "Amount", "Status"])
        .style(Style::default().add_modifier(Modifier::BOLD));
    let body: Vec<Row> = rows
        .iter()
        .map(|t| {
            Row::new(vec![
                Cell::from(iso(&t.transaction_date)),
                Cell::from(ellipsize(&t.description, 34)),
                Cell::from(t.department_code.clone().unwrap_or_else(|| "-".into())),
                Cell::from(category_label(t.category.as_deref())),
                Cell::from(t.vendor_name.clone().unwrap_or_else(|| "-".into())),
                Cell::from(fmt_money(t.amount, cur, rate)),
                Cell::from(t.status.as_str()),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(11),
        Constraint::Min(20),
        Constraint::Length(5),
        Constraint::Length(18),
        Constraint::Length(18),
        Constraint::Length(14),
        Constraint::Length(10),
    ];

    let table = Table::new(body, widths)
        .header(header)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Transactions ({} of {})", rows.len(), app.txn.rows.len())),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    f.render_stateful_widget(table, chunks[1], &mut app.txn.tsel);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help_text = [
        "Global keys:",
        "  ←/→, Tab : Switch tabs",
        "  ↑/↓      : Move selection",
        "  c        : Toggle INR / USD",
        "  r        : Refresh from the store",
        "  ?        : This help",
        "  q        : Quit",
        "",
        "Transactions tab:",
        "  /        : Edit search (Enter or Esc to finish)",
        "  s        : Cycle status filter (all → pending → … → flagged)",
        "  x        : Clear all filters",
        "  e        : Export the filtered rows to CSV in the working directory",
    ]
    .join("\n");

    let p = Paragraph::new(help_text).block(Block::default().borders(Borders::ALL).title("Help & Keybindings"));
    f.render_widget(p, area);
}
