use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};
use ratatui::widgets::TableState;

use crate::cli::api::Client;
use crate::cli::input::LineEdit;
use crate::cli::util;
use crate::currency::Currency;
use crate::database::models::{TransactionDetail, TransactionStatus};
use crate::filter::{self, TransactionFilter};
use crate::transparency::{PortalOverview, PublicDepartment, PublicFund};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Overview,
    Departments,
    Funds,
    Transactions,
    Help,
}

impl Tab {
    pub const ALL: [Tab; 5] = [Tab::Overview, Tab::Departments, Tab::Funds, Tab::Transactions, Tab::Help];

    pub fn title(&self) -> &'static str {
        match self {
            Tab::Overview => "Overview",
            Tab::Departments => "Departments",
            Tab::Funds => "Funds",
            Tab::Transactions => "Transactions",
            Tab::Help => "Help",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|t| t == self).unwrap_or(0)
    }

    fn step(&self, delta: isize) -> Tab {
        let n = Self::ALL.len() as isize;
        Self::ALL[(self.index() as isize + delta).rem_euclid(n) as usize]
    }
}

/// Status filter cycle: all, then each status in order, then back to all.
pub fn next_status(current: Option<&str>) -> Option<String> {
    let statuses = TransactionStatus::ALL;
    match current.and_then(|c| statuses.iter().position(|s| s.as_str() == c)) {
        None => Some(statuses[0].as_str().to_string()),
        Some(i) if i + 1 < statuses.len() => Some(statuses[i + 1].as_str().to_string()),
        Some(_) => None,
    }
}

#[derive(Default)]
pub struct TxnPage {
    pub rows: Vec<TransactionDetail>,
    pub filter: TransactionFilter,
    pub search: LineEdit,
    pub editing_search: bool,
    pub tsel: TableState,
}

impl TxnPage {
    pub fn visible(&self) -> Vec<TransactionDetail> {
        self.filter.apply(&self.rows)
    }
}

pub struct App {
    pub api: Client,
    pub tab: Tab,
    pub currency: Currency,
    pub status: String,
    pub quit: bool,
    pub overview: Option<PortalOverview>,
    pub dsel: TableState,
    pub fsel: TableState,
    pub txn: TxnPage,
    pub export_dir: PathBuf,
}

fn clamp_selection(sel: &mut TableState, len: usize) {
    match (len, sel.selected()) {
        (0, _) => sel.select(None),
        (n, Some(i)) if i >= n => sel.select(Some(n - 1)),
        (_, None) => sel.select(Some(0)),
        _ => {}
    }
}

fn move_selection(sel: &mut TableState, len: usize, delta: isize) {
    if len == 0 {
        sel.select(None);
        return;
    }
    let cur = sel.selected().unwrap_or(0) as isize;
    sel.select(Some((cur + delta).rem_euclid(len as isize) as usize));
}

impl App {
    pub fn new(api: Client, export_dir: PathBuf) -> Self {
        Self {
            api,
            tab: Tab::Overview,
            currency: Currency::Inr,
            status: "←/→ switch tabs | ? help | q quit".into(),
            quit: false,
            overview: None,
            dsel: TableState::default(),
            fsel: TableState::default(),
            txn: TxnPage::default(),
            export_dir,
        }
    }

    pub async fn refresh(&mut self) -> anyhow::Result<()> {
        self.overview = Some(self.api.overview(self.currency).await?);
        self.txn.rows = self.api.transactions().await?;

        let (depts, funds) = (self.departments().len(), self.funds().len());
        clamp_selection(&mut self.dsel, depts);
        clamp_selection(&mut self.fsel, funds);
        self.clamp_txn_selection();
        Ok(())
    }

    pub fn departments(&self) -> &[PublicDepartment] {
        self.overview.as_ref().map_or(&[], |o| o.departments.as_slice())
    }

    pub fn funds(&self) -> &[PublicFund] {
        self.overview.as_ref().map_or(&[], |o| o.fund_sources.funds.as_slice())
    }

    fn clamp_txn_selection(&mut self) {
        let n = self.txn.visible().len();
        clamp_selection(&mut self.txn.tsel, n);
    }

    pub fn cycle_status(&mut self) {
        self.txn.filter.status = next_status(self.txn.filter.status.as_deref());
        self.clamp_txn_selection();
    }

    pub fn export_csv(&mut self) -> anyhow::Result<PathBuf> {
        let rows = self.txn.visible();
        let path = self.export_dir.join(filter::export_file_name(util::today()));
        filter::export_csv_file(&path, &rows)?;
        self.status = format!("Exported {} rows to {}", rows.len(), path.display());
        Ok(path)
    }

    fn report(&mut self, result: anyhow::Result<()>, ok: impl Into<String>) {
        match result {
            Ok(_) => self.status = ok.into(),
            Err(e) => self.status = format!("Error: {e}"),
        }
    }

    pub async fn handle_key(&mut self, k: KeyEvent) -> anyhow::Result<()> {
        if k.kind != KeyEventKind::Press {
            return Ok(());
        }

        if self.txn.editing_search {
            match k.code {
                KeyCode::Enter | KeyCode::Esc => self.txn.editing_search = false,
                code => {
                    self.txn.search.apply(code);
                }
            }
            self.txn.filter.search = Some(self.txn.search.value.clone());
            self.clamp_txn_selection();
            return Ok(());
        }

        match k.code {
            KeyCode::Char('q') => self.quit = true,
            KeyCode::Right | KeyCode::Tab => self.tab = self.tab.step(1),
            KeyCode::Left | KeyCode::BackTab => self.tab = self.tab.step(-1),
            KeyCode::Char('?') => self.tab = Tab::Help,
            KeyCode::Char('r') => {
                let result = self.refresh().await;
                self.report(result, "Refreshed.");
            }
            KeyCode::Char('c') => {
                self.currency = self.currency.toggle();
                let result = self.refresh().await;
                let msg = format!("Showing amounts in {}", self.currency.code());
                self.report(result, msg);
            }
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Down => self.move_selection(1),
            code if self.tab == Tab::Transactions => self.handle_txn_key(code),
            _ => {}
        }
        Ok(())
    }

    fn move_selection(&mut self, delta: isize) {
        match self.tab {
            Tab::Departments => {
                let n = self.departments().len();
                move_selection(&mut self.dsel, n, delta)
            }
            Tab::Funds => {
                let n = self.funds().len();
                move_selection(&mut self.fsel, n, delta)
            }
            Tab::Transactions => {
                let n = self.txn.visible().len();
                move_selection(&mut self.txn.tsel, n, delta)
            }
            Tab::Overview | Tab::Help => {}
        }
    }

    fn handle_txn_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('/') => {
                self.txn.editing_search = true;
                self.status = "Type to search, Enter to finish".into();
            }
            KeyCode::Char('s') => {
                self.cycle_status();
                self.status = format!(
                    "Status filter: {}",
                    self.txn.filter.status.as_deref().unwrap_or("all")
                );
            }
            KeyCode::Char('x') => {
                self.txn.filter.clear();
                self.txn.search.clear();
                self.clamp_txn_selection();
                self.status = "Filters cleared.".into();
            }
            KeyCode::Char('e') => {
                if let Err(e) = self.export_csv() {
                    self.status = format!("Export failed: {e}");
                }
            }
            _ => {}
        }
    }
}
