//! Terminal front-end
//!
//! Reads the latest animator frame on every redraw and forwards pin requests
//! to the watchlist. Nothing here runs on the engine's or animator's tasks:
//! the UI loop only reads watch channels.

mod draw;

pub use draw::{draw, styled_lines};

use crate::{animator::TickerFrame, catalog::Catalog, ticker::PriceTicker};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;
use std::sync::Arc;
use tokio::sync::watch;

/// UI state
pub struct App<'a> {
    ticker: &'a PriceTicker,
    frames: watch::Receiver<TickerFrame>,
    catalog: watch::Receiver<Arc<Catalog>>,
    /// Text typed in the search box
    pub query: String,
    /// Catalog ids matching `query`
    pub suggestions: Vec<String>,
    pub list_state: ListState,
    pub status_message: Option<String>,
    pub should_quit: bool,
}

impl<'a> App<'a> {
    pub fn new(ticker: &'a PriceTicker, frames: watch::Receiver<TickerFrame>) -> Self {
        let mut app = Self {
            ticker,
            frames,
            catalog: ticker.catalog(),
            query: String::new(),
            suggestions: Vec::new(),
            list_state: ListState::default(),
            status_message: None,
            should_quit: false,
        };
        app.refresh_suggestions();
        app
    }

    pub fn ticker(&self) -> &PriceTicker {
        self.ticker
    }

    /// Latest frame from the animator
    pub fn frame(&self) -> TickerFrame {
        self.frames.borrow().clone()
    }

    /// Picks up a catalog that finished loading since the last call
    pub fn tick(&mut self) {
        if self.catalog.has_changed().unwrap_or(false) {
            self.refresh_suggestions();
        }
    }

    fn refresh_suggestions(&mut self) {
        let catalog = self.catalog.borrow_and_update().clone();
        self.suggestions = catalog
            .search(&self.query)
            .into_iter()
            .map(|entry| entry.id.clone())
            .collect();

        let selected = match self.list_state.selected() {
            _ if self.suggestions.is_empty() => None,
            Some(i) if i < self.suggestions.len() => Some(i),
            _ => Some(0),
        };
        self.list_state.select(selected);
    }

    pub fn on_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char(c) => {
                self.query.push(c);
                self.refresh_suggestions();
            }
            KeyCode::Backspace => {
                self.query.pop();
                self.refresh_suggestions();
            }
            KeyCode::Down => self.move_selection(1),
            KeyCode::Up => self.move_selection(-1),
            KeyCode::Enter => self.pin_selected(),
            _ => {}
        }
    }

    fn move_selection(&mut self, delta: isize) {
        if self.suggestions.is_empty() {
            return;
        }
        let len = self.suggestions.len() as isize;
        let current = self.list_state.selected().unwrap_or(0) as isize;
        self.list_state
            .select(Some((current + delta).rem_euclid(len) as usize));
    }

    /// Pins the highlighted suggestion, or the typed text if there is none
    pub fn pin_selected(&mut self) {
        let target = self
            .list_state
            .selected()
            .and_then(|i| self.suggestions.get(i).cloned())
            .unwrap_or_else(|| self.query.trim().to_string());

        if target.is_empty() {
            self.status_message = Some("Nothing to pin".to_string());
            return;
        }

        self.status_message = Some(match self.ticker.request_pin(&target) {
            Ok(true) => {
                self.query.clear();
                self.refresh_suggestions();
                format!("Pinned {target}, shown from the next refresh")
            }
            Ok(false) => format!("{target} is already pinned"),
            Err(e) => e.to_string(),
        });
    }
}
