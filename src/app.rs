//! UI-local state: panel selection and scrolling. Nothing here touches the
//! network or the snapshot contents.

use crate::poller::{safe_lock, SharedState};
use crossterm::event::KeyCode;

/// Which scrollable panel has keyboard focus.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Panel {
    Blocks,
    Mempool,
}

impl Panel {
    fn next(self) -> Self {
        match self {
            Panel::Blocks => Panel::Mempool,
            Panel::Mempool => Panel::Blocks,
        }
    }
}

pub struct App {
    pub state: SharedState,
    pub selected_panel: Panel,
    pub blocks_scroll: usize,
    pub mempool_scroll: usize,
}

impl App {
    pub fn new(state: SharedState) -> Self {
        Self {
            state,
            selected_panel: Panel::Blocks,
            blocks_scroll: 0,
            mempool_scroll: 0,
        }
    }

    /// Handle one key press. Returns true when the app should quit.
    pub fn on_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return true,
            KeyCode::Tab => {
                self.selected_panel = self.selected_panel.next();
            }
            KeyCode::Up => self.scroll_by(-1),
            KeyCode::Down => self.scroll_by(1),
            KeyCode::PageUp => self.scroll_by(-10),
            KeyCode::PageDown => self.scroll_by(10),
            KeyCode::Home => match self.selected_panel {
                Panel::Blocks => self.blocks_scroll = 0,
                Panel::Mempool => self.mempool_scroll = 0,
            },
            _ => {}
        }
        false
    }

    fn scroll_by(&mut self, delta: i64) {
        let max = {
            let state = safe_lock(&self.state);
            match (&state.snapshot, self.selected_panel) {
                (Some(s), Panel::Blocks) => s.recent_blocks.len().saturating_sub(1),
                (Some(s), Panel::Mempool) => s.mempool.len().saturating_sub(1),
                (None, _) => 0,
            }
        };
        let scroll = match self.selected_panel {
            Panel::Blocks => &mut self.blocks_scroll,
            Panel::Mempool => &mut self.mempool_scroll,
        };
        *scroll = scroll
            .saturating_add_signed(delta as isize)
            .min(max);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::poller::DashboardState;
    use crate::snapshot::DashboardSnapshot;
    use crate::types::Transaction;
    use std::sync::{Arc, Mutex};

    fn app_with_mempool(len: usize) -> App {
        let snapshot = DashboardSnapshot {
            mempool: (0..len)
                .map(|i| Transaction {
                    transaction_id: format!("tx{i}"),
                    ..Transaction::default()
                })
                .collect(),
            ..DashboardSnapshot::default()
        };
        let state = Arc::new(Mutex::new(DashboardState {
            snapshot: Some(snapshot),
            ..DashboardState::default()
        }));
        App::new(state)
    }

    #[test]
    fn quit_keys() {
        let mut app = app_with_mempool(0);
        assert!(app.on_key(KeyCode::Char('q')));
        assert!(app.on_key(KeyCode::Esc));
        assert!(!app.on_key(KeyCode::Tab));
    }

    #[test]
    fn tab_cycles_panels() {
        let mut app = app_with_mempool(0);
        assert_eq!(app.selected_panel, Panel::Blocks);
        app.on_key(KeyCode::Tab);
        assert_eq!(app.selected_panel, Panel::Mempool);
        app.on_key(KeyCode::Tab);
        assert_eq!(app.selected_panel, Panel::Blocks);
    }

    #[test]
    fn scroll_is_clamped_to_list_length() {
        let mut app = app_with_mempool(3);
        app.selected_panel = Panel::Mempool;
        app.on_key(KeyCode::PageDown);
        assert_eq!(app.mempool_scroll, 2);
        app.on_key(KeyCode::Up);
        assert_eq!(app.mempool_scroll, 1);
        app.on_key(KeyCode::Home);
        assert_eq!(app.mempool_scroll, 0);
        app.on_key(KeyCode::Up);
        assert_eq!(app.mempool_scroll, 0);
    }
}
