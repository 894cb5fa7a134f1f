use std::path::PathBuf;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Cell, Clear, Paragraph, Row, Table, TableState},
    Frame,
};

use crate::store::DraftSummary;
use crate::ui::centered_rect;

// Represents the state of the drafts table screen
pub struct DraftsState {
    drafts: Vec<DraftSummary>,
    table_state: TableState,
    import_input: Option<String>,
    status: Option<String>,
}

impl DraftsState {
    pub fn new(drafts: Vec<DraftSummary>) -> Self {
        let mut table_state = TableState::default();
        if !drafts.is_empty() {
            table_state.select(Some(0));
        }

        Self {
            drafts,
            table_state,
            import_input: None,
            status: None,
        }
    }

    pub fn with_status(drafts: Vec<DraftSummary>, status: impl Into<String>) -> Self {
        let mut state = Self::new(drafts);
        state.status = Some(status.into());
        state
    }

    pub fn next(&mut self) {
        if self.drafts.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i >= self.drafts.len() - 1 {
                    0
                } else {
                    i + 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn previous(&mut self) {
        if self.drafts.is_empty() {
            return;
        }

        let i = match self.table_state.selected() {
            Some(i) => {
                if i == 0 {
                    self.drafts.len() - 1
                } else {
                    i - 1
                }
            }
            None => 0,
        };
        self.table_state.select(Some(i));
    }

    pub fn selected_number(&self) -> Option<String> {
        self.table_state
            .selected()
            .and_then(|i| self.drafts.get(i))
            .map(|d| d.number.clone())
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }
}

pub enum DraftAction {
    Exit,
    NewQuote,
    EditDraft(String),
    PreviewDraft(String),
    DeleteDraft(String),
    Import(PathBuf),
}

pub fn render_drafts<B: Backend>(frame: &mut Frame<B>, state: &mut DraftsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let header_cells = ["Number", "Date", "Title", "Total"]
        .iter()
        .map(|h| Cell::from(*h).style(Style::default().fg(Color::Yellow)));
    let header = Row::new(header_cells)
        .style(Style::default())
        .height(1)
        .bottom_margin(1);

    let rows = state.drafts.iter().map(|draft| {
        Row::new(vec![
            Cell::from(draft.number.clone()),
            Cell::from(draft.date.format("%Y-%m-%d").to_string()),
            Cell::from(draft.title.clone()),
            Cell::from(format!("${:.2}", draft.total)),
        ])
    });

    let table = Table::new(rows)
        .header(header)
        .block(Block::default().borders(Borders::ALL).title("Stored Quotes"))
        .highlight_style(Style::default().bg(Color::Blue).add_modifier(Modifier::BOLD))
        .widths(&[
            Constraint::Percentage(20),
            Constraint::Percentage(15),
            Constraint::Percentage(45),
            Constraint::Percentage(20),
        ]);
    frame.render_stateful_widget(table, chunks[0], &mut state.table_state);

    let help_line = match &state.status {
        Some(status) => Spans::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Green),
        )),
        None => Spans::from(
            "N - New quote | Enter - Edit | P - Preview | D - Delete | I - Import | Q - Quit",
        ),
    };
    let help = Paragraph::new(help_line)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[1]);

    if let Some(path) = &state.import_input {
        let area = centered_rect(60, 20, frame.size());
        frame.render_widget(Clear, area);
        let popup = Paragraph::new(vec![
            Spans::from("Path to the quote JSON file:"),
            Spans::from(format!("{}|", path)),
            Spans::from(""),
            Spans::from("Enter - Import | Esc - Cancel"),
        ])
        .block(Block::default().title("Import Quote").borders(Borders::ALL))
        .style(Style::default().fg(Color::Cyan));
        frame.render_widget(popup, area);
    }
}

pub fn handle_input(state: &mut DraftsState) -> Result<Option<DraftAction>> {
    if let Event::Key(key) = event::read()? {
        // Any keypress clears a lingering status message
        state.status = None;

        // The import popup grabs all input while open
        if let Some(path) = &mut state.import_input {
            match key.code {
                KeyCode::Esc => {
                    state.import_input = None;
                }
                KeyCode::Enter => {
                    let path = PathBuf::from(path.trim());
                    state.import_input = None;
                    if path.as_os_str().is_empty() {
                        return Ok(None);
                    }
                    return Ok(Some(DraftAction::Import(path)));
                }
                KeyCode::Backspace => {
                    path.pop();
                }
                KeyCode::Char(c) => {
                    path.push(c);
                }
                _ => {}
            }
            return Ok(None);
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Ok(Some(DraftAction::Exit)),
            KeyCode::Char('n') => return Ok(Some(DraftAction::NewQuote)),
            KeyCode::Char('i') => {
                state.import_input = Some(String::new());
            }
            KeyCode::Enter | KeyCode::Char('e') => {
                if let Some(number) = state.selected_number() {
                    return Ok(Some(DraftAction::EditDraft(number)));
                }
            }
            KeyCode::Char('p') => {
                if let Some(number) = state.selected_number() {
                    return Ok(Some(DraftAction::PreviewDraft(number)));
                }
            }
            KeyCode::Char('d') => {
                if let Some(number) = state.selected_number() {
                    return Ok(Some(DraftAction::DeleteDraft(number)));
                }
            }
            KeyCode::Up => state.previous(),
            KeyCode::Down => state.next(),
            _ => {}
        }
    }

    Ok(None)
}
