use anyhow::Result;
use crossterm::event::{self, Event, KeyCode};
use tui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Style},
    text::{Span, Spans},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::models::Quote;
use crate::quote_gen;

// Represents the state of the document preview screen
pub struct PreviewState {
    quote: Quote,
    text: String,
    scroll: u16,
    status: Option<String>,
}

impl PreviewState {
    pub fn new(quote: Quote) -> Self {
        let text = quote_gen::render_text(&quote);
        Self {
            quote,
            text,
            scroll: 0,
            status: None,
        }
    }

    pub fn quote(&self) -> &Quote {
        &self.quote
    }

    pub fn into_quote(self) -> Quote {
        self.quote
    }

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status = Some(message.into());
    }

    pub fn scroll_up(&mut self) {
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        let lines = self.text.lines().count() as u16;
        if self.scroll + 1 < lines {
            self.scroll += 1;
        }
    }
}

pub enum PreviewAction {
    BackToEdit,
    BackToList,
    ExportPdf,
    ExportJson,
}

pub fn render_preview<B: Backend>(frame: &mut Frame<B>, state: &mut PreviewState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(3),
        ].as_ref())
        .split(frame.size());

    let title = format!("Preview — {} ({})", state.quote.number, state.quote.display_title());
    let document = Paragraph::new(state.text.as_str())
        .block(Block::default().title(title).borders(Borders::ALL))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll, 0));
    frame.render_widget(document, chunks[0]);

    let help_line = match &state.status {
        Some(status) => Spans::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Green),
        )),
        None => Spans::from(
            "P - Export PDF | J - Export JSON | E - Back to edit | B - Back to list | Up/Down - Scroll",
        ),
    };
    let help = Paragraph::new(help_line)
        .style(Style::default().fg(Color::Gray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(help, chunks[1]);
}

pub fn handle_input(state: &mut PreviewState) -> Result<Option<PreviewAction>> {
    if let Event::Key(key) = event::read()? {
        state.status = None;

        match key.code {
            KeyCode::Char('e') | KeyCode::Esc => return Ok(Some(PreviewAction::BackToEdit)),
            KeyCode::Char('b') | KeyCode::Char('q') => return Ok(Some(PreviewAction::BackToList)),
            KeyCode::Char('p') => return Ok(Some(PreviewAction::ExportPdf)),
            KeyCode::Char('j') => return Ok(Some(PreviewAction::ExportJson)),
            KeyCode::Up => state.scroll_up(),
            KeyCode::Down => state.scroll_down(),
            _ => {}
        }
    }

    Ok(None)
}
