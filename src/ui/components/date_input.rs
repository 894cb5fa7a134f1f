use chrono::{Datelike, Days, Months, NaiveDate};
use crossterm::event::KeyCode;
use tui::style::{Color, Modifier, Style};
use tui::text::{Span, Spans};

#[derive(Clone, Copy, PartialEq)]
enum DatePart {
    Year,
    Month,
    Day,
}

/// Segmented year/month/day editor. Arrow keys step the active part,
/// digits overwrite it through a small buffer.
pub struct DateInput {
    pub date: NaiveDate,
    part: DatePart,
    buffer: String,
}

impl DateInput {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            part: DatePart::Year,
            buffer: String::new(),
        }
    }

    /// Called when the field enters edit mode.
    pub fn reset(&mut self) {
        self.part = DatePart::Year;
        self.buffer.clear();
    }

    pub fn handle_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Left => {
                self.part = match self.part {
                    DatePart::Year => DatePart::Day,
                    DatePart::Month => DatePart::Year,
                    DatePart::Day => DatePart::Month,
                };
                self.buffer.clear();
            }
            KeyCode::Right | KeyCode::Tab => {
                self.part = match self.part {
                    DatePart::Year => DatePart::Month,
                    DatePart::Month => DatePart::Day,
                    DatePart::Day => DatePart::Year,
                };
                self.buffer.clear();
            }
            KeyCode::Up => self.step(1),
            KeyCode::Down => self.step(-1),
            KeyCode::Backspace => {
                self.buffer.pop();
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                self.buffer.push(c);
                self.commit_buffer();
            }
            _ => {}
        }
    }

    fn step(&mut self, delta: i32) {
        let stepped = match (self.part, delta >= 0) {
            (DatePart::Year, true) => self.date.checked_add_months(Months::new(12)),
            (DatePart::Year, false) => self.date.checked_sub_months(Months::new(12)),
            (DatePart::Month, true) => self.date.checked_add_months(Months::new(1)),
            (DatePart::Month, false) => self.date.checked_sub_months(Months::new(1)),
            (DatePart::Day, true) => self.date.checked_add_days(Days::new(1)),
            (DatePart::Day, false) => self.date.checked_sub_days(Days::new(1)),
        };
        if let Some(date) = stepped {
            self.date = date;
        }
        self.buffer.clear();
    }

    fn commit_buffer(&mut self) {
        let width = match self.part {
            DatePart::Year => 4,
            DatePart::Month | DatePart::Day => 2,
        };
        if self.buffer.len() < width {
            return;
        }

        if let Ok(value) = self.buffer.parse::<u32>() {
            let candidate = match self.part {
                DatePart::Year if (1900..=2100).contains(&value) => {
                    NaiveDate::from_ymd_opt(value as i32, self.date.month(), self.date.day())
                }
                DatePart::Month => {
                    NaiveDate::from_ymd_opt(self.date.year(), value, self.date.day())
                }
                DatePart::Day => {
                    NaiveDate::from_ymd_opt(self.date.year(), self.date.month(), value)
                }
                _ => None,
            };
            // Out-of-range input is simply dropped.
            if let Some(date) = candidate {
                self.date = date;
            }
        }
        self.buffer.clear();
    }

    /// Render the date with the active part highlighted while editing.
    pub fn spans(&self, editing: bool) -> Spans<'static> {
        let highlight = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED);

        let segment = |part: DatePart, text: String| -> Span<'static> {
            if editing && part == self.part {
                let shown = if self.buffer.is_empty() {
                    text
                } else {
                    self.buffer.clone()
                };
                Span::styled(shown, highlight)
            } else {
                Span::raw(text)
            }
        };

        Spans::from(vec![
            segment(DatePart::Year, format!("{:04}", self.date.year())),
            Span::raw("-"),
            segment(DatePart::Month, format!("{:02}", self.date.month())),
            Span::raw("-"),
            segment(DatePart::Day, format!("{:02}", self.date.day())),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn arrows_step_the_active_part() {
        let mut input = DateInput::new(date(2026, 8, 7));
        input.handle_key(KeyCode::Up);
        assert_eq!(input.date, date(2027, 8, 7));

        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Down);
        assert_eq!(input.date, date(2027, 7, 7));
    }

    #[test]
    fn typed_digits_replace_the_part_when_complete() {
        let mut input = DateInput::new(date(2026, 8, 7));
        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Char('2'));
        input.handle_key(KeyCode::Char('5'));
        assert_eq!(input.date, date(2026, 8, 25));
    }

    #[test]
    fn invalid_input_is_dropped() {
        let mut input = DateInput::new(date(2026, 2, 10));
        input.handle_key(KeyCode::Right);
        input.handle_key(KeyCode::Char('1'));
        input.handle_key(KeyCode::Char('9'));
        // Month 19 does not exist; the date is untouched.
        assert_eq!(input.date, date(2026, 2, 10));
    }
}
