//! Derived totals for the quote form.
//!
//! Everything here is pure and total: invalid numeric input coerces to
//! zero and recomputation happens synchronously on every edit.

use crate::models::LineItem;

pub fn subtotal(items: &[LineItem]) -> f64 {
    items.iter().map(|item| item.total).sum()
}

pub fn total_hours(items: &[LineItem]) -> f64 {
    items.iter().map(|item| item.hours).sum()
}

/// Grand total. Deliberately unclamped: a discount larger than the
/// subtotal yields a negative total.
pub fn total(subtotal: f64, discount: f64) -> f64 {
    subtotal - discount
}

/// Parse a numeric form field, coercing anything unparsable to zero.
pub fn parse_amount(input: &str) -> f64 {
    input.trim().parse::<f64>().unwrap_or(0.0)
}

/// Suggested delivery time in whole weeks, rounded up.
pub fn delivery_weeks(total_hours: f64, hours_per_week: f64) -> u32 {
    if total_hours <= 0.0 || hours_per_week <= 0.0 {
        return 0;
    }
    (total_hours / hours_per_week).ceil() as u32
}

pub fn format_delivery(weeks: u32) -> String {
    if weeks == 1 {
        "1 week".to_string()
    } else {
        format!("{} weeks", weeks)
    }
}

/// First integer embedded in the delivery text, used to tell an
/// auto-suggested value apart from a manual edit.
pub fn embedded_weeks(text: &str) -> Option<u32> {
    let digits: String = text
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

/// Tracks the last auto-suggested week count so the delivery field can
/// keep refreshing until the user writes something else into it.
#[derive(Debug, Default)]
pub struct DeliverySuggestion {
    last_suggested: Option<u32>,
}

impl DeliverySuggestion {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the tracker from an existing field value, so editing a saved
    /// draft whose estimate is still exactly an auto-generated text
    /// resumes tracking. Anything else counts as a manual entry.
    pub fn seed_from(text: &str) -> Self {
        Self {
            last_suggested: embedded_weeks(text)
                .filter(|weeks| format_delivery(*weeks) == text.trim()),
        }
    }

    /// Recompute the suggestion and decide whether the field follows it.
    ///
    /// Returns the replacement text when the field is still auto-managed
    /// (empty, or its week count matches the last suggested or freshly
    /// computed value); returns None once the user has edited the field
    /// away from the computed value.
    pub fn refresh(&mut self, current: &str, total_hours: f64, hours_per_week: f64) -> Option<String> {
        let weeks = delivery_weeks(total_hours, hours_per_week);
        let embedded = embedded_weeks(current);

        let auto_managed = current.trim().is_empty()
            || (embedded.is_some() && embedded == self.last_suggested)
            || embedded == Some(weeks);

        if !auto_managed {
            return None;
        }

        if weeks == 0 {
            self.last_suggested = None;
            if current.trim().is_empty() {
                return None;
            }
            return Some(String::new());
        }

        self.last_suggested = Some(weeks);
        Some(format_delivery(weeks))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(hours: f64, rate: f64) -> LineItem {
        let mut item = LineItem::new("backend-1", "REST API");
        item.hours = hours;
        item.hourly_rate = rate;
        item.recalc_from_time();
        item
    }

    #[test]
    fn subtotal_is_the_sum_of_line_totals() {
        let items = vec![item(10.0, 100.0), item(5.0, 80.0), item(0.0, 200.0)];
        assert_eq!(subtotal(&items), 1400.0);
        assert_eq!(total_hours(&items), 15.0);
    }

    #[test]
    fn total_is_never_clamped() {
        assert_eq!(total(1000.0, 250.0), 750.0);
        // A discount above the subtotal goes negative on purpose.
        assert_eq!(total(100.0, 250.0), -150.0);
    }

    #[test]
    fn invalid_amounts_coerce_to_zero() {
        assert_eq!(parse_amount("12.5"), 12.5);
        assert_eq!(parse_amount(" 40 "), 40.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
    }

    #[test]
    fn delivery_rounds_up_to_whole_weeks() {
        assert_eq!(delivery_weeks(40.0, 40.0), 1);
        assert_eq!(delivery_weeks(41.0, 40.0), 2);
        assert_eq!(delivery_weeks(0.0, 40.0), 0);
        assert_eq!(delivery_weeks(10.0, 0.0), 0);
    }

    #[test]
    fn one_week_is_singular() {
        assert_eq!(format_delivery(1), "1 week");
        assert_eq!(format_delivery(4), "4 weeks");
    }

    #[test]
    fn embedded_weeks_reads_the_first_integer() {
        assert_eq!(embedded_weeks("4 weeks"), Some(4));
        assert_eq!(embedded_weeks("about 12 weeks"), Some(12));
        assert_eq!(embedded_weeks("soon"), None);
    }

    #[test]
    fn suggestion_follows_recomputation_until_overridden() {
        let mut tracker = DeliverySuggestion::new();

        let first = tracker.refresh("", 80.0, 40.0);
        assert_eq!(first.as_deref(), Some("2 weeks"));

        // Totals changed, field still holds the old suggestion: refresh.
        let second = tracker.refresh("2 weeks", 120.0, 40.0);
        assert_eq!(second.as_deref(), Some("3 weeks"));

        // Manual override: week count no longer matches anything computed.
        let third = tracker.refresh("10 weeks, phased", 160.0, 40.0);
        assert_eq!(third, None);

        // And it stays suppressed on later recomputes.
        let fourth = tracker.refresh("10 weeks, phased", 200.0, 40.0);
        assert_eq!(fourth, None);
    }

    #[test]
    fn suggestion_clears_when_hours_drop_to_zero() {
        let mut tracker = DeliverySuggestion::new();
        tracker.refresh("", 80.0, 40.0);

        let cleared = tracker.refresh("2 weeks", 0.0, 40.0);
        assert_eq!(cleared.as_deref(), Some(""));
    }

    #[test]
    fn seeding_resumes_only_for_exact_auto_text() {
        let mut resumed = DeliverySuggestion::seed_from("2 weeks");
        assert_eq!(
            resumed.refresh("2 weeks", 120.0, 40.0).as_deref(),
            Some("3 weeks")
        );

        let mut manual = DeliverySuggestion::seed_from("2 weeks, maybe 3");
        assert_eq!(manual.refresh("2 weeks, maybe 3", 120.0, 40.0), None);
    }

    #[test]
    fn free_text_without_numbers_is_left_alone() {
        let mut tracker = DeliverySuggestion::new();
        assert_eq!(tracker.refresh("to be agreed", 80.0, 40.0), None);
    }
}
