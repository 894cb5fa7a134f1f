use serde::{Deserialize, Serialize};

/// One billable unit of work.
///
/// The line total follows one of two mutually exclusive update paths,
/// keyed on which field was last edited: time-based (hours x hourly rate,
/// which also mirrors the rate into the unit price) or unit-based
/// (quantity x unit price).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItem {
    pub id: String,
    pub category: String,
    pub description: String,
    pub details: String,
    pub quantity: f64,
    pub hours: f64,
    pub hourly_rate: f64,
    pub unit_price: f64,
    pub total: f64,
}

impl Default for LineItem {
    fn default() -> Self {
        Self {
            id: String::new(),
            category: String::new(),
            description: String::new(),
            details: String::new(),
            quantity: 1.0,
            hours: 0.0,
            hourly_rate: 0.0,
            unit_price: 0.0,
            total: 0.0,
        }
    }
}

impl LineItem {
    pub fn new(id: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Recompute the total after an edit to hours or hourly rate.
    pub fn recalc_from_time(&mut self) {
        self.total = self.hours * self.hourly_rate;
        self.unit_price = self.hourly_rate;
    }

    /// Recompute the total after an edit to quantity or unit price.
    pub fn recalc_from_units(&mut self) {
        self.total = self.quantity * self.unit_price;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_edit_drives_total_and_unit_price() {
        let mut item = LineItem::new("backend-1", "REST API");
        item.hours = 12.0;
        item.hourly_rate = 150.0;
        item.recalc_from_time();

        assert_eq!(item.total, 1800.0);
        assert_eq!(item.unit_price, 150.0);
    }

    #[test]
    fn unit_edit_drives_total_without_touching_rate() {
        let mut item = LineItem::new("frontend-1", "Web Interface");
        item.hourly_rate = 100.0;
        item.quantity = 3.0;
        item.unit_price = 250.0;
        item.recalc_from_units();

        assert_eq!(item.total, 750.0);
        assert_eq!(item.hourly_rate, 100.0);
    }

    #[test]
    fn new_items_start_with_a_single_unit() {
        let item = LineItem::new("backend-2", "Database");
        assert_eq!(item.quantity, 1.0);
        assert_eq!(item.total, 0.0);
    }
}
