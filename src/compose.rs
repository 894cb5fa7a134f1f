//! Document composition: partitions line items into the two report
//! groups and assigns section numbers, which shift because several
//! sections are only present when they have content.

use chrono::{Days, NaiveDate};

use crate::models::{LineItem, Quote};

/// Categories that land in the Backend group of the report. Anything
/// else, including categories added by an import, falls into Frontend.
pub const BACKEND_CATEGORIES: [&str; 9] = [
    "REST API",
    "Database",
    "Payment Integration",
    "Authentication/Authorization",
    "Data Processing",
    "Infrastructure/DevOps",
    "Backend Testing",
    "API Documentation",
    "Other Backend",
];

/// Category choices offered by the form for frontend items.
pub const FRONTEND_CATEGORIES: [&str; 8] = [
    "Web Interface",
    "Mobile App (Android/iOS)",
    "Design/UI/UX",
    "Frontend Integration",
    "Frontend Testing",
    "Responsiveness",
    "Performance",
    "Other Frontend",
];

/// How many item descriptions the deliverables digest lists before
/// truncating.
const DIGEST_LIMIT: usize = 5;

pub struct ItemGroups<'a> {
    pub backend: Vec<&'a LineItem>,
    pub frontend: Vec<&'a LineItem>,
}

/// Split items into the two named report groups. Exhaustive and
/// disjoint: every item lands in exactly one group.
pub fn partition(items: &[LineItem]) -> ItemGroups<'_> {
    let mut backend = Vec::new();
    let mut frontend = Vec::new();

    for item in items {
        if BACKEND_CATEGORIES.contains(&item.category.as_str()) {
            backend.push(item);
        } else {
            frontend.push(item);
        }
    }

    ItemGroups { backend, frontend }
}

pub fn group_hours(items: &[&LineItem]) -> f64 {
    items.iter().map(|item| item.hours).sum()
}

/// Human-readable digest of a group's deliverables: the item
/// descriptions joined, truncated to the first five with an ellipsis.
pub fn deliverables_digest(items: &[&LineItem]) -> String {
    let descriptions: Vec<&str> = items
        .iter()
        .map(|item| item.description.trim())
        .filter(|d| !d.is_empty())
        .collect();

    if descriptions.is_empty() {
        return "-".to_string();
    }

    if descriptions.len() > DIGEST_LIMIT {
        format!("{}...", descriptions[..DIGEST_LIMIT].join(", "))
    } else {
        descriptions.join(", ")
    }
}

/// Section numbers for the rendered report. Optional sections are
/// numbered only when present; the numbers of everything after them
/// shift accordingly.
#[derive(Debug, PartialEq, Eq)]
pub struct SectionPlan {
    pub project: Option<u32>,
    pub development: u32,
    pub costs: Option<u32>,
    pub revenue: Option<u32>,
    pub summary: u32,
    pub notes: Option<u32>,
    pub terms: u32,
}

pub fn section_plan(quote: &Quote) -> SectionPlan {
    fn bump(next: &mut u32) -> u32 {
        let n = *next;
        *next += 1;
        n
    }

    fn claim(next: &mut u32, present: bool) -> Option<u32> {
        present.then(|| bump(next))
    }

    let mut next = 1u32;

    SectionPlan {
        project: claim(&mut next, !quote.project.title.trim().is_empty()),
        development: bump(&mut next),
        costs: claim(&mut next, !quote.operational_costs.is_empty()),
        revenue: claim(&mut next, !quote.revenue_model.trim().is_empty()),
        summary: bump(&mut next),
        notes: claim(&mut next, !quote.notes.trim().is_empty()),
        terms: bump(&mut next),
    }
}

/// Last day the quote is valid: issue date plus the validity window.
pub fn valid_until(quote: &Quote) -> Option<NaiveDate> {
    quote.issue_date.checked_add_days(Days::new(quote.validity_days as u64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OperationalCost, Quote};

    fn item(category: &str, description: &str, hours: f64) -> LineItem {
        let mut item = LineItem::new("item", category);
        item.description = description.to_string();
        item.hours = hours;
        item
    }

    #[test]
    fn partition_is_exhaustive_and_disjoint() {
        let items = vec![
            item("REST API", "api", 10.0),
            item("Web Interface", "ui", 8.0),
            item("Database", "schema", 4.0),
            item("Something Custom", "misc", 2.0),
        ];

        let groups = partition(&items);
        assert_eq!(groups.backend.len(), 2);
        assert_eq!(groups.frontend.len(), 2);
        assert_eq!(groups.backend.len() + groups.frontend.len(), items.len());

        // Unknown categories land in the frontend group.
        assert!(groups.frontend.iter().any(|i| i.category == "Something Custom"));
    }

    #[test]
    fn digest_joins_descriptions_and_truncates_past_five() {
        let items: Vec<LineItem> = (1..=7)
            .map(|n| item("REST API", &format!("task {}", n), 1.0))
            .collect();
        let refs: Vec<&LineItem> = items.iter().collect();

        let digest = deliverables_digest(&refs[..3]);
        assert_eq!(digest, "task 1, task 2, task 3");

        let truncated = deliverables_digest(&refs);
        assert_eq!(truncated, "task 1, task 2, task 3, task 4, task 5...");
    }

    #[test]
    fn digest_of_nothing_is_a_dash() {
        assert_eq!(deliverables_digest(&[]), "-");

        let blank = item("REST API", "   ", 1.0);
        assert_eq!(deliverables_digest(&[&blank]), "-");
    }

    #[test]
    fn all_sections_present_numbers_one_through_seven() {
        let mut quote = Quote::default();
        quote.project.title = "Payments".to_string();
        quote.operational_costs.push(OperationalCost {
            description: "Hosting".to_string(),
            amount: 50.0,
            ..OperationalCost::default()
        });
        quote.revenue_model = "Subscription".to_string();
        quote.notes = "Staged rollout".to_string();

        let plan = section_plan(&quote);
        assert_eq!(plan.project, Some(1));
        assert_eq!(plan.development, 2);
        assert_eq!(plan.costs, Some(3));
        assert_eq!(plan.revenue, Some(4));
        assert_eq!(plan.summary, 5);
        assert_eq!(plan.notes, Some(6));
        assert_eq!(plan.terms, 7);
    }

    #[test]
    fn absent_sections_shift_everything_after_them() {
        let quote = Quote::default();

        let plan = section_plan(&quote);
        assert_eq!(plan.project, None);
        assert_eq!(plan.development, 1);
        assert_eq!(plan.costs, None);
        assert_eq!(plan.revenue, None);
        assert_eq!(plan.summary, 2);
        assert_eq!(plan.notes, None);
        assert_eq!(plan.terms, 3);
    }

    #[test]
    fn a_single_optional_section_bumps_later_numbers() {
        let mut quote = Quote::default();
        quote.revenue_model = "License".to_string();

        let plan = section_plan(&quote);
        assert_eq!(plan.development, 1);
        assert_eq!(plan.revenue, Some(2));
        assert_eq!(plan.summary, 3);
        assert_eq!(plan.terms, 4);
    }

    #[test]
    fn validity_window_offsets_the_issue_date() {
        let quote = Quote {
            issue_date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
            validity_days: 30,
            ..Quote::default()
        };
        assert_eq!(valid_until(&quote), NaiveDate::from_ymd_opt(2026, 4, 9));
    }
}
