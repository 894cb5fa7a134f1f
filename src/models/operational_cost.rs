use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Periodicity {
    #[default]
    Monthly,
    Yearly,
    OneTime,
}

impl Periodicity {
    /// Cycle through the variants, used by the wizard's select field.
    pub fn next(self) -> Self {
        match self {
            Periodicity::Monthly => Periodicity::Yearly,
            Periodicity::Yearly => Periodicity::OneTime,
            Periodicity::OneTime => Periodicity::Monthly,
        }
    }
}

impl fmt::Display for Periodicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Periodicity::Monthly => "monthly",
            Periodicity::Yearly => "yearly",
            Periodicity::OneTime => "one-time",
        };
        write!(f, "{}", label)
    }
}

/// Recurring or one-off cost listed alongside the quoted work.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationalCost {
    pub description: String,
    pub amount: f64,
    pub periodicity: Periodicity,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodicity_serializes_kebab_case() {
        let json = serde_json::to_string(&Periodicity::OneTime).unwrap();
        assert_eq!(json, "\"one-time\"");

        let parsed: Periodicity = serde_json::from_str("\"monthly\"").unwrap();
        assert_eq!(parsed, Periodicity::Monthly);
    }

    #[test]
    fn periodicity_cycles_through_all_variants() {
        let start = Periodicity::Monthly;
        assert_eq!(start.next().next().next(), start);
    }
}
