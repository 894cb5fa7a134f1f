use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::{ClientInfo, LineItem, OperationalCost, ProjectInfo};

/// Terms applied at submission time when the terms field is left blank.
pub const DEFAULT_TERMS: &str = "This quote is valid for the period indicated and is subject to \
     client approval. Development will follow industry best practices and will be delivered as \
     specified.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteKind {
    Preliminary,
    #[default]
    Final,
}

impl QuoteKind {
    pub fn toggle(self) -> Self {
        match self {
            QuoteKind::Preliminary => QuoteKind::Final,
            QuoteKind::Final => QuoteKind::Preliminary,
        }
    }
}

impl fmt::Display for QuoteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuoteKind::Preliminary => write!(f, "preliminary"),
            QuoteKind::Final => write!(f, "final"),
        }
    }
}

/// A finalized quote record.
///
/// Built once when the wizard form is submitted and read-only from then
/// on; the stored totals are the ones computed at submission time.
/// Every field is serde-defaulted so a partial JSON import still
/// deserializes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Quote {
    pub number: String,
    pub issue_date: NaiveDate,
    pub validity_days: u32,
    /// Free-text delivery estimate; empty means none was given.
    pub delivery_estimate: String,
    pub kind: QuoteKind,
    pub client: ClientInfo,
    pub project: ProjectInfo,
    pub items: Vec<LineItem>,
    pub operational_costs: Vec<OperationalCost>,
    pub revenue_model: String,
    pub notes: String,
    pub terms: String,
    pub subtotal: f64,
    pub discount: f64,
    pub total: f64,
    pub total_hours: f64,
}

impl Default for Quote {
    fn default() -> Self {
        Self {
            number: String::new(),
            issue_date: epoch(),
            validity_days: 30,
            delivery_estimate: String::new(),
            kind: QuoteKind::default(),
            client: ClientInfo::default(),
            project: ProjectInfo::default(),
            items: Vec::new(),
            operational_costs: Vec::new(),
            revenue_model: String::new(),
            notes: String::new(),
            terms: String::new(),
            subtotal: 0.0,
            discount: 0.0,
            total: 0.0,
            total_hours: 0.0,
        }
    }
}

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).expect("epoch is a valid date")
}

impl Quote {
    /// Title shown in draft listings, with a fallback for untitled quotes.
    pub fn display_title(&self) -> &str {
        if self.project.title.trim().is_empty() {
            "Untitled"
        } else {
            &self.project.title
        }
    }

    /// Base name for exported files: a slug of the project title, or the
    /// quote number when no title was given.
    pub fn file_stem(&self) -> String {
        let slug = slugify(&self.project.title);
        if slug.is_empty() {
            format!("quote-{}", slugify(&self.number))
        } else {
            slug
        }
    }
}

/// Lowercase, fold common diacritics, drop everything but alphanumerics,
/// spaces and hyphens, then hyphenate. Capped at 50 characters.
fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.trim().to_lowercase().chars() {
        match fold_diacritic(c) {
            c if c.is_ascii_alphanumeric() => out.push(c),
            ' ' | '-' => out.push('-'),
            _ => {}
        }
    }

    let mut collapsed = String::with_capacity(out.len());
    for c in out.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    collapsed.trim_matches('-').chars().take(50).collect()
}

fn fold_diacritic(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_stem_slugs_the_title() {
        let mut quote = Quote::default();
        quote.project.title = "  Sistema de Integração -- Fase 2!  ".to_string();
        assert_eq!(quote.file_stem(), "sistema-de-integracao-fase-2");
    }

    #[test]
    fn file_stem_falls_back_to_the_number() {
        let quote = Quote {
            number: "QTE-2026-014".to_string(),
            ..Quote::default()
        };
        assert_eq!(quote.file_stem(), "quote-qte-2026-014");
    }

    #[test]
    fn file_stem_is_capped_at_fifty_characters() {
        let mut quote = Quote::default();
        quote.project.title = "x".repeat(80);
        assert_eq!(quote.file_stem().len(), 50);
    }

    #[test]
    fn untitled_quotes_list_as_untitled() {
        let quote = Quote::default();
        assert_eq!(quote.display_title(), "Untitled");
    }

    #[test]
    fn kind_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&QuoteKind::Preliminary).unwrap(),
            "\"preliminary\""
        );
        assert_eq!(QuoteKind::Final.toggle(), QuoteKind::Preliminary);
    }
}
