mod client;
mod line_item;
mod operational_cost;
mod project;
mod quote;

pub use client::ClientInfo;
pub use line_item::LineItem;
pub use operational_cost::{OperationalCost, Periodicity};
pub use project::ProjectInfo;
pub use quote::{DEFAULT_TERMS, Quote, QuoteKind};
