//! Domain model of a single cash-book entry.
//!
//! Everything in this crate is pure: the category catalog, the amount rules
//! and the preview rendering. The chat front-end and the sink live elsewhere.

pub use categories::{Catalog, Category, Direction, INFLOW, NOT_FOUND, OUTFLOW};
pub use error::LedgerError;
pub use money::{Amount, format_amount, parse_amount};
pub use record::{PREVIEW_NOTE_CHARS, Preview, Record};

mod categories;
mod error;
mod money;
mod record;
