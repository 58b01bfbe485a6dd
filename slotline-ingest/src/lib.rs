//! slotline-ingest: candidate roster import (CSV) into a candidate store.

pub mod roster;
pub mod types;

pub use roster::{EmailValidator, import_roster, parse_roster_csv, parse_roster_reader};
pub use types::{ImportSummary, RosterRow, SkippedRow};
