//! Register filling: maps normalized transaction records into fixed
//! spreadsheet columns, inserts banded per-date subtotal rows, and
//! writes running-balance formulas that skip those subtotal rows.

pub mod layout;
pub mod normalize;
pub mod register;
pub mod row;
pub mod summary;

pub use layout::{Currency, RegisterLayout, TOTAL_LABEL};
pub use normalize::{normalize, DateField, NormalizedRecord};
pub use register::{fill_register, FillReport};
