//! Explicit view state for the dashboard: the app table and the detail panel.

pub mod detail;
pub mod session;
pub mod table;

pub use detail::{DetailController, DetailOutcome};
pub use session::{DetailSession, SessionStore};
pub use table::TableState;
