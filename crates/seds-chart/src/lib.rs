//! Chart rendering: share-of-total over time, and single-year magnitudes with
//! a renewable breakdown.

mod error;
pub mod kind;
pub mod render;
pub mod shares;
mod text;

pub use error::ChartError;
pub use kind::{ChartKind, chart_path};
pub use render::{render_composition, render_single_year, write_state_charts};
pub use shares::{STACK_ORDER, Shares, composition};
