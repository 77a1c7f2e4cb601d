pub mod record;
pub mod schema;
pub mod source;
pub mod state;

pub use record::{
    OBSERVATION_WINDOW, PriceRow, RawRecord, RenewableRow, WideRow, Year, YearWindow,
};
pub use schema::{PRICE_TABLE, RENEWABLE_TABLE, SNAPSHOT_TABLE, seds};
pub use source::EnergySource;
pub use state::{State, UnknownState};
