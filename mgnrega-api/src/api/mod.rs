//! HTTP API handlers for mgnrega-api

pub mod districts;
pub mod health;
pub mod locate;
pub mod states;

pub use districts::{get_district, get_district_summary, refresh_district};
pub use health::health_routes;
pub use locate::locate_by_coords;
pub use states::list_states;
