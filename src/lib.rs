pub mod app;
pub mod client;
pub mod poller;
pub mod snapshot;
pub mod types;
pub mod ui;

pub use client::{ApiClient, BatchSource, FetchError};
pub use poller::{safe_lock, DashboardState, Poller, SharedState};
pub use snapshot::{merge, DashboardSnapshot, Kpis, TimeSeriesPoint};
pub use types::*;
