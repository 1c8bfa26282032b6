pub mod registry;
pub mod routes;
pub mod state;

pub use registry::{Endpoint, HttpMethod, RouteRegistry};
pub use routes::app;
pub use state::AppState;
