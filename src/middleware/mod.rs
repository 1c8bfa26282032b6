pub mod auth;
pub mod gate;
pub mod response;

pub use auth::{JwtPrincipalResolver, Principal, PrincipalResolver, ResolveError};
pub use gate::{permission_gate, Decision, PermissionDeclaration, RouteGate};
pub use response::{ApiResponse, ApiResult};
