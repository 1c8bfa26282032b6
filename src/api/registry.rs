use axum::{
    handler::Handler,
    middleware::from_fn_with_state,
    routing::{on, MethodFilter},
    Router,
};
use serde::Serialize;
use std::sync::Arc;

use super::state::AppState;
use crate::middleware::{permission_gate, PermissionDeclaration, PrincipalResolver, RouteGate};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    fn filter(self) -> MethodFilter {
        match self {
            HttpMethod::Get => MethodFilter::GET,
            HttpMethod::Post => MethodFilter::POST,
            HttpMethod::Put => MethodFilter::PUT,
            HttpMethod::Patch => MethodFilter::PATCH,
            HttpMethod::Delete => MethodFilter::DELETE,
        }
    }
}

/// One registered route and the permissions it declares
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Endpoint {
    pub method: HttpMethod,
    pub path: String,
    pub declaration: Option<PermissionDeclaration>,
}

/// Builds the router while recording every route's permission declaration.
/// Each route gets its own [`permission_gate`] layer carrying its declaration.
pub struct RouteRegistry {
    router: Router<AppState>,
    endpoints: Vec<Endpoint>,
    resolver: Arc<dyn PrincipalResolver>,
}

impl RouteRegistry {
    pub fn new(resolver: Arc<dyn PrincipalResolver>) -> Self {
        Self {
            router: Router::new(),
            endpoints: Vec::new(),
            resolver,
        }
    }

    /// Register a route open to everyone
    pub fn public<H, T>(self, method: HttpMethod, path: &str, handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        self.route(method, path, Some(PermissionDeclaration::public()), handler)
    }

    /// Register a route callable by principals holding any of `permissions`
    pub fn require<H, T>(self, method: HttpMethod, path: &str, permissions: &[&str], handler: H) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let declaration = PermissionDeclaration::any_of(permissions.iter().copied());
        self.route(method, path, Some(declaration), handler)
    }

    pub fn route<H, T>(
        mut self,
        method: HttpMethod,
        path: &str,
        declaration: Option<PermissionDeclaration>,
        handler: H,
    ) -> Self
    where
        H: Handler<T, AppState>,
        T: 'static,
    {
        let gate = RouteGate::new(declaration.clone(), self.resolver.clone());
        let method_router = on(method.filter(), handler).route_layer(from_fn_with_state(gate, permission_gate));

        self.router = self.router.route(path, method_router);
        self.endpoints.push(Endpoint {
            method,
            path: path.to_string(),
            declaration,
        });
        self
    }

    pub fn endpoints(&self) -> &[Endpoint] {
        &self.endpoints
    }

    pub fn into_parts(self) -> (Router<AppState>, Vec<Endpoint>) {
        (self.router, self.endpoints)
    }
}
