use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::web::AntiforgeryExemptions;

/// Inserted into every request that passed through [`bff_middleware`].
#[derive(Debug, Clone, Copy)]
pub struct BffMiddlewareMarker;

/// Establishes the request-scoped state BFF endpoints rely on: the marker, and
/// the antiforgery exemptions for the enforcing middleware further down.
pub async fn bff_middleware(
    State(exemptions): State<AntiforgeryExemptions>,
    mut request: Request,
    next: Next,
) -> Response {
    request.extensions_mut().insert(BffMiddlewareMarker);
    request.extensions_mut().insert(exemptions);
    next.run(request).await
}
