use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use tracing::debug;

use crate::auth::auth::authenticate;

/// Answers 401 unless the request carries a valid bearer token.
/// On success the caller is stored in the request extensions as `AuthUser`.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let auth_user = match authenticate(req.request()) {
        Ok(user) => user,
        Err(e) => {
            debug!(path = %req.path(), reason = %e, "Rejected unauthenticated request");
            let resp = e.error_response();
            return Ok(req.into_response(resp));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
