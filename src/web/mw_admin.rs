// src/web/mw_admin.rs
use crate::{error::AppError, services::capacita::Capacita};
use axum::{
    extract::{Extension, Request},
    middleware::Next,
    response::Response,
};

/// Consente l'accesso solo agli amministratori. Va eseguito dopo `require_auth`.
pub async fn require_admin(
    Extension(capacita): Extension<Capacita>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if capacita.amministratore {
        tracing::debug!("Admin MW: accesso consentito a {}", capacita.utente_id);
        Ok(next.run(request).await)
    } else {
        tracing::warn!(
            "Admin MW: accesso negato a {} (ruolo {:?}).",
            capacita.utente_id,
            capacita.ruolo
        );
        Err(AppError::Unauthorized)
    }
}
