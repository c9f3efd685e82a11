// src/services/auth_service.rs
use crate::{
    archivio::RepoUtenti,
    error::{AppError, AppResult},
    models::utente::Utente,
};

/// Verifica che la password corrisponda all'hash salvato.
pub async fn verify_password(password: &str, stored_hash: &str) -> AppResult<bool> {
    let password = password.to_string();
    let stored_hash = stored_hash.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Verifica hash bcrypt...");
        bcrypt::verify(&password, &stored_hash)
    })
    .await
    .map_err(|e| {
        tracing::error!("Errore nella task spawn_blocking (verify_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Errore bcrypt durante la verifica: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Genera un hash bcrypt per la password.
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || {
        tracing::debug!("Generazione hash bcrypt...");
        bcrypt::hash(&password, bcrypt::DEFAULT_COST)
    })
    .await
    .map_err(|e| {
        tracing::error!("Errore nella task spawn_blocking (hash_password): {:?}", e);
        AppError::InternalServerError
    })?
    .map_err(|e| {
        tracing::error!("Errore bcrypt durante la generazione dell'hash: {:?}", e);
        AppError::PasswordHashingError
    })
}

/// Controlla email e password. Utente inesistente, senza password o password
/// errata producono lo stesso errore.
pub async fn autentica(utenti: &dyn RepoUtenti, email: &str, password: &str) -> AppResult<Utente> {
    tracing::info!("Tentativo di accesso per: {}", email);

    let Some(utente) = utenti.trova_per_email(email).await? else {
        tracing::warn!("Utente non trovato: {}", email);
        return Err(AppError::InvalidCredentials);
    };
    let Some(hash) = utente.password_hash.as_deref() else {
        tracing::warn!("Utente {} senza password impostata.", email);
        return Err(AppError::InvalidCredentials);
    };

    if verify_password(password, hash).await? {
        tracing::info!("✅ Accesso riuscito per: {}", utente.id);
        Ok(utente)
    } else {
        tracing::warn!("Password errata per: {}", email);
        Err(AppError::InvalidCredentials)
    }
}
