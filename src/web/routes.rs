// src/web/routes.rs
use crate::{
    error::AppResult,
    state::AppState,
    web::{
        admin_handlers, allievo_handlers, annunci_handlers, auth_handlers, mw_admin, mw_auth,
        pagamenti_handlers,
    },
};
use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::SqlitePool;
use time::Duration;
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, SessionManagerLayer};
use tower_sessions_sqlx_store::SqliteStore;

// GET /health: risponde solo se il database è raggiungibile
async fn salute(State(pool): State<SqlitePool>) -> AppResult<StatusCode> {
    sqlx::query("SELECT 1").execute(&pool).await?;
    Ok(StatusCode::OK)
}

pub fn create_router(app_state: AppState) -> Router {
    // --- Rotte pubbliche ---
    let public_routes = Router::new()
        .route("/health", get(salute))
        .route("/login", post(auth_handlers::handle_login))
        .route("/logout", post(auth_handlers::handle_logout));

    // --- Rotte di amministrazione ---
    // require_auth viene applicato dal router padre
    let admin_routes = Router::new()
        .route(
            "/utenti",
            get(admin_handlers::lista_utenti).post(admin_handlers::crea_utente),
        )
        .route(
            "/utenti/{id}",
            get(admin_handlers::dettaglio_utente)
                .put(admin_handlers::modifica_utente)
                .delete(admin_handlers::elimina_utente),
        )
        .route(
            "/corsi",
            get(allievo_handlers::lista_corsi).post(admin_handlers::crea_corso),
        )
        .route(
            "/corsi/{id}",
            put(admin_handlers::modifica_corso).delete(admin_handlers::elimina_corso),
        )
        .route(
            "/pagamenti",
            get(pagamenti_handlers::lista_pagamenti).post(pagamenti_handlers::crea_pagamento),
        )
        .route("/pagamenti/mensilita", put(pagamenti_handlers::registra_mensilita))
        .route(
            "/pagamenti/{id}",
            get(pagamenti_handlers::dettaglio_pagamento)
                .put(pagamenti_handlers::modifica_pagamento)
                .delete(pagamenti_handlers::elimina_pagamento),
        )
        .route(
            "/annunci",
            get(annunci_handlers::lista_annunci).post(annunci_handlers::crea_annuncio),
        )
        .route(
            "/annunci/{id}",
            put(annunci_handlers::modifica_annuncio).delete(annunci_handlers::elimina_annuncio),
        )
        .route("/report", get(pagamenti_handlers::report))
        .route("/quote", get(pagamenti_handlers::quote_allievi))
        .route_layer(middleware::from_fn(mw_admin::require_admin));

    // --- Rotte autenticate ---
    let authenticated_routes = Router::new()
        .route("/me", get(auth_handlers::handle_me))
        .route("/annunci", get(annunci_handlers::lista_annunci))
        .route("/corsi", get(allievo_handlers::lista_corsi))
        .route("/allievi/{id}/prospetto", get(allievo_handlers::prospetto_allievo))
        .nest("/admin", admin_routes)
        .route_layer(middleware::from_fn(mw_auth::require_auth));

    Router::new()
        .merge(public_routes)
        .merge(authenticated_routes)
        .with_state(app_state)
}

/// Router completo con tracing e sessioni.
pub fn crea_app(app_state: AppState, session_store: SqliteStore) -> Router {
    let giorni = app_state.config.sessione_giorni;

    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_http_only(true)
        .with_expiry(Expiry::OnInactivity(Duration::days(giorni)));

    create_router(app_state)
        .layer(session_layer)
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        archivio::Collezione,
        config::Config,
        db::pool_in_memoria,
        models::{
            pagamento::{Mensilita, Mese, StatoPagamento, Categoria},
            utente::{NuovoUtente, Ruolo},
        },
    };
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use tower::ServiceExt;

    async fn app_di_prova() -> (Router, AppState) {
        let pool = pool_in_memoria().await.unwrap();
        let store = SqliteStore::new(pool.clone())
            .with_table_name("sessions")
            .unwrap();
        store.migrate().await.unwrap();

        let config = Config {
            database_url: "sqlite::memory:".into(),
            indirizzo: "127.0.0.1:0".parse().unwrap(),
            admin_emails: vec!["direzione@scuola.it".into()],
            giorno_scadenza: 10,
            sessione_giorni: 1,
        };
        let state = AppState::new(pool, config);
        (crea_app(state.clone(), store), state)
    }

    async fn crea_account(state: &AppState, email: &str, ruolo: Ruolo) -> String {
        state
            .archivio
            .utenti
            .crea(NuovoUtente {
                email: email.into(),
                password: Some("password-sicura".into()),
                nome: "Prova".into(),
                cognome: "Account".into(),
                ruolo,
                genitore_id: None,
                data_iscrizione: None,
                corsi: vec![],
            })
            .await
            .unwrap()
            .id
    }

    async fn login(app: &Router, email: &str) -> String {
        let corpo = serde_json::json!({ "email": email, "password": "password-sicura" });
        let risposta = app
            .clone()
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(corpo.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(risposta.status(), StatusCode::OK);

        let cookie = risposta
            .headers()
            .get(header::SET_COOKIE)
            .expect("cookie di sessione")
            .to_str()
            .unwrap();
        cookie.split(';').next().unwrap().to_string()
    }

    async fn get_con_cookie(app: &Router, uri: &str, cookie: &str) -> StatusCode {
        app.clone()
            .oneshot(
                Request::get(uri)
                    .header(header::COOKIE, cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[tokio::test]
    async fn health_segue_lo_stato_del_database() {
        let (app, state) = app_di_prova().await;
        let risposta = app
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(risposta.status(), StatusCode::OK);

        state.db_pool.close().await;
        let risposta = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(risposta.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn senza_sessione_401() {
        let (app, _) = app_di_prova().await;
        let risposta = app
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(risposta.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn credenziali_errate_401() {
        let (app, state) = app_di_prova().await;
        crea_account(&state, "allieva@scuola.it", Ruolo::Allievo).await;

        let corpo = serde_json::json!({ "email": "allieva@scuola.it", "password": "sbagliata" });
        let risposta = app
            .oneshot(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(corpo.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(risposta.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn allievo_non_accede_all_admin() {
        let (app, state) = app_di_prova().await;
        let id = crea_account(&state, "allieva@scuola.it", Ruolo::Allievo).await;
        let altro = crea_account(&state, "altra@scuola.it", Ruolo::Allievo).await;
        let cookie = login(&app, "allieva@scuola.it").await;

        assert_eq!(get_con_cookie(&app, "/me", &cookie).await, StatusCode::OK);
        assert_eq!(get_con_cookie(&app, "/admin/report", &cookie).await, StatusCode::FORBIDDEN);
        assert_eq!(
            get_con_cookie(&app, &format!("/allievi/{id}/prospetto"), &cookie).await,
            StatusCode::OK
        );
        assert_eq!(
            get_con_cookie(&app, &format!("/allievi/{altro}/prospetto"), &cookie).await,
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_con_cookie(&app, &format!("/allievi/{id}/prospetto?anno=2147483647"), &cookie).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn admin_da_lista_email_vede_il_report() {
        let (app, state) = app_di_prova().await;
        // Ruolo insegnante, ma l'email è nella lista degli amministratori
        crea_account(&state, "direzione@scuola.it", Ruolo::Insegnante).await;
        let allievo = crea_account(&state, "allieva@scuola.it", Ruolo::Allievo).await;
        state
            .archivio
            .pagamenti
            .registra_mensilita(Mensilita {
                utente_id: allievo,
                mese: Mese::Ottobre,
                anno: 2024,
                categoria: Categoria::Mensile,
                stato: StatoPagamento::Pagato,
                importo: 45.0,
                data_pagamento: None,
            })
            .await
            .unwrap();

        let cookie = login(&app, "direzione@scuola.it").await;
        let risposta = app
            .clone()
            .oneshot(
                Request::get("/admin/report?anno=2024")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(risposta.status(), StatusCode::OK);

        let corpo = axum::body::to_bytes(risposta.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&corpo).unwrap();
        assert_eq!(json["totale_pagato"], 45.0);
        assert_eq!(json["numero_pagamenti"], 1);

        // Anni fuori intervallo respinti prima di qualsiasi calcolo
        assert_eq!(
            get_con_cookie(&app, "/admin/report?anno=2147483647", &cookie).await,
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_con_cookie(&app, "/admin/pagamenti?anno=2147483647", &cookie).await,
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn logout_chiude_la_sessione() {
        let (app, state) = app_di_prova().await;
        crea_account(&state, "allieva@scuola.it", Ruolo::Allievo).await;
        let cookie = login(&app, "allieva@scuola.it").await;

        let risposta = app
            .clone()
            .oneshot(
                Request::post("/logout")
                    .header(header::COOKIE, &cookie)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(risposta.status(), StatusCode::NO_CONTENT);
        assert_eq!(get_con_cookie(&app, "/me", &cookie).await, StatusCode::UNAUTHORIZED);
    }
}
