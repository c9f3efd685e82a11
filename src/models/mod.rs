// src/models/mod.rs
pub mod annuncio;
pub mod corso;
pub mod pagamento;
pub mod utente;
