// src/services/mod.rs
pub mod aggregatore;
pub mod auth_service;
pub mod capacita;
pub mod manutenzione;
pub mod stato_pagamento;
