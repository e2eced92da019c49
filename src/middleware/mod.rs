/*
 * Responsibility
 * - Router-level layers, applied once in app.rs
 * - Authorization is not a layer here: handlers call AuthService::enforce
 */
pub mod cors;
pub mod http;
pub mod security_headers;
