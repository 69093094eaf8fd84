//! Authentication and session security core.
//!
//! Credential verification, RS256 access/refresh token issuance with
//! single-use refresh rotation, and a TOTP two-factor engine, wired
//! against injected storage/cache/audit ports. The HTTP surface, the
//! relational database, and email delivery belong to the embedding
//! application.

pub mod config;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use models::{
    AuthResponse, ClientContext, LoginRequest, RegisterRequest, TokenResponse, UserResponse,
};
pub use services::{AuthError, AuthService, JwtService, TotpEngine};
