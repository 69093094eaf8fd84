//! Services layer for the authentication core.
//!
//! The orchestrating `AuthService` plus the engines and ports it is wired
//! with: token signing, the TOTP engine, and the store/cache/audit traits.

pub mod audit;
pub mod auth;
pub mod cache;
pub mod error;
pub mod jwt;
pub mod store;
pub mod totp;

pub use audit::{AuditSink, MockAuditSink, TracingAuditSink};
pub use auth::AuthService;
pub use cache::{EphemeralCache, MockCache, RedisService};
pub use error::AuthError;
pub use jwt::{AccessTokenClaims, JwtService, RefreshTokenClaims};
pub use store::{MemorySessionStore, MemoryUserStore, SessionStore, UserStore};
pub use totp::{TotpEngine, TotpEnrollment};
