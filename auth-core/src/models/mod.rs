pub mod audit_event;
pub mod session;
pub mod user;

pub use audit_event::{AuditAction, AuditEvent, ClientContext};
pub use session::Session;
pub use user::{
    AuthResponse, LoginRequest, RegisterRequest, SpaceRole, TokenResponse, User, UserResponse,
};
