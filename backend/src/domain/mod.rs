//! Domain primitives, services and ports.
//!
//! Purpose: hold the credential model, password hashing, the session
//! authenticator and the storage port. Nothing here depends on Actix or
//! Diesel; inbound and outbound adapters translate to and from these types.
//!
//! Public surface:
//! - Credential / UserId: user identity and password material.
//! - LoginCredentials: validated login payload.
//! - SessionAuthenticator: login and per-request session resolution.
//! - Error / ErrorCode: transport-agnostic error payload.
//! - TraceId: request correlation identifier.

pub mod auth;
pub mod credential;
pub mod error;
pub mod password;
pub mod ports;
pub mod session;
pub mod trace_id;

pub use self::auth::{LoginCredentials, LoginValidationError};
pub use self::credential::{
    Credential, CredentialField, CredentialValidationError, FieldViolation, UserId, ViolationKind,
};
pub use self::error::{Error, ErrorCode};
pub use self::session::{AuthRejection, SessionAuthenticator, SessionGrant, SessionSnapshot};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
