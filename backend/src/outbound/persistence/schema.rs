//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `schema/users.sql` exactly. Regenerate with
//! `diesel print-schema` when the DDL changes.

diesel::table! {
    /// User accounts.
    ///
    /// `id` is a `BIGSERIAL` assigned on insert; `email` carries a unique
    /// constraint.
    users (id) {
        /// Primary key.
        id -> Int8,
        /// Login email.
        email -> Varchar,
        /// Argon2id PHC hash.
        password -> Varchar,
    }
}
