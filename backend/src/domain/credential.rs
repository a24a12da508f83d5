//! Credential model: identity, password material and field validation.
//!
//! A [`Credential`] carries a transient plaintext password while it is being
//! created and a persisted hash afterwards. Neither password field is ever
//! serialised, and `Debug` output redacts both.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use zeroize::Zeroizing;

use super::password::{self, PasswordHashError};

/// Shortest accepted plaintext password, in characters.
pub const PASSWORD_MIN_LEN: usize = 6;
/// Longest accepted plaintext password, in characters.
pub const PASSWORD_MAX_LEN: usize = 30;
const EMAIL_MAX_LEN: usize = 254;

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| {
            Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]{0,61}[A-Za-z0-9])?)+$").ok()
        })
        .as_ref()
}

fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX_LEN && email_regex().is_some_and(|regex| regex.is_match(email))
}

/// Repository-assigned user identifier.
///
/// # Examples
/// ```
/// use accounts::domain::UserId;
///
/// let id = UserId::new(7);
/// assert_eq!(id.get(), 7);
/// assert_eq!(id.to_string(), "7");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i64);

impl UserId {
    /// Wrap a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Field that failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialField {
    /// The login email.
    Email,
    /// The plaintext password.
    Password,
}

impl CredentialField {
    /// Field name as it appears on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
        }
    }
}

/// Why a field failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// The value is missing or blank.
    Required,
    /// The value is not a well-formed email address.
    InvalidFormat,
    /// The value length lies outside the inclusive range.
    LengthOutOfRange {
        /// Inclusive lower bound.
        min: usize,
        /// Inclusive upper bound.
        max: usize,
    },
}

impl ViolationKind {
    /// Stable machine-readable code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Required => "required",
            Self::InvalidFormat => "invalid_format",
            Self::LengthOutOfRange { .. } => "length_out_of_range",
        }
    }
}

/// One failing field with its reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldViolation {
    /// The failing field.
    pub field: CredentialField,
    /// The failure reason.
    pub kind: ViolationKind,
}

impl FieldViolation {
    const fn new(field: CredentialField, kind: ViolationKind) -> Self {
        Self { field, kind }
    }

    /// Human-readable description of the violation.
    #[must_use]
    pub fn message(&self) -> String {
        let field = self.field.as_str();
        match self.kind {
            ViolationKind::Required => format!("{field} is required"),
            ViolationKind::InvalidFormat => format!("{field} must be a valid email address"),
            ViolationKind::LengthOutOfRange { min, max } => {
                format!("{field} must be between {min} and {max} characters")
            }
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

/// Every field violation found in a credential.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("credential validation failed: {}", join_violations(.violations))]
pub struct CredentialValidationError {
    violations: Vec<FieldViolation>,
}

fn join_violations(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(FieldViolation::message)
        .collect::<Vec<_>>()
        .join("; ")
}

impl CredentialValidationError {
    /// Violations in field order.
    #[must_use]
    pub fn violations(&self) -> &[FieldViolation] {
        &self.violations
    }

    /// Consume the error and return its violations.
    #[must_use]
    pub fn into_violations(self) -> Vec<FieldViolation> {
        self.violations
    }
}

/// A user's identity plus password material.
///
/// ## Invariants
/// - `id` is assigned by a repository, never by callers.
/// - A credential that passed [`Credential::validate`] has either a non-empty
///   plaintext password or a password hash.
/// - Serialisation emits only `id` and `email`.
///
/// # Examples
/// ```
/// use accounts::domain::Credential;
///
/// let mut credential = Credential::new("a@x.com", "secret1");
/// credential.validate().expect("valid credential");
/// credential.derive_credentials().expect("hash derived");
/// credential.sanitize();
/// assert!(credential.plaintext_password().is_none());
/// assert!(credential.verify_password("secret1"));
/// ```
#[derive(Clone, Serialize)]
pub struct Credential {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<UserId>,
    email: String,
    #[serde(skip)]
    plaintext_password: Option<Zeroizing<String>>,
    #[serde(skip)]
    password_hash: Option<String>,
}

impl Credential {
    /// Build an unsaved credential from caller input.
    pub fn new(email: impl Into<String>, plaintext_password: impl Into<String>) -> Self {
        Self {
            id: None,
            email: email.into(),
            plaintext_password: Some(Zeroizing::new(plaintext_password.into())),
            password_hash: None,
        }
    }

    /// Rebuild a stored credential from persisted columns.
    pub fn from_stored(
        id: UserId,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id),
            email: email.into(),
            plaintext_password: None,
            password_hash: Some(password_hash.into()),
        }
    }

    /// Repository-assigned identifier, once persisted.
    #[must_use]
    pub const fn id(&self) -> Option<UserId> {
        self.id
    }

    /// Login email.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Transient plaintext password, if still present.
    #[must_use]
    pub fn plaintext_password(&self) -> Option<&str> {
        self.plaintext_password.as_deref().map(String::as_str)
    }

    /// Derived password hash, if any.
    #[must_use]
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    /// Record the identifier assigned by a repository.
    pub fn assign_id(&mut self, id: UserId) {
        self.id = Some(id);
    }

    fn has_hash(&self) -> bool {
        self.password_hash.as_deref().is_some_and(|hash| !hash.is_empty())
    }

    /// Check every field and report all violations at once.
    ///
    /// The password is only checked when no hash is set yet.
    ///
    /// # Errors
    ///
    /// Returns [`CredentialValidationError`] listing each failing field.
    pub fn validate(&self) -> Result<(), CredentialValidationError> {
        let mut violations = Vec::new();

        let email = self.email.as_str();
        if email.trim().is_empty() {
            violations.push(FieldViolation::new(
                CredentialField::Email,
                ViolationKind::Required,
            ));
        } else if !is_valid_email(email) {
            violations.push(FieldViolation::new(
                CredentialField::Email,
                ViolationKind::InvalidFormat,
            ));
        }

        if !self.has_hash() {
            let length = self.plaintext_password().map_or(0, |pw| pw.chars().count());
            if length == 0 {
                violations.push(FieldViolation::new(
                    CredentialField::Password,
                    ViolationKind::Required,
                ));
            } else if !(PASSWORD_MIN_LEN..=PASSWORD_MAX_LEN).contains(&length) {
                violations.push(FieldViolation::new(
                    CredentialField::Password,
                    ViolationKind::LengthOutOfRange {
                        min: PASSWORD_MIN_LEN,
                        max: PASSWORD_MAX_LEN,
                    },
                ));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(CredentialValidationError { violations })
        }
    }

    /// Hash the plaintext password into `password_hash`.
    ///
    /// Does nothing when no non-empty plaintext is present.
    ///
    /// # Errors
    ///
    /// Propagates [`PasswordHashError`] from the hasher.
    pub fn derive_credentials(&mut self) -> Result<(), PasswordHashError> {
        let Some(plaintext) = self.plaintext_password().filter(|pw| !pw.is_empty()) else {
            return Ok(());
        };
        let hash = password::hash_password(plaintext)?;
        self.password_hash = Some(hash);
        Ok(())
    }

    /// Drop the plaintext password. Idempotent.
    pub fn sanitize(&mut self) {
        self.plaintext_password = None;
    }

    /// Return a copy without the plaintext password.
    #[must_use]
    pub fn sanitized(&self) -> Self {
        let mut copy = self.clone();
        copy.sanitize();
        copy
    }

    /// Check `candidate` against the stored hash.
    ///
    /// Returns `false` when no hash is set or the hash is malformed.
    #[must_use]
    pub fn verify_password(&self, candidate: &str) -> bool {
        self.password_hash
            .as_deref()
            .is_some_and(|hash| password::verify_password(candidate, hash))
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("id", &self.id)
            .field("email", &self.email)
            .field(
                "plaintext_password",
                &self.plaintext_password.as_ref().map(|_| "<redacted>"),
            )
            .field(
                "password_hash",
                &self.password_hash.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    fn kinds(error: &CredentialValidationError) -> Vec<(CredentialField, ViolationKind)> {
        error
            .violations()
            .iter()
            .map(|violation| (violation.field, violation.kind))
            .collect()
    }

    #[rstest]
    #[case("a@x.com", "secret")]
    #[case("first.last+tag@example.co.uk", "abcdefghijklmnopqrstuvwxyz1234")]
    #[case("a@x.com", "пароль")]
    fn valid_credentials_pass(#[case] email: &str, #[case] password: &str) {
        Credential::new(email, password)
            .validate()
            .expect("credential should be valid");
    }

    #[rstest]
    #[case("", CredentialField::Email, ViolationKind::Required)]
    #[case("   ", CredentialField::Email, ViolationKind::Required)]
    #[case("not-an-email", CredentialField::Email, ViolationKind::InvalidFormat)]
    #[case("a@b", CredentialField::Email, ViolationKind::InvalidFormat)]
    #[case("a b@x.com", CredentialField::Email, ViolationKind::InvalidFormat)]
    fn invalid_email_is_reported(
        #[case] email: &str,
        #[case] field: CredentialField,
        #[case] kind: ViolationKind,
    ) {
        let err = Credential::new(email, "secret1")
            .validate()
            .expect_err("email should be rejected");
        assert_eq!(kinds(&err), vec![(field, kind)]);
    }

    #[rstest]
    #[case("12345")]
    #[case("abcdefghijklmnopqrstuvwxyz12345")]
    fn password_length_is_bounded(#[case] password: &str) {
        let err = Credential::new("a@x.com", password)
            .validate()
            .expect_err("password should be rejected");
        assert_eq!(
            kinds(&err),
            vec![(
                CredentialField::Password,
                ViolationKind::LengthOutOfRange { min: 6, max: 30 }
            )]
        );
    }

    #[rstest]
    fn all_violations_are_aggregated() {
        let err = Credential::new("", "")
            .validate()
            .expect_err("both fields should fail");
        assert_eq!(
            kinds(&err),
            vec![
                (CredentialField::Email, ViolationKind::Required),
                (CredentialField::Password, ViolationKind::Required),
            ]
        );
        assert!(err.to_string().contains("email is required"));
    }

    #[rstest]
    fn stored_hash_skips_password_rules() {
        let credential = Credential::from_stored(UserId::new(1), "a@x.com", "$argon2id$stub");
        credential.validate().expect("hash satisfies the password rule");
    }

    #[rstest]
    fn derive_without_plaintext_is_a_no_op() {
        let mut credential = Credential::from_stored(UserId::new(1), "a@x.com", "keep");
        credential.derive_credentials().expect("no-op derive");
        assert_eq!(credential.password_hash(), Some("keep"));
    }

    #[rstest]
    fn derive_then_verify() {
        let mut credential = Credential::new("a@x.com", "secret1");
        credential.derive_credentials().expect("derive hash");
        assert!(credential.verify_password("secret1"));
        assert!(!credential.verify_password("secret2"));
    }

    #[rstest]
    fn verify_without_hash_is_false() {
        assert!(!Credential::new("a@x.com", "secret1").verify_password("secret1"));
    }

    #[rstest]
    fn sanitize_is_idempotent() {
        let mut credential = Credential::new("a@x.com", "secret1");
        credential.sanitize();
        credential.sanitize();
        assert!(credential.plaintext_password().is_none());
    }

    #[rstest]
    fn serialisation_omits_password_material() {
        let mut credential = Credential::new("a@x.com", "secret1");
        credential.derive_credentials().expect("derive hash");
        credential.assign_id(UserId::new(3));
        let value = serde_json::to_value(&credential).expect("serialise credential");
        assert_eq!(value, json!({ "id": 3, "email": "a@x.com" }));
    }

    #[rstest]
    fn debug_redacts_password_material() {
        let mut credential = Credential::new("a@x.com", "secret1");
        credential.derive_credentials().expect("derive hash");
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("secret1"));
        assert!(!rendered.contains("argon2"));
    }
}
