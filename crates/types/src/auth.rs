//! The authentication-level ladder consulted by the signing flow (spec
//! Design Notes, §4.7: "Authentication-level ladder").

use serde::{Deserialize, Serialize};

/// A single authentication factor a party presented when signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Password,
    SecondFactor,
    FaceVerification,
    DocumentVerification,
}

/// A total order of assurance levels; each level subsumes the ones below it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthLevel {
    Basic,
    Enhanced,
    Maximum,
}

/// The minimum level required to sign a contract of this type (spec Design
/// Notes): `maximum` whenever the contract carries a guarantor (the
/// strictest case the source gates on), `basic` otherwise. A contract type
/// or value-based ladder is left to the caller via `requires_guarantee`.
pub fn required_level(requires_guarantee: bool) -> AuthLevel {
    if requires_guarantee {
        AuthLevel::Maximum
    } else {
        AuthLevel::Basic
    }
}

/// Whether the set of methods actually presented satisfies `required`,
/// per the rules in spec Design Notes:
/// `basic ⇐ password`; `enhanced ⇐ password ∧ ≥2 methods`;
/// `maximum ⇐ password ∧ face ∧ document ∧ ≥3 methods`.
pub fn auth_satisfies(provided: &[AuthMethod], required: AuthLevel) -> bool {
    let has_password = provided.contains(&AuthMethod::Password);
    let has_face = provided.contains(&AuthMethod::FaceVerification);
    let has_document = provided.contains(&AuthMethod::DocumentVerification);
    let count = provided.len();

    match required {
        AuthLevel::Basic => has_password,
        AuthLevel::Enhanced => has_password && count >= 2,
        AuthLevel::Maximum => has_password && has_face && has_document && count >= 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_requires_only_password() {
        assert!(auth_satisfies(&[AuthMethod::Password], AuthLevel::Basic));
        assert!(!auth_satisfies(&[AuthMethod::SecondFactor], AuthLevel::Basic));
    }

    #[test]
    fn maximum_requires_password_face_document_and_three_methods() {
        let full = [
            AuthMethod::Password,
            AuthMethod::FaceVerification,
            AuthMethod::DocumentVerification,
        ];
        assert!(auth_satisfies(&full, AuthLevel::Maximum));
        let missing_document = [AuthMethod::Password, AuthMethod::FaceVerification];
        assert!(!auth_satisfies(&missing_document, AuthLevel::Maximum));
    }

    #[test]
    fn enhanced_requires_password_and_second_method() {
        assert!(auth_satisfies(
            &[AuthMethod::Password, AuthMethod::SecondFactor],
            AuthLevel::Enhanced
        ));
        assert!(!auth_satisfies(&[AuthMethod::Password], AuthLevel::Enhanced));
    }
}
