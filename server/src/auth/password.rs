//! Password hashing.
//!
//! New hashes are argon2 PHC strings, so the parameters and salt travel with
//! the hash and old hashes keep verifying if the defaults change. Accounts
//! created before the switch still carry bcrypt (`$2a$` / `$2b$` / `$2y$`)
//! hashes; those verify too and are replaced on the next good login.

use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand_core::OsRng;

const BCRYPT_PREFIXES: &[&str] = &["$2a$", "$2b$", "$2y$"];

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    Ok(Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string())
}

/// Whether `stored_hash` should be replaced by a fresh [`hash_password`].
pub fn needs_rehash(stored_hash: &str) -> bool {
    BCRYPT_PREFIXES.iter().any(|p| stored_hash.starts_with(p))
}

/// False for a wrong password and for a stored value that is neither a PHC
/// nor a bcrypt hash.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    if needs_rehash(stored_hash) {
        return match bcrypt::verify(password, stored_hash) {
            Ok(matches) => matches,
            Err(e) => {
                tracing::warn!(error = %e, "Stored bcrypt hash is malformed");
                false
            }
        };
    }

    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        tracing::warn!("Stored password is not a valid PHC hash");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify() {
        let hash = hash_password("demo123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("demo123", &hash));
        assert!(!verify_password("demo124", &hash));
        assert!(!needs_rehash(&hash));
    }

    #[test]
    fn same_password_gets_distinct_salts() {
        let a = hash_password("hunter2").unwrap();
        let b = hash_password("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "plaintext-from-an-old-row"));
        assert!(!verify_password("", ""));
        assert!(!verify_password("anything", "$2b$10$truncated"));
    }

    #[test]
    fn bcrypt_hashes_verify_and_want_rehash() {
        let hash = bcrypt::hash("demo123", 4).unwrap();
        assert!(hash.starts_with("$2b$"));
        assert!(needs_rehash(&hash));
        assert!(verify_password("demo123", &hash));
        assert!(!verify_password("demo124", &hash));

        // Same password, `$2a$` spelling.
        let legacy = hash.replacen("$2b$", "$2a$", 1);
        assert!(needs_rehash(&legacy));
        assert!(verify_password("demo123", &legacy));
    }
}
