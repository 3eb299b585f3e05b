use anyhow::{Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use sha2::{Digest, Sha256};

/// Reduce the plaintext to a fixed-length hex digest before the slow hash.
/// This only normalizes input length; Argon2 stays the work factor.
fn normalize(plaintext: &str) -> String {
    hex::encode(Sha256::digest(plaintext.as_bytes()))
}

/// Hash a password with Argon2id and a fresh random salt. The returned PHC
/// string embeds the salt and parameters, so verification needs nothing else.
pub fn hash(plaintext: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(normalize(plaintext).as_bytes(), &salt)
        .map_err(|e| anyhow!(e))?;
    Ok(hash.to_string())
}

/// Verify a password against a stored credential. A malformed credential
/// verifies as false rather than erroring.
pub fn verify(plaintext: &str, credential: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(credential) else {
        return false;
    };
    Argon2::default()
        .verify_password(normalize(plaintext).as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verify_roundtrip() {
        let credential = hash("pw123").unwrap();
        assert_ne!(credential, "pw123");
        assert!(verify("pw123", &credential));
        assert!(!verify("pw124", &credential));
    }

    #[test]
    fn salts_make_hashes_unique() {
        let a = hash("same password").unwrap();
        let b = hash("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn malformed_credential_is_false_not_panic() {
        assert!(!verify("pw123", ""));
        assert!(!verify("pw123", "not-a-phc-string"));
        assert!(!verify("pw123", "$argon2id$garbage"));
    }
}
