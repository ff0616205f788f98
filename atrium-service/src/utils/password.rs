use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use std::{fmt, sync::OnceLock};

static DUMMY_HASH: OnceLock<Option<PasswordHashString>> = OnceLock::new();

/// Plain password. Never prints its content.
#[derive(Clone)]
pub struct Password(String);

impl Password {
    pub fn new(password: String) -> Self {
        Self(password)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Password {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Password(***)")
    }
}

/// PHC-formatted Argon2id hash.
#[derive(Debug, Clone)]
pub struct PasswordHashString(String);

impl PasswordHashString {
    pub fn new(hash: String) -> Self {
        Self(hash)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// Hash with Argon2id and a fresh random salt.
pub fn hash_password(password: &Password) -> Result<PasswordHashString, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_str().as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(PasswordHashString::new(hash))
}

/// Constant-time verification. A stored hash that does not parse is an error,
/// not a mismatch.
pub fn verify_password(
    password: &Password,
    password_hash: &PasswordHashString,
) -> Result<bool, anyhow::Error> {
    let parsed = PasswordHash::new(password_hash.as_str())
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {}", e))?;

    Ok(Argon2::default()
        .verify_password(password.as_str().as_bytes(), &parsed)
        .is_ok())
}

fn dummy_hash() -> Option<&'static PasswordHashString> {
    DUMMY_HASH
        .get_or_init(|| hash_password(&Password::new("atrium-dummy-credential".to_string())).ok())
        .as_ref()
}

/// Spend one full Argon2 verification without a stored hash, so a rejected
/// login for an unknown account costs as much as a wrong password.
pub fn verify_against_dummy(password: &Password) {
    if let Some(hash) = dummy_hash() {
        let _ = verify_password(password, hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_argon2id_and_salted() {
        let password = Password::new("hunter22".to_string());
        let a = hash_password(&password).unwrap();
        let b = hash_password(&password).unwrap();

        assert!(a.as_str().starts_with("$argon2id$"));
        assert_ne!(a.as_str(), b.as_str());
    }

    #[test]
    fn verifies_only_the_right_password() {
        let hash = hash_password(&Password::new("hunter22".to_string())).unwrap();
        assert!(verify_password(&Password::new("hunter22".to_string()), &hash).unwrap());
        assert!(!verify_password(&Password::new("hunter23".to_string()), &hash).unwrap());
    }

    #[test]
    fn corrupt_hash_is_an_error() {
        let bad = PasswordHashString::new("plaintext".to_string());
        assert!(verify_password(&Password::new("x".to_string()), &bad).is_err());
    }

    #[test]
    fn dummy_hash_is_a_real_argon2id_hash() {
        let hash = dummy_hash().unwrap();
        assert!(hash.as_str().starts_with("$argon2id$"));
        assert!(std::ptr::eq(hash, dummy_hash().unwrap()));
        assert!(!verify_password(&Password::new("hunter22".to_string()), hash).unwrap());
        verify_against_dummy(&Password::new("hunter22".to_string()));
    }

    #[test]
    fn debug_redacts() {
        let password = Password::new("hunter22".to_string());
        assert_eq!(format!("{:?}", password), "Password(***)");
    }
}
