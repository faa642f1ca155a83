use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let argon2 = Argon2::default();
    let salt = SaltString::generate(&mut OsRng);

    Ok(argon2.hash_password(password.as_bytes(), &salt)?.to_string())
}

/// False for a wrong password and for a malformed hash alike.
pub fn verify_password(password: &str, hashed: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hashed) else {
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
    fn test_hash_and_verify() {
        let hashed = hash_password("admin123").expect("hash");
        assert_ne!(hashed, "admin123");
        assert!(verify_password("admin123", &hashed));
        assert!(!verify_password("admin124", &hashed));
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify_password("admin123", "not-a-phc-string"));
    }
}
