use argon2::{
    password_hash::{rand_core::OsRng, PasswordHasher, SaltString},
    Argon2,
};
use rand::RngCore;

/// Length of the random secret behind an unclaimed owner credential.
const OWNER_SECRET_BYTES: usize = 32;

/// Hash for a freshly provisioned owner.
///
/// The hashed secret is 32 random bytes that are dropped right away, so the
/// stored value satisfies the schema but matches no password anyone knows.
/// The owner has to go through a set-password flow before signing in.
pub fn unclaimed_owner_hash() -> Result<String, anyhow::Error> {
    let mut secret = [0u8; OWNER_SECRET_BYTES];
    OsRng.fill_bytes(&mut secret);
    hash_secret(&secret)
}

fn hash_secret(secret: &[u8]) -> Result<String, anyhow::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(secret, &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash owner credential: {}", e))?
        .to_string();
    Ok(hash)
}
