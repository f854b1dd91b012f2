//! Password hashing with bcrypt.
//!
//! Digests are salted per call and carry their own cost, so verification
//! works regardless of the cost the digest was produced with.

use crate::error::AppError;

/// Work factor used for stored digests (2^12 rounds).
pub const DEFAULT_HASH_COST: u32 = bcrypt::DEFAULT_COST;

/// Derives a salted digest of `password`.
///
/// bcrypt is CPU bound, so the work runs on the blocking pool.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_owned();
    let digest = tokio::task::spawn_blocking(move || bcrypt::hash(password, cost)).await??;
    Ok(digest)
}

/// Checks `password` against a stored digest.
pub async fn verify_password(password: &str, digest: &str) -> Result<bool, AppError> {
    let password = password.to_owned();
    let digest = digest.to_owned();
    let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest)).await??;
    Ok(matches)
}
