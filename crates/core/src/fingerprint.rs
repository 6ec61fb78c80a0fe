//! Device fingerprinting for trial issuance.

use sha2::{Digest, Sha256};

/// Hash the headers that identify a client device into a stable hex digest.
///
/// Missing headers contribute an empty component, so two bare clients share
/// a fingerprint; the IP half of the trial key separates them.
pub fn device_fingerprint(
    user_agent: Option<&str>,
    accept: Option<&str>,
    accept_language: Option<&str>,
    accept_encoding: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    for part in [user_agent, accept, accept_language, accept_encoding] {
        hasher.update(part.unwrap_or("").as_bytes());
        hasher.update([0u8]);
    }
    format!("{:x}", hasher.finalize())
}
