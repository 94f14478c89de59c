//! Migration checksums
//!
//! SHA-256 of the migration text, hex encoded. A recorded checksum that no
//! longer matches the embedded SQL means the migration was edited after it
//! ran.

use sha2::{Digest, Sha256};

pub fn compute_checksum(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}
