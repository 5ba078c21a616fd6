pub mod types;
pub mod queries;

pub use types::*;
pub use queries::*;

use rand::Rng;

/// Generate an opaque event id: 16 random bytes, hex encoded.
pub fn generate_id() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();
    hex::encode(bytes)
}
