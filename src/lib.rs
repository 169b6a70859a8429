//! Password hashing with bcrypt, version 2b.
//!
//! A hash is a 60-byte `$2b$CC$...` string embedding the algorithm version,
//! the work factor, the salt, and the derived key. Generation pulls 16 bytes
//! of salt from the hasher's byte source, runs the expensive Blowfish key
//! schedule `2^cost` times, and frames the result with bcrypt's custom
//! base 64 alphabet. Verification decodes a prior hash and recomputes it.
//!
//! Only the first 72 bytes of a password take part in the computation;
//! legacy variants (2, 2a, 2x, 2y) are neither produced nor accepted.
//!
//! ```
//! use bcrypt_hasher::PasswordHasher;
//!
//! let mut hasher = PasswordHasher::new();
//! let hash = hasher.generate("hunter2", 4)?;
//! assert!(hasher.verify("hunter2", &hash));
//! assert!(!hasher.verify("hunter3", &hash));
//! # Ok::<(), bcrypt_hasher::BcryptError>(())
//! ```

mod b64;
mod bcrypt;
mod blowfish;
mod consts;
mod hasher;

pub use crate::bcrypt::{
    as_str, decode_bcrypt, encode_bcrypt, EncodedHash, HashParams, PwdHash, Salt, DEFAULT_COST,
    ENCODED_SIZE, HASH_SIZE, MAX_COST, MIN_COST, SALT_SIZE,
};
pub use crate::hasher::{BcryptError, ByteSource, PasswordHasher, SystemSource};
