//! Password hashing façade: owns the salt byte source, validates inputs,
//! and drives hash generation and verification.

use std::fmt;

use rand::rngs::ThreadRng;
use rand::Rng;

use crate::bcrypt::{
    decode_bcrypt, encode_bcrypt, gen_hash, EncodedHash, Salt, MAX_COST, MIN_COST, SALT_SIZE,
};

/// A bcrypt hashing error.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BcryptError {
    /// The password was empty.
    EmptyPassword,
    /// The cost was outside `[MIN_COST, MAX_COST]`.
    InvalidCost(u32),
}

impl fmt::Display for BcryptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BcryptError::EmptyPassword => write!(f, "password cannot be empty"),
            BcryptError::InvalidCost(cost) => {
                write!(f, "cost {} is outside [{}, {}]", cost, MIN_COST, MAX_COST)
            }
        }
    }
}

impl std::error::Error for BcryptError {}

/// A source of salt material, one byte per call.
///
/// Implementing this on a deterministic stream is how tests pin the salt a
/// hasher will use.
pub trait ByteSource {
    /// Produces the next byte.
    fn next_byte(&mut self) -> u8;
}

/// The default byte source, backed by the thread-local cryptographic
/// generator.
pub struct SystemSource {
    rng: ThreadRng,
}

impl SystemSource {
    /// Creates a source seeded from the operating system.
    pub fn new() -> Self {
        SystemSource {
            rng: rand::thread_rng(),
        }
    }
}

impl Default for SystemSource {
    fn default() -> Self {
        SystemSource::new()
    }
}

impl ByteSource for SystemSource {
    fn next_byte(&mut self) -> u8 {
        self.rng.gen()
    }
}

/// Hashes and verifies passwords with bcrypt, always producing and only
/// accepting version 2b. Aside from the byte source the hasher holds no
/// mutable state.
pub struct PasswordHasher<S = SystemSource> {
    source: S,
}

impl PasswordHasher<SystemSource> {
    /// Creates a hasher whose salts come from [`SystemSource`].
    pub fn new() -> Self {
        PasswordHasher {
            source: SystemSource::new(),
        }
    }
}

impl Default for PasswordHasher<SystemSource> {
    fn default() -> Self {
        PasswordHasher::new()
    }
}

impl<S: ByteSource> PasswordHasher<S> {
    /// Creates a hasher with a caller-provided byte source.
    pub fn with_source(source: S) -> Self {
        PasswordHasher { source }
    }

    /// Pulls 16 bytes of salt from the source.
    fn gen_salt(&mut self) -> Salt {
        let mut salt = [0u8; SALT_SIZE];
        for byte in &mut salt {
            *byte = self.source.next_byte();
        }
        salt
    }

    /// Hashes `password` under a fresh salt, returning the 60-byte encoded
    /// form. Fails if the password is empty or `cost` is outside
    /// `[MIN_COST, MAX_COST]`.
    pub fn generate<B: AsRef<[u8]>>(
        &mut self,
        password: B,
        cost: u32,
    ) -> Result<EncodedHash, BcryptError> {
        let password = password.as_ref();
        if password.is_empty() {
            return Err(BcryptError::EmptyPassword);
        }
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(BcryptError::InvalidCost(cost));
        }

        let salt = self.gen_salt();
        let pwd_hash = gen_hash(password, &salt, cost);
        Ok(encode_bcrypt(&pwd_hash, &salt, cost))
    }

    /// Returns whether `password` matches the encoded hash `arr`.
    ///
    /// Total: an empty password, unparseable framing, or a mismatch all
    /// yield `false`. Callers never need to distinguish a wrong password
    /// from a garbage hash.
    pub fn verify<B: AsRef<[u8]>>(&self, password: B, arr: &EncodedHash) -> bool {
        let password = password.as_ref();
        if password.is_empty() {
            return false;
        }
        let Some(params) = decode_bcrypt(arr) else {
            return false;
        };
        let pwd_hash = gen_hash(password, &params.salt, params.cost);
        constant_time_eq(&pwd_hash, &params.pwd_hash)
    }
}

// Comparison without data-dependent early exit.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
