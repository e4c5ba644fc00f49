//! Credential security
//!
//! Salted, memory-hard password derivation.

mod hasher;

pub use hasher::{
    CredentialHasher, HashingError, HashingParams, PasswordHash, Salt, HASH_LEN, SALT_LEN,
};
