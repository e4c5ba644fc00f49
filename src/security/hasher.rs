//! Credential Hasher
//!
//! Argon2id key derivation over a per-user random salt. Stored hashes are
//! raw derived bytes, the salt lives next to them in its own column.

use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use rand::RngCore;

/// Salt length in bytes
pub const SALT_LEN: usize = 16;

/// Derived hash length in bytes
pub const HASH_LEN: usize = 32;

/// Errors raised while deriving a hash
#[derive(Debug, thiserror::Error)]
pub enum HashingError {
    #[error("Invalid hashing parameters: {0}")]
    InvalidParams(String),

    #[error("Derivation failed: {0}")]
    Derivation(String),

    #[error("Hashing task aborted: {0}")]
    TaskAborted(String),

    #[error("Stored credential has invalid length {found}, expected {expected}")]
    InvalidLength { expected: usize, found: usize },
}

/// Argon2 cost parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashingParams {
    /// Memory cost in KiB
    pub memory_kib: u32,
    /// Number of passes
    pub iterations: u32,
    /// Degree of parallelism (lanes)
    pub parallelism: u32,
}

impl Default for HashingParams {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

/// Random per-user salt
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Salt([u8; SALT_LEN]);

impl Salt {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for Salt {
    type Error = HashingError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; SALT_LEN] = bytes.try_into().map_err(|_| HashingError::InvalidLength {
            expected: SALT_LEN,
            found: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

impl std::fmt::Debug for Salt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Salt([REDACTED])")
    }
}

/// Fixed-length derived password hash
#[derive(Clone, Copy)]
pub struct PasswordHash([u8; HASH_LEN]);

impl PasswordHash {
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl TryFrom<&[u8]> for PasswordHash {
    type Error = HashingError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let arr: [u8; HASH_LEN] = bytes.try_into().map_err(|_| HashingError::InvalidLength {
            expected: HASH_LEN,
            found: bytes.len(),
        })?;
        Ok(Self(arr))
    }
}

// Constant-time so that equality checks on hashes never leak a prefix match
impl PartialEq for PasswordHash {
    fn eq(&self, other: &Self) -> bool {
        constant_time_eq::constant_time_eq(&self.0, &other.0)
    }
}

impl Eq for PasswordHash {}

impl std::fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}

/// Derives and verifies password hashes.
///
/// Cheap to clone; the Argon2 context only carries its parameters.
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    params: HashingParams,
}

impl std::fmt::Debug for CredentialHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialHasher")
            .field("params", &self.params)
            .finish()
    }
}

impl CredentialHasher {
    /// Build a hasher, rejecting parameters Argon2 cannot run with
    pub fn new(params: HashingParams) -> Result<Self, HashingError> {
        let argon_params = Params::new(
            params.memory_kib,
            params.iterations,
            params.parallelism,
            Some(HASH_LEN),
        )
        .map_err(|e| HashingError::InvalidParams(e.to_string()))?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, argon_params),
            params,
        })
    }

    pub fn params(&self) -> HashingParams {
        self.params
    }

    /// Fresh salt from the OS CSPRNG
    pub fn generate_salt(&self) -> Salt {
        let mut bytes = [0u8; SALT_LEN];
        OsRng.fill_bytes(&mut bytes);
        Salt(bytes)
    }

    /// Derive the hash of `password` under `salt`.
    ///
    /// Deterministic for a given password, salt and parameter set. This is
    /// CPU and memory heavy; async callers should go through
    /// [`CredentialHasher::derive_blocking`].
    pub fn derive(&self, password: &str, salt: &Salt) -> Result<PasswordHash, HashingError> {
        let mut out = [0u8; HASH_LEN];
        self.argon2
            .hash_password_into(password.as_bytes(), salt.as_bytes(), &mut out)
            .map_err(|e| HashingError::Derivation(e.to_string()))?;
        Ok(PasswordHash(out))
    }

    /// Check `password` against a stored salt and hash in constant time
    pub fn verify(
        &self,
        password: &str,
        salt: &Salt,
        expected: &PasswordHash,
    ) -> Result<bool, HashingError> {
        let candidate = self.derive(password, salt)?;
        Ok(candidate == *expected)
    }

    /// [`derive`](Self::derive) on the blocking thread pool.
    ///
    /// Takes the password by value so the plaintext is dropped as soon as
    /// the derivation finishes.
    pub async fn derive_blocking(
        &self,
        password: String,
        salt: Salt,
    ) -> Result<PasswordHash, HashingError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.derive(&password, &salt))
            .await
            .map_err(|e| HashingError::TaskAborted(e.to_string()))?
    }

    /// [`verify`](Self::verify) on the blocking thread pool
    pub async fn verify_blocking(
        &self,
        password: String,
        salt: Salt,
        expected: PasswordHash,
    ) -> Result<bool, HashingError> {
        let hasher = self.clone();
        tokio::task::spawn_blocking(move || hasher.verify(&password, &salt, &expected))
            .await
            .map_err(|e| HashingError::TaskAborted(e.to_string()))?
    }
}
