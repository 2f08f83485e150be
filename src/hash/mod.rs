//! hash
//!
//! Order-independent repository hashing.
//!
//! # Algorithm
//!
//! The running digest starts as `size` zero bytes. Each element pulled from
//! the source is hashed on its own with a fresh hasher, and the element digest
//! is XORed into the running digest. XOR is commutative, associative and
//! self-inverse, so:
//!
//! - the empty source hashes to all zeros
//! - an element added twice cancels out
//! - element order does not matter
//! - `append(hash(a), b) == hash(a ++ b)`
//!
//! # Element encoding
//!
//! References are encoded as `"<full ref name>:<target sha>"` and the head
//! pointer as `"HEAD:<default branch>"`. See [`serialize_reference`] and
//! [`serialize_head`].
//!
//! # Example
//!
//! ```
//! use gitweave::hash::{Hasher, HashType, AggregationType};
//!
//! let hasher = Hasher::new(HashType::Sha256, AggregationType::Xor);
//! let empty = hasher.hash(std::iter::empty::<Result<Vec<u8>, ()>>()).unwrap();
//! assert_eq!(empty, vec![0u8; 32]);
//!
//! let twice = hasher
//!     .hash(vec![Ok::<_, ()>(b"x".to_vec()), Ok(b"x".to_vec())])
//!     .unwrap();
//! assert_eq!(twice, vec![0u8; 32]);
//! ```

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use thiserror::Error;

/// Errors parsing hash settings.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
    #[error("unknown hash type '{0}' (expected sha256 or sha512)")]
    UnknownHashType(String),

    #[error("unknown aggregation type '{0}' (expected xor)")]
    UnknownAggregation(String),
}

/// Digest applied to each element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashType {
    #[default]
    Sha256,
    Sha512,
}

impl HashType {
    /// Digest length in bytes.
    pub fn size(self) -> usize {
        match self {
            HashType::Sha256 => 32,
            HashType::Sha512 => 64,
        }
    }

    fn digest(self, element: &[u8]) -> Vec<u8> {
        match self {
            HashType::Sha256 => Sha256::digest(element).to_vec(),
            HashType::Sha512 => Sha512::digest(element).to_vec(),
        }
    }
}

impl std::str::FromStr for HashType {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "sha256" => Ok(HashType::Sha256),
            "sha512" => Ok(HashType::Sha512),
            _ => Err(HashError::UnknownHashType(s.to_string())),
        }
    }
}

/// How element digests are combined.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    #[default]
    Xor,
}

impl std::str::FromStr for AggregationType {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xor" => Ok(AggregationType::Xor),
            _ => Err(HashError::UnknownAggregation(s.to_string())),
        }
    }
}

/// XOR `value` into `acc`, zero-extending whichever is shorter.
fn xor_into(acc: &mut Vec<u8>, value: &[u8]) {
    if value.len() > acc.len() {
        acc.resize(value.len(), 0);
    }
    for (a, v) in acc.iter_mut().zip(value) {
        *a ^= v;
    }
}

/// Aggregating hasher over a pull-based element source.
///
/// Holds no per-aggregation state, so one instance can serve concurrent
/// aggregations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Hasher {
    hash_type: HashType,
    aggregation: AggregationType,
}

impl Hasher {
    pub fn new(hash_type: HashType, aggregation: AggregationType) -> Self {
        Self {
            hash_type,
            aggregation,
        }
    }

    /// Length of the digests this hasher produces.
    pub fn size(&self) -> usize {
        self.hash_type.size()
    }

    /// Hash every element of `source`.
    ///
    /// # Errors
    ///
    /// Returns the first error the source yields.
    pub fn hash<S, E>(&self, source: S) -> Result<Vec<u8>, E>
    where
        S: IntoIterator<Item = Result<Vec<u8>, E>>,
    {
        self.append(&vec![0u8; self.size()], source)
    }

    /// Extend a previous digest with more elements.
    ///
    /// # Errors
    ///
    /// Returns the first error the source yields.
    pub fn append<S, E>(&self, prior: &[u8], source: S) -> Result<Vec<u8>, E>
    where
        S: IntoIterator<Item = Result<Vec<u8>, E>>,
    {
        let mut acc = prior.to_vec();
        for element in source {
            let digest = self.hash_type.digest(&element?);
            match self.aggregation {
                AggregationType::Xor => xor_into(&mut acc, &digest),
            }
        }
        Ok(acc)
    }
}

/// `"<refname>:<sha>"`.
pub fn serialize_reference(refname: &str, sha: &str) -> Vec<u8> {
    format!("{refname}:{sha}").into_bytes()
}

/// `"HEAD:<default branch>"`.
pub fn serialize_head(default_branch: &str) -> Vec<u8> {
    format!("HEAD:{default_branch}").into_bytes()
}
