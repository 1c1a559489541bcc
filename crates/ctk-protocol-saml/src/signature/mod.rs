//! Signature verification contract.
//!
//! Decoding a redirect response checks the query-string signature, but the
//! cryptography itself is delegated to a [`SignatureVerifier`]. The
//! workspace ships [`X509SignatureVerifier`], which verifies against the
//! signing certificate published in the IdP metadata.
//!
//! # Signature Algorithms
//!
//! - RSA-SHA1 (legacy, still accepted on the wire)
//! - RSA-SHA256, RSA-SHA384, RSA-SHA512
//! - ECDSA-SHA256, ECDSA-SHA384, ECDSA-SHA512

mod x509;

pub use x509::X509SignatureVerifier;

use crate::constants::signature_algorithms;
use crate::error::SignatureResult;

/// Signature algorithm selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    /// RSA with SHA-256.
    RsaSha256,
    /// RSA with SHA-384.
    RsaSha384,
    /// RSA with SHA-512.
    RsaSha512,
    /// ECDSA with SHA-256.
    EcdsaSha256,
    /// ECDSA with SHA-384.
    EcdsaSha384,
    /// ECDSA with SHA-512.
    EcdsaSha512,
    /// Legacy RSA with SHA-1.
    RsaSha1,
}

impl SignatureAlgorithm {
    /// Returns the URI for this signature algorithm.
    #[must_use]
    pub const fn uri(&self) -> &'static str {
        match self {
            Self::RsaSha256 => signature_algorithms::RSA_SHA256,
            Self::RsaSha384 => signature_algorithms::RSA_SHA384,
            Self::RsaSha512 => signature_algorithms::RSA_SHA512,
            Self::EcdsaSha256 => signature_algorithms::ECDSA_SHA256,
            Self::EcdsaSha384 => signature_algorithms::ECDSA_SHA384,
            Self::EcdsaSha512 => signature_algorithms::ECDSA_SHA512,
            Self::RsaSha1 => signature_algorithms::RSA_SHA1,
        }
    }

    /// Parses a signature algorithm from its URI.
    #[must_use]
    pub fn from_uri(uri: &str) -> Option<Self> {
        match uri {
            signature_algorithms::RSA_SHA256 => Some(Self::RsaSha256),
            signature_algorithms::RSA_SHA384 => Some(Self::RsaSha384),
            signature_algorithms::RSA_SHA512 => Some(Self::RsaSha512),
            signature_algorithms::ECDSA_SHA256 => Some(Self::EcdsaSha256),
            signature_algorithms::ECDSA_SHA384 => Some(Self::EcdsaSha384),
            signature_algorithms::ECDSA_SHA512 => Some(Self::EcdsaSha512),
            signature_algorithms::RSA_SHA1 => Some(Self::RsaSha1),
            _ => None,
        }
    }

    /// Returns true if this algorithm uses RSA.
    #[must_use]
    pub const fn is_rsa(&self) -> bool {
        matches!(
            self,
            Self::RsaSha256 | Self::RsaSha384 | Self::RsaSha512 | Self::RsaSha1
        )
    }

    /// Returns true if this algorithm uses ECDSA.
    #[must_use]
    pub const fn is_ecdsa(&self) -> bool {
        matches!(
            self,
            Self::EcdsaSha256 | Self::EcdsaSha384 | Self::EcdsaSha512
        )
    }
}

/// Verifies a detached signature over raw bytes.
///
/// Implementations return `Ok(false)` for a signature that does not verify
/// and reserve `Err` for unusable inputs: an unknown algorithm or key
/// material that cannot be parsed.
pub trait SignatureVerifier: Send + Sync {
    /// Verifies `signature` over `signed` using `algorithm` (a URI) and
    /// `key` (DER certificate bytes for the shipped verifier).
    fn verify(
        &self,
        signed: &[u8],
        algorithm: &str,
        signature: &[u8],
        key: &[u8],
    ) -> SignatureResult<bool>;
}

/// A verifier paired with the key it should verify against.
#[derive(Clone, Copy)]
pub struct SignatureCheck<'a> {
    /// The verifier.
    pub verifier: &'a dyn SignatureVerifier,
    /// Key material handed to the verifier.
    pub key: &'a [u8],
}

impl std::fmt::Debug for SignatureCheck<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignatureCheck")
            .field("key_len", &self.key.len())
            .finish_non_exhaustive()
    }
}
