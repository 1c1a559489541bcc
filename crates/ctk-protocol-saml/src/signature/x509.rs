//! Verification against an X.509 signing certificate.

use aws_lc_rs::signature::{
    UnparsedPublicKey, VerificationAlgorithm, ECDSA_P256_SHA256_ASN1, ECDSA_P384_SHA384_ASN1,
    ECDSA_P521_SHA512_ASN1, RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
    RSA_PKCS1_2048_8192_SHA256, RSA_PKCS1_2048_8192_SHA384, RSA_PKCS1_2048_8192_SHA512,
};
use x509_parser::prelude::{FromDer, X509Certificate};

use super::{SignatureAlgorithm, SignatureVerifier};
use crate::error::{SignatureError, SignatureResult};

/// Verifies signatures with the public key of a DER encoded certificate.
#[derive(Debug, Clone, Copy, Default)]
pub struct X509SignatureVerifier;

impl X509SignatureVerifier {
    /// Creates the verifier.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl SignatureVerifier for X509SignatureVerifier {
    fn verify(
        &self,
        signed: &[u8],
        algorithm: &str,
        signature: &[u8],
        key: &[u8],
    ) -> SignatureResult<bool> {
        let algorithm = SignatureAlgorithm::from_uri(algorithm)
            .ok_or_else(|| SignatureError::UnsupportedAlgorithm(algorithm.to_string()))?;

        let (_, cert) = X509Certificate::from_der(key)
            .map_err(|e| SignatureError::InvalidKey(format!("certificate: {e}")))?;
        let public_key = &cert.public_key().subject_public_key.data;

        let verification_alg: &'static dyn VerificationAlgorithm = match algorithm {
            SignatureAlgorithm::RsaSha1 => &RSA_PKCS1_2048_8192_SHA1_FOR_LEGACY_USE_ONLY,
            SignatureAlgorithm::RsaSha256 => &RSA_PKCS1_2048_8192_SHA256,
            SignatureAlgorithm::RsaSha384 => &RSA_PKCS1_2048_8192_SHA384,
            SignatureAlgorithm::RsaSha512 => &RSA_PKCS1_2048_8192_SHA512,
            SignatureAlgorithm::EcdsaSha256 => &ECDSA_P256_SHA256_ASN1,
            SignatureAlgorithm::EcdsaSha384 => &ECDSA_P384_SHA384_ASN1,
            SignatureAlgorithm::EcdsaSha512 => &ECDSA_P521_SHA512_ASN1,
        };

        let public_key = UnparsedPublicKey::new(verification_alg, public_key.as_ref());
        match public_key.verify(signed, signature) {
            Ok(()) => Ok(true),
            Err(_) => Ok(false),
        }
    }
}
