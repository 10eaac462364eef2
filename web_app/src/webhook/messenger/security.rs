//! Security utilities for Messenger webhook verification
//!
//! Meta signs every webhook payload with an HMAC keyed by the app secret and
//! sends it as `X-Hub-Signature: sha1=<hex>` and, on newer API versions, also
//! as `X-Hub-Signature-256: sha256=<hex>`.
//!
//! To verify authenticity:
//! 1. Read the signature header (the SHA-256 one wins when both are present)
//! 2. Compute the HMAC of the raw request body with the algorithm it names
//! 3. Compare both digests in constant time
//! 4. Only parse the body when they match
//!
//! # Important Notes
//!
//! - The signature MUST be computed on the raw request body bytes, not parsed JSON
//! - The comparison must be constant-time to prevent timing attacks

use super::errors::AuthError;
use hmac::{
    Hmac, Mac,
    digest::{InvalidLength, KeyInit},
};
use sha1::Sha1;
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Legacy SHA-1 signature header
pub const SIGNATURE_HEADER: &str = "X-Hub-Signature";
/// SHA-256 signature header
pub const SIGNATURE_256_HEADER: &str = "X-Hub-Signature-256";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureAlgorithm {
    Sha1,
    Sha256,
}

impl SignatureAlgorithm {
    /// Parses the algorithm prefix of a signature header, case insensitive
    pub fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("sha1") {
            Some(SignatureAlgorithm::Sha1)
        } else if name.eq_ignore_ascii_case("sha256") {
            Some(SignatureAlgorithm::Sha256)
        } else {
            None
        }
    }

    /// Length in bytes of the HMAC this algorithm produces
    pub fn digest_len(&self) -> usize {
        match self {
            SignatureAlgorithm::Sha1 => 20,
            SignatureAlgorithm::Sha256 => 32,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SignatureAlgorithm::Sha1 => "sha1",
            SignatureAlgorithm::Sha256 => "sha256",
        }
    }
}

/// Verifies a webhook signature header against the raw request body
///
/// # Arguments
///
/// * `secret` - The Facebook app secret
/// * `raw_body` - The raw request body bytes
/// * `signature_header` - Value of the signature header, if the request had one
///
/// # Errors
///
/// * [`AuthError::MissingSignature`] when there is no header
/// * [`AuthError::MalformedSignature`] when it isn't `<sha1|sha256>=<hex>` or the
///   digest length doesn't match the algorithm
/// * [`AuthError::SignatureMismatch`] when the digest doesn't match the body
///
/// # Example
///
/// ```
/// use messenger_bot::webhook::messenger::security::{SignatureAlgorithm, sign, verify};
///
/// let body = br#"{"object":"page","entry":[]}"#;
/// let header = sign(b"app-secret", body, SignatureAlgorithm::Sha1).unwrap();
///
/// assert!(verify(b"app-secret", body, Some(&header)).is_ok());
/// ```
pub fn verify(
    secret: &[u8],
    raw_body: &[u8],
    signature_header: Option<&str>,
) -> Result<(), AuthError> {
    let header = signature_header.ok_or(AuthError::MissingSignature)?;

    let Some((algorithm_name, signature_hex)) = header.trim().split_once('=') else {
        logfire::warn!("Invalid signature header format: expected '<algorithm>=<hex>'");
        return Err(AuthError::MalformedSignature);
    };

    let Some(algorithm) = SignatureAlgorithm::from_name(algorithm_name) else {
        logfire::warn!(
            "Unsupported signature algorithm: {algorithm}",
            algorithm = algorithm_name.to_string()
        );
        return Err(AuthError::MalformedSignature);
    };

    let expected_signature = hex::decode(signature_hex).map_err(|e| {
        logfire::warn!(
            "Failed to decode signature hex: {error}",
            error = e.to_string()
        );
        AuthError::MalformedSignature
    })?;

    if expected_signature.len() != algorithm.digest_len() {
        let expected_len = algorithm.digest_len() as i64;
        logfire::warn!(
            "Signature digest has {len} bytes, {algorithm} needs {expected}",
            len = expected_signature.len() as i64,
            algorithm = algorithm.name().to_string(),
            expected = expected_len
        );
        return Err(AuthError::MalformedSignature);
    }

    let computed_signature = digest(algorithm, secret, raw_body).map_err(|e| {
        logfire::error!(
            "Failed to create HMAC instance: {error}",
            error = e.to_string()
        );
        AuthError::SignatureMismatch
    })?;

    // Constant-time comparison to prevent timing attacks
    let is_valid: bool = computed_signature.ct_eq(&expected_signature[..]).into();

    if !is_valid {
        logfire::warn!("Webhook signature verification failed: signatures do not match");
        return Err(AuthError::SignatureMismatch);
    }

    Ok(())
}

/// Builds the header value Meta would send for `body`, e.g. `sha1=ab12...`
pub fn sign(
    secret: &[u8],
    body: &[u8],
    algorithm: SignatureAlgorithm,
) -> Result<String, InvalidLength> {
    let signature = digest(algorithm, secret, body)?;
    Ok(format!("{}={}", algorithm.name(), hex::encode(signature)))
}

fn digest(
    algorithm: SignatureAlgorithm,
    secret: &[u8],
    body: &[u8],
) -> Result<Vec<u8>, InvalidLength> {
    match algorithm {
        SignatureAlgorithm::Sha1 => mac_bytes::<Hmac<Sha1>>(secret, body),
        SignatureAlgorithm::Sha256 => mac_bytes::<Hmac<Sha256>>(secret, body),
    }
}

fn mac_bytes<M: Mac + KeyInit>(secret: &[u8], body: &[u8]) -> Result<Vec<u8>, InvalidLength> {
    let mut mac = <M as KeyInit>::new_from_slice(secret)?;
    Mac::update(&mut mac, body);
    Ok(mac.finalize().into_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"test_secret";
    const PAYLOAD: &[u8] = b"{\"object\":\"page\",\"entry\":[]}";

    fn header_for(payload: &[u8], algorithm: SignatureAlgorithm) -> String {
        sign(SECRET, payload, algorithm).unwrap()
    }

    #[test]
    fn test_verify_signature_valid() {
        for algorithm in [SignatureAlgorithm::Sha1, SignatureAlgorithm::Sha256] {
            let header = header_for(PAYLOAD, algorithm);
            assert_eq!(verify(SECRET, PAYLOAD, Some(&header)), Ok(()));
        }
    }

    #[test]
    fn test_sign_matches_known_sha1_digest() {
        let mut mac = <Hmac<Sha1> as KeyInit>::new_from_slice(SECRET).unwrap();
        mac.update(PAYLOAD);
        let expected = format!("sha1={}", hex::encode(mac.finalize().into_bytes()));

        assert_eq!(header_for(PAYLOAD, SignatureAlgorithm::Sha1), expected);
    }

    #[test]
    fn test_verify_signature_missing_header() {
        assert_eq!(
            verify(SECRET, PAYLOAD, None),
            Err(AuthError::MissingSignature)
        );
    }

    #[test]
    fn test_verify_signature_invalid_header_format() {
        for header in [
            "abc123",
            "md5=abc123",
            "sha1=zzzz",
            "=abcd",
            "",
            "sha1=",
            "sha256=ab",
        ] {
            assert_eq!(
                verify(SECRET, PAYLOAD, Some(header)),
                Err(AuthError::MalformedSignature),
                "header: {header}"
            );
        }
    }

    #[test]
    fn test_verify_signature_wrong_secret() {
        let header = sign(b"wrong_secret", PAYLOAD, SignatureAlgorithm::Sha1).unwrap();

        assert_eq!(
            verify(SECRET, PAYLOAD, Some(&header)),
            Err(AuthError::SignatureMismatch)
        );
    }

    #[test]
    fn test_verify_signature_algorithm_must_match_digest() {
        let sha1_digest = header_for(PAYLOAD, SignatureAlgorithm::Sha1);
        let relabelled = sha1_digest.replacen("sha1=", "sha256=", 1);

        assert_eq!(
            verify(SECRET, PAYLOAD, Some(&relabelled)),
            Err(AuthError::MalformedSignature)
        );

        let zeroed = format!("sha256={}", "0".repeat(64));

        assert_eq!(
            verify(SECRET, PAYLOAD, Some(&zeroed)),
            Err(AuthError::SignatureMismatch)
        );
    }

    #[test]
    fn test_verify_signature_any_body_bit_flip_fails() {
        let header = header_for(PAYLOAD, SignatureAlgorithm::Sha1);

        for byte in 0..PAYLOAD.len() {
            for bit in 0..8 {
                let mut tampered = PAYLOAD.to_vec();
                tampered[byte] ^= 1 << bit;
                assert_eq!(
                    verify(SECRET, &tampered, Some(&header)),
                    Err(AuthError::SignatureMismatch),
                    "byte {byte} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn test_verify_signature_any_signature_bit_flip_fails() {
        let header = header_for(PAYLOAD, SignatureAlgorithm::Sha256);
        let (prefix, signature_hex) = header.split_once('=').unwrap();
        let signature = hex::decode(signature_hex).unwrap();

        for byte in 0..signature.len() {
            for bit in 0..8 {
                let mut tampered = signature.clone();
                tampered[byte] ^= 1 << bit;
                let tampered_header = format!("{prefix}={}", hex::encode(tampered));
                assert_eq!(
                    verify(SECRET, PAYLOAD, Some(&tampered_header)),
                    Err(AuthError::SignatureMismatch),
                    "byte {byte} bit {bit}"
                );
            }
        }
    }

    #[test]
    fn test_verify_signature_truncated_digest() {
        let header = header_for(PAYLOAD, SignatureAlgorithm::Sha1);
        let truncated = &header[..header.len() - 2];

        assert_eq!(
            verify(SECRET, PAYLOAD, Some(truncated)),
            Err(AuthError::MalformedSignature)
        );
        assert_eq!(
            verify(b"s", b"{}", Some("sha1=")),
            Err(AuthError::MalformedSignature)
        );
    }

    #[test]
    fn test_verify_signature_algorithm_prefix_case_insensitive() {
        let header = header_for(PAYLOAD, SignatureAlgorithm::Sha1).replacen("sha1", "SHA1", 1);

        assert_eq!(verify(SECRET, PAYLOAD, Some(&header)), Ok(()));
    }
}
