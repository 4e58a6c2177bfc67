#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![forbid(unsafe_code)]

use crate::client::ChainClient;
use crate::config::ChainConfig;
use crate::error::{BridgeError, Result};
use crate::types::{QueryOutcome, SignedMessage};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use tracing::{debug, info, warn};

type Blake2b256 = Blake2b<U32>;

/// Signature scheme flag for Ed25519 in a SUI serialized signature.
pub const ED25519_FLAG: u8 = 0x00;
const PERSONAL_MESSAGE_INTENT: [u8; 3] = [3, 0, 0];
const SIGNATURE_LENGTH: usize = 64;
const PUBLIC_KEY_LENGTH: usize = 32;
const SERIALIZED_LENGTH: usize = 1 + SIGNATURE_LENGTH + PUBLIC_KEY_LENGTH;

pub struct SignatureManager<'a, C: ChainClient + ?Sized> {
    config: &'a ChainConfig,
    client: &'a C,
}

impl<'a, C: ChainClient + ?Sized> SignatureManager<'a, C> {
    #[must_use]
    pub const fn new(config: &'a ChainConfig, client: &'a C) -> Self {
        Self { config, client }
    }

    /// Signs `message` as a personal message with the configured key.
    ///
    /// # Errors
    /// Returns `BridgeError::PlaceholderAddress` when the account address was
    /// never derived; nothing is sent to the SDK in that case.
    pub async fn sign_message(&self, message: &str) -> Result<QueryOutcome<SignedMessage>> {
        let address = self.config.account().require_authoritative()?;
        debug!(%address, bytes = message.len(), "signing personal message");
        let outcome = self
            .client
            .sign_message(self.config.settings(), message)
            .await;
        match outcome.failure() {
            Some(failure) => warn!(%address, error = %failure, "message signing failed"),
            None => info!(%address, "message signed"),
        }
        Ok(outcome)
    }

    /// Verifies a signature produced for the configured chain.
    ///
    /// # Errors
    /// See [`verify_personal_message`].
    pub fn verify_message(
        &self,
        message: &str,
        signature: &str,
        public_key: Option<&str>,
    ) -> Result<bool> {
        verify_personal_message(message, signature, public_key)
    }
}

/// Digest a SUI wallet signs for a personal message:
/// `blake2b-256(intent || bcs(message))`.
#[must_use]
pub fn personal_message_digest(message: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(PERSONAL_MESSAGE_INTENT);
    hasher.update(uleb128(message.len()));
    hasher.update(message);
    let mut digest = [0_u8; 32];
    digest.copy_from_slice(&hasher.finalize());
    digest
}

fn uleb128(mut value: usize) -> Vec<u8> {
    let mut out = Vec::with_capacity(4);
    loop {
        let byte = u8::try_from(value & 0x7f).unwrap_or(0);
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Verifies a base64 serialized Ed25519 signature (`flag || sig || pk`) over
/// `message`. When `public_key` is given (hex or base64, with or without the
/// scheme flag) it must equal the key embedded in the signature.
///
/// Returns `Ok(false)` for a well-formed signature that does not verify.
///
/// # Errors
/// Returns `BridgeError::InvalidParameter` for undecodable or malformed input.
pub fn verify_personal_message(
    message: &str,
    signature: &str,
    public_key: Option<&str>,
) -> Result<bool> {
    let serialized = STANDARD
        .decode(signature.trim())
        .map_err(|e| BridgeError::invalid("signature", format!("not base64: {e}")))?;
    if serialized.len() != SERIALIZED_LENGTH {
        return Err(BridgeError::invalid(
            "signature",
            format!(
                "expected {SERIALIZED_LENGTH} bytes, got {}",
                serialized.len()
            ),
        ));
    }
    if serialized[0] != ED25519_FLAG {
        return Err(BridgeError::invalid(
            "signature",
            format!("unsupported signature scheme flag {:#04x}", serialized[0]),
        ));
    }

    let (signature_bytes, embedded_key) = serialized[1..].split_at(SIGNATURE_LENGTH);
    let embedded_key: [u8; PUBLIC_KEY_LENGTH] = embedded_key
        .try_into()
        .map_err(|_| BridgeError::invalid("signature", "truncated public key"))?;

    if let Some(expected) = public_key {
        if decode_public_key(expected)? != embedded_key {
            debug!("supplied public key does not match signature");
            return Ok(false);
        }
    }

    let signature_bytes: [u8; SIGNATURE_LENGTH] = signature_bytes
        .try_into()
        .map_err(|_| BridgeError::invalid("signature", "truncated signature"))?;
    let verifying_key = VerifyingKey::from_bytes(&embedded_key)
        .map_err(|e| BridgeError::invalid("public_key", e.to_string()))?;
    let digest = personal_message_digest(message.as_bytes());

    Ok(verifying_key
        .verify(&digest, &Signature::from_bytes(&signature_bytes))
        .is_ok())
}

fn decode_public_key(raw: &str) -> Result<[u8; PUBLIC_KEY_LENGTH]> {
    let trimmed = raw.trim();
    let hex_digits = trimmed.strip_prefix("0x").unwrap_or(trimmed);
    let bytes = hex::decode(hex_digits)
        .or_else(|_| STANDARD.decode(trimmed))
        .map_err(|_| BridgeError::invalid("public_key", "expected hex or base64"))?;
    let key = match bytes.as_slice() {
        [ED25519_FLAG, rest @ ..] if rest.len() == PUBLIC_KEY_LENGTH => rest,
        other => other,
    };
    key.try_into().map_err(|_| {
        BridgeError::invalid(
            "public_key",
            format!("expected {PUBLIC_KEY_LENGTH} bytes, got {}", key.len()),
        )
    })
}

#[cfg(test)]
pub(crate) fn serialize_for_tests(signing_key: &ed25519_dalek::SigningKey, message: &str) -> String {
    use ed25519_dalek::Signer;
    let signature = signing_key.sign(&personal_message_digest(message.as_bytes()));
    let mut bytes = vec![ED25519_FLAG];
    bytes.extend_from_slice(&signature.to_bytes());
    bytes.extend_from_slice(signing_key.verifying_key().as_bytes());
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::{
        personal_message_digest, serialize_for_tests, uleb128, verify_personal_message,
        SignatureManager,
    };
    use crate::config::{AccountAddress, ChainConfig};
    use crate::error::BridgeError;
    use crate::test_support::{settings_from_env, FakeChainClient};
    use crate::types::Address;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine as _;
    use ed25519_dalek::SigningKey;

    fn signing_key() -> SigningKey {
        SigningKey::from_bytes(&[7_u8; 32])
    }

    #[test]
    fn uleb128_matches_bcs_lengths() {
        assert_eq!(uleb128(0), vec![0x00]);
        assert_eq!(uleb128(127), vec![0x7f]);
        assert_eq!(uleb128(128), vec![0x80, 0x01]);
        assert_eq!(uleb128(300), vec![0xac, 0x02]);
    }

    #[test]
    fn digest_depends_on_message() {
        assert_ne!(personal_message_digest(b"a"), personal_message_digest(b"b"));
    }

    #[test]
    fn valid_signature_verifies_with_and_without_key() {
        let key = signing_key();
        let signature = serialize_for_tests(&key, "hello bridge");
        let pk_hex = hex::encode(key.verifying_key().as_bytes());
        let mut flagged = vec![0_u8];
        flagged.extend_from_slice(key.verifying_key().as_bytes());
        let pk_b64_flagged = STANDARD.encode(flagged);

        assert_eq!(verify_personal_message("hello bridge", &signature, None).ok(), Some(true));
        assert_eq!(
            verify_personal_message("hello bridge", &signature, Some(&pk_hex)).ok(),
            Some(true)
        );
        assert_eq!(
            verify_personal_message("hello bridge", &signature, Some(&pk_b64_flagged)).ok(),
            Some(true)
        );
    }

    #[test]
    fn tampered_message_or_foreign_key_fails() {
        let key = signing_key();
        let signature = serialize_for_tests(&key, "hello bridge");
        let other = SigningKey::from_bytes(&[9_u8; 32]);
        let other_hex = format!("0x{}", hex::encode(other.verifying_key().as_bytes()));

        assert_eq!(verify_personal_message("hello bridgE", &signature, None).ok(), Some(false));
        assert_eq!(
            verify_personal_message("hello bridge", &signature, Some(&other_hex)).ok(),
            Some(false)
        );
    }

    #[test]
    fn malformed_signature_is_invalid_parameter() {
        assert!(matches!(
            verify_personal_message("m", "not base64!", None),
            Err(BridgeError::InvalidParameter { .. })
        ));
        assert!(matches!(
            verify_personal_message("m", &STANDARD.encode([0_u8; 10]), None),
            Err(BridgeError::InvalidParameter { .. })
        ));
    }

    #[tokio::test]
    async fn placeholder_address_is_never_used_for_signing() -> Result<(), String> {
        let settings = settings_from_env(&[])?;
        let client = FakeChainClient::healthy("0x1");
        let config = ChainConfig::with_address(
            settings,
            AccountAddress::Placeholder(Address::parse("0xabc").map_err(|e| e.to_string())?),
        );

        let result = SignatureManager::new(&config, &client).sign_message("hi").await;
        assert!(matches!(result, Err(BridgeError::PlaceholderAddress(_))));
        assert!(client.calls().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn derived_address_signs_through_client() -> Result<(), String> {
        let settings = settings_from_env(&[])?;
        let client = FakeChainClient::healthy("0x1");
        let config = ChainConfig::load(settings, &client).await;

        let signed = SignatureManager::new(&config, &client)
            .sign_message("hello bridge")
            .await
            .map_err(|e| e.to_string())?
            .ok()
            .ok_or("expected signature")?;
        assert_eq!(
            verify_personal_message("hello bridge", &signed.signature, signed.public_key.as_deref())
                .ok(),
            Some(true)
        );
        Ok(())
    }
}
