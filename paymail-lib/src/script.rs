//! Output scripts, legacy addresses and Bitcoin signed messages.
//!
//! The [`ScriptAdapter`] trait is the seam between the protocol code and the
//! Bitcoin primitives it needs. [`StandardScriptAdapter`] covers standard
//! pay-to-pubkey-hash outputs and compact recoverable message signatures.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::{PaymailError, Result};

/// Version byte of mainnet pay-to-pubkey-hash addresses.
pub const P2PKH_VERSION: u8 = 0x00;

/// Version byte of testnet pay-to-pubkey-hash addresses.
pub const P2PKH_TESTNET_VERSION: u8 = 0x6f;

const OP_DUP: u8 = 0x76;
const OP_HASH160: u8 = 0xa9;
const OP_EQUALVERIFY: u8 = 0x88;
const OP_CHECKSIG: u8 = 0xac;
const PUBKEY_HASH_LEN: usize = 20;

const SIGNED_MESSAGE_MAGIC: &str = "Bitcoin Signed Message:\n";
const COMPACT_SIGNATURE_LEN: usize = 65;
const COMPACT_HEADER_BASE: u8 = 27;

/// Bitcoin script and signature operations used by the protocol.
pub trait ScriptAdapter: Send + Sync {
    /// Legacy address paid by a hex encoded output script.
    fn address_from_script(&self, script_hex: &str) -> Result<String>;

    /// Hex encoded pay-to-pubkey-hash script for an address.
    fn script_from_address(&self, address: &str) -> Result<String>;

    /// Sign `message` with a hex private key, returning a base64 compact signature.
    fn sign_message(&self, private_key_hex: &str, message: &str) -> Result<String>;

    /// Check that `signature` over `message` was made by the key behind `address`.
    fn verify_message(&self, address: &str, signature: &str, message: &str) -> Result<()>;
}

/// Default adapter for pay-to-pubkey-hash outputs.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardScriptAdapter;

impl ScriptAdapter for StandardScriptAdapter {
    fn address_from_script(&self, script_hex: &str) -> Result<String> {
        if script_hex.is_empty() {
            return Err(PaymailError::InvalidScript("missing script".to_string()));
        }
        let script = hex::decode(script_hex)
            .map_err(|e| PaymailError::InvalidScript(format!("invalid hex: {}", e)))?;

        let hash = pubkey_hash_from_script(&script).ok_or_else(|| {
            PaymailError::InvalidScript(format!("no address found in script: {}", script_hex))
        })?;
        Ok(encode_address(hash, P2PKH_VERSION))
    }

    fn script_from_address(&self, address: &str) -> Result<String> {
        let hash = decode_address(address)?;
        let mut script = Vec::with_capacity(25);
        script.extend_from_slice(&[OP_DUP, OP_HASH160, PUBKEY_HASH_LEN as u8]);
        script.extend_from_slice(&hash);
        script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);
        Ok(hex::encode(script))
    }

    fn sign_message(&self, private_key_hex: &str, message: &str) -> Result<String> {
        let key = signing_key(private_key_hex)?;
        let digest = signed_message_hash(message);

        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&digest)
            .map_err(|e| PaymailError::Signature(e.to_string()))?;

        let mut compact = Vec::with_capacity(COMPACT_SIGNATURE_LEN);
        // compressed keys add 4 to the header
        compact.push(COMPACT_HEADER_BASE + 4 + recovery_id.to_byte());
        compact.extend_from_slice(&signature.to_bytes());
        Ok(BASE64.encode(compact))
    }

    fn verify_message(&self, address: &str, signature: &str, message: &str) -> Result<()> {
        let raw = BASE64
            .decode(signature)
            .map_err(|e| PaymailError::Signature(format!("invalid base64 signature: {}", e)))?;
        if raw.len() != COMPACT_SIGNATURE_LEN {
            return Err(PaymailError::Signature(format!(
                "signature must be {} bytes, got {}",
                COMPACT_SIGNATURE_LEN,
                raw.len()
            )));
        }

        let header = raw[0];
        if !(COMPACT_HEADER_BASE..COMPACT_HEADER_BASE + 8).contains(&header) {
            return Err(PaymailError::Signature(format!(
                "invalid signature header byte {}",
                header
            )));
        }
        let compressed = header >= COMPACT_HEADER_BASE + 4;
        let mut recovery_id = RecoveryId::from_byte((header - COMPACT_HEADER_BASE) & 3)
            .ok_or_else(|| PaymailError::Signature("invalid recovery id".to_string()))?;

        let mut sig = Signature::from_slice(&raw[1..])
            .map_err(|e| PaymailError::Signature(e.to_string()))?;
        // Recovery only accepts low-S signatures; negating s flips the parity of R.
        if let Some(normalized) = sig.normalize_s() {
            sig = normalized;
            recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
        }

        let digest = signed_message_hash(message);
        let key = VerifyingKey::recover_from_prehash(&digest, &sig, recovery_id)
            .map_err(|e| PaymailError::Signature(format!("failed to recover public key: {}", e)))?;

        let point = key.to_encoded_point(compressed);
        let recovered = encode_address(hash160(point.as_bytes()), P2PKH_VERSION);
        if recovered != address {
            return Err(PaymailError::Signature(format!(
                "signature does not match address: recovered {} expected {}",
                recovered, address
            )));
        }
        Ok(())
    }
}

/// RIPEMD-160 of SHA-256.
pub fn hash160(data: &[u8]) -> [u8; PUBKEY_HASH_LEN] {
    let mut out = [0u8; PUBKEY_HASH_LEN];
    out.copy_from_slice(&Ripemd160::digest(Sha256::digest(data)));
    out
}

/// Double SHA-256.
pub fn sha256d(data: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(Sha256::digest(data)));
    out
}

/// Base58check address for a public key hash.
pub fn encode_address(pubkey_hash: [u8; PUBKEY_HASH_LEN], version: u8) -> String {
    bs58::encode(pubkey_hash).with_check_version(version).into_string()
}

/// Public key hash carried by a legacy address.
pub fn decode_address(address: &str) -> Result<[u8; PUBKEY_HASH_LEN]> {
    let raw = bs58::decode(address)
        .with_check(None)
        .into_vec()
        .map_err(|e| PaymailError::invalid_data("address", e.to_string()))?;

    match raw.split_first() {
        Some((&version, hash))
            if (version == P2PKH_VERSION || version == P2PKH_TESTNET_VERSION)
                && hash.len() == PUBKEY_HASH_LEN =>
        {
            let mut out = [0u8; PUBKEY_HASH_LEN];
            out.copy_from_slice(hash);
            Ok(out)
        }
        _ => Err(PaymailError::invalid_data(
            "address",
            format!("not a pay-to-pubkey-hash address: {}", address),
        )),
    }
}

/// Compressed public key (hex) for a hex private key.
pub fn pubkey_from_private_key(private_key_hex: &str) -> Result<String> {
    let key = signing_key(private_key_hex)?;
    Ok(hex::encode(key.verifying_key().to_encoded_point(true).as_bytes()))
}

/// Legacy address for a hex encoded public key.
pub fn address_from_pubkey(pubkey_hex: &str) -> Result<String> {
    let bytes = hex::decode(pubkey_hex)?;
    VerifyingKey::from_sec1_bytes(&bytes)
        .map_err(|e| PaymailError::invalid_data("pubkey", e.to_string()))?;
    Ok(encode_address(hash160(&bytes), P2PKH_VERSION))
}

/// Legacy address of the compressed public key for a hex private key.
pub fn address_from_private_key(private_key_hex: &str) -> Result<String> {
    address_from_pubkey(&pubkey_from_private_key(private_key_hex)?)
}

/// A fresh random private key, hex encoded.
pub fn generate_private_key() -> String {
    hex::encode(SigningKey::random(&mut rand::rngs::OsRng).to_bytes())
}

fn signing_key(private_key_hex: &str) -> Result<SigningKey> {
    if private_key_hex.is_empty() {
        return Err(PaymailError::invalid_data("private key", "missing private key"));
    }
    let bytes = hex::decode(private_key_hex)?;
    SigningKey::from_slice(&bytes).map_err(|e| PaymailError::invalid_data("private key", e.to_string()))
}

fn pubkey_hash_from_script(script: &[u8]) -> Option<[u8; PUBKEY_HASH_LEN]> {
    match script {
        [OP_DUP, OP_HASH160, len, hash @ .., OP_EQUALVERIFY, OP_CHECKSIG]
            if *len as usize == PUBKEY_HASH_LEN && hash.len() == PUBKEY_HASH_LEN =>
        {
            let mut out = [0u8; PUBKEY_HASH_LEN];
            out.copy_from_slice(hash);
            Some(out)
        }
        _ => None,
    }
}

fn write_varint(out: &mut Vec<u8>, n: usize) {
    match n {
        0..=0xfc => out.push(n as u8),
        0xfd..=0xffff => {
            out.push(0xfd);
            out.extend_from_slice(&(n as u16).to_le_bytes());
        }
        0x1_0000..=0xffff_ffff => {
            out.push(0xfe);
            out.extend_from_slice(&(n as u32).to_le_bytes());
        }
        _ => {
            out.push(0xff);
            out.extend_from_slice(&(n as u64).to_le_bytes());
        }
    }
}

/// Digest signed for a Bitcoin signed message.
pub fn signed_message_hash(message: &str) -> [u8; 32] {
    let mut buf = Vec::with_capacity(SIGNED_MESSAGE_MAGIC.len() + message.len() + 10);
    write_varint(&mut buf, SIGNED_MESSAGE_MAGIC.len());
    buf.extend_from_slice(SIGNED_MESSAGE_MAGIC.as_bytes());
    write_varint(&mut buf, message.len());
    buf.extend_from_slice(message.as_bytes());
    sha256d(&buf)
}
