//! BRFC specification catalog.
//!
//! A BRFC id is derived from a specification's title, author and version:
//! the first 12 hex characters of the byte-reversed double SHA-256 of the
//! trimmed fields concatenated together.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::{PaymailError, Result};

/// Established alias for the public key infrastructure capability.
pub const BRFC_PKI: &str = "pki";
/// BRFC id for public key infrastructure.
pub const BRFC_PKI_ALTERNATE: &str = "0c4339ef99c2";
/// Established alias for basic address resolution.
pub const BRFC_PAYMENT_DESTINATION: &str = "paymentDestination";
/// BRFC id for basic address resolution.
pub const BRFC_BASIC_ADDRESS_RESOLUTION: &str = "759684b1a19a";
/// BRFC id for sender validation.
pub const BRFC_SENDER_VALIDATION: &str = "6745385c3fc0";
/// BRFC id for verifying a public key owner.
pub const BRFC_VERIFY_PUBLIC_KEY_OWNER: &str = "a9f510c16bde";
/// BRFC id for the public profile.
pub const BRFC_PUBLIC_PROFILE: &str = "f12f968c92d6";
/// BRFC id for P2P payment destinations.
pub const BRFC_P2P_PAYMENT_DESTINATION: &str = "2a40af698840";
/// BRFC id for P2P transactions.
pub const BRFC_P2P_TRANSACTIONS: &str = "5f1323cddf31";
/// BRFC id for receiver approvals.
pub const BRFC_RECEIVER_APPROVALS: &str = "3d7c2ca83a46";

/// A single BRFC specification.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BrfcSpec {
    /// Established short alias, if any.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alias: String,
    /// Author of the specification.
    #[serde(default)]
    pub author: String,
    /// 12 character BRFC id.
    #[serde(default)]
    pub id: String,
    /// Ids this specification replaces.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub supersedes: Vec<String>,
    /// Title of the specification.
    #[serde(default)]
    pub title: String,
    /// Location of the specification document.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub url: String,
    /// Version label.
    #[serde(default)]
    pub version: String,
    /// Set once the id has been checked against the fields.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub valid: bool,
}

impl BrfcSpec {
    /// Create a spec without an id; call [`generate`](Self::generate) to fill it in.
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Compute the BRFC id for this spec's fields.
    pub fn compute_id(&self) -> Result<String> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(PaymailError::invalid_data("brfc title", "length: 0"));
        }

        let preimage = format!("{}{}{}", title, self.author.trim(), self.version.trim());
        let mut hash = Sha256::digest(Sha256::digest(preimage.as_bytes()));
        hash.reverse();
        let mut id = hex::encode(hash);
        id.truncate(12);
        Ok(id)
    }

    /// Generate and store the id.
    pub fn generate(&mut self) -> Result<()> {
        self.id = self.compute_id()?;
        self.valid = true;
        Ok(())
    }

    /// Check the stored id against the fields.
    ///
    /// Returns whether the id matched and the id that was computed.
    pub fn validate(&self) -> Result<(bool, String)> {
        let computed = self.compute_id()?;
        Ok((computed == self.id, computed))
    }
}

// (id, alias, title, author, version, url)
const KNOWN_SPECIFICATIONS: &[(&str, &str, &str, &str, &str, &str)] = &[
    (
        "57dd1f54fc67",
        "",
        "BRFC Specifications",
        "andy (nChain)",
        "1",
        "http://bsvalias.org/01-02-brfc-id-assignment.html",
    ),
    (
        "74524c4d6274",
        "",
        "bsvalias Payment Addressing (PayTo Protocol Prefix)",
        "andy (nChain)",
        "1",
        "http://bsvalias.org/04-04-payto-protocol-prefix.html",
    ),
    (
        "0036f9b8860f",
        "",
        "bsvalias Integration with Simplified Payment Protocol",
        "andy (nChain)",
        "1",
        "http://bsvalias.org/04-05-integration-with-simplified-payment-protocol.html",
    ),
    (
        "b2aa66e26b43",
        "",
        "bsvalias Service Discovery",
        "andy (nChain)",
        "1",
        "http://bsvalias.org/02-service-discovery.html",
    ),
    (
        BRFC_PKI_ALTERNATE,
        BRFC_PKI,
        "bsvalias Public Key Infrastructure",
        "andy (nChain)",
        "1",
        "http://bsvalias.org/03-public-key-infrastructure.html",
    ),
    (
        BRFC_BASIC_ADDRESS_RESOLUTION,
        BRFC_PAYMENT_DESTINATION,
        "bsvalias Payment Addressing (Basic Address Resolution)",
        "andy (nChain)",
        "1",
        "http://bsvalias.org/04-01-basic-address-resolution.html",
    ),
    (
        BRFC_SENDER_VALIDATION,
        "",
        "bsvalias Payment Addressing (Payer Validation)",
        "andy (nChain)",
        "",
        "http://bsvalias.org/04-02-sender-validation.html",
    ),
    (
        BRFC_RECEIVER_APPROVALS,
        "",
        "bsvalias Payment Addressing (Receiver Approvals)",
        "andy (nChain)",
        "1",
        "http://bsvalias.org/04-03-receiver-approvals.html",
    ),
    (
        BRFC_VERIFY_PUBLIC_KEY_OWNER,
        "",
        "Verify Public Key Owner",
        "",
        "",
        "http://bsvalias.org/05-verify-public-key-owner.html",
    ),
    (
        BRFC_PUBLIC_PROFILE,
        "",
        "Public Profile (Name & Avatar)",
        "Ryan X. Charles (Money Button)",
        "1",
        "https://github.com/bitcoin-sv-specs/brfc-paymail/pull/7/files",
    ),
    (
        BRFC_P2P_PAYMENT_DESTINATION,
        "",
        "P2P Payment Destination",
        "Ryan X. Charles (Money Button)",
        "1",
        "https://docs.moneybutton.com/docs/paymail-07-p2p-payment-destination.html",
    ),
    (
        BRFC_P2P_TRANSACTIONS,
        "",
        "P2P Transactions",
        "Ryan X. Charles (Money Button)",
        "1",
        "https://docs.moneybutton.com/docs/paymail-06-p2p-transactions.html",
    ),
];

/// The bundled catalog of known specifications.
pub fn default_brfcs() -> Vec<BrfcSpec> {
    KNOWN_SPECIFICATIONS
        .iter()
        .map(|(id, alias, title, author, version, url)| BrfcSpec {
            alias: alias.to_string(),
            author: author.to_string(),
            id: id.to_string(),
            supersedes: Vec::new(),
            title: title.to_string(),
            url: url.to_string(),
            version: version.to_string(),
            valid: true,
        })
        .collect()
}

/// Load the bundled catalog followed by any additional specs given as a JSON array.
///
/// Additional specs without an id get one generated; specs with an id must
/// validate. Entries are appended as-is, so ids may repeat.
pub fn load_brfcs(additional_specifications: &str) -> Result<Vec<BrfcSpec>> {
    let mut specs = default_brfcs();
    if additional_specifications.trim().is_empty() {
        return Ok(specs);
    }

    let extra: Vec<BrfcSpec> = serde_json::from_str(additional_specifications)?;
    for mut spec in extra {
        if spec.id.is_empty() {
            spec.generate()?;
        } else {
            let (valid, computed) = spec.validate()?;
            if !valid {
                return Err(PaymailError::ValidationFailed(format!(
                    "brfc: [{}] is invalid - id returned: {} vs {}",
                    spec.title, computed, spec.id
                )));
            }
            spec.valid = true;
        }
        specs.push(spec);
    }

    Ok(specs)
}

/// Every spec in `specs` whose id or alias equals `key`.
pub fn find_brfcs<'a>(specs: &'a [BrfcSpec], key: &str) -> Vec<&'a BrfcSpec> {
    specs
        .iter()
        .filter(|spec| spec.id == key || (!spec.alias.is_empty() && spec.alias == key))
        .collect()
}
