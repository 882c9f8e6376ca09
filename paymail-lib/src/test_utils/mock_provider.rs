//! In-memory provider storage.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

use crate::script::{address_from_private_key, generate_private_key, pubkey_from_private_key};
use crate::server::{
    PaymailAddress, PaymailRepository, ProviderError, ProviderResult, RepositoryProvider,
    TransactionRecord,
};

/// Service provider over an [`InMemoryRepository`].
pub type InMemoryProvider = RepositoryProvider<InMemoryRepository>;

/// Aliases created by [`InMemoryProvider::seeded`]: alias, avatar, id, name.
const SEED_ALIASES: &[(&str, &str, u64, &str)] = &[
    ("mrz", "https://github.com/mrz1836.png", 1, "MrZ"),
    ("satchmo", "https://github.com/rohenaz.png", 2, "Satchmo"),
];

fn lock_error(context: &str) -> ProviderError {
    ProviderError::Storage(format!("InMemoryRepository: lock poisoned during {}", context))
}

/// Paymails and transactions held in memory.
///
/// **Warning**: for testing only; everything is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    paymails: RwLock<HashMap<(String, String), PaymailAddress>>,
    transactions: RwLock<Vec<TransactionRecord>>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a paymail with a fresh key pair.
    pub fn generate_paymail(
        &self,
        domain: &str,
        alias: &str,
        id: u64,
        name: &str,
        avatar: &str,
    ) -> ProviderResult<PaymailAddress> {
        let private_key = generate_private_key();
        let paymail = PaymailAddress {
            alias: alias.to_lowercase(),
            avatar: avatar.to_string(),
            id,
            last_address: address_from_private_key(&private_key)?,
            name: name.to_string(),
            pub_key: pubkey_from_private_key(&private_key)?,
            private_key,
        };

        self.paymails
            .write()
            .map_err(|_| lock_error("generate"))?
            .insert((paymail.alias.clone(), domain.to_lowercase()), paymail.clone());
        Ok(paymail)
    }

    /// Received transactions, oldest first. Empty if the lock is poisoned.
    pub fn transactions(&self) -> Vec<TransactionRecord> {
        self.transactions
            .read()
            .map(|t| t.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl PaymailRepository for InMemoryRepository {
    async fn get_paymail(&self, alias: &str, domain: &str) -> ProviderResult<Option<PaymailAddress>> {
        let paymails = self.paymails.read().map_err(|_| lock_error("get"))?;
        Ok(paymails
            .get(&(alias.to_lowercase(), domain.to_lowercase()))
            .cloned())
    }

    async fn save_paymail(&self, domain: &str, paymail: PaymailAddress) -> ProviderResult<()> {
        self.paymails
            .write()
            .map_err(|_| lock_error("save"))?
            .insert((paymail.alias.to_lowercase(), domain.to_lowercase()), paymail);
        Ok(())
    }

    async fn save_transaction(&self, record: TransactionRecord) -> ProviderResult<()> {
        self.transactions
            .write()
            .map_err(|_| lock_error("save transaction"))?
            .push(record);
        Ok(())
    }
}

impl RepositoryProvider<InMemoryRepository> {
    /// Provider hosting "mrz" and "satchmo" on `domain`, each with a fresh key.
    pub fn seeded(domain: &str) -> ProviderResult<Self> {
        let repository = InMemoryRepository::new();
        for (alias, avatar, id, name) in SEED_ALIASES {
            repository.generate_paymail(domain, alias, *id, name, avatar)?;
        }
        Ok(Self::new(repository))
    }
}
