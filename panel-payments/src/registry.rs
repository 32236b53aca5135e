//! Name-keyed registry of constructed payment rails.

use std::sync::Arc;

use panel_types::{PaymentAdapter, RegistryError};

use crate::config::PaymentsConfig;
use crate::cryptomus::CryptomusAdapter;
use crate::korapay::KorapayAdapter;

/// Fixed set of payment adapters, looked up case-insensitively.
#[derive(Clone, Default)]
pub struct PaymentRegistry {
    adapters: Vec<(String, Arc<dyn PaymentAdapter>)>,
}

impl PaymentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the `korapay` and `cryptomus` rails.
    pub fn from_config(config: &PaymentsConfig) -> Result<Self, RegistryError> {
        Ok(Self::new()
            .with_adapter("korapay", Arc::new(KorapayAdapter::new(config.korapay.clone())?))
            .with_adapter("cryptomus", Arc::new(CryptomusAdapter::new(config.cryptomus.clone())?)))
    }

    /// Registers `adapter` under `key`, replacing any adapter with the same key.
    pub fn with_adapter(mut self, key: &str, adapter: Arc<dyn PaymentAdapter>) -> Self {
        let key = key.to_lowercase();
        self.adapters.retain(|(k, _)| *k != key);
        self.adapters.push((key, adapter));
        self
    }

    pub fn get_payment_adapter(
        &self,
        name: &str,
    ) -> Result<Arc<dyn PaymentAdapter>, RegistryError> {
        let key = name.to_lowercase();
        self.adapters
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, adapter)| Arc::clone(adapter))
            .ok_or_else(|| RegistryError::AdapterNotFound(name.to_string()))
    }

    pub fn get_all_payment_adapters(&self) -> Vec<Arc<dyn PaymentAdapter>> {
        self.adapters.iter().map(|(_, a)| Arc::clone(a)).collect()
    }

    /// Registered keys, in registration order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.adapters.iter().map(|(k, _)| k.as_str())
    }
}
