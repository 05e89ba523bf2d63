//! Remembered customer identities over two redundant stores.
//!
//! Checkout remembers up to five customers so a returning buyer can fill
//! the form in one tap. The list lives in a primary store and a fallback
//! store; reads repair the primary from the fallback, and every write goes
//! to both. Losing this data costs convenience, never a sale, so every
//! storage failure is logged and swallowed.

pub mod store;

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use boutik_core::{Email, PhoneNumber};

use crate::catalog::CountryCode;

pub use store::{JsonFileStore, MemoryStore, StoreError, VaultStore};

/// Retention cap; the oldest entry is evicted past this.
pub const MAX_SAVED_CUSTOMERS: usize = 5;

/// Expiry applied to the fallback store on every write.
pub const FALLBACK_TTL: Duration = Duration::from_secs(30 * 24 * 60 * 60);

/// A remembered customer identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCustomer {
    /// Customer email.
    pub email: Email,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Local mobile number.
    pub phone: PhoneNumber,
    /// Country the customer last checked out from.
    pub country: CountryCode,
    /// When this identity was last used, RFC 3339.
    pub last_used: DateTime<Utc>,
}

impl SavedCustomer {
    /// `"First Last"`, as the payment backend expects it.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Two entries are the same person if either the email or the phone
    /// matches.
    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.email == other.email || self.phone == other.phone
    }
}

/// Dual-store persistence for [`SavedCustomer`] lists.
///
/// The vault is the only writer to either store. All operations are
/// best-effort: a failing store is logged and skipped, and `load` returns
/// an empty list rather than an error.
pub struct CustomerVault {
    primary: Box<dyn VaultStore>,
    fallback: Box<dyn VaultStore>,
}

impl CustomerVault {
    /// Build a vault over a primary and a fallback store.
    #[must_use]
    pub fn new(primary: Box<dyn VaultStore>, fallback: Box<dyn VaultStore>) -> Self {
        Self { primary, fallback }
    }

    /// Load saved customers, newest first.
    ///
    /// Reads the primary store; if it is empty, reads the fallback and, if
    /// that holds data, writes it back into the primary before returning.
    /// Never fails: decode and I/O problems degrade to an empty list.
    #[must_use]
    pub fn load(&self) -> Vec<SavedCustomer> {
        if let Some(customers) = Self::read_list(self.primary.as_ref(), "primary") {
            if !customers.is_empty() {
                return customers;
            }
        }

        if let Some(customers) = Self::read_list(self.fallback.as_ref(), "fallback") {
            if !customers.is_empty() {
                // Repair the primary so the next read doesn't need the
                // fallback.
                self.write_list(&customers, true, false);
                return customers;
            }
        }

        Vec::new()
    }

    /// Remember a customer.
    ///
    /// An existing entry with the same email or phone is replaced rather
    /// than duplicated; past the retention cap the oldest entry is evicted.
    /// Both stores are written, primary first; a failure in one never
    /// prevents the write to the other.
    pub fn save(&self, customer: SavedCustomer) {
        let mut customers = self.load();
        customers.retain(|existing| !existing.same_identity(&customer));
        customers.insert(0, customer);
        customers.truncate(MAX_SAVED_CUSTOMERS);
        self.write_list(&customers, true, true);
    }

    /// Re-stamp an entry's `last_used` and move it to the front.
    ///
    /// An out-of-range index is logged and ignored.
    pub fn touch(&self, index: usize) {
        let mut customers = self.load();
        if index >= customers.len() {
            tracing::warn!(index, len = customers.len(), "vault touch out of range");
            return;
        }
        let mut customer = customers.remove(index);
        customer.last_used = Utc::now();
        customers.insert(0, customer);
        self.write_list(&customers, true, true);
    }

    fn read_list(store: &dyn VaultStore, which: &'static str) -> Option<Vec<SavedCustomer>> {
        let payload = match store.read() {
            Ok(payload) => payload?,
            Err(error) => {
                tracing::warn!(%error, store = which, "vault read failed");
                return None;
            }
        };

        match serde_json::from_str(&payload) {
            Ok(customers) => Some(customers),
            Err(error) => {
                tracing::warn!(%error, store = which, "vault payload did not decode");
                None
            }
        }
    }

    fn write_list(&self, customers: &[SavedCustomer], primary: bool, fallback: bool) {
        let payload = match serde_json::to_string(customers) {
            Ok(payload) => payload,
            Err(error) => {
                tracing::warn!(%error, "vault encode failed");
                return;
            }
        };

        if primary {
            if let Err(error) = self.primary.write(&payload, None) {
                tracing::warn!(%error, store = "primary", "vault write failed");
            }
        }
        if fallback {
            if let Err(error) = self.fallback.write(&payload, Some(FALLBACK_TTL)) {
                tracing::warn!(%error, store = "fallback", "vault write failed");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn customer(email: &str, phone: &str, first: &str) -> SavedCustomer {
        SavedCustomer {
            email: Email::parse(email).unwrap(),
            first_name: first.to_owned(),
            last_name: "Diallo".to_owned(),
            phone: PhoneNumber::parse(phone).unwrap(),
            country: CountryCode::SN,
            last_used: Utc::now(),
        }
    }

    fn memory_vault() -> CustomerVault {
        CustomerVault::new(Box::new(MemoryStore::new()), Box::new(MemoryStore::new()))
    }

    #[test]
    fn test_load_empty() {
        assert!(memory_vault().load().is_empty());
    }

    #[test]
    fn test_save_and_load_newest_first() {
        let vault = memory_vault();
        vault.save(customer("a@example.sn", "771234501", "Awa"));
        vault.save(customer("b@example.sn", "771234502", "Binta"));

        let loaded = vault.load();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].first_name, "Binta");
        assert_eq!(loaded[1].first_name, "Awa");
    }

    #[test]
    fn test_save_dedups_by_email_or_phone() {
        let vault = memory_vault();
        vault.save(customer("awa@example.sn", "771234501", "Awa"));
        // Same email, new phone and name: replaces, not appends.
        vault.save(customer("awa@example.sn", "771234599", "Awa2"));

        let loaded = vault.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].first_name, "Awa2");

        // Same phone, new email: still the same person.
        vault.save(customer("new@example.sn", "771234599", "Awa3"));
        let loaded = vault.load();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].first_name, "Awa3");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let vault = memory_vault();
        for i in 0..6 {
            vault.save(customer(
                &format!("c{i}@example.sn"),
                &format!("77123450{i}"),
                &format!("C{i}"),
            ));
        }

        let loaded = vault.load();
        assert_eq!(loaded.len(), MAX_SAVED_CUSTOMERS);
        assert_eq!(loaded[0].first_name, "C5");
        // C0, the oldest, is gone.
        assert!(loaded.iter().all(|c| c.first_name != "C0"));
    }

    #[test]
    fn test_self_heal_primary_from_fallback() {
        let primary = Box::new(MemoryStore::new());
        let fallback = Box::new(MemoryStore::new());

        // Seed only the fallback, as if the primary had been wiped.
        let seeded = vec![customer("awa@example.sn", "771234501", "Awa")];
        fallback
            .write(&serde_json::to_string(&seeded).unwrap(), None)
            .unwrap();

        let vault = CustomerVault::new(primary, fallback);
        let loaded = vault.load();
        assert_eq!(loaded.len(), 1);

        // The primary has been repaired: wiping the fallback no longer
        // loses the data.
        clear_store(vault.fallback.as_ref());
        let again = vault.load();
        assert_eq!(again, loaded);
    }

    fn clear_store(store: &dyn VaultStore) {
        store.write("[]", None).expect("clear");
    }

    #[test]
    fn test_corrupt_primary_degrades_to_fallback() {
        let primary = Box::new(MemoryStore::new());
        let fallback = Box::new(MemoryStore::new());
        primary.write("][ not json", None).unwrap();

        let seeded = vec![customer("awa@example.sn", "771234501", "Awa")];
        fallback
            .write(&serde_json::to_string(&seeded).unwrap(), None)
            .unwrap();

        let vault = CustomerVault::new(primary, fallback);
        assert_eq!(vault.load().len(), 1);
    }

    #[test]
    fn test_both_stores_corrupt_degrades_to_empty() {
        let primary = Box::new(MemoryStore::new());
        let fallback = Box::new(MemoryStore::new());
        primary.write("nope", None).unwrap();
        fallback.write("also nope", None).unwrap();

        let vault = CustomerVault::new(primary, fallback);
        assert!(vault.load().is_empty());
    }

    #[test]
    fn test_touch_moves_to_front_and_restamps() {
        let vault = memory_vault();
        vault.save(customer("a@example.sn", "771234501", "Awa"));
        vault.save(customer("b@example.sn", "771234502", "Binta"));

        let before = vault.load();
        assert_eq!(before[1].first_name, "Awa");
        let old_stamp = before[1].last_used;

        vault.touch(1);

        let after = vault.load();
        assert_eq!(after[0].first_name, "Awa");
        assert!(after[0].last_used >= old_stamp);
        assert_eq!(after[1].first_name, "Binta");
    }

    #[test]
    fn test_touch_out_of_range_is_ignored() {
        let vault = memory_vault();
        vault.save(customer("a@example.sn", "771234501", "Awa"));
        vault.touch(7);
        assert_eq!(vault.load().len(), 1);
    }

    #[test]
    fn test_save_reaches_fallback_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("customers.json");
        let vault = CustomerVault::new(
            Box::new(MemoryStore::new()),
            Box::new(JsonFileStore::new(&path)),
        );
        vault.save(customer("awa@example.sn", "771234501", "Awa"));

        // A second vault with an empty primary heals from the file.
        let vault2 = CustomerVault::new(
            Box::new(MemoryStore::new()),
            Box::new(JsonFileStore::new(&path)),
        );
        assert_eq!(vault2.load().len(), 1);
    }
}
