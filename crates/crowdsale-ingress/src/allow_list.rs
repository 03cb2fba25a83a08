//! Allow-list: the set of identities admitted to contribute.
//!
//! Membership is the only state. Every mutation is checked against the
//! [`AdminRole`]; reads are free.

use std::collections::BTreeSet;

use crowdsale_types::{constants, Address, Result, SaleError};

use crate::AdminRole;

/// Admitted participant identities.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList {
    admitted: BTreeSet<Address>,
}

impl AllowList {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit one identity. Returns `false` if it was already admitted.
    ///
    /// # Errors
    /// `Unauthorized` for non-admins, `InvalidAddress` for the zero address.
    pub fn add(&mut self, role: &AdminRole, caller: Address, id: Address) -> Result<bool> {
        role.ensure(caller)?;
        if id.is_zero() {
            return Err(SaleError::InvalidAddress {
                reason: "cannot admit the zero address".into(),
            });
        }
        Ok(self.admitted.insert(id))
    }

    /// Admit a batch of identities, all or nothing.
    ///
    /// Returns the number of newly admitted identities.
    ///
    /// # Errors
    /// `Unauthorized` for non-admins, `InvalidConfig` for an oversized
    /// batch, `InvalidAddress` if any entry is the zero address.
    pub fn add_many(&mut self, role: &AdminRole, caller: Address, ids: &[Address]) -> Result<usize> {
        role.ensure(caller)?;
        if ids.len() > constants::MAX_ALLOW_LIST_BATCH {
            return Err(SaleError::InvalidConfig(format!(
                "allow-list batch of {} exceeds maximum {}",
                ids.len(),
                constants::MAX_ALLOW_LIST_BATCH
            )));
        }
        if ids.iter().any(Address::is_zero) {
            return Err(SaleError::InvalidAddress {
                reason: "cannot admit the zero address".into(),
            });
        }
        let added = ids.iter().filter(|id| self.admitted.insert(**id)).count();
        tracing::debug!(requested = ids.len(), added, "Allow-list batch applied");
        Ok(added)
    }

    /// Remove one identity. Returns `false` if it was not admitted.
    ///
    /// # Errors
    /// `Unauthorized` for non-admins.
    pub fn remove(&mut self, role: &AdminRole, caller: Address, id: Address) -> Result<bool> {
        role.ensure(caller)?;
        Ok(self.admitted.remove(&id))
    }

    #[must_use]
    pub fn is_admitted(&self, id: Address) -> bool {
        self.admitted.contains(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.admitted.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.admitted.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.admitted.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (AdminRole, Address, AllowList) {
        let admin = Address::random();
        (AdminRole::new(admin).unwrap(), admin, AllowList::new())
    }

    #[test]
    fn add_and_remove() {
        let (role, admin, mut list) = setup();
        let alice = Address::random();

        assert!(!list.is_admitted(alice));
        assert!(list.add(&role, admin, alice).unwrap());
        assert!(!list.add(&role, admin, alice).unwrap());
        assert!(list.is_admitted(alice));

        assert!(list.remove(&role, admin, alice).unwrap());
        assert!(!list.is_admitted(alice));
        assert!(!list.remove(&role, admin, alice).unwrap());
    }

    #[test]
    fn non_admin_cannot_mutate() {
        let (role, _admin, mut list) = setup();
        let mallory = Address::random();

        let err = list.add(&role, mallory, mallory).unwrap_err();
        assert!(matches!(err, SaleError::Unauthorized { .. }));
        let err = list.add_many(&role, mallory, &[mallory]).unwrap_err();
        assert!(matches!(err, SaleError::Unauthorized { .. }));
        let err = list.remove(&role, mallory, mallory).unwrap_err();
        assert!(matches!(err, SaleError::Unauthorized { .. }));
        assert!(list.is_empty());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let (role, admin, mut list) = setup();
        let ids = [Address::random(), Address::ZERO, Address::random()];

        let err = list.add_many(&role, admin, &ids).unwrap_err();
        assert!(matches!(err, SaleError::InvalidAddress { .. }));
        assert!(list.is_empty());

        let ids = [Address::random(), Address::random()];
        assert_eq!(list.add_many(&role, admin, &ids).unwrap(), 2);
        assert_eq!(list.add_many(&role, admin, &ids).unwrap(), 0);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn oversized_batch_rejected() {
        let (role, admin, mut list) = setup();
        let ids: Vec<Address> = (0..=constants::MAX_ALLOW_LIST_BATCH)
            .map(|_| Address::random())
            .collect();
        let err = list.add_many(&role, admin, &ids).unwrap_err();
        assert!(matches!(err, SaleError::InvalidConfig(_)));
        assert!(list.is_empty());
    }
}
