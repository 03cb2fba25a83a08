//! Admin role: the single identity allowed to configure the sale.

use crowdsale_types::{Address, Result, SaleError};

/// Holder of the admin role. Exactly one owner at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdminRole {
    owner: Address,
}

impl AdminRole {
    /// # Errors
    /// `InvalidAddress` for the zero address.
    pub fn new(owner: Address) -> Result<Self> {
        if owner.is_zero() {
            return Err(SaleError::InvalidAddress {
                reason: "admin is the zero address".into(),
            });
        }
        Ok(Self { owner })
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// # Errors
    /// `Unauthorized` unless `caller` is the owner.
    pub fn ensure(&self, caller: Address) -> Result<()> {
        if caller != self.owner {
            return Err(SaleError::Unauthorized { caller });
        }
        Ok(())
    }

    /// Hand the role to `new_owner`. Returns the previous owner.
    ///
    /// # Errors
    /// `Unauthorized` for non-owners, `InvalidAddress` for the zero address.
    pub fn transfer(&mut self, caller: Address, new_owner: Address) -> Result<Address> {
        self.ensure(caller)?;
        if new_owner.is_zero() {
            return Err(SaleError::InvalidAddress {
                reason: "new admin is the zero address".into(),
            });
        }
        let previous = self.owner;
        self.owner = new_owner;
        tracing::info!(from = %previous, to = %new_owner, "Admin role transferred");
        Ok(previous)
    }
}
