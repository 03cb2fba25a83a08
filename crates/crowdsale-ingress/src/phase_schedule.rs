//! Phase schedule: ordered phases, each with a fixed rate.
//!
//! Exactly one phase is current. The admin can only move forward; a
//! single-rate sale is a one-phase schedule.

use crowdsale_types::{constants, Address, PhaseConfig, PhaseIndex, Rate, Result, SaleError};

use crate::AdminRole;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseSchedule {
    phases: Vec<PhaseConfig>,
    current: PhaseIndex,
}

impl PhaseSchedule {
    /// # Errors
    /// `InvalidConfig` for an empty or oversized list, or a zero rate.
    pub fn new(phases: Vec<PhaseConfig>) -> Result<Self> {
        if phases.is_empty() {
            return Err(SaleError::InvalidConfig("at least one phase required".into()));
        }
        if phases.len() > constants::MAX_PHASES {
            return Err(SaleError::InvalidConfig(format!(
                "{} phases exceeds maximum {}",
                phases.len(),
                constants::MAX_PHASES
            )));
        }
        if let Some(phase) = phases.iter().find(|p| p.rate == 0) {
            return Err(SaleError::InvalidConfig(format!(
                "phase {} has a zero rate",
                phase.name
            )));
        }
        Ok(Self {
            phases,
            current: PhaseIndex(0),
        })
    }

    #[must_use]
    pub fn current(&self) -> PhaseIndex {
        self.current
    }

    #[must_use]
    pub fn current_phase(&self) -> &PhaseConfig {
        &self.phases[self.current.0]
    }

    #[must_use]
    pub fn current_rate(&self) -> Rate {
        self.current_phase().rate
    }

    #[must_use]
    pub fn phases(&self) -> &[PhaseConfig] {
        &self.phases
    }

    /// Move to phase `to`. Returns the new rate.
    ///
    /// # Errors
    /// `Unauthorized` for non-admins; `InvalidPhaseTransition` when `to`
    /// is not after the current phase or has no configured rate.
    pub fn advance(&mut self, role: &AdminRole, caller: Address, to: PhaseIndex) -> Result<Rate> {
        role.ensure(caller)?;
        if to <= self.current || to.0 >= self.phases.len() {
            return Err(SaleError::InvalidPhaseTransition {
                from: self.current.0,
                to: to.0,
            });
        }
        let from = self.current;
        self.current = to;
        let rate = self.current_rate();
        tracing::info!(
            from = %from,
            to = %to,
            phase = %self.current_phase().name,
            rate,
            "Phase advanced"
        );
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn presale_then_public() -> PhaseSchedule {
        PhaseSchedule::new(vec![
            PhaseConfig::new("pre-sale", 600),
            PhaseConfig::new("public-sale", 500),
            PhaseConfig::new("final", 400),
        ])
        .unwrap()
    }

    #[test]
    fn starts_at_phase_zero() {
        let s = presale_then_public();
        assert_eq!(s.current(), PhaseIndex(0));
        assert_eq!(s.current_rate(), 600);
        assert_eq!(s.current_phase().name, "pre-sale");
        assert_eq!(s.phases().len(), 3);
    }

    #[test]
    fn advances_forward_and_may_skip() {
        let admin = Address::random();
        let role = AdminRole::new(admin).unwrap();
        let mut s = presale_then_public();

        assert_eq!(s.advance(&role, admin, PhaseIndex(2)).unwrap(), 400);
        assert_eq!(s.current(), PhaseIndex(2));
    }

    #[test]
    fn backwards_or_same_phase_rejected() {
        let admin = Address::random();
        let role = AdminRole::new(admin).unwrap();
        let mut s = presale_then_public();
        s.advance(&role, admin, PhaseIndex(1)).unwrap();

        assert_eq!(
            s.advance(&role, admin, PhaseIndex(1)).unwrap_err(),
            SaleError::InvalidPhaseTransition { from: 1, to: 1 }
        );
        assert_eq!(
            s.advance(&role, admin, PhaseIndex(0)).unwrap_err(),
            SaleError::InvalidPhaseTransition { from: 1, to: 0 }
        );
        assert_eq!(s.current_rate(), 500);
    }

    #[test]
    fn unconfigured_phase_rejected() {
        let admin = Address::random();
        let role = AdminRole::new(admin).unwrap();
        let mut s = presale_then_public();
        assert_eq!(
            s.advance(&role, admin, PhaseIndex(3)).unwrap_err(),
            SaleError::InvalidPhaseTransition { from: 0, to: 3 }
        );
    }

    #[test]
    fn non_admin_rejected_before_index_checks() {
        let role = AdminRole::new(Address::random()).unwrap();
        let mut s = presale_then_public();
        let err = s.advance(&role, Address::random(), PhaseIndex(0)).unwrap_err();
        assert!(matches!(err, SaleError::Unauthorized { .. }));
    }

    #[test]
    fn invalid_schedules_rejected() {
        assert!(PhaseSchedule::new(vec![]).is_err());
        assert!(PhaseSchedule::new(vec![PhaseConfig::new("free", 0)]).is_err());
        let too_many = (0..=constants::MAX_PHASES)
            .map(|i| PhaseConfig::new(format!("p{i}"), 1))
            .collect();
        assert!(PhaseSchedule::new(too_many).is_err());
    }
}
