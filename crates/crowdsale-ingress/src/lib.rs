//! # crowdsale-ingress
//!
//! **Admission Plane**: everything that decides whether a contribution or
//! an admin call may proceed, before any state is committed.
//!
//! ## Architecture
//!
//! 1. **AdminRole**: the single identity allowed to configure the sale
//! 2. **AllowList**: identities admitted to contribute
//! 3. **TimeWindow**: opening/closing instants gating participation
//! 4. **PhaseSchedule**: current phase and its rate
//! 5. **CapPolicy**: aggregate and per-participant limits
//!
//! ## Contribution Gate
//!
//! ```text
//! contribute → TimeWindow.is_open() → AllowList.is_admitted()
//!            → CapPolicy.validate() → PhaseSchedule.current_rate() → commit
//! ```
//!
//! None of these components perform I/O.

pub mod admin;
pub mod allow_list;
pub mod cap_policy;
pub mod phase_schedule;
pub mod time_window;

pub use admin::AdminRole;
pub use allow_list::AllowList;
pub use cap_policy::CapPolicy;
pub use phase_schedule::PhaseSchedule;
pub use time_window::TimeWindow;
