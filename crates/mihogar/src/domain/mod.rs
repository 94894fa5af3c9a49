//! Shared value types for the mortgage domain: typed money, interest rates,
//! grace periods, and the backend's string enums with total, fallback-based
//! parsing.

mod enums;
mod money;
mod rate;

pub use enums::{
    parse_or_fallback, CapitalizationPeriod, Currency, FallbackEnum, GraceType, LoanProgramKind,
    RateType, SimulationStatus, SubsidyType,
};
pub use money::Money;
pub use rate::{GracePeriod, InterestRate};
