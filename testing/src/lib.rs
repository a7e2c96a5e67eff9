//! # Roomkeep Testing
//!
//! Testing utilities and helpers for the Roomkeep reducer architecture.
//!
//! This crate provides:
//! - [`FixedClock`] for deterministic dates
//! - [`ReducerTest`], a Given-When-Then harness for reducers
//! - Assertion helpers for returned effects
//!
//! ## Example
//!
//! ```ignore
//! use roomkeep_testing::{assertions, test_clock, ReducerTest};
//!
//! ReducerTest::new(CheckoutReducer::new())
//!     .with_env(test_environment())
//!     .given_state(CheckoutState::default())
//!     .when_action(CheckoutAction::RequestReview)
//!     .then_effects(assertions::assert_no_effects)
//!     .run();
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use roomkeep_core::environment::Clock;


/// Mock implementations of Environment traits
pub mod mocks {
    use super::{Clock, DateTime, NaiveDate, Utc};

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use roomkeep_testing::mocks::FixedClock;
    /// use roomkeep_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// assert_eq!(clock.now(), clock.now());
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }

        /// Create a clock pinned to midnight UTC of the given date
        #[must_use]
        pub fn on_date(date: NaiveDate) -> Self {
            Self::new(date.and_time(chrono::NaiveTime::MIN).and_utc())
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    ///
    /// # Panics
    ///
    /// This function will panic if the hardcoded timestamp fails to parse,
    /// which should never happen in practice.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(
            DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .expect("hardcoded timestamp should always parse")
                .with_timezone(&Utc),
        )
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, test_clock};
pub use reducer_test::{ReducerTest, assertions};
