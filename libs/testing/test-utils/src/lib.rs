//! Shared test utilities
//!
//! - `TestDatabase`: PostgreSQL container with migrations applied (feature: "postgres")
//! - `TestRabbitMq`: RabbitMQ container (feature: "rabbitmq")
//! - `TestDataBuilder`: deterministic test data (always available)
//!
//! Container-backed tests need Docker; mark them `#[ignore]` and run them with
//! `cargo test -- --ignored`.
//!
//! ```rust,ignore
//! use test_utils::{TestDatabase, TestDataBuilder};
//!
//! #[tokio::test]
//! #[ignore = "requires Docker"]
//! async fn my_postgres_test() {
//!     let db = TestDatabase::new().await;
//!     let builder = TestDataBuilder::from_test_name("my_postgres_test");
//!     let id = db.insert_user(&builder.name("user"), 30, &builder.email("user")).await;
//! }
//! ```

#[cfg(feature = "postgres")]
mod postgres;

#[cfg(feature = "rabbitmq")]
mod rabbitmq;

#[cfg(feature = "postgres")]
pub use postgres::TestDatabase;

#[cfg(feature = "rabbitmq")]
pub use rabbitmq::TestRabbitMq;

/// Builder for test data with deterministic values
///
/// The same seed always yields the same names and emails, so tests are
/// reproducible while distinct tests stay apart.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from the test name (recommended)
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_create_user");
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Name that fits the 50-character column limit
    pub fn name(&self, label: &str) -> String {
        format!("{}-{}", label, self.seed % 1_000_000)
    }

    /// Unique, valid email address that fits the 50-character column limit
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let email = TestDataBuilder::new(42).email("alice");
    /// assert_eq!(email, "alice.42@example.test");
    /// ```
    pub fn email(&self, label: &str) -> String {
        format!("{}.{}@example.test", label, self.seed % 1_000_000)
    }
}
