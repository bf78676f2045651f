//! Database integration tests.
//!
//! These run against a live Postgres with pgvector and are ignored by
//! default; run them with `cargo test -- --ignored` once a test database
//! is reachable (see [`crate::test_fixtures::DEFAULT_TEST_DATABASE_URL`]).
