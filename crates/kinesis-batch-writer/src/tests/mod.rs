//! Adapter tests against a mock sink.
//!
//! - `harness.rs`      - MockSinkClient and adapter construction helpers
//! - `buffering.rs`    - Threshold buffering and batch writes
//! - `chunking.rs`     - Put-one vs put-many selection and chunk limits
//! - `readiness.rs`    - Readiness probe events per variant
//! - `end_of_input.rs` - Final flush on end()
//! - `errors.rs`       - Call failures and configuration failures
//! - `pipe.rs`         - Line pipe: EOF, shutdown and readiness exits

mod readiness;
