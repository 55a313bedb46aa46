//! Testing utilities for the activity interceptor
//!
//! This crate provides:
//! - Mock reporters and ID generators that record or script their behavior
//! - Fixtures for call contexts, routes and canned handlers
//!
//! # Examples
//!
//! ```
//! use activity_interceptor::{ActivityInterceptor, ActivityInterceptorConfig};
//! use activity_interceptor_testing::{mocks::RecordingReporter, fixtures::*};
//!
//! let reporter = RecordingReporter::new();
//! let interceptor = ActivityInterceptor::new(
//!     ActivityInterceptorConfig::new().with_reporter(reporter.clone()),
//! );
//!
//! let result = futures::executor::block_on(interceptor.wrap(
//!     context_with_tcp_peer("127.0.0.1"),
//!     (),
//!     &test_route(),
//!     not_found_handler(),
//! ));
//!
//! assert!(result.is_err());
//! assert_eq!(reporter.last().unwrap().caller_address, "127.0.0.1");
//! ```

pub mod fixtures;
pub mod mocks;

// Re-export commonly used types
pub use fixtures::*;
pub use mocks::*;

// Re-export testing dependencies for convenience
pub use proptest;
