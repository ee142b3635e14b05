//! # Quantum-Lock Test Suite
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/          # Engine throughput (criterion)
//! └── src/
//!     ├── harness.rs    # Real TCP server + protocol clients
//!     └── integration/  # End-to-end flows over the wire
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p ql-tests
//! cargo test -p ql-tests integration::sessions
//! cargo bench -p ql-tests
//! ```

#![allow(dead_code)]

pub mod harness;
pub mod integration;
