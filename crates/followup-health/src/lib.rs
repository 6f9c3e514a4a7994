//! Core engine for the Follow-Up Health Dashboard: the deterministic
//! scoring and driver-selection logic, the report-email composer, and
//! the submission/template flow behind the calculator and its admin
//! console. Storage and outbound mail stay behind traits so the whole
//! crate runs against in-memory adapters in tests.

pub mod config;
pub mod drivers;
pub mod email;
pub mod error;
pub mod scoring;
pub mod submissions;
pub mod telemetry;
