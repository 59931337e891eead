//! CLI library components for the OMX matrix converter.

#![allow(missing_docs)]

pub mod batch;
pub mod logging;
pub mod types;
