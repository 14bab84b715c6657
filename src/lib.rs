//! Logwarden - SOC-grade access-log anomaly triage
//!
//! Classifies web-server access-log lines as Normal or Anomaly for
//! security-operations triage. A batch of raw lines is validated, embedded
//! into a fixed-width feature space and run through a cascade of three
//! unsupervised detectors; every verdict carries a human-readable reason
//! and a confidence score.
//!
//! # Modules
//!
//! ## Pipeline
//! - [`validation`] - Structural validation of raw log lines
//! - [`parser`] - Rule-based HTTP field extraction
//! - [`features`] - TF-IDF embedding and feature matrix assembly
//! - [`anomaly`] - The three unsupervised detectors
//! - [`cascade`] - Three-stage narrowing pipeline
//! - [`reasoning`] - Explainable reasons and confidence scoring
//! - [`analyzer`] - Batch orchestration
//!
//! ## Infrastructure
//! - [`bundle`] - Frozen model artifact (fit / save / load)
//! - [`server`] - HTTP API
//! - [`cli`] - Command-line interface

pub mod error;

// Pipeline
pub mod analyzer;
pub mod anomaly;
pub mod cascade;
pub mod features;
pub mod parser;
pub mod reasoning;
pub mod validation;

// Infrastructure
pub mod bundle;
pub mod cli;
pub mod server;

pub use error::{Result, WardenError};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::analyzer::{analyze_lines, Finding, FindingStatus};
    pub use crate::anomaly::{
        AnomalyDetector, IsolationForest, KernelType, LocalOutlierFactor, OneClassSvm,
    };
    pub use crate::bundle::ModelBundle;
    pub use crate::cascade::{run_cascade, CascadeOutcome, Verdict};
    pub use crate::error::{Result, WardenError};
    pub use crate::features::{build_features, LogVectorizer};
    pub use crate::parser::{parse, try_parse, ParsedRequest, Protocol};
    pub use crate::validation::LogValidator;
}
