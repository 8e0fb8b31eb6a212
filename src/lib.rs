//! Bulk uploader for Pantheon 2.
//!
//! Scans a documentation directory recursively, classifies each file as a
//! module (versioned document) or resource (static asset or symlink alias)
//! using wildcard patterns from `pantheon2.yml`, and uploads every classified
//! file to a Pantheon content repository over HTTP.
//!
//! Pipeline: [`scan`] → [`classify`] (resources first, then modules) →
//! [`plan`] → [`upload`] → [`report`]. The [`cli`] module wires the stages
//! together; [`upload::Transport`] is the mockable seam for the wire.

pub mod classify;
pub mod cli;
pub mod error;
pub mod glob;
pub mod load_config;
pub mod plan;
pub mod report;
pub mod scan;
pub mod upload;
