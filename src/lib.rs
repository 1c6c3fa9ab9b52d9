//! Migration worker for the incubator platform.
//!
//! Copies records from the legacy ("ancient") HTTP API into the new platform
//! API: fetches source records per resource type, skips rows that were already
//! imported (matched on the `id_legacy` marker), rewrites foreign-key
//! references from legacy ids to newly-assigned ids, strips invalid bytes from
//! string fields, and POSTs the result. Runs are sequential and re-runnable;
//! the only durable state lives in the target API and the plain-text logs.

pub mod clean;
pub mod cli;
pub mod clients;
pub mod config;
pub mod logbook;
pub mod reconcile;
pub mod resolver;
pub mod throttle;
