//! Spawn prediction and presentation driving for the Nebula Relics tracker.
//!
//! This crate owns the time-to-state mapping and its periodic
//! re-evaluation. Nothing here draws anything; renderers subscribe to the
//! published [`Forecast`](nebula_types::Forecast).
//!
//! # Modules
//!
//! - [`clock`] -- [`Clock`] trait with system and manual implementations.
//! - [`config`] -- Configuration loading from `nebula-config.yaml` into
//!   strongly-typed structs.
//! - [`driver`] -- [`PresentationDriver`]: tick, evaluate, publish.
//! - [`predictor`] -- [`SpawnPredictor`]: the pure instant-to-state mapping.
//! - [`schedule`] -- Cancellable repeating tasks on tokio or by hand.
//!
//! [`Clock`]: clock::Clock
//! [`PresentationDriver`]: driver::PresentationDriver
//! [`SpawnPredictor`]: predictor::SpawnPredictor

pub mod clock;
pub mod config;
pub mod driver;
pub mod predictor;
pub mod schedule;
