//! DualMA Core: bar loop, broker, indicators and the moving-average crossover
//! strategy.
//!
//! This crate contains the whole backtesting engine:
//! - Domain types (bars, orders, fills, positions, trades)
//! - Append-only series buffers and the streaming SMA indicator
//! - Single-slot broker with commission and cash/position checks
//! - Triple-SMA crossover strategy behind the `Strategy` trait
//! - Bar-by-bar event loop with configurable fill timing
//! - CSV data feed, TOML run configuration and summary metrics

pub mod broker;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod indicators;
pub mod metrics;
pub mod series;
pub mod strategy;
