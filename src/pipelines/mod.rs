// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines
//!
//! # Pipeline Architecture
//!
//! ```text
//! ┌──────────────┐     ┌────────────────────┐     ┌─────────────────┐
//! │  Depth Map   │ ──▶ │  Volume Pipeline   │ ──▶ │ (area, volume)  │
//! │ Calibration  │     │  - Plane fit       │     │  per entity id  │
//! │  Label Mask  │     │  - Leveling        │     │                 │
//! │              │     │  - Grid integrate  │     │                 │
//! └──────────────┘     └────────────────────┘     └─────────────────┘
//! ```
//!
//! # Design Principles
//!
//! 1. **Request-scoped**: no caches survive between estimations
//! 2. **Robust**: outlier-tolerant plane fit, per-entity degeneracies never abort
//! 3. **Reproducible**: a fixed seed gives bit-identical results
//!
//! # Modules
//!
//! - [`volume`]: Area and volume estimation from a single depth capture

pub mod volume;
