// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Demo model definitions used by tests and the CLI.

/// Retina → LGN (On/Off) → V1 early-vision model.
pub mod early_vision;
