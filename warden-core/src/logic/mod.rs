// warden-core/src/logic/mod.rs
// ============================================================================
// Module: Tri-State Requirement Logic
// Description: Fail-closed Boolean algebra over evidence that may be absent.
// Purpose: Back FP-pattern requirement matching and other evidence gates
//          that must never treat missing data as satisfied.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! FP-pattern matching needs to distinguish "this clause definitely does
//! not hold" from "we don't know whether this clause holds" — the two
//! must not be conflated, or an incomplete enrichment result could
//! silently auto-close a true positive. This module provides that
//! distinction as a small, reusable tri-state algebra.

pub mod tristate;

pub use tristate::BochvarLogic;
pub use tristate::GroupCounts;
pub use tristate::KleeneLogic;
pub use tristate::LogicMode;
pub use tristate::TriLogic;
pub use tristate::TriState;
