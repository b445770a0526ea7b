//! Shared utilities for the Medrec contract suite.
//!
//! This crate provides:
//! - [`text`] — bounded-buffer helpers for trimming, lowercasing and digit
//!   extraction on Soroban `String`s, which expose no slice API of their own.
//! - [`ttl`] — persistent-storage TTL extension with the thresholds used by
//!   every contract in the suite.

#![no_std]
#![allow(clippy::arithmetic_side_effects)]
#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod text;
pub mod ttl;

pub use text::*;
pub use ttl::*;
