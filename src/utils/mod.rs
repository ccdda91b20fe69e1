// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 webdevops contributors

//! Utility modules
//!
//! Common utilities for the webdevops CLI.

pub mod colors;

pub use colors::*;
