// SPDX-FileCopyrightText: 2026 Tollgate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tollgate server assembly.
//!
//! Builds every collaborator named in the configuration and wires them into
//! the dispatcher and HTTP gateway. The `tollgate` binary is a thin CLI
//! over this crate.

pub mod serve;
pub mod shutdown;

pub use serve::{AppParts, build_app, run_serve};
