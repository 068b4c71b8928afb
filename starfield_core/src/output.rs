// Copyright 2026 the Starfield Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Drawing surface identification.
//!
//! Several starfields can be mounted on one page, each with its own loop.
//! [`SurfaceId`] tells their ticks and trace events apart; core treats the
//! value as opaque.

use core::fmt;

/// Identifies one mounted drawing surface.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SurfaceId(pub u32);

impl fmt::Debug for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SurfaceId({})", self.0)
    }
}
