// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Font data model

pub mod designspace;
pub mod font;
pub mod outline;
pub mod workspace;

pub use designspace::load_font;
pub use font::{Axis, Blend, Font, Instance, Location, Master, MasterId};
pub use outline::{Connection, Contour, Incompatibility, Node, NodeType, Outline};
