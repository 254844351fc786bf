// Copyright 2025 the Kinkfinder Authors
// SPDX-License-Identifier: Apache-2.0

//! Kinkfinder: finds kinks in interpolated and master outlines of a font

fn main() -> anyhow::Result<()> {
    kinkfinder::run()
}
