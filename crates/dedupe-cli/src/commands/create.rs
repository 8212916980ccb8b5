// dedupe-cli — `create` subcommand
// Copyright (C) 2026  dedupe contributors
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published
// by the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.

use crate::context::Target;
use crate::output;
use anyhow::Result;
use clap::Args;
use dedupe_core::ChunkerConfig;

#[derive(Args, Debug)]
pub struct CreateCmd {
    /// Lower bound on chunk size, in bytes. Must be a multiple of 64 and at least 128.
    #[arg(long, default_value_t = 2048)]
    min_chunk_size: u32,

    /// Upper bound on chunk size, in bytes. Must be a multiple of 64 and at least 8x min-chunk-size.
    #[arg(long, default_value_t = 65536)]
    max_chunk_size: u32,

    /// Window advance, in bytes, between boundary checks.
    #[arg(long, default_value_t = 48)]
    shift_count: u32,

    /// Leading zero bytes of the rolling digest required to call a boundary (1..=8).
    #[arg(long, default_value_t = 2)]
    boundary_check_bytes: u8,
}

impl CreateCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let config = ChunkerConfig::new(
            self.min_chunk_size,
            self.max_chunk_size,
            self.shift_count,
            self.boundary_check_bytes,
            target.pool,
        )
        .map_err(|e| anyhow::anyhow!(e))?;

        target.create_library(config)?;
        output::success(&format!("created index at {}", target.index.display()));
        Ok(())
    }
}
