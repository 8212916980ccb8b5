// dedupe-cli — `retrieve` subcommand
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
use anyhow::{Context, Result};
use clap::Args;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct RetrieveCmd {
    /// Name of the stored object to reassemble.
    name: String,

    /// Path to write the reassembled bytes to.
    #[arg(long)]
    out: PathBuf,
}

impl RetrieveCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let container = target.require_container()?;
        let library = target.open_library()?;
        let mut sink = target.open_chunk_store()?;

        let data = library
            .retrieve_object(container, &self.name, &mut sink)
            .map_err(|e| anyhow::anyhow!(e))?;

        fs::write(&self.out, &data).with_context(|| format!("writing {}", self.out.display()))?;
        output::success(&format!("retrieved '{}' ({} bytes) to {}", self.name, data.len(), self.out.display()));
        Ok(())
    }
}
