// dedupe-cli — `verify` subcommand
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

#[derive(Args, Debug)]
pub struct VerifyCmd {
    /// Name of the object to verify against external storage.
    name: String,
}

impl VerifyCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let container = target.require_container()?;
        let library = target.open_library()?;
        let mut sink = target.open_chunk_store()?;

        let report = library
            .verify(container, &self.name, &mut sink)
            .map_err(|e| anyhow::anyhow!(e))?;

        output::detail("chunks checked", &report.chunks_checked.to_string());
        output::detail("missing", &report.missing.len().to_string());

        if report.is_consistent() {
            output::success(&format!("'{}' is fully present in external storage", report.object_name));
            Ok(())
        } else {
            for key in &report.missing {
                println!("  missing: {key}");
            }
            anyhow::bail!("'{}' is missing {} chunk(s)", report.object_name, report.missing.len());
        }
    }
}
