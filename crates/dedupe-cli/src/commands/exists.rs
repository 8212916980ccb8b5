// dedupe-cli — `exists` subcommand
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
use anyhow::Result;
use clap::Args;

#[derive(Args, Debug)]
pub struct ExistsCmd {
    /// Name of the object to check.
    name: String,
}

impl ExistsCmd {
    /// Prints `true`/`false` and exits non-zero when the object is absent,
    /// so the command is usable directly in shell conditionals.
    pub fn execute(&self, target: &Target) -> Result<()> {
        let container = target.require_container()?;
        let library = target.open_library()?;

        let present = library.object_exists(container, &self.name).map_err(|e| anyhow::anyhow!(e))?;
        println!("{present}");
        if !present {
            std::process::exit(1);
        }
        Ok(())
    }
}
