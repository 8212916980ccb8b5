// dedupe-cli — `list` subcommand
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
pub struct ListCmd;

impl ListCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let container = target.require_container()?;
        let library = target.open_library()?;

        let objects = library.list_objects(container).map_err(|e| anyhow::anyhow!(e))?;
        if objects.is_empty() {
            println!("(no objects)");
        } else {
            for name in objects {
                println!("{name}");
            }
        }
        Ok(())
    }
}
