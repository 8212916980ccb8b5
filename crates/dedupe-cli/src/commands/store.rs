// dedupe-cli — `store` subcommand
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
pub struct StoreCmd {
    /// File to chunk and store.
    file: PathBuf,

    /// Object name to store it under. Defaults to the file name.
    #[arg(long)]
    name: Option<String>,

    /// Overwrite an existing object of the same name instead of failing.
    #[arg(long)]
    replace: bool,

    /// Chunk and write incrementally instead of buffering the whole file.
    #[arg(long)]
    streaming: bool,
}

impl StoreCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let container = target.require_container()?;
        let library = target.open_library()?;
        let mut sink = target.open_chunk_store()?;

        let name = match &self.name {
            Some(n) => n.clone(),
            None => self
                .file
                .file_name()
                .and_then(|n| n.to_str())
                .map(str::to_owned)
                .context("could not derive an object name from the file path; pass --name")?,
        };

        let spans = if self.streaming {
            let reader = fs::File::open(&self.file).with_context(|| format!("opening {}", self.file.display()))?;
            library
                .store_object_streaming(container, &name, reader, &mut sink, self.replace)
                .map_err(|e| anyhow::anyhow!(e))?
        } else {
            let data = fs::read(&self.file).with_context(|| format!("reading {}", self.file.display()))?;
            let store_fn = if self.replace {
                dedupe_core::Library::store_or_replace_object
            } else {
                dedupe_core::Library::store_object
            };
            store_fn(&library, container, &name, &data, &mut sink).map_err(|e| anyhow::anyhow!(e))?
        };

        output::success(&format!("stored '{name}' as {} chunk(s)", spans.len()));
        Ok(())
    }
}
