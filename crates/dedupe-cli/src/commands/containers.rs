// dedupe-cli — container subcommands (pool mode only)
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
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct AddContainerCmd {
    /// Name of the new container.
    name: String,
}

impl AddContainerCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let library = target.open_library()?;
        library.add_container(&self.name).map_err(|e| anyhow::anyhow!(e))?;
        output::success(&format!("created container '{}'", self.name));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct DeleteContainerCmd {
    /// Name of the container to delete, along with every object in it.
    name: String,
}

impl DeleteContainerCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let library = target.open_library()?;
        let mut sink = target.open_chunk_store()?;
        library
            .delete_container(&self.name, &mut sink)
            .map_err(|e| anyhow::anyhow!(e))?;
        output::success(&format!("deleted container '{}'", self.name));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ListContainersCmd;

impl ListContainersCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let library = target.open_library()?;
        let containers = library.list_containers().map_err(|e| anyhow::anyhow!(e))?;
        if containers.is_empty() {
            println!("(no containers)");
        } else {
            for name in containers {
                println!("{name}");
            }
        }
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct ImportContainerCmd {
    /// Name to register the container under, or merge into if it already
    /// exists.
    name: String,

    /// Path to an existing container index file produced elsewhere.
    #[arg(long)]
    from: PathBuf,

    /// When merging into an existing container, bump the refcount of chunk
    /// keys it already holds instead of leaving them untouched.
    #[arg(long)]
    increment_refcount: bool,
}

impl ImportContainerCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let library = target.open_library()?;
        library
            .import_container_index(&self.name, &self.from, self.increment_refcount)
            .map_err(|e| anyhow::anyhow!(e))?;
        output::success(&format!("imported container '{}' from {}", self.name, self.from.display()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct BackupCmd {
    /// Destination path for the backup copy.
    #[arg(long)]
    to: PathBuf,
}

impl BackupCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let library = target.open_library()?;
        library.backup_index(&self.to).map_err(|e| anyhow::anyhow!(e))?;
        output::success(&format!("backed up index to {}", self.to.display()));
        Ok(())
    }
}

#[derive(Args, Debug)]
pub struct BackupContainerCmd {
    /// Name of the container to back up.
    name: String,

    /// Destination path for the backup copy.
    #[arg(long)]
    to: PathBuf,

    /// Also register (or merge) the backup as a container under this name
    /// in the same pool.
    #[arg(long)]
    new_name: Option<String>,

    /// When cloning into an existing container under `--new-name`, bump the
    /// refcount of chunk keys it already holds instead of leaving them
    /// untouched. Ignored without `--new-name`.
    #[arg(long)]
    increment_refcount: bool,
}

impl BackupContainerCmd {
    pub fn execute(&self, target: &Target) -> Result<()> {
        let library = target.open_library()?;
        library
            .backup_container_index(&self.name, &self.to, self.new_name.as_deref(), self.increment_refcount)
            .map_err(|e| anyhow::anyhow!(e))?;
        output::success(&format!("backed up container '{}' to {}", self.name, self.to.display()));
        Ok(())
    }
}
