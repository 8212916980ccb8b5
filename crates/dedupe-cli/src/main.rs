// dedupe-cli — command-line entry point
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

mod commands;
mod context;
mod output;

use clap::{Parser, Subcommand};
use context::Target;

#[derive(Parser, Debug)]
#[command(name = "dedupe", version, about = "Content-defined chunking & deduplication over a local index")]
struct Cli {
    #[command(flatten)]
    target: Target,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new, empty index.
    Create(commands::CreateCmd),
    /// Chunk a file and store it as a named object.
    Store(commands::StoreCmd),
    /// Reassemble a stored object and write it out.
    Retrieve(commands::RetrieveCmd),
    /// Delete a stored object, releasing chunks it alone referenced.
    Delete(commands::DeleteCmd),
    /// List the objects in the index (or in one container, in pool mode).
    List(commands::ListCmd),
    /// Check whether an object is present.
    Exists(commands::ExistsCmd),
    /// Print index-wide statistics, including the dedup ratio.
    Stats(commands::StatsCmd),
    /// Confirm every chunk of an object is still present in the chunk store.
    Verify(commands::VerifyCmd),
    /// Create a new, empty container (pool mode only).
    AddContainer(commands::AddContainerCmd),
    /// Delete a container and every object in it (pool mode only).
    DeleteContainer(commands::DeleteContainerCmd),
    /// List containers (pool mode only).
    ListContainers(commands::ListContainersCmd),
    /// Register an externally-produced container index file (pool mode only).
    ImportContainer(commands::ImportContainerCmd),
    /// Back up one container's index file (pool mode only).
    BackupContainer(commands::BackupContainerCmd),
    /// Back up the top-level index (the single index in flat mode, or the
    /// container registry, not container contents, in pool mode).
    Backup(commands::BackupCmd),
}

fn main() {
    let cli = Cli::parse();
    let _ = dedupe_observability::init_tracing(dedupe_observability::LogFormat::Pretty, None);

    let result = match &cli.command {
        Commands::Create(cmd) => cmd.execute(&cli.target),
        Commands::Store(cmd) => cmd.execute(&cli.target),
        Commands::Retrieve(cmd) => cmd.execute(&cli.target),
        Commands::Delete(cmd) => cmd.execute(&cli.target),
        Commands::List(cmd) => cmd.execute(&cli.target),
        Commands::Exists(cmd) => cmd.execute(&cli.target),
        Commands::Stats(cmd) => cmd.execute(&cli.target),
        Commands::Verify(cmd) => cmd.execute(&cli.target),
        Commands::AddContainer(cmd) => cmd.execute(&cli.target),
        Commands::DeleteContainer(cmd) => cmd.execute(&cli.target),
        Commands::ListContainers(cmd) => cmd.execute(&cli.target),
        Commands::ImportContainer(cmd) => cmd.execute(&cli.target),
        Commands::BackupContainer(cmd) => cmd.execute(&cli.target),
        Commands::Backup(cmd) => cmd.execute(&cli.target),
    };

    if let Err(err) = result {
        output::error(&format!("{err:#}"));
        std::process::exit(1);
    }
}
