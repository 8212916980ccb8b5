// dedupe-cli — command modules
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

pub mod containers;
pub mod create;
pub mod delete;
pub mod exists;
pub mod list;
pub mod retrieve;
pub mod stats;
pub mod store;
pub mod verify;

pub use containers::{
    AddContainerCmd, BackupCmd, BackupContainerCmd, DeleteContainerCmd, ImportContainerCmd, ListContainersCmd,
};
pub use create::CreateCmd;
pub use delete::DeleteCmd;
pub use exists::ExistsCmd;
pub use list::ListCmd;
pub use retrieve::RetrieveCmd;
pub use stats::StatsCmd;
pub use store::StoreCmd;
pub use verify::VerifyCmd;
