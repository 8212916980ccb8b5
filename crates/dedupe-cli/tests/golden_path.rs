// dedupe-cli — end-to-end CLI tests
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

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn dedupe() -> Command {
    Command::cargo_bin("dedupe").unwrap()
}

#[test]
fn create_store_retrieve_delete_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let chunks = dir.path().join("chunks");
    let index = dir.path().join("index.sqlite3");
    let input = dir.path().join("input.bin");
    let output = dir.path().join("output.bin");

    fs::write(&input, vec![42u8; 200_000]).unwrap();

    dedupe()
        .args(["--chunks", chunks.to_str().unwrap(), "--index", index.to_str().unwrap(), "create"])
        .assert()
        .success();

    dedupe()
        .args([
            "--chunks",
            chunks.to_str().unwrap(),
            "--index",
            index.to_str().unwrap(),
            "store",
            input.to_str().unwrap(),
            "--name",
            "blob",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("stored 'blob'"));

    dedupe()
        .args([
            "--chunks",
            chunks.to_str().unwrap(),
            "--index",
            index.to_str().unwrap(),
            "retrieve",
            "blob",
            "--out",
            output.to_str().unwrap(),
        ])
        .assert()
        .success();

    assert_eq!(fs::read(&input).unwrap(), fs::read(&output).unwrap());

    dedupe()
        .args(["--chunks", chunks.to_str().unwrap(), "--index", index.to_str().unwrap(), "exists", "blob"])
        .assert()
        .success();

    dedupe()
        .args(["--chunks", chunks.to_str().unwrap(), "--index", index.to_str().unwrap(), "delete", "blob"])
        .assert()
        .success();

    dedupe()
        .args(["--chunks", chunks.to_str().unwrap(), "--index", index.to_str().unwrap(), "exists", "blob"])
        .assert()
        .failure();
}

#[test]
fn store_without_create_fails_with_nonzero_exit() {
    let dir = tempfile::tempdir().unwrap();
    let chunks = dir.path().join("chunks");
    let index = dir.path().join("index.sqlite3");
    let input = dir.path().join("input.bin");
    fs::write(&input, b"hello").unwrap();

    dedupe()
        .args([
            "--chunks",
            chunks.to_str().unwrap(),
            "--index",
            index.to_str().unwrap(),
            "store",
            input.to_str().unwrap(),
        ])
        .assert()
        .failure();
}

#[test]
fn pool_mode_requires_container_for_object_commands() {
    let dir = tempfile::tempdir().unwrap();
    let chunks = dir.path().join("chunks");
    let index = dir.path().join("index.sqlite3");

    dedupe()
        .args(["--chunks", chunks.to_str().unwrap(), "--index", index.to_str().unwrap(), "--pool", "create"])
        .assert()
        .success();

    dedupe()
        .args([
            "--chunks",
            chunks.to_str().unwrap(),
            "--index",
            index.to_str().unwrap(),
            "--pool",
            "list",
        ])
        .assert()
        .failure();

    dedupe()
        .args([
            "--chunks",
            chunks.to_str().unwrap(),
            "--index",
            index.to_str().unwrap(),
            "--pool",
            "add-container",
            "c1",
        ])
        .assert()
        .success();

    dedupe()
        .args([
            "--chunks",
            chunks.to_str().unwrap(),
            "--index",
            index.to_str().unwrap(),
            "--pool",
            "--container",
            "c1",
            "list",
        ])
        .assert()
        .success();
}
