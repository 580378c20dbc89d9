mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_partial_capacity_drops_overflow() {
    let file = common::scenario(&[
        "grant, , bob, diamond, 200",
        "join, , alice, , 2",
        "start, l1, bob, diamond, 200",
        "win, l1, alice, ,",
    ]);

    let mut cmd = Command::new(cargo_bin!("escrow-lot"));
    cmd.arg(file.path());

    // Two slots of 64 fit, the remaining 72 land at alice's feet.
    cmd.assert()
        .success()
        .stdout(predicate::str::contains("win,l1,alice,128,72,0"));
}

#[test]
fn test_custom_stack_size() {
    let file = common::scenario(&[
        "stack, , , ender_pearl, 16",
        "grant, , bob, ender_pearl, 40",
        "join, , alice, , 1",
        "start, l1, bob, ender_pearl, 40",
        "win, l1, alice, ,",
    ]);

    let mut cmd = Command::new(cargo_bin!("escrow-lot"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("win,l1,alice,16,24,0"));
}

#[test]
fn test_offline_winner_gets_lot_on_join() {
    let file = common::scenario(&[
        "grant, , bob, emerald, 10",
        "start, l1, bob, emerald, 10",
        "win, l1, carol, ,",
        "join, , carol, , 36",
    ]);

    let mut cmd = Command::new(cargo_bin!("escrow-lot"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("win,l1,carol,0,0,10"))
        .stdout(predicate::str::contains("redeliver,,carol,10,0,0"));
}

#[test]
fn test_cancel_returns_items_to_seller() {
    let file = common::scenario(&[
        "grant, , bob, gold_ingot, 5",
        "join, , bob, , 36",
        "start, l1, bob, gold_ingot, 5",
        "cancel, l1, , ,",
    ]);

    let mut cmd = Command::new(cargo_bin!("escrow-lot"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("cancel,l1,bob,5,0,0"));
}

#[test]
fn test_delivered_lot_cannot_be_delivered_twice() {
    let file = common::scenario(&[
        "grant, , bob, diamond, 3",
        "join, , alice, , 36",
        "start, l1, bob, diamond, 3",
        "win, l1, alice, ,",
        "win, l1, alice, ,",
    ]);

    let mut cmd = Command::new(cargo_bin!("escrow-lot"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("win,l1,alice,3,0,0"))
        .stderr(predicate::str::contains("Unknown lot: l1"));
}

#[test]
fn test_unfinished_lots_return_to_sellers_at_exit() {
    let file = common::scenario(&[
        "grant, , bob, diamond, 6",
        "grant, , dave, gold_ingot, 2",
        "join, , bob, , 36",
        "join, , dave, , 36",
        "start, l2, dave, gold_ingot, 2",
        "start, l1, bob, diamond, 6",
    ]);

    let mut cmd = Command::new(cargo_bin!("escrow-lot"));
    cmd.arg(file.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("cancel,l1,bob,6,0,0"))
        .stdout(predicate::str::contains("cancel,l2,dave,2,0,0"));
}
