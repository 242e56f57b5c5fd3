use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

#[test]
fn test_cli_end_to_end() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("commerce-core"));
    cmd.arg("tests/fixtures/checkout.jsonl");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "ref,order_id,customer_id,items,total,status",
        ))
        .stdout(predicate::str::contains(
            "ref,payment_id,order,amount,method,status,transaction_id,reject_reason,refund_reason",
        ))
        // o1 moved along to shipped, o2 was canceled
        .stdout(predicate::str::is_match(r"(?m)^o1,[0-9a-f-]+,[0-9a-f-]+,2,1100000,shipped$")?)
        .stdout(predicate::str::is_match(r"(?m)^o2,[0-9a-f-]+,[0-9a-f-]+,1,10,canceled$")?)
        .stdout(predicate::str::is_match(
            r"(?m)^p1,[0-9a-f-]+,o1,1100000,credit_card,approved,txn_[0-9a-f-]+,,$",
        )?)
        .stdout(predicate::str::is_match(
            r"(?m)^p2,[0-9a-f-]+,o2,10,bank_transfer,refunded,txn_[0-9a-f-]+,,customer request$",
        )?);

    Ok(())
}

#[test]
fn test_cli_decline_limit() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::new(cargo_bin!("commerce-core"));
    cmd.arg("tests/fixtures/checkout.jsonl")
        .arg("--decline-over")
        .arg("1000");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            ",o1,1100000,credit_card,rejected,,declined: amount 1100000 exceeds limit 1000,",
        ))
        .stdout(predicate::str::contains(",o2,10,bank_transfer,refunded,txn_"))
        .stderr(predicate::str::contains("failed to process command"));

    Ok(())
}

#[test]
fn test_cli_missing_input() {
    let mut cmd = Command::new(cargo_bin!("commerce-core"));
    cmd.arg("tests/fixtures/does-not-exist.jsonl");

    cmd.assert().failure();
}
