use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

mod common;

#[test]
fn test_malformed_lines_are_skipped() {
    let script = common::script(&[
        r#"{"op":"create_order","ref":"o1","customer":"c1","items":[{"product_id":"p","name":"Pen","unit_price":3,"quantity":1}]}"#,
        r#"{"op":"teleport","order":"o1"}"#,
        r#"not json at all"#,
        r#"{"op":"create_order","ref":"o2","customer":"c1"}"#,
        r#"{"op":"update_order_status","order":"o1","status":"paid"}"#,
    ]);

    let mut cmd = Command::new(cargo_bin!("commerce-core"));
    cmd.arg(script.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("failed to read command"))
        .stdout(predicate::str::is_match(r"(?m)^o1,[0-9a-f-]+,c1,1,3,paid$").unwrap())
        .stdout(predicate::str::contains("o2,").not());
}

#[test]
fn test_rejected_operations_do_not_stop_the_script() {
    let script = common::script(&[
        r#"{"op":"create_order","ref":"bad","customer":"c1","items":[{"product_id":"p","name":"Pen","unit_price":3,"quantity":0}]}"#,
        r#"{"op":"create_order","ref":"o1","customer":"c1","items":[{"product_id":"p","name":"Pen","unit_price":3,"quantity":2}]}"#,
        r#"{"op":"update_order_status","order":"o1","status":"delivered"}"#,
        r#"{"op":"create_payment","ref":"p1","order":"o1","amount":-6,"method":"credit_card"}"#,
        r#"{"op":"create_payment","ref":"p1","order":"o1","amount":6,"method":"cash"}"#,
        r#"{"op":"refund_payment","payment":"missing","reason":"x"}"#,
        r#"{"op":"create_member","ref":"m1","email":"no-at-sign","name":"Ada","password":"longenough"}"#,
        r#"{"op":"cancel_order","order":"o1"}"#,
    ]);

    let mut cmd = Command::new(cargo_bin!("commerce-core"));
    cmd.arg(script.path());

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("failed to process command"))
        .stdout(predicate::str::is_match(r"(?m)^o1,[0-9a-f-]+,c1,1,6,canceled$").unwrap())
        .stdout(predicate::str::contains("bad,").not())
        .stdout(predicate::str::contains("p1,").not());
}

#[test]
fn test_blank_script() {
    let script = common::script(&["", "   "]);

    let mut cmd = Command::new(cargo_bin!("commerce-core"));
    cmd.arg(script.path());

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(
            "ref,order_id,customer_id,items,total,status",
        ))
        .stderr(predicate::str::contains("failed").not());
}
