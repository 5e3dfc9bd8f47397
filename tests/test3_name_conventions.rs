#![cfg(feature = "sqlite")]

use std::collections::HashMap;

use serde::Deserialize;
use sql_facade::prelude::*;

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct Account {
    UserID: i64,
    FirstName: String,
    NickName: Option<String>,
}

async fn accounts(convention: NameConvention, columns: [&str; 3]) -> Result<Db, SqlFacadeError> {
    let db = Db::connect(DatabaseType::Sqlite, ":memory:", convention).await?;
    db.execute_batch(&format!(
        "CREATE TABLE accounts ({} INTEGER PRIMARY KEY, {} TEXT NOT NULL, {} TEXT);",
        columns[0], columns[1], columns[2]
    ))
    .await?;
    db.exec(
        &format!(
            "INSERT INTO accounts ({}, {}, {}) VALUES (?, ?, ?)",
            columns[0], columns[1], columns[2]
        ),
        &params![7, "Katherine", None::<String>],
    )
    .await?;
    Ok(db)
}

#[tokio::test]
async fn each_convention_finds_its_columns() -> Result<(), Box<dyn std::error::Error>> {
    let cases = [
        (NameConvention::Same, ["UserID", "FirstName", "NickName"]),
        (NameConvention::Uncapitalized, ["userID", "firstName", "nickName"]),
        (NameConvention::UnderScore, ["user_id", "first_name", "nick_name"]),
        (NameConvention::Uppercase, ["USERID", "FIRSTNAME", "NICKNAME"]),
        (
            NameConvention::UppercaseUnderScore,
            ["USER_ID", "FIRST_NAME", "NICK_NAME"],
        ),
    ];
    for (convention, columns) in cases {
        let db = accounts(convention, columns).await?;
        let acct: Account = db.select_one("SELECT * FROM accounts", &[]).await?;
        assert_eq!(acct.UserID, 7, "{convention:?}");
        assert_eq!(acct.FirstName, "Katherine");
        assert!(acct.NickName.is_none());
    }
    Ok(())
}

#[tokio::test]
async fn switching_convention_shares_the_pool() -> Result<(), Box<dyn std::error::Error>> {
    let snake = accounts(NameConvention::UnderScore, ["user_id", "first_name", "nick_name"]).await?;
    let same = snake.with_name_convention(NameConvention::Same);

    // raw field names no longer match the snake_case columns
    let err = same
        .select_one::<Account>("SELECT * FROM accounts", &[])
        .await
        .unwrap_err();
    assert!(matches!(err, SqlFacadeError::Mapping(_)));

    // aliasing the columns fixes it, on the very same in-memory database
    let acct: Account = same
        .select_one(
            "SELECT user_id AS UserID, first_name AS FirstName, nick_name AS NickName FROM accounts",
            &[],
        )
        .await?;
    assert_eq!(acct.UserID, 7);
    Ok(())
}

#[tokio::test]
async fn custom_convention_and_raw_maps() -> Result<(), Box<dyn std::error::Error>> {
    fn prefixed(field: &str) -> String {
        format!("acct_{}", field.to_lowercase())
    }
    let db = accounts(
        NameConvention::Custom(prefixed),
        ["acct_userid", "acct_firstname", "acct_nickname"],
    )
    .await?;
    let acct: Account = db.select_one("SELECT * FROM accounts", &[]).await?;
    assert_eq!(acct.FirstName, "Katherine");

    // maps are keyed by the raw column names
    let raw: HashMap<String, serde_json::Value> =
        db.select_one("SELECT * FROM accounts", &[]).await?;
    assert_eq!(raw["acct_userid"], serde_json::json!(7));
    assert!(raw["acct_nickname"].is_null());
    Ok(())
}
