//! `pvsync sync --interactive` with answers piped on stdin.
//!
//! GREEN when:
//! - `n` skips the first status and `a` accepts it and everything after.
//! - Only the accepted statuses are uploaded, in one batch.
//! - The text report lists the declined status on a `skipped_record` line.

use assert_cmd::Command;
use chrono::{Days, NaiveTime, Utc};
use httpmock::prelude::*;
use predicates::prelude::*;
use sqlx::sqlite::SqlitePoolOptions;

fn yesterday() -> (String, i64) {
    let date = Utc::now()
        .date_naive()
        .checked_sub_days(Days::new(1))
        .unwrap();
    let start = date.and_time(NaiveTime::MIN).and_utc().timestamp();
    (date.format("%Y-%m-%d").to_string(), start)
}

fn seed_archive(path: &std::path::Path, start: i64) {
    let url = format!("sqlite://{}?mode=rwc", path.display());
    let rt = tokio::runtime::Runtime::new().unwrap();
    rt.block_on(async {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(&url)
            .await
            .unwrap();
        sqlx::query(
            "create table archive (dateTime integer not null primary key, \
             energy real, gridPower real, inverterTemp real, gridVoltage real)",
        )
        .execute(&pool)
        .await
        .unwrap();
        for i in 1..=3_i64 {
            sqlx::query("insert into archive (dateTime, energy) values (?1, ?2)")
                .bind(start + i * 300)
                .bind(10.0 * i as f64)
                .execute(&pool)
                .await
                .unwrap();
        }
        pool.close().await;
    });
}

#[test]
fn declined_status_is_reported_and_not_uploaded() {
    let dir = tempfile::tempdir().unwrap();
    let (date, start) = yesterday();
    let db = dir.path().join("weewx.sdb");
    seed_archive(&db, start);

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(POST).path("/service/r2/getstatus.jsp");
        then.status(400).body("Bad request 400: No status found");
    });
    server.mock(|when, then| {
        when.method(POST).path("/service/r2/getsystem.jsp");
        then.status(200).body(";;0");
    });
    let upload = server.mock(|when, then| {
        when.method(POST).path("/service/r2/addbatchstatus.jsp");
        then.status(200).body("d,t,1;d,t,1");
    });

    let cfg = dir.path().join("pvsync.yaml");
    std::fs::write(
        &cfg,
        format!("pvoutput:\n  base_url: {}\n  retry_wait_secs: 0\n", server.base_url()),
    )
    .unwrap();

    Command::cargo_bin("pvsync")
        .unwrap()
        .current_dir(dir.path())
        .env_remove("PVSYNC_ARCHIVE_URL")
        .args([
            "sync",
            "--interactive",
            "--date",
            &date,
            "--api-key",
            "test-key",
            "--system-id",
            "4242",
            "--config",
            cfg.to_str().unwrap(),
            "--archive",
            &format!("sqlite://{}", db.display()),
        ])
        .write_stdin("n\na\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("skipped=1"))
        .stdout(predicate::str::contains("published=2"))
        .stdout(predicate::str::contains(format!(
            "skipped_record ts={} reason=declined by operator",
            start + 300
        )))
        .stderr(predicate::str::contains("publish?"));

    assert_eq!(upload.hits(), 1);
}
