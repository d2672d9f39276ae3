//! Pipeline against a mock InfluxDB HTTP API.

mod helpers;

use std::time::Duration;

use geostat::{BatchConfig, DbSettings, LineSource, Pipeline, StoreWriter, Transport};
use httptest::{matchers::*, responders::*, Expectation, Server};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use helpers::{append_lines, wait_until, FakeResolver};

fn http_settings(server: &Server) -> DbSettings {
    DbSettings {
        host: server.addr().ip().to_string(),
        tcp_port: server.addr().port(),
        database: "weblogs".to_string(),
        measurement: "hits".to_string(),
        full_size: 2,
        transport: Transport::Http,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_schema_is_provisioned_once_across_flushes() {
    let server = httptest::ServerBuilder::new()
        .bind_addr(([127, 0, 0, 1], 0).into())
        .run()
        .expect("Failed to start mock server");
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/query"),
            request::body(url_decoded(contains(("q", "CREATE DATABASE \"weblogs\"")))),
        ])
        .times(1)
        .respond_with(status_code(200).body(r#"{"results":[{"statement_id":0}]}"#)),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/query"),
            request::body(url_decoded(contains((
                "q",
                "CREATE RETENTION POLICY \"geostat_rp\" ON \"weblogs\" DURATION 30d REPLICATION 1 DEFAULT"
            )))),
        ])
        .times(1)
        .respond_with(status_code(200).body(r#"{"results":[{"statement_id":0}]}"#)),
    );
    server.expect(
        Expectation::matching(all_of![
            request::method_path("POST", "/write"),
            request::query(url_decoded(contains(("db", "weblogs")))),
            request::body(matches(r"^hits,city=Mountain\\ View,country_code=US,geohash=9q9\w{9},host=test-host,ip=8\.8\.8\.\d count=1i \d+\nhits,")),
        ])
        .times(3)
        .respond_with(status_code(204)),
    );

    let db = http_settings(&server);
    let writer = StoreWriter::connect(&db).await.expect("writer should build");

    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("access.log");
    append_lines(&path, &[]);
    let cancel = CancellationToken::new();
    let source = LineSource::open(&path, Duration::from_millis(10), cancel.child_token())
        .await
        .expect("source should open");

    let pipeline = Pipeline::new(source, FakeResolver::default(), writer, BatchConfig::from_db(&db));
    let stats = pipeline.stats.clone();

    let (report, ()) = tokio::join!(pipeline.run(cancel.clone()), async {
        append_lines(
            &path,
            &[
                "GET /a 8.8.8.1", "GET /b 8.8.8.2", "GET /c 8.8.8.3", "GET /d 8.8.8.4",
                "GET /e 8.8.8.5", "GET /f 8.8.8.6",
            ],
        );
        assert!(wait_until(|| stats.points_written() == 6).await);
        cancel.cancel();
    });

    let report = report.expect("pipeline should stop cleanly");
    assert_eq!(report.points_written, 6);
}

#[tokio::test]
async fn test_rejected_writes_keep_pipeline_running() {
    let server = httptest::ServerBuilder::new()
        .bind_addr(([127, 0, 0, 1], 0).into())
        .run()
        .expect("Failed to start mock server");
    server.expect(
        Expectation::matching(request::method_path("POST", "/query"))
            .times(2)
            .respond_with(status_code(200).body(r#"{"results":[{"statement_id":0}]}"#)),
    );
    server.expect(
        Expectation::matching(request::method_path("POST", "/write"))
            .times(1..)
            .respond_with(status_code(500).body(r#"{"error":"timeout"}"#)),
    );

    let mut db = http_settings(&server);
    db.full_size = 1;
    db.max_retained = Some(2);
    let writer = StoreWriter::connect(&db).await.expect("writer should build");

    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("access.log");
    append_lines(&path, &[]);
    let cancel = CancellationToken::new();
    let source = LineSource::open(&path, Duration::from_millis(10), cancel.child_token())
        .await
        .expect("source should open");

    let pipeline = Pipeline::new(source, FakeResolver::default(), writer, BatchConfig::from_db(&db));
    let stats = pipeline.stats.clone();

    let (report, ()) = tokio::join!(pipeline.run(cancel.clone()), async {
        append_lines(&path, &["a 8.8.8.1", "b 8.8.8.2", "c 8.8.8.3", "d 8.8.8.4"]);
        assert!(wait_until(|| stats.lines_read() == 4).await);
        cancel.cancel();
    });

    let report = report.expect("rejected writes are not fatal");
    assert_eq!(report.points_written, 0);
    // Two points overflow the retry buffer, the other two are lost at shutdown
    assert_eq!(report.dropped(geostat::DropReason::RetainOverflow), 2);
    assert_eq!(report.dropped(geostat::DropReason::Shutdown), 2);
}

#[tokio::test]
async fn test_schema_failure_is_fatal() {
    let server = httptest::ServerBuilder::new()
        .bind_addr(([127, 0, 0, 1], 0).into())
        .run()
        .expect("Failed to start mock server");
    server.expect(
        Expectation::matching(request::method_path("POST", "/query"))
            .respond_with(status_code(401).body(r#"{"error":"authorization failed"}"#)),
    );

    let db = http_settings(&server);
    let writer = StoreWriter::connect(&db).await.expect("writer should build");

    let dir = TempDir::new().expect("Failed to create temp directory");
    let path = dir.path().join("access.log");
    append_lines(&path, &[]);
    let cancel = CancellationToken::new();
    let source = LineSource::open(&path, Duration::from_millis(10), cancel.child_token())
        .await
        .expect("source should open");

    let mut batch = BatchConfig::from_db(&db);
    batch.full_size = 1;
    let pipeline = Pipeline::new(source, FakeResolver::default(), writer, batch);

    let (result, ()) = tokio::join!(pipeline.run(cancel.clone()), async {
        append_lines(&path, &["GET / 8.8.8.8 200"]);
    });

    let err = result.expect_err("schema failure is fatal");
    assert!(format!("{:#}", err).contains("authorization failed"));
}
