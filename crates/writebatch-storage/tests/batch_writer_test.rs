mod common;

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use common::RecordingStore;
use proptest::prelude::*;
use rusqlite::Connection;
use writebatch_core::errors::WriteError;
use writebatch_core::events::{JobSealedEvent, WriteEventHandler};
use writebatch_core::types::{FlushKind, InsertMode, WritePhase};
use writebatch_storage::{
    execute_in_transaction, execute_jobs, open_in_memory, BatchWriter, FlushJob, SqlValue,
    TableBatch,
};

type Tables = BTreeMap<String, TableBatch>;

fn row(id: i64, name: &str) -> Vec<SqlValue> {
    vec![SqlValue::from(id), SqlValue::from(name)]
}

fn table_map(batches: impl IntoIterator<Item = TableBatch>) -> Tables {
    batches
        .into_iter()
        .map(|b| (b.table_name().to_string(), b))
        .collect()
}

fn scenario_store() -> Connection {
    let conn = open_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE a (id INTEGER PRIMARY KEY, name TEXT);
         CREATE TABLE b (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO a VALUES (1, 'stale');",
    )
    .unwrap();
    conn
}

fn scenario_tables() -> Tables {
    let mut a = TableBatch::new("a", ["id", "name"]);
    a.add_delete(1);
    a.add_insert(1, row(1, "x")).unwrap();
    a.add_insert(2, row(2, "y")).unwrap();
    let mut b = TableBatch::new("b", ["id", "name"]);
    b.add_insert(5, row(5, "z")).unwrap();
    table_map([a, b])
}

fn dump(conn: &Connection, table: &str) -> Vec<Vec<SqlValue>> {
    let mut stmt = conn
        .prepare(&format!("SELECT * FROM {table} ORDER BY id"))
        .unwrap();
    let columns = stmt.column_count();
    let rows = stmt
        .query_map([], |r| {
            (0..columns)
                .map(|i| r.get::<_, SqlValue>(i))
                .collect::<rusqlite::Result<Vec<_>>>()
        })
        .unwrap()
        .collect::<Result<Vec<_>, _>>()
        .unwrap();
    rows
}

fn delete_job_count(jobs: &[FlushJob<'_>]) -> usize {
    jobs.iter().filter(|j| j.kind() == FlushKind::Delete).count()
}

#[test]
fn test_example_scenario_order_and_result() {
    let conn = scenario_store();
    let mut tables = scenario_tables();
    let writer = BatchWriter::with_mode(10, InsertMode::Parameterized);

    let jobs = writer.write(&conn, &mut tables).unwrap();

    let shape: Vec<_> = jobs
        .iter()
        .map(|j| (j.kind(), j.tables().to_vec(), j.entry_count()))
        .collect();
    assert_eq!(
        shape,
        vec![
            (FlushKind::Delete, vec!["a".to_string()], 1),
            (FlushKind::Insert, vec!["a".to_string()], 2),
            (FlushKind::Insert, vec!["b".to_string()], 1),
        ]
    );

    execute_jobs(jobs).unwrap();
    assert_eq!(dump(&conn, "a"), vec![row(1, "x"), row(2, "y")]);
    assert_eq!(dump(&conn, "b"), vec![row(5, "z")]);
}

#[test]
fn test_literal_scenario_keeps_deletes_first() {
    let conn = scenario_store();
    let mut tables = scenario_tables();
    let writer = BatchWriter::with_mode(10, InsertMode::Literal);

    let jobs = writer.write(&conn, &mut tables).unwrap();
    assert_eq!(jobs[0].kind(), FlushKind::Delete);
    assert!(jobs[1..].iter().all(|j| j.kind() == FlushKind::Insert));
    // Literal inserts share one accumulator across tables.
    assert_eq!(jobs.len(), 2);
    assert_eq!(jobs[1].tables(), &["a".to_string(), "b".to_string()]);

    execute_jobs(jobs).unwrap();
    assert_eq!(dump(&conn, "a"), vec![row(1, "x"), row(2, "y")]);
}

#[test]
fn test_replace_deletes_precede_inserts_for_every_table() {
    let conn = open_in_memory().unwrap();
    let writer = BatchWriter::with_mode(3, InsertMode::Parameterized);
    let mut batches = Vec::new();
    for name in ["t1", "t2", "t3"] {
        let mut batch = TableBatch::new(name, ["id", "name"]);
        for id in 0..4 {
            batch.add_delete(id);
            batch.add_insert(id, row(id, name)).unwrap();
        }
        batches.push(batch);
    }
    let mut tables = table_map(batches);

    let jobs = writer.write(&conn, &mut tables).unwrap();
    for name in ["t1", "t2", "t3"] {
        let last_delete = jobs
            .iter()
            .rposition(|j| j.kind() == FlushKind::Delete && j.touches(name))
            .unwrap();
        let insert = jobs
            .iter()
            .position(|j| j.kind() == FlushKind::Insert && j.touches(name))
            .unwrap();
        assert!(last_delete < insert, "{name}: delete job after insert job");
    }
}

#[test]
fn test_delete_job_count_boundaries() {
    let conn = open_in_memory().unwrap();
    let threshold = 4;
    let writer = BatchWriter::with_mode(threshold, InsertMode::Parameterized);

    for (n, expected) in [(0, 0), (threshold, 1), (threshold + 1, 2)] {
        let mut batch = TableBatch::deletes_only("gene");
        for id in 0..n as i64 {
            batch.add_delete(id);
        }
        let mut tables = table_map([batch]);
        let jobs = writer.write(&conn, &mut tables).unwrap();
        assert_eq!(delete_job_count(&jobs), expected, "n = {n}");
    }
}

proptest! {
    #[test]
    fn prop_delete_jobs_is_ceil_n_over_b(
        per_table in proptest::collection::vec(0usize..40, 0..5),
        threshold in 1usize..16,
    ) {
        let store = RecordingStore::new();
        let writer = BatchWriter::with_mode(threshold, InsertMode::Parameterized);
        let mut tables = table_map(per_table.iter().enumerate().map(|(t, n)| {
            let mut batch = TableBatch::deletes_only(format!("t{t}"));
            for id in 0..*n as i64 {
                batch.add_delete(id);
            }
            batch
        }));

        let jobs = writer.write(&store, &mut tables).unwrap();
        let total: usize = per_table.iter().sum();
        prop_assert_eq!(delete_job_count(&jobs), total.div_ceil(threshold));
        prop_assert_eq!(jobs.iter().map(FlushJob::entry_count).sum::<usize>(), total);
        prop_assert!(jobs.iter().all(|j| j.entry_count() <= threshold));
    }
}

#[test]
fn test_batches_drained_after_write() {
    let conn = scenario_store();
    let mut tables = scenario_tables();
    BatchWriter::default().write(&conn, &mut tables).unwrap();
    for batch in tables.values() {
        assert!(batch.ids_to_delete().is_empty());
        assert!(batch.rows_to_insert().is_empty());
        assert!(!batch.column_names().is_empty());
    }

    // Reusable for the next cycle.
    let a = tables.get_mut("a").unwrap();
    a.add_insert(3, row(3, "w")).unwrap();
    let jobs = BatchWriter::default().write(&conn, &mut tables).unwrap();
    assert_eq!(jobs.len(), 1);
}

#[test]
fn test_shape_mismatch_before_any_store_call() {
    let store = RecordingStore::new();
    let mut good = TableBatch::new("a", ["id", "name"]);
    good.add_delete(1);
    good.add_insert(1, row(1, "x")).unwrap();
    let mut bad = TableBatch::new("b", ["id"]);
    bad.add_insert(2, vec![SqlValue::from(2)]).unwrap();
    bad.set_column_names(["id", "name", "extra"]);
    let mut tables = table_map([good, bad]);

    let err = BatchWriter::default().write(&store, &mut tables).unwrap_err();
    assert!(matches!(
        err,
        WriteError::ShapeMismatch { ref table, expected: 3, actual: 1, .. } if table == "b"
    ));
    assert!(store.calls().is_empty());
}

#[test]
fn test_strategies_reach_same_store_state() {
    let schema = "CREATE TABLE sample (id INTEGER PRIMARY KEY, label TEXT, score REAL, flag INTEGER, payload BLOB);
                  CREATE TABLE note (id INTEGER PRIMARY KEY, body TEXT);
                  INSERT INTO sample VALUES (1, 'old', 0.5, 0, NULL), (2, 'gone', 1.5, 1, X'00');
                  INSERT INTO note VALUES (10, 'keep');";

    let build = || {
        let mut sample = TableBatch::new("sample", ["id", "label", "score", "flag", "payload"]);
        sample.add_delete(1);
        sample.add_delete(2);
        sample
            .add_insert(
                1,
                vec![
                    SqlValue::from(1),
                    SqlValue::from("it's \"quoted\""),
                    SqlValue::from(2.0),
                    SqlValue::from(true),
                    SqlValue::from(vec![0xde, 0xad]),
                ],
            )
            .unwrap();
        sample
            .add_insert(
                3,
                vec![
                    SqlValue::from(3),
                    SqlValue::Null,
                    SqlValue::from(-0.25),
                    SqlValue::from(false),
                    SqlValue::Null,
                ],
            )
            .unwrap();
        let mut note = TableBatch::new("note", ["id", "body"]);
        for id in 11..20 {
            note.add_insert(id, row(id, &format!("line {id}; DROP TABLE note; --")))
                .unwrap();
        }
        note.add_insert(20, row(20, "nul\0inside 'text'")).unwrap();
        table_map([sample, note])
    };

    let mut states = Vec::new();
    for mode in [InsertMode::Literal, InsertMode::Parameterized] {
        let conn = open_in_memory().unwrap();
        conn.execute_batch(schema).unwrap();
        let mut tables = build();
        let jobs = BatchWriter::with_mode(4, mode).write(&conn, &mut tables).unwrap();
        execute_in_transaction(&conn, jobs).unwrap();
        states.push((dump(&conn, "sample"), dump(&conn, "note")));
    }

    assert_eq!(states[0], states[1]);
    assert_eq!(states[0].0.len(), 2);
    assert_eq!(states[0].1.len(), 11);
    assert_eq!(
        states[0].1.last(),
        Some(&vec![SqlValue::Integer(20), SqlValue::from("nul\0inside 'text'")])
    );
}

#[test]
fn test_deletes_without_columns_and_columns_without_rows() {
    let conn = open_in_memory().unwrap();
    let mut deletes = TableBatch::deletes_only("d");
    deletes.add_delete(1);
    deletes.add_delete(2);
    let idle = TableBatch::new("idle", ["id", "name"]);
    let mut tables = table_map([deletes, idle]);

    let jobs = BatchWriter::with_mode(10, InsertMode::Parameterized)
        .write(&conn, &mut tables)
        .unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].kind(), FlushKind::Delete);
    assert_eq!(
        jobs[0].sql(),
        vec!["DELETE FROM d WHERE id = 1", "DELETE FROM d WHERE id = 2"]
    );
}

#[test]
fn test_custom_id_column_and_quoting() {
    let store = RecordingStore::new();
    let config = writebatch_core::config::WriterConfig {
        max_batch_size: 10,
        insert_strategy: InsertMode::Literal,
        id_column: "row_id".to_string(),
    };
    let mut batch = TableBatch::new("order", ["row_id", "group"]);
    batch.add_delete(4);
    batch.add_insert(4, row(4, "g")).unwrap();
    let mut tables = table_map([batch]);

    let jobs = BatchWriter::new(&config).write(&store, &mut tables).unwrap();
    assert_eq!(jobs[0].sql(), vec!["DELETE FROM \"order\" WHERE row_id = 4"]);
    assert_eq!(
        jobs[1].sql(),
        vec!["INSERT INTO \"order\" (row_id, \"group\") VALUES (4, 'g')"]
    );
}

#[test]
fn test_add_failure_releases_open_batch() {
    let store = RecordingStore::new();
    store.fail_add_after.set(Some(3));
    let mut batch = TableBatch::deletes_only("gene");
    for id in 0..5 {
        batch.add_delete(id);
    }
    let mut tables = table_map([batch]);

    let mut jobs = Vec::new();
    let err = BatchWriter::with_mode(2, InsertMode::Parameterized)
        .write_into(&store, &mut tables, &mut jobs)
        .unwrap_err();

    assert!(matches!(
        err,
        WriteError::WriteFailure { phase: WritePhase::Delete, .. }
    ));
    // The first full batch was sealed before the failure and stays valid.
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].entry_count(), 2);
    assert_eq!(store.calls().last().map(String::as_str), Some("close batch"));
    // Nothing was drained because the delete phase never completed.
    assert_eq!(tables["gene"].pending_deletes(), 5);
}

#[test]
fn test_insert_failure_in_write_keeps_deletes() {
    let store = RecordingStore::new();
    store.fail_prepare.set(true);
    let mut batch = TableBatch::new("gene", ["id", "name"]);
    batch.add_delete(1);
    batch.add_insert(1, row(1, "a")).unwrap();
    let mut tables = table_map([batch]);

    let err = BatchWriter::with_mode(10, InsertMode::Parameterized)
        .write(&store, &mut tables)
        .unwrap_err();

    assert!(matches!(
        err,
        WriteError::WriteFailure { phase: WritePhase::Prepare, .. }
    ));
    // The sealed delete job never reached the caller, so the delete stays
    // pending for the next write.
    assert_eq!(tables["gene"].pending_deletes(), 1);
    assert_eq!(tables["gene"].pending_inserts(), 1);
}

#[test]
fn test_release_failure_keeps_prior_error() {
    let store = RecordingStore::new();
    store.fail_add_after.set(Some(0));
    store.fail_close.set(true);
    let mut batch = TableBatch::deletes_only("gene");
    batch.add_delete(1);
    let mut tables = table_map([batch]);

    let err = BatchWriter::default().write(&store, &mut tables).unwrap_err();
    match err {
        WriteError::ResourceReleaseFailure { prior: Some(prior), .. } => {
            assert!(matches!(
                *prior,
                WriteError::WriteFailure { phase: WritePhase::Delete, .. }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_bind_failure_releases_prepared_statement() {
    let store = RecordingStore::new();
    store.fail_bind.set(true);
    let mut batch = TableBatch::new("gene", ["id", "name"]);
    batch.add_insert(1, row(1, "a")).unwrap();
    let mut tables = table_map([batch]);

    let err = BatchWriter::with_mode(10, InsertMode::Parameterized)
        .write(&store, &mut tables)
        .unwrap_err();
    assert!(matches!(
        err,
        WriteError::WriteFailure { phase: WritePhase::Insert, .. }
    ));
    assert_eq!(
        store.calls(),
        vec![
            "prepare INSERT INTO gene (id, name) VALUES (?1, ?2)".to_string(),
            "close prepared".to_string(),
        ]
    );
}

#[test]
fn test_execute_jobs_runs_in_sequence_order() {
    let store = RecordingStore::new();
    let mut gene = TableBatch::new("gene", ["id", "name"]);
    gene.add_delete(1);
    gene.add_insert(1, row(1, "a")).unwrap();
    let mut tables = table_map([gene]);

    let jobs = BatchWriter::with_mode(10, InsertMode::Parameterized)
        .write(&store, &mut tables)
        .unwrap();
    let stats = execute_jobs(jobs).unwrap();
    assert_eq!(stats.jobs, 2);

    let calls = store.calls();
    let delete = calls
        .iter()
        .position(|c| c == "execute DELETE FROM gene WHERE id = 1")
        .unwrap();
    let insert = calls
        .iter()
        .position(|c| c.starts_with("execute prepared INSERT INTO gene"))
        .unwrap();
    assert!(delete < insert);
}

#[test]
fn test_execute_failure_reports_release_failure() {
    let store = RecordingStore::new();
    let mut gene = TableBatch::deletes_only("gene");
    gene.add_delete(1);
    let mut tables = table_map([gene]);
    let jobs = BatchWriter::default().write(&store, &mut tables).unwrap();

    store.fail_execute.set(true);
    store.fail_close.set(true);
    let err = execute_jobs(jobs).unwrap_err();
    assert!(matches!(
        err,
        WriteError::ResourceReleaseFailure { prior: Some(_), .. }
    ));
}

#[derive(Default)]
struct CountingEvents {
    sealed: AtomicUsize,
    entries: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
}

impl WriteEventHandler for CountingEvents {
    fn on_job_sealed(&self, event: &JobSealedEvent<'_>) {
        self.sealed.fetch_add(1, Ordering::SeqCst);
        self.entries.fetch_add(event.entries, Ordering::SeqCst);
    }

    fn on_write_completed(&self, _event: &writebatch_core::events::WriteCompletedEvent) {
        self.completed.fetch_add(1, Ordering::SeqCst);
    }

    fn on_write_failed(&self, _error: &WriteError) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_event_sink_sees_every_job() {
    let conn = scenario_store();
    let events = Arc::new(CountingEvents::default());
    let writer =
        BatchWriter::with_mode(10, InsertMode::Parameterized).with_events(events.clone());

    let mut tables = scenario_tables();
    let jobs = writer.write(&conn, &mut tables).unwrap();
    assert_eq!(events.sealed.load(Ordering::SeqCst), jobs.len());
    assert_eq!(events.entries.load(Ordering::SeqCst), 4);
    assert_eq!(events.completed.load(Ordering::SeqCst), 1);

    let mut bad = TableBatch::new("a", ["id"]);
    bad.add_insert(1, vec![SqlValue::from(1)]).unwrap();
    bad.set_column_names(Vec::<String>::new());
    let mut tables = table_map([bad]);
    assert!(writer.write(&conn, &mut tables).is_err());
    assert_eq!(events.failed.load(Ordering::SeqCst), 1);
}
