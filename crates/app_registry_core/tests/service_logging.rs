use app_registry_core::db::open_db_in_memory;
use app_registry_core::{AppDto, AppService, PageRequest, SqliteAppRepository};
use log::{LevelFilter, Log, Metadata, Record};
use std::sync::Mutex;

struct CapturingLogger {
    lines: Mutex<Vec<String>>,
}

impl Log for CapturingLogger {
    fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        self.lines.lock().unwrap().push(record.args().to_string());
    }

    fn flush(&self) {}
}

static LOGGER: CapturingLogger = CapturingLogger {
    lines: Mutex::new(Vec::new()),
};

fn take_lines() -> Vec<String> {
    std::mem::take(&mut *LOGGER.lines.lock().unwrap())
}

fn single_event<'a>(lines: &'a [String], event: &str) -> &'a str {
    let prefix = format!("event={event} ");
    let matching: Vec<&String> = lines.iter().filter(|line| line.starts_with(&prefix)).collect();
    assert_eq!(matching.len(), 1, "expected one {event} line in {lines:?}");
    matching[0]
}

fn assert_outcome(line: &str, status: &str) {
    assert!(line.contains("module=service"), "{line}");
    assert!(line.contains(&format!("status={status}")), "{line}");
    assert!(line.contains("duration_ms="), "{line}");
}

// Single test in this binary: the logger is process-global.
#[test]
fn every_service_operation_logs_its_outcome() {
    log::set_logger(&LOGGER).unwrap();
    log::set_max_level(LevelFilter::Trace);

    let conn = open_db_in_memory().unwrap();
    let service = AppService::new(SqliteAppRepository::try_new(&conn).unwrap());
    service.create(&AppDto::new("ordertest", "Order Test")).unwrap();
    take_lines();

    service.get("ordertest").unwrap();
    let lines = take_lines();
    let line = single_event(&lines, "app_get");
    assert_outcome(line, "ok");
    assert!(line.contains("app_id=ordertest"), "{line}");

    service.get("ghost").unwrap_err();
    let lines = take_lines();
    let line = single_event(&lines, "app_get");
    assert_outcome(line, "error");
    assert!(line.contains("error_code=not_found"), "{line}");

    service.is_app_id_unique("ordertest").unwrap();
    let lines = take_lines();
    assert_outcome(single_event(&lines, "app_is_unique"), "ok");

    service.find(None, PageRequest::new(0, 10)).unwrap();
    let lines = take_lines();
    let outcome = lines
        .iter()
        .find(|line| line.starts_with("event=app_find ") && line.contains("status="))
        .unwrap_or_else(|| panic!("no app_find outcome in {lines:?}"));
    assert_outcome(outcome, "ok");

    service.find(Some("Order Test"), PageRequest::new(0, 10)).unwrap();
    let lines = take_lines();
    let outcome = lines
        .iter()
        .find(|line| line.starts_with("event=app_find ") && line.contains("status="))
        .unwrap_or_else(|| panic!("no app_find outcome in {lines:?}"));
    assert_outcome(outcome, "ok");

    conn.execute_batch("DROP TABLE apps;").unwrap();
    service.find(None, PageRequest::new(0, 10)).unwrap_err();
    let lines = take_lines();
    let line = single_event(&lines, "app_find");
    assert_outcome(line, "error");
    assert!(line.contains("error_code=repo_error"), "{line}");
}
