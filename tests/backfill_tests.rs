//! 回填与趋势视图集成测试

mod laser_test_fixtures;

use laser_validation::error::ErrorCategory;
use laser_validation::history::HistoryStore;
use laser_validation::tools::{
    AppConfig, TrendWindow, build_trend, format_trend_report, process_backfill_parallel,
    process_backfill_serial, scan_run_files, write_trend_json,
};
use laser_test_fixtures::{
    BACKFILL_CORRUPT_RUN, BACKFILL_GOOD_RUNS, BACKFILL_MISSING_HISTOGRAM_RUN, backfill_dir,
    ensure_fixtures_generated, scratch_history,
};

fn log(msg_zh: impl AsRef<str>, msg_en: impl AsRef<str>) {
    println!("{} / {}", msg_zh.as_ref(), msg_en.as_ref());
}

fn config_for(tag: &str) -> AppConfig {
    ensure_fixtures_generated();
    AppConfig {
        history_path: scratch_history(tag),
        data_dir: backfill_dir(),
        rebuild: true,
        ..AppConfig::default()
    }
}

#[test]
fn test_scan_finds_all_run_files() {
    ensure_fixtures_generated();
    let runs: Vec<u32> = scan_run_files(&backfill_dir())
        .unwrap()
        .iter()
        .map(|f| f.run)
        .collect();
    assert_eq!(
        runs,
        vec![
            BACKFILL_GOOD_RUNS[0],
            BACKFILL_GOOD_RUNS[1],
            BACKFILL_GOOD_RUNS[2],
            BACKFILL_CORRUPT_RUN,
            BACKFILL_MISSING_HISTOGRAM_RUN,
        ]
    );
}

#[test]
fn test_serial_backfill_appends_in_order() {
    let config = config_for("serial");
    let store = HistoryStore::new(&config.history_path);
    let files = scan_run_files(&config.data_dir).unwrap();

    let snapshot = process_backfill_serial(&files, &store, &config).unwrap();
    log(
        format!("串行回填: {snapshot:?}"),
        "serial backfill snapshot",
    );
    assert_eq!(snapshot.processed, 3);
    assert_eq!(snapshot.failed, 2);
    assert_eq!(snapshot.duplicates, 0);
    assert_eq!(snapshot.error_stats[&ErrorCategory::Format].len(), 1);
    assert_eq!(snapshot.error_stats[&ErrorCategory::MissingObject].len(), 1);

    let rows = store.load_all().unwrap();
    let runs: Vec<u32> = rows.iter().map(|s| s.run).collect();
    assert_eq!(runs, BACKFILL_GOOD_RUNS.to_vec());
    let bad: Vec<u32> = rows.iter().map(|s| s.bad_channels).collect();
    assert_eq!(bad, vec![0, 0, 1]);
    assert_eq!(rows[1].peak_time, 760.0);

    // 再次回填：全部已记录
    let again = process_backfill_serial(&files, &store, &config).unwrap();
    assert_eq!(again.processed, 0);
    assert_eq!(again.duplicates, 3);
    assert_eq!(store.load_all().unwrap().len(), 3);

    std::fs::remove_file(&config.history_path).ok();
}

#[test]
fn test_parallel_backfill_matches_serial() {
    let serial_config = config_for("par_ref");
    let serial_store = HistoryStore::new(&serial_config.history_path);
    let files = scan_run_files(&serial_config.data_dir).unwrap();
    process_backfill_serial(&files, &serial_store, &serial_config).unwrap();

    let config = AppConfig {
        parallel_runs: 3,
        ..config_for("parallel")
    };
    let store = HistoryStore::new(&config.history_path);
    let snapshot = process_backfill_parallel(&files, &store, &config, 3).unwrap();
    assert_eq!(snapshot.processed, 3);
    assert_eq!(snapshot.failed, 2);

    assert_eq!(store.load_all().unwrap(), serial_store.load_all().unwrap());

    std::fs::remove_file(&serial_config.history_path).ok();
    std::fs::remove_file(&config.history_path).ok();
}

#[test]
fn test_trend_from_backfilled_history() {
    let config = config_for("trend");
    let store = HistoryStore::new(&config.history_path);
    let files = scan_run_files(&config.data_dir).unwrap();
    process_backfill_serial(&files, &store, &config).unwrap();

    let rows = store.load_all().unwrap();
    let window = TrendWindow::resolve(30000, None, store.last_run().unwrap()).unwrap();
    assert_eq!(window.to, BACKFILL_GOOD_RUNS[2] + 100);

    let report = build_trend(&rows, window, 0);
    assert_eq!(report.points.len(), 3);
    // 阈值为0时，只有含分裂通道的运行被高亮
    assert_eq!(report.highlighted_count(), 1);
    for point in &report.points {
        let total = point.intensity_total.unwrap();
        assert!((total - 10_000.0 / 1750.0 / 250_000.0).abs() < 1e-12 || point.run == BACKFILL_GOOD_RUNS[2]);
    }

    let text = format_trend_report(&report);
    assert!(text.contains("30003"));

    let json_path = std::env::temp_dir().join(format!("laser_it_trend_{}.json", std::process::id()));
    write_trend_json(&report, &json_path).unwrap();
    let value: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
    assert_eq!(value["points"].as_array().unwrap().len(), 3);

    std::fs::remove_file(&json_path).ok();
    std::fs::remove_file(&config.history_path).ok();
}
