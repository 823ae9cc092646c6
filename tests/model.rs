use std::collections::HashSet;

use sysdash::app::{App, AppOptions};
use sysdash::snapshot::LinkState;
use sysdash::{
    Config, DashboardError, DashboardEvent, DashboardModel, RefreshConfig, RefreshInterval,
    SchedulerState, Series, SeriesSample, SyntheticSource,
};

fn idle_model(seed: u64) -> DashboardModel {
    DashboardModel::new(
        Box::new(SyntheticSource::seeded(seed)),
        RefreshConfig::default(),
    )
    .unwrap()
}

#[test]
fn construction_takes_the_initial_snapshot() {
    let model = idle_model(1);
    assert_eq!(model.refresh_interval(), RefreshInterval::Five);
    assert_eq!(model.scheduler_state(), SchedulerState::Idle);
    for series in Series::ALL {
        assert_eq!(model.history_len(series), 1);
    }
    assert_eq!(
        model.history_for(Series::Cpu)[0].timestamp,
        model.current_snapshot().taken_at
    );
}

#[test]
fn snapshots_are_well_formed() {
    let model = idle_model(2);
    let snapshot = model.current_snapshot();

    let in_range = |v: f64| (0.0..=100.0).contains(&v);
    assert!(in_range(snapshot.cpu.usage_percent.get()));
    assert!(snapshot
        .cpu
        .per_core_usage_percent
        .iter()
        .all(|c| in_range(c.get())));
    assert!(snapshot.memory.used_gib <= snapshot.memory.total_gib);
    assert!(snapshot.memory.swap_used_gib <= snapshot.memory.swap_total_gib);
    assert!(snapshot
        .disk
        .partitions
        .iter()
        .all(|p| p.used_gib <= p.total_gib));
    assert!(snapshot.network.download_speed_mbs >= 0.0);

    for interface in &snapshot.network.interfaces {
        assert_eq!(
            interface.ip().is_some(),
            interface.state() == LinkState::Up,
            "{}",
            interface.name()
        );
    }

    let processes = &snapshot.processes;
    assert!(processes.running + processes.sleeping <= processes.total);
    let pids: HashSet<u32> = processes.list.iter().map(|p| p.pid).collect();
    assert_eq!(pids.len(), processes.list.len());
    assert!(processes.list.iter().all(|p| p.pid > 0));
    assert!(processes
        .list
        .iter()
        .all(|p| in_range(p.cpu_percent) && in_range(p.memory_percent)));
}

#[test]
fn invalid_interval_is_rejected_and_ignored() {
    let mut model = idle_model(3);
    let mut events = model.subscribe();

    let err = model.set_refresh_interval(1000).unwrap_err();
    assert!(matches!(err, DashboardError::InvalidConfig(_)));
    assert!(model.set_refresh_interval(0).is_err());
    assert_eq!(model.refresh_interval(), RefreshInterval::Five);
    assert!(events.try_recv().is_err());
}

#[test]
fn changing_interval_while_idle_stays_idle() {
    let mut model = idle_model(4);
    let mut events = model.subscribe();

    model.set_refresh_interval(10).unwrap();
    assert_eq!(model.refresh_interval(), RefreshInterval::Ten);
    assert_eq!(model.scheduler_state(), SchedulerState::Idle);
    assert!(matches!(
        events.try_recv(),
        Ok(DashboardEvent::IntervalChanged(RefreshInterval::Ten))
    ));

    // Same interval again is not a change
    model.set_refresh_interval(10).unwrap();
    assert!(events.try_recv().is_err());
}

#[test]
fn history_by_name() {
    let model = idle_model(5);

    let memory = model.history_for_name("memory").unwrap();
    assert_eq!(memory.len(), 1);
    assert!(matches!(memory[0].value, SeriesSample::Usage(_)));

    let network = model.history_for_name("net").unwrap();
    assert!(matches!(network[0].value, SeriesSample::Network(_)));

    let err = model.history_for_name("gpu").unwrap_err();
    assert!(matches!(err, DashboardError::UnknownSeries(name) if name == "gpu"));
}

#[test]
fn reset_history_keeps_the_snapshot() {
    let model = idle_model(6);
    let snapshot = model.current_snapshot();
    model.reset_history();
    for series in Series::ALL {
        assert_eq!(model.history_len(series), 0);
    }
    assert_eq!(*model.current_snapshot(), *snapshot);
}

#[test]
fn config_thresholds_drive_alerts() {
    let mut config = Config::default();
    config.alerts.cpu.warning = 0.0;
    config.alerts.cpu.critical = 100.0;
    let model = DashboardModel::from_config(Box::new(SyntheticSource::seeded(7)), &config).unwrap();

    let alerts = model.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "CPU usage over 0%");
}

#[test]
fn invalid_config_is_refused() {
    let config = Config {
        process_count: 0,
        ..Config::default()
    };
    let result = DashboardModel::from_config(Box::new(SyntheticSource::seeded(8)), &config);
    assert!(matches!(result, Err(DashboardError::InvalidConfig(_))));
}

#[test]
fn snapshot_json_uses_display_keys() {
    let json = idle_model(9).current_snapshot().to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();

    assert!(value["takenAt"].is_string());
    assert!(value["cpu"]["perCoreUsagePercent"].is_array());
    assert!(value["memory"]["totalGiB"].is_number());
    assert!(value["disk"]["readSpeedMBs"].is_number());
    assert!(value["network"]["downloadSpeedMBs"].is_number());
    assert!(value["processes"]["list"].is_array());
    assert!(value["memory"]["swapTotalGiB"].is_number());
    assert!(value["cpu"]["loadAverage"]["fifteen"].is_number());
    assert!(value["cpu"]["frequencyMhz"].is_number());
    assert_eq!(value["system"]["hostname"], "sysdash-demo");
    assert!(value["system"]["uptimeSecs"].is_u64());
}

#[test]
fn app_exports_last_snapshot_on_shutdown() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last.json");

    let mut app = App::new(
        &Config::default(),
        AppOptions {
            export: Some(path.clone()),
            seed: Some(10),
            ..AppOptions::default()
        },
    )
    .unwrap();
    let taken_at = app.model().current_snapshot().taken_at;
    app.shutdown();

    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        written["takenAt"],
        serde_json::to_value(taken_at).unwrap()
    );
}
