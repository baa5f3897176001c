use std::io::Write;

use nohash_hasher::IntMap;
use rust_ring_a2a::exchange::config::{CommandLineArgs, Config};
use rust_ring_a2a::exchange::controller::local_controller::run_channel_and_join;
use rust_ring_a2a::test_utils::transpose;

#[test]
fn run_from_config_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        "partitioning:\n  num_parts: 4\ndata:\n  seed: 11\noutput:\n  logging: None"
    )
    .unwrap();

    let args = CommandLineArgs {
        config_path: Some(file.path().to_str().unwrap().to_string()),
        ..Default::default()
    };
    let config = Config::from_args(&args).unwrap();

    let reports = run_channel_and_join(&config, IntMap::default()).unwrap();

    assert_eq!(4, reports.len());
    let messages: Vec<Vec<i32>> = reports.iter().map(|r| r.messages.clone()).collect();
    let received: Vec<Vec<i32>> = reports.iter().map(|r| r.received.clone()).collect();
    assert_eq!(transpose(&messages), received);

    for report in &reports {
        assert!(report.messages.iter().all(|v| *v >= 1 && *v <= 16));
    }
}

#[test]
fn only_root_knows_max_time() {
    let args = CommandLineArgs {
        num_parts: Some(3),
        seed: Some(5),
        ..Default::default()
    };
    let config = Config::from_args(&args).unwrap();

    let reports = run_channel_and_join(&config, IntMap::default()).unwrap();

    let max = reports[0].max_communication_time.unwrap();
    for report in &reports {
        assert!(report.communication_time.as_secs_f64() <= max);
    }
    assert!(reports[1..]
        .iter()
        .all(|r| r.max_communication_time.is_none()));
}
