use std::path::PathBuf;
use std::sync::Arc;

use tempfile::tempdir;

use gravtab::fields::FIELD_TIDE_BPS;
use gravtab::meta::META_FILENAME;
use gravtab::provider::{TIDE_FORCE_MAX, TIDE_FORCE_MIN};
use gravtab::table::{Table, NANOS_PER_SEC};
use gravtab::writer::TableBuilder;
use gravtab::{CancelToken, Error, FileGravimetric, GravimetricProvider, ProviderConfig};

const EPOCH: i64 = 1_754_006_400; // 2025-08-01T00:00:00Z

fn write_table(dir: &std::path::Path, name: &str, values: &[u16]) -> PathBuf {
    let mut builder = TableBuilder::new(EPOCH, NANOS_PER_SEC, FIELD_TIDE_BPS);
    builder.extend_bps(values);
    let path = dir.join(name);
    builder.write_to(&path).expect("write table");
    path
}

fn at_secs(offset: i64) -> i64 {
    (EPOCH + offset) * NANOS_PER_SEC
}

fn config(hysteresis_bps: u16) -> ProviderConfig {
    ProviderConfig {
        dataset_id: None,
        hysteresis_bps,
    }
}

#[test]
fn maps_basis_points_to_physical_range() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "map.bin", &[0, 10_000]);
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");

    let low = provider.fetch_at(at_secs(0));
    assert!((low.lunar_tide_force - TIDE_FORCE_MIN).abs() < 1e-9, "{low:?}");
    let high = provider.fetch_at(at_secs(1));
    assert!(
        (high.lunar_tide_force - TIDE_FORCE_MAX).abs() < 1e-9,
        "{high:?}"
    );
}

#[test]
fn hysteresis_sticks_below_band() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "hys.bin", &[0, 10, 5_000, 10_000]);
    let provider = FileGravimetric::open(&path, &config(100)).expect("open");

    // First fetch establishes the value; no prior to stick to.
    let v1 = provider.fetch_at(at_secs(0));
    assert!((v1.lunar_tide_force - 80.0).abs() < 0.1, "{v1:?}");
    // +10 bps is below the 100 bps band: output holds.
    let v2 = provider.fetch_at(at_secs(1));
    assert_eq!(v2, v1, "expected stick below band");
    // +4990 bps passes.
    let v3 = provider.fetch_at(at_secs(2));
    assert!(v3.lunar_tide_force > v2.lunar_tide_force, "{v3:?} vs {v2:?}");
    // 10000 bps maps to the top of the range.
    let v4 = provider.fetch_at(at_secs(3));
    assert!((v4.lunar_tide_force - 130.0).abs() < 0.1, "{v4:?}");
}

#[test]
fn hysteresis_adopts_on_band_edge() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "edge.bin", &[1_000, 1_100, 1_201]);
    let provider = FileGravimetric::open(&path, &config(100)).expect("open");

    let v1 = provider.fetch_at(at_secs(0));
    // Delta of exactly 100 counts as beyond the band.
    let v2 = provider.fetch_at(at_secs(1));
    assert!(
        v2.lunar_tide_force > v1.lunar_tide_force,
        "expected adoption on band edge: {v2:?} vs {v1:?}"
    );
    let v3 = provider.fetch_at(at_secs(2));
    assert!(v3.lunar_tide_force > v2.lunar_tide_force, "{v3:?} vs {v2:?}");
}

#[test]
fn out_of_range_fetches_clamp_to_edge_samples() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "clamp.bin", &[2_000, 3_000]);
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");

    let before = provider.fetch_at(at_secs(-10));
    let first = provider.fetch_at(at_secs(0));
    assert_eq!(before, first, "before start clamps to first sample");

    let after = provider.fetch_at(at_secs(100));
    let last = provider.fetch_at(at_secs(1));
    assert_eq!(after, last, "after end clamps to last sample");
    assert!(after.lunar_tide_force > first.lunar_tide_force);
}

#[test]
fn stale_reflects_coverage_window() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "stale.bin", &[1_000, 2_000]);
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");

    assert!(provider.stale(at_secs(-1)));
    assert!(!provider.stale(at_secs(0)));
    assert!(!provider.stale(at_secs(1)));
    assert!(provider.stale(at_secs(10)));
}

#[test]
fn dataset_id_resolution_precedence() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "ds.bin", &[0]);
    let meta_path = dir.path().join(META_FILENAME);

    // Explicit id wins even with a sidecar present.
    std::fs::write(&meta_path, "{\n  \"dataset_id\": \"metaY\"\n}\n").expect("write meta");
    let cfg = ProviderConfig {
        dataset_id: Some("explicitX".to_string()),
        hysteresis_bps: 0,
    };
    let provider = FileGravimetric::open(&path, &cfg).expect("open");
    assert_eq!(provider.dataset_id(), "explicitX");

    // No explicit id: sidecar document resolves.
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");
    assert_eq!(provider.dataset_id(), "metaY");

    // Malformed sidecar is silently ignored.
    std::fs::write(&meta_path, "not json").expect("write meta");
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");
    assert_eq!(provider.dataset_id(), "");

    // Missing sidecar likewise.
    std::fs::remove_file(&meta_path).expect("remove meta");
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");
    assert_eq!(provider.dataset_id(), "");
}

#[test]
fn provider_identity_accessors() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "ident.bin", &[5_000]);
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");
    assert_eq!(provider.mode(), "file");
    assert_eq!(provider.name(), "ident.bin");
}

#[test]
fn fetch_honors_pre_cancelled_token() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "cancel.bin", &[1_000, 2_000]);
    let provider = FileGravimetric::open(&path, &config(0)).expect("open");

    let token = CancelToken::new();
    token.cancel();
    assert!(matches!(provider.fetch(&token).unwrap_err(), Error::Cancelled));

    // A fresh token goes through; "now" is outside coverage, so the result is
    // the edge-clamped last sample.
    let data = provider.fetch(&CancelToken::new()).expect("fetch");
    let expected = provider.fetch_at(at_secs(1));
    assert_eq!(data, expected);
}

#[test]
fn fetch_after_close_degrades_to_low_bound() {
    let dir = tempdir().expect("tempdir");
    let path = write_table(dir.path(), "closed.bin", &[9_000, 9_500]);
    let mut table = Table::open(&path).expect("open");
    table.close().expect("close");
    let provider = FileGravimetric::new(table, &config(0));

    // Every lookup, including the edge clamp, is unavailable; fetch degrades
    // to 0 bps instead of failing.
    let data = provider.fetch_at(at_secs(0));
    assert!((data.lunar_tide_force - TIDE_FORCE_MIN).abs() < 1e-9, "{data:?}");
}

#[test]
fn concurrent_fetches_are_race_free() {
    let dir = tempdir().expect("tempdir");
    let values: Vec<u16> = (0..100).map(|i| i * 100).collect();
    let path = write_table(dir.path(), "race.bin", &values);
    let provider = Arc::new(FileGravimetric::open(&path, &config(50)).expect("open"));

    let mut handles = Vec::new();
    for t in 0..8i64 {
        let provider = Arc::clone(&provider);
        handles.push(std::thread::spawn(move || {
            let token = CancelToken::new();
            for k in 0..200i64 {
                let data = provider.fetch_at(at_secs((k + t) % 100));
                assert!(
                    data.lunar_tide_force >= TIDE_FORCE_MIN
                        && data.lunar_tide_force <= TIDE_FORCE_MAX
                );
                let _ = provider.fetch(&token);
            }
        }));
    }
    for handle in handles {
        handle.join().expect("join");
    }
}

#[test]
fn env_config_validates_hysteresis_range() {
    std::env::set_var("HYSTERESIS_BPS", "250");
    assert_eq!(ProviderConfig::from_env().hysteresis_bps, 250);

    std::env::set_var("HYSTERESIS_BPS", "10001");
    assert_eq!(ProviderConfig::from_env().hysteresis_bps, 0);

    std::env::set_var("HYSTERESIS_BPS", "-5");
    assert_eq!(ProviderConfig::from_env().hysteresis_bps, 0);

    std::env::set_var("HYSTERESIS_BPS", "abc");
    assert_eq!(ProviderConfig::from_env().hysteresis_bps, 0);

    std::env::remove_var("HYSTERESIS_BPS");
    assert_eq!(ProviderConfig::from_env().hysteresis_bps, 0);
}
