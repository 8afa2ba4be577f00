mod common;

use common::params;
use quickplay::config::{disc::FsDisc, FeatureFlags, Revision};

#[test]
fn init_loads_once() {
    let dir = tempfile::tempdir().unwrap();
    let record = params(FeatureFlags::JUMP_TO_AREA);
    std::fs::write(dir.path().join("dbgconfig"), record.encode(Revision::V2)).unwrap();

    let settings = dir.path().join("quickplay.json");
    std::fs::write(
        &settings,
        format!(
            r#"{{ "log_file": {}, "log_level": "debug" }}"#,
            serde_json::to_string(&dir.path().join("quickplay.log")).unwrap()
        ),
    )
    .unwrap();

    assert!(quickplay::global().is_none());

    let first = quickplay::init(&FsDisc::new(dir.path()), Some(&settings));
    assert_eq!(first.params(), &record);
    assert!(std::ptr::eq(first, quickplay::global().unwrap()));

    // A second load, even from a disc without a config, returns the first instance.
    let empty = tempfile::tempdir().unwrap();
    let second = quickplay::init(&FsDisc::new(empty.path()), None);
    assert!(std::ptr::eq(first, second));
    assert!(second.is_active());

    log::logger().flush();
    let log = std::fs::read_to_string(dir.path().join("quickplay.log")).unwrap();
    assert!(log.contains("Quickplay module loaded"));
    assert!(log.contains("Quickplay parameters loaded successfully!"));
}
