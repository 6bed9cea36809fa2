use std::time::Duration;
use vedirect_bridge::util::{format_hex_compact, pretty_hex, Clock};

#[test]
fn test_compact_hex_of_checksum_trailer() {
    assert_eq!(format_hex_compact(b"Checksum\t\x9c"), "43 68 65 63 6b 73 75 6d 09 9c");
}

#[test]
fn test_pretty_hex_of_frame_line() {
    let dump = pretty_hex(b"\r\nSOC\t1960", 8);
    let rows: Vec<&str> = dump.lines().collect();
    assert_eq!(rows.len(), 2);
    assert!(rows[0].starts_with("0000: 0d 0a 53 4f 43 09 31 39"));
    assert!(rows[0].ends_with("|..SOC.19|"));
    assert!(rows[1].starts_with("0008: 36 30"));
}

#[tokio::test(start_paused = true)]
async fn test_clock_follows_paused_time() {
    let clock = Clock::new();
    let before = clock.millis();
    tokio::time::advance(Duration::from_millis(2500)).await;
    let elapsed = clock.elapsed_since(before);
    assert!((2500..2510).contains(&elapsed));
    assert_eq!(clock.elapsed_since(u64::MAX), 0);
}
