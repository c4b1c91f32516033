use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

fn run_channelcode(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_channelcode"))
        .args(args)
        .output()
        .expect("Failed to execute channelcode")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "channelcode failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn create_test_file(dir: &TempDir, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write test file");
    path
}

fn path_str(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn sample_payload(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 + 7) as u8).collect()
}

#[test]
fn test_checksum_of_all_ones() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "ones.bin", &[0xFF; 6]);
    let output = stdout_of(&run_channelcode(&["checksum", path_str(&input)]));
    assert!(output.contains("Checksum: 0000"), "got: {}", output);
}

#[test]
fn test_checksum_pads_odd_file() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "odd.bin", &[0x12]);
    let output = stdout_of(&run_channelcode(&["checksum", path_str(&input)]));
    assert!(output.contains("Checksum: EDFF"), "got: {}", output);
}

#[test]
fn test_checksum_burst_detection() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "payload.bin", &sample_payload(64));
    let output = stdout_of(&run_channelcode(&[
        "checksum",
        path_str(&input),
        "--burst",
        "1",
        "--trials",
        "50",
    ]));
    assert!(output.contains("detected 50/50"), "got: {}", output);
}

#[test]
fn test_transmit_noiseless_round_trip() {
    let dir = TempDir::new().unwrap();
    let payload = sample_payload(300);
    let input = create_test_file(&dir, "input.bin", &payload);
    let output_path = dir.path().join("output.bin");

    for codec in ["none", "repetition", "hamming"] {
        let output = run_channelcode(&[
            "transmit",
            path_str(&input),
            path_str(&output_path),
            "--codec",
            codec,
            "--p",
            "0",
        ]);
        let text = stdout_of(&output);
        assert!(text.contains("Residual bit errors: 0"), "got: {}", text);
        assert_eq!(fs::read(&output_path).unwrap(), payload);
    }
}

#[test]
fn test_transmit_json_report() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "input.bin", &sample_payload(500));
    let output_path = dir.path().join("output.bin");
    let text = stdout_of(&run_channelcode(&[
        "transmit",
        path_str(&input),
        path_str(&output_path),
        "--codec",
        "repetition",
        "--p",
        "0.02",
        "--seed",
        "3",
        "--json",
    ]));
    let report: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(report["total_bits"], 4000);
    assert!(report["channel_bit_errors"].as_u64().unwrap() > 0);
    assert!(report["bit_errors"].as_u64().unwrap() < report["channel_bit_errors"].as_u64().unwrap());
}

#[test]
fn test_transmit_rejects_invalid_probability() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "input.bin", b"data");
    let output_path = dir.path().join("output.bin");
    let output = run_channelcode(&[
        "transmit",
        path_str(&input),
        path_str(&output_path),
        "--p",
        "1.5",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("outside [0, 1]"));
    assert!(!output_path.exists());
}

#[test]
fn test_sweep_json_output() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "sweep.bin", &sample_payload(200));
    let text = stdout_of(&run_channelcode(&[
        "sweep",
        path_str(&input),
        "--p",
        "0",
        "--p",
        "0.01",
        "--trials",
        "2",
        "--json",
    ]));
    let series: Value = serde_json::from_str(&text).unwrap();
    let series = series.as_array().unwrap();
    assert_eq!(series.len(), 3);
    for s in series {
        let points = s["points"].as_array().unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0]["mean_ber"], 0.0);
        assert_eq!(points[0]["trials"], 2);
    }
}

#[test]
fn test_sweep_reads_config_file() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "sweep.bin", &sample_payload(64));
    let config = create_test_file(
        &dir,
        "sweep.json",
        br#"{"probabilities": [0.0, 0.001], "codecs": ["hamming74"], "trials": 3}"#,
    );
    let text = stdout_of(&run_channelcode(&[
        "sweep",
        path_str(&input),
        "--config",
        path_str(&config),
        "--json",
    ]));
    let series: Value = serde_json::from_str(&text).unwrap();
    let series = series.as_array().unwrap();
    assert_eq!(series.len(), 1);
    assert_eq!(series[0]["codec"], "hamming74");
    assert_eq!(series[0]["points"].as_array().unwrap().len(), 2);
    assert_eq!(series[0]["points"][1]["trials"], 3);
}

#[test]
fn test_sweep_text_table() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "sweep.bin", &sample_payload(32));
    let text = stdout_of(&run_channelcode(&[
        "sweep",
        path_str(&input),
        "--codec",
        "repetition",
        "--serial",
    ]));
    assert!(text.contains("repetition(3,1)"), "got: {}", text);
    assert!(text.contains("channel BER"));
}

#[test]
fn test_crc_burst_default_experiment() {
    let text = stdout_of(&run_channelcode(&["crc-burst", "--json"]));
    let outcomes: Value = serde_json::from_str(&text).unwrap();
    let outcomes = outcomes.as_array().unwrap();
    assert_eq!(outcomes.len(), 5);
    assert_eq!(outcomes[0]["corrupted"], false);
    assert_eq!(outcomes[0]["detected"], false);
    for outcome in &outcomes[1..] {
        assert_eq!(outcome["unit"], "bytes");
        assert_eq!(outcome["detected"], true);
    }
}

#[test]
fn test_crc_burst_text_output() {
    let dir = TempDir::new().unwrap();
    let input = create_test_file(&dir, "ref.bin", &[0xFF, 0x81, 0xF0, 0x0F]);
    let text = stdout_of(&run_channelcode(&[
        "crc-burst",
        "--input",
        path_str(&input),
        "--length",
        "2",
        "--unit",
        "bits",
    ]));
    assert!(text.contains("Errors detected!"), "got: {}", text);
}

#[test]
fn test_crc_collision_with_weak_polynomial() {
    let text = stdout_of(&run_channelcode(&[
        "crc-collision",
        "--poly",
        "0x101",
        "--xor-out",
        "0",
        "--reflected",
        "false",
        "--random-bytes",
        "8",
        "--max-length",
        "32",
        "--json",
    ]));
    let collision: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(collision["length"], 16);
    assert_eq!(collision["offset"], 0);
}

#[test]
fn test_crc_collision_none_for_crc32_short_bursts() {
    let text = stdout_of(&run_channelcode(&[
        "crc-collision",
        "--reflected",
        "false",
        "--random-bytes",
        "8",
        "--max-length",
        "32",
    ]));
    assert!(text.contains("No undetected burst up to 32 bits"), "got: {}", text);
}

#[test]
fn test_rejects_malformed_polynomial() {
    let output = run_channelcode(&["crc-burst", "--poly", "0xNOPE"]);
    assert!(!output.status.success());
}

#[test]
fn test_crc_burst_rejects_oversized_byte_burst() {
    let output = run_channelcode(&[
        "crc-burst",
        "--unit",
        "bytes",
        "--length",
        "2305843009213693952",
    ]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("not addressable"));
}
