use assert_cmd::Command;
use predicates::prelude::*;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

const ORCA_GCODE: &str = "\
; generated by OrcaSlicer
;ENABLE_BED_COOLDOWN
G28
G1 X10 Y10
; estimated printing time (normal mode) = 1d 15h 43m 23s
; filament used [mm] = 1234.5
";

const CURA_GCODE: &str = "\
;FLAVOR:Marlin
;TIME:17677
;Generated with Cura_SteamEngine 5.7.0
;ENABLE_BED_COOLDOWN
;LAYER_COUNT:2
;LAYER:0
G1 X1 Y1
;LAYER:1
G1 X2 Y2
";

fn write_gcode(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// Isolated HOME so a user config never leaks into the test
fn cmd(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("bed-cooldown").unwrap();
    cmd.env("HOME", home).env_remove("RUST_LOG");
    cmd
}

#[test]
fn test_standalone_orca_file() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", ORCA_GCODE);

    cmd(dir.path())
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"SLICER_TIME_ESTIMATED\":142083"))
        .stdout(predicate::str::contains("1d 15h 43m 23s"));

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(
        "ENABLE_BED_COOLDOWN SLICER_TIME_ESTIMATED=142083 ELAPSED_TIME_THRESHOLD=900 \
         REMAIN_TIME_THRESHOLD=900 PROGRESS_THRESHOLD=90 PROGRESS_TYPE=time TARGET_TEMP=60 \
         DEBUG=false\n"
    ));
    assert!(content.contains(
        ";TIME:142083\n; estimated printing time (normal mode) = 1d 15h 43m 23s\n"
    ));
    assert!(!content.lines().any(|l| l == ";ENABLE_BED_COOLDOWN"));
    assert_eq!(content.matches("ENABLE_BED_COOLDOWN SLICER_TIME_ESTIMATED").count(), 1);
}

#[test]
fn test_standalone_cura_file_gets_estimate_comment() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", CURA_GCODE);

    cmd(dir.path()).arg(&path).assert().success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(";TIME:17677\n; estimated printing time (normal mode) = 4h 54m 37s\n"));
    assert!(content.contains("SLICER_TIME_ESTIMATED=17677"));
}

#[test]
fn test_key_value_overrides() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", ORCA_GCODE);

    cmd(dir.path())
        .args(["REMAIN_TIME_THRESHOLD=300", "progress_type=virtual_sdcard", "--debug=TRUE"])
        .arg(&path)
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("REMAIN_TIME_THRESHOLD=300"));
    assert!(content.contains("PROGRESS_TYPE=virtual_sdcard"));
    assert!(content.contains("DEBUG=true"));
}

#[test]
fn test_bogus_progress_type_fails_before_write() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", ORCA_GCODE);

    cmd(dir.path())
        .arg("PROGRESS_TYPE=bogus")
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("PROGRESS_TYPE"))
        .stderr(predicate::str::contains("bogus"));

    assert_eq!(fs::read_to_string(&path).unwrap(), ORCA_GCODE);
}

#[test]
fn test_missing_time_estimate_leaves_file_untouched() {
    let dir = TempDir::new().unwrap();
    let original = ";ENABLE_BED_COOLDOWN\nG28\n";
    let path = write_gcode(&dir, "part.gcode", original);

    cmd(dir.path())
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no print time estimate found"));

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_missing_marker_fails_in_standalone_mode() {
    let dir = TempDir::new().unwrap();
    let original = ";TIME:100\nG28\n";
    let path = write_gcode(&dir, "part.gcode", original);

    cmd(dir.path())
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("ENABLE_BED_COOLDOWN"));

    assert_eq!(fs::read_to_string(&path).unwrap(), original);
}

#[test]
fn test_missing_file_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nope.gcode");

    cmd(dir.path())
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.gcode"));
}

#[test]
fn test_missing_path_argument() {
    let dir = TempDir::new().unwrap();
    cmd(dir.path()).assert().failure();
}

#[test]
fn test_dry_run_does_not_write() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", ORCA_GCODE);

    cmd(dir.path())
        .arg("--dry-run")
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("[DRY-RUN]"));

    assert_eq!(fs::read_to_string(&path).unwrap(), ORCA_GCODE);
}

#[test]
fn test_no_cross_write() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", ORCA_GCODE);

    cmd(dir.path()).arg("--no-cross-write").arg(&path).assert().success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(!content.contains(";TIME:"));
    assert!(content.contains("SLICER_TIME_ESTIMATED=142083"));
}

#[test]
fn test_json_report() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", CURA_GCODE);

    let assert = cmd(dir.path())
        .args(["--format", "json"])
        .arg(&path)
        .assert()
        .success();
    let report: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

    assert_eq!(report["mode"], "standalone");
    assert_eq!(report["time_format"], "time_tag");
    assert_eq!(report["estimate_secs"], 17677);
    assert_eq!(report["estimate"], "4h 54m 37s");
    assert_eq!(report["params"]["PROGRESS_TYPE"], "time");
    assert_eq!(report["params"]["DEBUG"], false);
    assert_eq!(report["insertions"], 1);
    assert_eq!(report["written"], true);
}

#[test]
fn test_layers_mode_inserts_after_first_layer() {
    let dir = TempDir::new().unwrap();
    let path = write_gcode(&dir, "part.gcode", CURA_GCODE);

    cmd(dir.path())
        .args(["--mode", "layers", "--no-cross-write"])
        .arg(&path)
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains(
        ";LAYER:0\nINIT_BED_COOLDOWN SLICER_TIME_ESTIMATED=17677 ELAPSED_TIME_THRESHOLD=901 \
         REMAIN_TIME_THRESHOLD=901 PROGRESS_THRESHOLD=75 PROGRESS_TYPE=time TARGET_TEMP=0 \
         DEBUG=false\nG1 X1 Y1\n"
    ));
    // The standalone marker is not touched in layers mode
    assert!(content.contains("\n;ENABLE_BED_COOLDOWN\n"));
}

#[test]
fn test_config_file_is_overridden_by_arguments() {
    let dir = TempDir::new().unwrap();
    let config_path = dir.path().join("cooldown.toml");
    fs::write(
        &config_path,
        "[thresholds]\ntarget_temp = 40\nprogress = 80\n\n[output]\ncross_write = false\n",
    )
    .unwrap();
    let path = write_gcode(&dir, "part.gcode", ORCA_GCODE);

    cmd(dir.path())
        .arg("--config")
        .arg(&config_path)
        .arg("TARGET_TEMP=50")
        .arg(&path)
        .assert()
        .success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("PROGRESS_THRESHOLD=80"));
    assert!(content.contains("TARGET_TEMP=50"));
    assert!(!content.contains(";TIME:"));
}

#[test]
fn test_default_config_location_under_home() {
    let dir = TempDir::new().unwrap();
    let config_dir = dir.path().join(".bed-cooldown");
    fs::create_dir_all(&config_dir).unwrap();
    fs::write(config_dir.join("config.toml"), "[thresholds]\nremain_time = 120\n").unwrap();
    let path = write_gcode(&dir, "part.gcode", ORCA_GCODE);

    cmd(dir.path()).arg(&path).assert().success();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("REMAIN_TIME_THRESHOLD=120"));
}

#[test]
fn test_print_schema_without_path() {
    let dir = TempDir::new().unwrap();

    let assert = cmd(dir.path()).arg("--print-schema").assert().success();
    let schema: Value = serde_json::from_slice(&assert.get_output().stdout).unwrap();

    assert_eq!(schema["key"], "BedCooldown");
    assert_eq!(schema["settings"]["progresstype"]["default_value"], "time");
}
