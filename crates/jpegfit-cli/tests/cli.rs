use assert_cmd::Command;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn combined_output(output: &std::process::Output) -> String {
    format!(
        "{}\n{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    )
}

/// A `jpegfit` command that can't see the user's config or environment.
fn jpegfit(home: &TempDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("jpegfit"));
    cmd.env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .env_remove("RUST_LOG")
        .env_remove("JPEGFIT_TARGET_MB")
        .env_remove("JPEGFIT_MIN_QUALITY")
        .env_remove("JPEGFIT_MAX_QUALITY")
        .env_remove("JPEGFIT_SUFFIX");
    cmd
}

fn write_noise_png(path: &Path, width: u32, height: u32) {
    let mut state = 0x9E37_79B9_u32;
    let img = image::RgbImage::from_fn(width, height, |_, _| {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let [r, g, b, _] = state.to_le_bytes();
        image::Rgb([r, g, b])
    });
    img.save(path).expect("write test png");
}

#[test]
fn help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    let output = jpegfit(&home).arg("--help").output().expect("--help runs");

    assert!(output.status.success());
    let text = combined_output(&output);
    assert!(text.contains("compress"), "help text missing compress: {text}");
    assert!(text.contains("convert"), "help text missing convert: {text}");
}

#[test]
fn compress_help_lists_flags() {
    let home = TempDir::new().unwrap();
    let output = jpegfit(&home)
        .args(["compress", "--help"])
        .output()
        .expect("compress --help runs");

    assert!(output.status.success());
    let text = combined_output(&output);
    for flag in ["--target-mb", "--output", "--min-quality", "--max-quality", "--fast"] {
        assert!(text.contains(flag), "help text missing {flag}: {text}");
    }
}

#[test]
fn compress_writes_default_output() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("noise.png");
    write_noise_png(&input, 96, 64);

    let output = jpegfit(&home)
        .arg("compress")
        .arg(&input)
        .args(["--target-mb", "0.01"])
        .output()
        .expect("compress runs");

    assert!(output.status.success(), "{}", combined_output(&output));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("at quality"), "unexpected stdout: {text}");

    let written = work.path().join("noise_compressed.jpg");
    let size = fs::metadata(&written).expect("output exists").len();
    assert!(size <= 10_485);
    assert!(!work.path().join("noise_compressed.jpg.temp.jpg").exists());
}

#[test]
fn compress_to_explicit_output_with_fast_search() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("noise.png");
    let target = work.path().join("out").join("fit.jpg");
    fs::create_dir(work.path().join("out")).unwrap();
    write_noise_png(&input, 32, 32);

    let output = jpegfit(&home)
        .arg("compress")
        .arg(&input)
        .args(["--target-mb", "5", "--fast", "--max-quality", "90"])
        .arg("--output")
        .arg(&target)
        .output()
        .expect("compress runs");

    assert!(output.status.success(), "{}", combined_output(&output));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("quality 90 after 1 probes"), "unexpected stdout: {text}");
    assert!(target.exists());
}

#[test]
fn compress_unreachable_target_exits_two() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("noise.png");
    write_noise_png(&input, 64, 64);

    let output = jpegfit(&home)
        .arg("compress")
        .arg(&input)
        .args(["--target-mb", "0.0001"])
        .output()
        .expect("compress runs");

    assert_eq!(output.status.code(), Some(2), "{}", combined_output(&output));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Could not compress"), "unexpected stdout: {text}");
    assert!(!work.path().join("noise_compressed.jpg").exists());
    assert!(!work.path().join("noise_compressed.jpg.temp.jpg").exists());
}

#[test]
fn compress_without_input_fails_when_not_interactive() {
    let home = TempDir::new().unwrap();
    let output = jpegfit(&home)
        .arg("compress")
        .output()
        .expect("compress runs");

    assert_eq!(output.status.code(), Some(1));
    let text = combined_output(&output);
    assert!(text.contains("missing INPUT"), "unexpected output: {text}");
}

#[test]
fn compress_rejects_inverted_bounds() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("noise.png");
    write_noise_png(&input, 8, 8);

    let output = jpegfit(&home)
        .arg("compress")
        .arg(&input)
        .args(["--min-quality", "80", "--max-quality", "20"])
        .output()
        .expect("compress runs");

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("above upper bound"));
}

#[test]
fn invalid_environment_config_is_reported() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("noise.png");
    write_noise_png(&input, 8, 8);

    let output = jpegfit(&home)
        .env("JPEGFIT_MAX_QUALITY", "101")
        .arg("compress")
        .arg(&input)
        .output()
        .expect("compress runs");

    assert_eq!(output.status.code(), Some(1));
    assert!(combined_output(&output).contains("failed to load configuration"));
}

#[test]
fn config_file_sets_output_suffix() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let input = work.path().join("noise.png");
    let config = work.path().join("jpegfit.toml");
    write_noise_png(&input, 16, 16);
    fs::write(&config, "suffix = \"_web\"\ntarget_mb = 2.0\n").unwrap();

    let output = jpegfit(&home)
        .arg("--config")
        .arg(&config)
        .arg("compress")
        .arg(&input)
        .output()
        .expect("compress runs");

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(work.path().join("noise_web.jpg").exists());
}

#[test]
fn convert_folder_non_recursive() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let nested = work.path().join("nested");
    fs::create_dir(&nested).unwrap();
    write_noise_png(&work.path().join("a.png"), 8, 8);
    write_noise_png(&nested.join("b.png"), 8, 8);
    fs::write(work.path().join("notes.txt"), "skip me").unwrap();

    let output = jpegfit(&home)
        .arg("convert")
        .arg(work.path())
        .output()
        .expect("convert runs");

    assert!(output.status.success(), "{}", combined_output(&output));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("1 converted, 1 skipped, 0 failed"), "unexpected stdout: {text}");
    assert!(work.path().join("a.jpg").exists());
    assert!(!nested.join("b.jpg").exists());
}

#[test]
fn convert_recursive_into_output_dir() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    let nested = work.path().join("nested");
    let out = TempDir::new().unwrap();
    fs::create_dir(&nested).unwrap();
    write_noise_png(&work.path().join("a.png"), 8, 8);
    write_noise_png(&nested.join("b.png"), 8, 8);

    let output = jpegfit(&home)
        .arg("convert")
        .arg(work.path())
        .arg("--recursive")
        .arg("--output-dir")
        .arg(out.path())
        .args(["--quality", "70"])
        .output()
        .expect("convert runs");

    assert!(output.status.success(), "{}", combined_output(&output));
    assert!(out.path().join("a.jpg").exists());
    assert!(out.path().join("nested").join("b.jpg").exists());
    assert!(!out.path().join("b.jpg").exists());
}

#[test]
fn convert_reports_failures() {
    let home = TempDir::new().unwrap();
    let work = TempDir::new().unwrap();
    fs::write(work.path().join("broken.png"), "not really a png").unwrap();

    let output = jpegfit(&home)
        .arg("convert")
        .arg(work.path())
        .output()
        .expect("convert runs");

    assert_eq!(output.status.code(), Some(1));
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("Failed:"), "unexpected stdout: {text}");
}
