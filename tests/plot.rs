#![cfg(feature = "int_test")]

use serial_test::serial;
use std::fs;
use steptrace::config::PlotConfig;
use steptrace::plot;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a];

fn prepare_logs(dir: &std::path::Path) -> PlotConfig {
    let baseline = dir.join("baseline.txt");
    let optimized = dir.join("optimized.txt");
    fs::write(
        &baseline,
        "0x1000 push %rbp\n0x1001 mov %rsp, %rbp\n0x1004 mov %rdi, %rax\n0x1007 pop %rbp\n0x1008 ret\n",
    )
    .unwrap();
    fs::write(&optimized, "0x1000 mov %rdi, %rax\n0x1003 ret\n").unwrap();

    PlotConfig {
        baseline,
        optimized,
        output: dir.join("instruction_count.png"),
        ..PlotConfig::default()
    }
}

#[test]
#[serial]
fn test_plot_png() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = prepare_logs(dir.path());

    let comparison = plot::plot(&cfg).unwrap();
    assert_eq!(comparison.rows()[0].mnemonic, "mov");
    let image = fs::read(&cfg.output).unwrap();
    assert_eq!(image[..8], PNG_MAGIC);

    // second run overwrites a chart with the same counts
    let again = plot::plot(&cfg).unwrap();
    assert_eq!(again, comparison);
    assert!(fs::metadata(&cfg.output).unwrap().len() > 0);
}

#[test]
#[serial]
fn test_plot_svg() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = PlotConfig {
        output: dir.path().join("instruction_count.svg"),
        ..prepare_logs(dir.path())
    };

    plot::plot(&cfg).unwrap();
    let svg = fs::read_to_string(&cfg.output).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("baseline"));
    assert!(svg.contains("optimized"));
    assert!(svg.contains("push"));
}

#[test]
#[serial]
fn test_plot_malformed_log() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = prepare_logs(dir.path());
    fs::write(&cfg.optimized, "0x1000 mov %rdi, %rax\n0x1003\n").unwrap();

    let err = plot::plot(&cfg).unwrap_err();
    assert!(matches!(err, plot::Error::MalformedLine { line: 2, .. }));
    assert!(!cfg.output.exists());
}
