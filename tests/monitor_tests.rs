//! Monitor record behaviour: alignment, ordering, rendering, export.

use logsim::devices::Level;

mod common;
use common::session;

#[test]
fn records_align_when_attached_mid_run() {
    let mut s = session("DEVICE SWITCH a(1), b(0), c(1); CONNECT MONITOR a END");
    s.run(2).unwrap();
    s.toggle_monitor("b", None).unwrap();
    s.continue_run(3).unwrap();
    s.toggle_monitor("c", None).unwrap();
    s.continue_run(1).unwrap();

    let records = s.monitors().records();
    assert_eq!(records.len(), 3);
    for record in records {
        assert_eq!(record.samples.len(), 6);
    }
    // The later monitor's first samples are BLANK, exactly up to the
    // cycle it was attached.
    assert_eq!(records[1].samples[..2], [Level::Blank; 2]);
    assert_ne!(records[1].samples[2], Level::Blank);
    assert_eq!(records[2].samples[..5], [Level::Blank; 5]);
    assert_ne!(records[2].samples[5], Level::Blank);
}

#[test]
fn display_renders_rows_with_glyphs() {
    let mut s = session(
        "DEVICE SWITCH hi(1), lo(0); CLOCK ck(1); CONNECT MONITOR hi, lo, ck END",
    );
    s.run(4).unwrap();
    let text = s.display_signals();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 3);
    // Natural name order: ck, hi, lo.
    assert_eq!(lines[0], "ck: \\/\\/");
    assert_eq!(lines[1], "hi: ‾‾‾‾");
    assert_eq!(lines[2], "lo: ____");
}

#[test]
fn display_pads_names_and_leaves_blank_gaps() {
    let mut s = session("DEVICE SWITCH a(1), longname(0); CONNECT MONITOR a END");
    s.run(2).unwrap();
    s.toggle_monitor("longname", None).unwrap();
    s.continue_run(1).unwrap();
    let text = s.display_signals();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "a       : ‾‾‾");
    assert_eq!(lines[1], "longname:   _");
}

#[test]
fn signal_names_partition_and_sort_naturally() {
    let src = "\
DEVICE SWITCH a2(0), a10(0), a1(0); DFF d;
CONNECT a1 -> d.DATA, d.CLK, d.SET, d.RESET;
MONITOR a10, d.QBAR
END
";
    let mut s = session(src);
    s.run(1).unwrap();
    let (monitored, unmonitored) = s.signal_names();
    assert_eq!(monitored, vec!["a10", "d.QBAR"]);
    assert_eq!(unmonitored, vec!["a1", "a2", "d.Q"]);
}

#[test]
fn remove_monitor_drops_the_record() {
    let mut s = session("DEVICE SWITCH a(1), b(0); CONNECT MONITOR a, b END");
    s.run(2).unwrap();
    assert_eq!(s.monitors().records().len(), 2);
    assert!(!s.toggle_monitor("b", None).unwrap());
    let records = s.monitors().records();
    assert_eq!(records.len(), 1);
    // The survivor keeps its samples.
    assert_eq!(records[0].samples.len(), 2);
}

#[test]
fn traces_export_as_json() {
    let mut s = session("DEVICE SWITCH a(1); CLOCK ck(2); CONNECT MONITOR a, ck END");
    s.run(3).unwrap();
    let json: serde_json::Value = serde_json::from_str(&s.traces_json()).unwrap();
    let traces = json.as_array().unwrap();
    assert_eq!(traces.len(), 2);
    assert_eq!(traces[0]["name"], "a");
    assert_eq!(traces[0]["samples"].as_array().unwrap().len(), 3);
    assert_eq!(traces[0]["samples"][0], "High");
    assert_eq!(traces[1]["name"], "ck");
}

#[test]
fn reset_clears_samples_but_keeps_monitors() {
    let mut s = session("DEVICE SWITCH a(1); CONNECT MONITOR a END");
    s.run(5).unwrap();
    s.restart();
    let records = s.monitors().records();
    assert_eq!(records.len(), 1);
    assert!(records[0].samples.is_empty());
}
