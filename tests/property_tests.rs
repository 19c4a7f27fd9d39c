// tests/property_tests.rs
use logsim::devices::Level;
use logsim::monitors::natural_cmp;
use logsim::names::Names;
use logsim::Session;
use proptest::prelude::*;
use std::cmp::Ordering;
use std::path::Path;

// --- Strategies ---

const GATE_KINDS: [&str; 5] = ["AND", "NAND", "OR", "NOR", "XOR"];

/// A randomly wired, acyclic combinational circuit: switches feed
/// gates, gates feed only later gates. Returns the definition source.
fn arb_acyclic_circuit() -> impl Strategy<Value = String> {
    (
        prop::collection::vec(any::<bool>(), 1..=4),
        prop::collection::vec((0..5usize, 1..=3usize, prop::collection::vec(any::<u32>(), 3)), 1..=8),
    )
        .prop_map(|(switches, gates)| {
            let mut device = String::from("DEVICE\n");
            let mut connect = String::from("CONNECT\n");
            let mut monitor = Vec::new();

            for (i, on) in switches.iter().enumerate() {
                device.push_str(&format!("  SWITCH sw{}({});\n", i + 1, u8::from(*on)));
            }
            for (j, (kind_index, fan_in, seeds)) in gates.iter().enumerate() {
                let kind = GATE_KINDS[*kind_index];
                // XOR has a fixed fan-in of two and takes no qualifier.
                let fan_in = if kind == "XOR" { 2 } else { *fan_in };
                if kind == "XOR" {
                    device.push_str(&format!("  XOR g{};\n", j + 1));
                } else {
                    device.push_str(&format!("  {kind} g{}({fan_in});\n", j + 1));
                }
                // Each input draws from a switch or an earlier gate.
                let sources = switches.len() + j;
                for input in 0..fan_in {
                    let pick = seeds[input % seeds.len()] as usize % sources;
                    let source = if pick < switches.len() {
                        format!("sw{}", pick + 1)
                    } else {
                        format!("g{}", pick - switches.len() + 1)
                    };
                    connect.push_str(&format!("  {source} -> g{}.I{};\n", j + 1, input + 1));
                }
                monitor.push(format!("g{}", j + 1));
            }
            format!("{device}{connect}MONITOR {}\nEND\n", monitor.join(", "))
        })
}

fn load(src: &str) -> Session {
    Session::load_source(Path::new("prop.circuit"), src)
        .expect("no fatal errors")
        .expect("generated circuit parses cleanly")
}

// --- Property Tests ---

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: interning is idempotent and ids are unique per string.
    #[test]
    fn prop_intern_unique_and_idempotent(
        strings in prop::collection::vec("[a-z][a-z0-9]{0,6}", 1..40)
    ) {
        let mut names = Names::new();
        let refs: Vec<&str> = strings.iter().map(String::as_str).collect();
        let first = names.lookup(&refs);
        let second = names.lookup(&refs);
        prop_assert_eq!(&first, &second);

        for (i, a) in first.iter().enumerate() {
            for (j, b) in first.iter().enumerate() {
                prop_assert_eq!(a == b, strings[i] == strings[j],
                    "ids {:?}/{:?} disagree with strings {:?}/{:?}",
                    a, b, strings[i], strings[j]);
            }
        }
        // Reverse lookup round-trips.
        for (id, s) in first.iter().zip(&strings) {
            prop_assert_eq!(names.name_string(*id), Some(s.as_str()));
        }
    }

    /// Property: natural order compares digit runs numerically.
    #[test]
    fn prop_natural_order_matches_numeric(
        base in "[a-z]{1,3}",
        a in 0u32..10_000,
        b in 0u32..10_000
    ) {
        let left = format!("{base}{a}");
        let right = format!("{base}{b}");
        prop_assert_eq!(natural_cmp(&left, &right), a.cmp(&b));
    }

    /// Property: sorting under natural order is consistent (adjacent
    /// pairs come out ordered).
    #[test]
    fn prop_natural_sort_is_ordered(
        mut names in prop::collection::vec("[a-z]{1,2}[0-9]{0,3}", 1..30)
    ) {
        names.sort_by(|x, y| natural_cmp(x, y));
        for pair in names.windows(2) {
            prop_assert_ne!(natural_cmp(&pair[0], &pair[1]), Ordering::Greater);
        }
    }

    /// Property: an acyclic combinational network always stabilises,
    /// and a stable cycle is a fixed point: running another cycle with
    /// unchanged inputs records identical samples.
    #[test]
    fn prop_acyclic_network_stabilises_to_fixed_point(src in arb_acyclic_circuit()) {
        let mut session = load(&src);
        session.run(1).expect("acyclic network must stabilise");
        session.continue_run(1).expect("second cycle must stabilise");
        for record in session.monitors().records() {
            prop_assert_eq!(record.samples.len(), 2);
            prop_assert_eq!(record.samples[0], record.samples[1]);
            prop_assert_ne!(record.samples[0], Level::Blank);
        }
    }

    /// Property: a run's outcome and records are deterministic from
    /// cold start, oscillating or not.
    #[test]
    fn prop_runs_are_deterministic(src in arb_acyclic_circuit(), cycles in 1usize..6) {
        let mut first = load(&src);
        let mut second = load(&src);
        let a = first.run(cycles);
        let b = second.run(cycles);
        prop_assert_eq!(a, b);
        let left: Vec<_> = first.monitors().records().iter().map(|r| r.samples.clone()).collect();
        let right: Vec<_> = second.monitors().records().iter().map(|r| r.samples.clone()).collect();
        prop_assert_eq!(left, right);
    }

    /// Property: monitors attached at different cycles keep equal
    /// record lengths, with BLANK exactly over the missed prefix.
    #[test]
    fn prop_monitor_records_stay_aligned(before in 0usize..8, after in 1usize..8) {
        let mut session = load(
            "DEVICE SWITCH a(1), b(0);\nCONNECT\nMONITOR a\nEND\n",
        );
        session.run(before).unwrap();
        session.toggle_monitor("b", None).unwrap();
        session.continue_run(after).unwrap();

        let records = session.monitors().records();
        prop_assert_eq!(records[0].samples.len(), before + after);
        prop_assert_eq!(records[1].samples.len(), before + after);
        for (cycle, level) in records[1].samples.iter().enumerate() {
            if cycle < before {
                prop_assert_eq!(*level, Level::Blank);
            } else {
                prop_assert_ne!(*level, Level::Blank);
            }
        }
    }
}

/// Oscillation is deterministic: the classic cross-coupled NAND pair
/// fails identically on every run with the same cold-start state.
#[test]
fn oscillation_is_deterministic_across_runs() {
    let src = "\
DEVICE SWITCH en(1); NAND g1(2), g2(2);
CONNECT en -> g1.I1, g2.I1; g2 -> g1.I2; g1 -> g2.I2;
MONITOR g1
END
";
    let mut session = load(src);
    for _ in 0..5 {
        assert!(session.run(3).is_err());
        assert!(session.monitors().records()[0].samples.is_empty());
    }
}
