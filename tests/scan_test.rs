use scangen::{
    CodeGenConfig, CompiledAutomaton, NfaCompiler, ScangenErrorKind, StateHandle,
};

/// Add a literal keyword rule: one node per character, chained, with a transition-less
/// accepting node at the end.
fn add_literal(compiler: &mut NfaCompiler, text: &str, kind: u32) {
    let start = compiler.start_state();
    let nodes: Vec<StateHandle> = text.chars().map(|_| compiler.new_state()).collect();
    let accept = compiler.new_state();
    for (i, ch) in text.chars().enumerate() {
        let to = if i + 1 < nodes.len() { nodes[i + 1] } else { accept };
        compiler.add_move(nodes[i], ch, ch, to).unwrap();
    }
    compiler.set_accepting(accept, kind).unwrap();
    compiler.add_epsilon(start, nodes[0]);
}

/// Add a one-or-more character class rule: the body node loops through an accepting hub.
fn add_class_plus(compiler: &mut NfaCompiler, lo: char, hi: char, kind: u32) {
    let start = compiler.start_state();
    let body = compiler.new_state();
    let hub = compiler.new_state();
    compiler.add_move(body, lo, hi, hub).unwrap();
    compiler.add_epsilon(hub, body);
    compiler.set_accepting(hub, kind).unwrap();
    compiler.add_epsilon(start, body);
}

/// Two rules: "a" as kind 1 and "ab" as kind 2.
fn ab_automaton() -> CompiledAutomaton {
    let mut compiler = NfaCompiler::new("INITIAL");
    add_literal(&mut compiler, "a", 1);
    add_literal(&mut compiler, "ab", 2);
    compiler.compile(&CodeGenConfig::default()).unwrap()
}

/// Keywords, identifiers, numbers and two overlapping operators.
fn rich_automaton() -> CompiledAutomaton {
    let mut compiler = NfaCompiler::new("INITIAL");
    add_literal(&mut compiler, "if", 1);
    add_literal(&mut compiler, "for", 2);
    add_literal(&mut compiler, "to", 3);
    add_literal(&mut compiler, "t", 4);
    add_literal(&mut compiler, "<=", 5);
    add_literal(&mut compiler, "<<", 6);
    add_literal(&mut compiler, "<", 7);
    add_class_plus(&mut compiler, 'a', 'z', 10);
    add_class_plus(&mut compiler, '0', '9', 11);
    compiler.compile(&CodeGenConfig::default()).unwrap()
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

struct TestData {
    input: &'static str,
    expected: Option<(u32, usize)>,
}

const AB_TESTS: &[TestData] = &[
    TestData {
        input: "a",
        expected: Some((1, 0)),
    },
    TestData {
        input: "ab",
        expected: Some((2, 1)),
    },
    TestData {
        input: "abb",
        expected: Some((2, 1)),
    },
    TestData {
        input: "ac",
        expected: Some((1, 0)),
    },
    TestData {
        input: "b",
        expected: None,
    },
    TestData {
        input: "",
        expected: None,
    },
];

#[test]
fn test_longest_match_and_kind_priority() {
    init();
    let automaton = ab_automaton();
    for data in AB_TESTS {
        let result = automaton.scan(data.input).map(|m| (m.kind(), m.pos()));
        assert_eq!(result, data.expected, "input {:?}", data.input);
    }
}

const RICH_TESTS: &[TestData] = &[
    // Keyword beats identifier at the same position.
    TestData {
        input: "if",
        expected: Some((1, 1)),
    },
    // A longer identifier beats a shorter keyword.
    TestData {
        input: "ifx",
        expected: Some((10, 2)),
    },
    TestData {
        input: "i",
        expected: Some((10, 0)),
    },
    TestData {
        input: "forever",
        expected: Some((10, 6)),
    },
    TestData {
        input: "t",
        expected: Some((4, 0)),
    },
    TestData {
        input: "to",
        expected: Some((3, 1)),
    },
    TestData {
        input: "top",
        expected: Some((10, 2)),
    },
    TestData {
        input: "<",
        expected: Some((7, 0)),
    },
    TestData {
        input: "<=",
        expected: Some((5, 1)),
    },
    TestData {
        input: "<<",
        expected: Some((6, 1)),
    },
    TestData {
        input: "<>",
        expected: Some((7, 0)),
    },
    TestData {
        input: "1234x",
        expected: Some((11, 3)),
    },
    TestData {
        input: "?",
        expected: None,
    },
];

#[test]
fn test_rich_automaton_matches() {
    init();
    let automaton = rich_automaton();
    for data in RICH_TESTS {
        let result = automaton.scan(data.input).map(|m| (m.kind(), m.pos()));
        assert_eq!(result, data.expected, "input {:?}", data.input);
    }
}

#[test]
fn test_scan_equals_simulation() {
    init();
    let automaton = rich_automaton();
    let inputs = [
        "", "a", "i", "if", "iff", "ifif", "f", "fo", "for", "fort", "t", "to", "tot", "too",
        "<", "<=", "<<", "<<=", "<=<", "0", "0123456789", "42x17", "x", "zzz", "?", "if?",
        "?if", " if", "a<b",
    ];
    for input in inputs {
        assert_eq!(
            automaton.scan(input),
            automaton.simulate(input),
            "input {:?}",
            input
        );
    }
}

#[test]
fn test_scan_equals_simulation_without_literal_start() {
    init();
    // Only class rules: every start-set member is shared, so the scan enters through a
    // synthetic composite identifier.
    let mut compiler = NfaCompiler::new("INITIAL");
    add_class_plus(&mut compiler, 'a', 'z', 3);
    add_class_plus(&mut compiler, '0', '9', 2);
    add_class_plus(&mut compiler, 'a', 'f', 1);
    let automaton = compiler.compile(&CodeGenConfig::default()).unwrap();
    assert!(automaton.start_state_id().is_some());
    for input in ["abc", "abf", "fff", "123", "12a", "a1", "", "?"] {
        assert_eq!(
            automaton.scan(input),
            automaton.simulate(input),
            "input {:?}",
            input
        );
    }
    // The hexish class has the lower kind and wins while it still matches.
    assert_eq!(
        automaton.scan("face").map(|m| (m.kind(), m.pos())),
        Some((1, 3))
    );
    assert_eq!(
        automaton.scan("faze").map(|m| (m.kind(), m.pos())),
        Some((3, 3))
    );
}

/// A successor set with an exclusive and a shared member, so the compile pairs the two cases
/// and withdraws the shared one from the stored set.
fn paired_automaton() -> CompiledAutomaton {
    let mut compiler = NfaCompiler::new("INITIAL");
    let start = compiler.start_state();
    let x = compiler.new_state();
    let z = compiler.new_state();
    let hub = compiler.new_state();
    let p = compiler.new_state();
    let q = compiler.new_state();
    let acc1 = compiler.new_state();
    let acc2 = compiler.new_state();
    compiler.add_move(x, 'x', 'x', hub).unwrap();
    compiler.add_epsilon(hub, p);
    compiler.add_epsilon(hub, q);
    compiler.add_move(z, 'z', 'z', q).unwrap();
    compiler.add_move(p, 'p', 'p', acc1).unwrap();
    compiler.add_move(q, 'q', 'q', acc2).unwrap();
    compiler.set_accepting(acc1, 1).unwrap();
    compiler.set_accepting(acc2, 2).unwrap();
    compiler.add_epsilon(start, x);
    compiler.add_epsilon(start, z);
    compiler.compile(&CodeGenConfig::default()).unwrap()
}

#[test]
fn test_case_pairing_preserves_matches() {
    init();
    let automaton = paired_automaton();
    let cases = [
        ("xp", Some((1, 1))),
        ("xq", Some((2, 1))),
        ("zq", Some((2, 1))),
        ("zp", None),
        ("x", None),
        ("q", None),
    ];
    for (input, expected) in cases {
        assert_eq!(
            automaton.scan(input).map(|m| (m.kind(), m.pos())),
            expected,
            "input {:?}",
            input
        );
        assert_eq!(
            automaton.scan(input),
            automaton.simulate(input),
            "input {:?}",
            input
        );
    }
}

#[test]
fn test_unicode_escapes_gating() {
    init();
    let build = |unicode: bool| {
        let mut compiler = NfaCompiler::new("INITIAL");
        let start = compiler.start_state();
        let body = compiler.new_state();
        let accept = compiler.new_state();
        compiler.add_move(body, 'α', 'ω', accept).unwrap();
        compiler.set_accepting(accept, 1).unwrap();
        compiler.add_epsilon(start, body);
        compiler
            .compile(&CodeGenConfig::default().with_unicode_escapes(unicode))
            .unwrap()
    };
    let with = build(true);
    assert_eq!(with.scan("β").map(|m| (m.kind(), m.pos())), Some((1, 0)));
    assert_eq!(with.scan("β"), with.simulate("β"));
    let without = build(false);
    assert_eq!(without.scan("β"), None);
    assert_eq!(without.scan("β"), without.simulate("β"));
}

#[test]
fn test_state_count_and_start_id() {
    let automaton = ab_automaton();
    // Transition-bearing nodes only: "a" has one, "ab" has two.
    assert_eq!(automaton.state_count(), 3);
    assert!(automaton.start_state_id().is_some());
    assert_eq!(automaton.name(), "INITIAL");
}

#[test]
fn test_max_states_ceiling() {
    let mut compiler = NfaCompiler::new("INITIAL");
    add_literal(&mut compiler, "abcdefgh", 1);
    let err = compiler
        .compile(&CodeGenConfig::default().with_max_states(3))
        .unwrap_err();
    assert!(matches!(
        *err.source,
        ScangenErrorKind::AutomatonTooLarge { states: 8, limit: 3 }
    ));
}

#[test]
fn test_dummy_states_take_no_part_in_matching() {
    let mut compiler = NfaCompiler::new("INITIAL");
    compiler.new_dummy_state();
    add_literal(&mut compiler, "a", 1);
    compiler.new_dummy_state();
    let automaton = compiler.compile(&CodeGenConfig::default()).unwrap();
    // Placeholders are skipped by the numbering.
    assert_eq!(automaton.state_count(), 1);
    assert_eq!(automaton.scan("a").map(|m| (m.kind(), m.pos())), Some((1, 0)));
}

#[test]
fn test_conflicting_successor_is_rejected() {
    let mut compiler = NfaCompiler::new("INITIAL");
    let a = compiler.new_state();
    let b = compiler.new_state();
    let c = compiler.new_state();
    compiler.add_move(a, 'x', 'x', b).unwrap();
    let err = compiler.add_move(a, 'y', 'y', c).unwrap_err();
    assert!(matches!(*err.source, ScangenErrorKind::Inconsistency(_)));
}

#[test]
fn test_conflicting_kind_is_rejected() {
    let mut compiler = NfaCompiler::new("INITIAL");
    let accept = compiler.new_state();
    compiler.set_accepting(accept, 1).unwrap();
    compiler.set_accepting(accept, 1).unwrap();
    let err = compiler.set_accepting(accept, 2).unwrap_err();
    assert!(matches!(*err.source, ScangenErrorKind::Inconsistency(_)));
}

#[cfg(feature = "serde")]
#[test]
fn test_scan_match_serialization() {
    let automaton = ab_automaton();
    let matched = automaton.scan("ab").unwrap();
    let json = serde_json::to_string(&matched).unwrap();
    let back: scangen::ScanMatch = serde_json::from_str(&json).unwrap();
    assert_eq!(matched, back);
}
