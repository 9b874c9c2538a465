use plaid_engine::{CombinatorialEngine, StrategyKind};
use plaid_ir::parse::parse_spec;
use plaid_ir::{Combination, Dimension, Value};

fn drain(engine: &mut CombinatorialEngine) -> Vec<Combination> {
    let mut out = Vec::new();
    let mut c = Combination::new();
    while engine.next(&mut c) {
        out.push(c.clone());
    }
    out
}

fn three_dimensions() -> Vec<Dimension> {
    vec![
        Dimension::new("Editing", ["Backspace", "Delete", "Enter"]),
        Dimension::new("AcceptsReturn", [true, false]),
        Dimension::new("FontSize", [8, 12, 96, 200]),
    ]
}

#[test]
fn test_yields_product_of_value_counts() {
    let mut engine = CombinatorialEngine::from_dimensions(three_dimensions()).unwrap();
    assert_eq!(engine.total_count(), 24);

    let all = drain(&mut engine);
    assert_eq!(all.len(), 24);
    assert_eq!(engine.yielded(), 24);

    let mut c = Combination::new();
    assert!(!engine.next(&mut c), "exhausted engine must stay exhausted");
}

#[test]
fn test_every_combination_is_distinct_and_complete() {
    let mut engine = CombinatorialEngine::from_dimensions(three_dimensions()).unwrap();
    let all = drain(&mut engine);

    for (i, a) in all.iter().enumerate() {
        assert_eq!(a.len(), 3);
        for b in &all[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

#[test]
fn test_first_dimension_varies_fastest() {
    let mut engine = CombinatorialEngine::from_dimensions(three_dimensions()).unwrap();
    let all = drain(&mut engine);

    let editing: Vec<&str> = all.iter().take(4).map(|c| c.get_text("Editing").unwrap()).collect();
    assert_eq!(editing, vec!["Backspace", "Delete", "Enter", "Backspace"]);
    assert_eq!(all[3].get_bool("AcceptsReturn"), Some(false));
}

#[test]
fn test_empty_dimension_yields_nothing() {
    let dims = vec![
        Dimension::new("Wrap", [true, false]),
        Dimension::new("Nothing", Vec::<Value>::new()),
    ];
    let mut engine = CombinatorialEngine::from_dimensions(dims).unwrap();
    assert_eq!(engine.total_count(), 0);

    let mut c = Combination::new();
    assert!(!engine.next(&mut c));
    assert!(c.is_empty());
}

#[test]
fn test_no_dimensions_yields_nothing() {
    let mut engine = CombinatorialEngine::from_dimensions(Vec::new()).unwrap();
    assert_eq!(engine.total_count(), 0);
    let mut c = Combination::new();
    assert!(!engine.next(&mut c));
}

#[test]
fn test_identical_engines_yield_identical_sequences() {
    for kind in [StrategyKind::Exhaustive, StrategyKind::Pairwise { seed: 9 }] {
        let mut a = CombinatorialEngine::with_strategy(three_dimensions(), kind.build()).unwrap();
        let mut b = CombinatorialEngine::with_strategy(three_dimensions(), kind.build()).unwrap();
        assert_eq!(drain(&mut a), drain(&mut b), "strategy {kind:?}");
    }
}

#[test]
fn test_value_filters_restrict_combinations() {
    let spec = parse_spec(
        r#"{ "dimensions": [
            { "name": "AcceptsReturn", "values": [true, false] },
            { "name": "EditableType", "values": [
                "TextBox",
                { "value": "PasswordBox", "filter": "AcceptsReturn==1" }
            ] }
        ] }"#,
    )
    .unwrap();
    let mut engine = CombinatorialEngine::from_dimensions(spec.into_dimensions().unwrap()).unwrap();
    let all = drain(&mut engine);

    assert_eq!(all.len(), 3);
    assert!(all
        .iter()
        .filter(|c| c.get_text("EditableType") == Some("PasswordBox"))
        .all(|c| c.get_bool("AcceptsReturn") == Some(false)));
    // The space size is still reported unfiltered.
    assert_eq!(engine.total_count(), 4);
}

#[test]
fn test_filtering_hook_sees_filter_verdict() {
    let mut engine = CombinatorialEngine::from_dimensions(three_dimensions()).unwrap();
    engine.set_filtering_hook(Box::new(|c: &Combination, acceptable: bool| {
        acceptable && c.get_int("FontSize") != Some(200)
    }));

    let all = drain(&mut engine);
    assert_eq!(all.len(), 18);
    assert!(all.iter().all(|c| c.get_int("FontSize") != Some(200)));
}

#[test]
fn test_pairwise_is_smaller_than_exhaustive() {
    let dims = vec![
        Dimension::new("A", [0, 1, 2]),
        Dimension::new("B", [0, 1, 2]),
        Dimension::new("C", [0, 1, 2]),
        Dimension::new("D", [0, 1, 2]),
    ];
    let mut engine =
        CombinatorialEngine::with_strategy(dims, StrategyKind::Pairwise { seed: 42 }.build()).unwrap();
    assert_eq!(engine.strategy_name(), "pairwise");
    assert_eq!(engine.total_count(), 81);

    let all = drain(&mut engine);
    assert!(all.len() >= 9);
    assert!(all.len() < 81);
}
