use cognate_core::*;
use ndarray::array;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;

fn abc_table() -> Arc<SymbolTable> {
    SymbolTable::from_tokens(["a", "b", "c", "d"])
}

/// +2 identity, -1 substitution, -2 against a gap
fn identity_model(symbols: &Arc<SymbolTable>) -> CorrespondenceModel {
    let mut model = CorrespondenceModel::new(symbols.clone());
    let n = symbols.size() as u32;
    for a in 1..n {
        for b in 1..n {
            let score = if a == GAP || b == GAP {
                -2.0
            } else if a == b {
                2.0
            } else {
                -1.0
            };
            model.set_score(a, b, score).unwrap();
        }
    }
    model
}

#[test]
fn test_identical_strings_edit_distance() {
    let symbols = abc_table();
    let abc = symbols.encode(&["a", "b", "c"]).unwrap();

    assert_eq!(edit_distance(abc.segments(), abc.segments()), 0);
    let alignment = edit_distance_alignment(&abc, &abc);
    assert_eq!(alignment.normalized_distance_score, 0.0);
    assert_eq!(alignment.operations(), vec![EditOp::Match; 3]);
}

#[test]
fn test_single_substitution_edit_distance() {
    let symbols = abc_table();
    let abc = symbols.encode(&["a", "b", "c"]).unwrap();
    let abd = symbols.encode(&["a", "b", "d"]).unwrap();

    assert_eq!(edit_distance(abc.segments(), abd.segments()), 1);
    let alignment = edit_distance_alignment(&abc, &abd);
    assert!((alignment.normalized_distance_score - 1.0 / 3.0).abs() < 1e-12);
}

#[test]
fn test_needleman_wunsch_never_gaps_when_mismatch_is_cheaper() {
    let symbols = abc_table();
    let model = identity_model(&symbols);
    let ab = symbols.encode(&["a", "b"]).unwrap();
    let ac = symbols.encode(&["a", "c"]).unwrap();

    let scoring = PairScoring::global_only(&model);
    let alignment = needleman_wunsch(&ab, &ac, &scoring, &AlignmentConfig::default()).unwrap();
    assert_eq!(alignment.alignment_score, 1.0);
    assert!(alignment.pairs().all(|(x, y)| x != GAP && y != GAP));
    assert_eq!(alignment.display(&symbols).unwrap(), "a b\na c");
}

#[test]
fn test_upgma_partition() {
    let matrix = array![[0.0, 1.0, 5.0], [1.0, 0.0, 5.0], [5.0, 5.0, 0.0]];
    let mut clusters = flat_cluster(&matrix, Linkage::Average, 2.0).unwrap();
    clusters.sort();
    assert_eq!(clusters, vec![vec![0, 1], vec![2]]);
}

#[test]
fn test_information_weighted_self_alignment_is_zero() {
    let mut builder = SymbolTableBuilder::new();
    builder.define_segments("kastu");
    let symbols = builder.freeze();
    let forms: Vec<PhoneticString> = ["kata", "kasa", "tuka", "sata"]
        .iter()
        .map(|ipa| symbols.segment(ipa).unwrap())
        .collect();
    let info = InformationModel::train(symbols.clone(), &forms, 0.2).unwrap();

    let model = identity_model(&symbols);
    let models = CorrespondenceModels {
        global: model.clone(),
        local: Default::default(),
        self_models: vec![Some(model)],
    };

    for form in &forms {
        let alignment = information_weighted_alignment(
            form,
            &form.clone(),
            &models.scoring(0, 0),
            &info,
            &info,
            &AlignmentConfig::default(),
        )
        .unwrap();
        assert!(alignment.normalized_distance_score.abs() < 1e-9);
        assert_eq!(alignment.str1, *form);
    }
}

#[test]
fn test_model_record_round_trip_through_json() {
    let symbols = abc_table();
    let model = identity_model(&symbols);
    let json = ModelRecord::from_correspondence(&model).to_json().unwrap();
    let restored = ModelRecord::from_json(&json)
        .unwrap()
        .into_correspondence(None)
        .unwrap();

    let ab = symbols.encode(&["a", "b"]).unwrap();
    let ac = symbols.encode(&["a", "c"]).unwrap();
    let config = AlignmentConfig::default();
    let before = needleman_wunsch(&ab, &ac, &PairScoring::global_only(&model), &config).unwrap();
    let rebuilt = restored.symbols().encode(&["a", "b"]).unwrap();
    let after =
        needleman_wunsch(&rebuilt, &ac, &PairScoring::global_only(&restored), &config).unwrap();
    assert_eq!(before.alignment_score, after.alignment_score);
}

fn romance_wordlist() -> Wordlist {
    let rows = [
        ("father", "pater", "padre", "pai"),
        ("foot", "pes", "pie", "pe"),
        ("fish", "piskis", "peske", "peiSe"),
        ("full", "plenus", "lleno", "Seio"),
        ("night", "noktem", "noke", "noite"),
        ("eight", "okto", "oko", "oito"),
        ("milk", "laktem", "leke", "leite"),
        ("water", "akua", "agua", "agua"),
        ("dog", "kanis", "pero", "kao"),
        ("head", "kaput", "kabesa", "kabesa"),
    ];
    let mut builder = SymbolTableBuilder::new();
    for (_, latin, spanish, portuguese) in rows {
        builder.define_segments(latin);
        builder.define_segments(spanish);
        builder.define_segments(portuguese);
    }
    let mut wordlist = Wordlist::new(builder.freeze());
    for (concept, latin, spanish, portuguese) in rows {
        wordlist.add_ipa("latin", concept, latin).unwrap();
        wordlist.add_ipa("spanish", concept, spanish).unwrap();
        wordlist.add_ipa("portuguese", concept, portuguese).unwrap();
    }
    wordlist
}

fn fast_config() -> CoreConfig {
    CoreConfig::from_json_str(
        r#"{"inference": {"monte_carlo_samples": 4000, "sampling_chunks": 4}}"#,
    )
    .unwrap()
}

fn romance_detector(seed: u64) -> CognateDetector {
    CognateDetector::infer(romance_wordlist(), fast_config(), &mut ChaCha8Rng::seed_from_u64(seed))
        .unwrap()
}

#[test]
fn test_pipeline_assigns_every_form_once() {
    let wordlist = romance_wordlist();
    let num_forms = wordlist.len();
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let detector = CognateDetector::infer(wordlist, fast_config(), &mut rng).unwrap();
    let sets = detector.cognate_sets().unwrap();

    let mut members: Vec<usize> = sets.iter().flat_map(|set| set.members.clone()).collect();
    members.sort_unstable();
    assert_eq!(members, (0..num_forms).collect::<Vec<_>>());

    for (expected_id, set) in sets.iter().enumerate() {
        assert_eq!(set.id, expected_id);
        assert_eq!(set.size, set.members.len());
        let concept = detector.wordlist().concept_id(&set.concept).unwrap();
        assert!(set
            .members
            .iter()
            .all(|&form| detector.wordlist().form(form).concept == concept));
    }
}

#[test]
fn test_pipeline_is_reproducible() {
    let first = romance_detector(9).cognate_sets().unwrap();
    let second = romance_detector(9).cognate_sets().unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_identical_forms_share_a_set() {
    let detector = romance_detector(1);
    let wordlist = detector.wordlist();
    let water = wordlist.concept_id("water").unwrap();
    let forms = wordlist.concept_forms(water);
    // spanish and portuguese "agua"
    let (spanish, portuguese) = (forms[1], forms[2]);

    let sets = detector.cognate_sets().unwrap();
    let holding = |form: usize| sets.iter().position(|set| set.members.contains(&form));
    assert_eq!(holding(spanish), holding(portuguese));
}
