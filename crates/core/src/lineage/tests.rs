use super::*;

fn ancestor(node: &str, distance: u32, other: &str) -> LineageRecord {
    LineageRecord {
        node_id: node.to_string(),
        kind: LineageKind::Ancestor,
        distance,
        other: other.to_string(),
        timestamp_ms: 100,
        version: Some(1),
    }
}

fn edge(ancestor: &str, descendant: &str, depth: u32, distance: u32) -> EdgePair {
    EdgePair::build(EdgeRequest {
        ancestor_id: ancestor.to_string(),
        descendant_id: descendant.to_string(),
        depth,
        distance,
        timestamp_ms: 10,
        version: None,
        now_ms: 1_000,
    })
    .unwrap()
}

#[test]
fn node_id_validation() {
    assert_eq!(NodeId::try_new("").unwrap_err(), NodeIdError::Empty);
    assert_eq!(NodeId::try_new("  ").unwrap_err(), NodeIdError::Empty);
    assert_eq!(
        NodeId::try_new("a#b").unwrap_err(),
        NodeIdError::ContainsSeparator
    );
    assert_eq!(
        NodeId::try_new("bad\u{0007}id").unwrap_err(),
        NodeIdError::ContainsControl
    );
    assert_eq!(NodeId::try_new(ROOT).unwrap_err(), NodeIdError::Reserved);
    assert_eq!(
        NodeId::try_new("x".repeat(257)).unwrap_err(),
        NodeIdError::TooLong
    );
    assert_eq!(NodeId::try_new("syn123").unwrap().as_str(), "syn123");
}

#[test]
fn hash_key_encodes_and_decodes() {
    let hash = encode_hash("syn1", LineageKind::Ancestor).unwrap();
    assert_eq!(hash, "syn1#A");
    assert_eq!(
        decode_hash(&hash).unwrap(),
        ("syn1".to_string(), LineageKind::Ancestor)
    );
    assert_eq!(
        encode_hash("", LineageKind::Descendant).unwrap_err(),
        KeyError::EmptyId
    );
    assert_eq!(
        encode_hash("a#b", LineageKind::Descendant).unwrap_err(),
        KeyError::IdContainsSeparator
    );
    assert_eq!(decode_hash("syn1#X").unwrap_err(), KeyError::UnknownKind);
    assert_eq!(decode_hash("syn1").unwrap_err(), KeyError::MalformedHashKey);
}

#[test]
fn range_key_is_zero_padded_and_order_preserving() {
    assert_eq!(encode_range(3, "syn9").unwrap(), "0003#syn9");
    assert_eq!(encode_range_prefix(12).unwrap(), "0012#");
    assert_eq!(
        decode_range("0012#syn9").unwrap(),
        (12, "syn9".to_string())
    );

    let mut keys = [10u32, 2, 1, 100, 9]
        .iter()
        .map(|d| encode_range(*d, "z").unwrap())
        .collect::<Vec<_>>();
    keys.sort();
    let decoded = keys
        .iter()
        .map(|k| decode_range(k).unwrap().0)
        .collect::<Vec<_>>();
    assert_eq!(decoded, vec![1, 2, 9, 10, 100]);
}

#[test]
fn range_key_rejects_bad_input() {
    assert_eq!(
        encode_range(key::MAX_DISTANCE + 1, "a").unwrap_err(),
        KeyError::DistanceOutOfRange
    );
    assert_eq!(
        encode_range(1, "a#b").unwrap_err(),
        KeyError::IdContainsSeparator
    );
    assert_eq!(
        decode_range("-001#a").unwrap_err(),
        KeyError::MalformedRangeKey
    );
    assert_eq!(decode_range("01#a").unwrap_err(), KeyError::MalformedRangeKey);
    assert_eq!(decode_range("0001#").unwrap_err(), KeyError::MalformedRangeKey);
}

#[test]
fn edge_pair_builds_complementary_records() {
    let pair = edge("a", "c", 0, 2);
    assert_eq!(pair.a2d().node_id, "a");
    assert_eq!(pair.a2d().kind, LineageKind::Descendant);
    assert_eq!(pair.a2d().other, "c");
    assert_eq!(pair.d2a().node_id, "c");
    assert_eq!(pair.d2a().kind, LineageKind::Ancestor);
    assert_eq!(pair.d2a().other, "a");
    assert_eq!(pair.a2d().distance, 2);
    assert_eq!(pair.d2a().distance, 2);
    assert_eq!(pair.ancestor_depth(), 0);
}

#[test]
fn edge_pair_validation() {
    let base = EdgeRequest {
        ancestor_id: "a".to_string(),
        descendant_id: "a".to_string(),
        depth: 0,
        distance: 1,
        timestamp_ms: 10,
        version: None,
        now_ms: 1_000,
    };
    assert_eq!(
        EdgePair::build(base.clone()).unwrap_err(),
        EdgeError::SelfLineage
    );
    assert_eq!(
        EdgePair::build(EdgeRequest {
            descendant_id: "b".to_string(),
            distance: 0,
            ..base.clone()
        })
        .unwrap_err(),
        EdgeError::ZeroDistance
    );
    assert_eq!(
        EdgePair::build(EdgeRequest {
            descendant_id: "b".to_string(),
            timestamp_ms: 5_000,
            ..base.clone()
        })
        .unwrap_err(),
        EdgeError::TimestampInFuture {
            timestamp_ms: 5_000,
            now_ms: 1_000
        }
    );
    assert!(
        EdgePair::build(EdgeRequest {
            ancestor_id: ROOT.to_string(),
            descendant_id: "a".to_string(),
            ..base
        })
        .is_ok()
    );
}

#[test]
fn edge_pair_rebuilt_from_ancestor_record() {
    let record = ancestor("c", 2, "a");
    let pair = EdgePair::from_ancestor_record(&record, 0).unwrap();
    assert_eq!(pair.d2a(), &record);
    assert_eq!(pair.a2d().node_id, "a");
    assert_eq!(pair.a2d().other, "c");
    assert_eq!(pair.a2d().timestamp_ms, record.timestamp_ms);
    assert_eq!(pair.a2d().version, None);

    let mut downward = record.clone();
    downward.kind = LineageKind::Descendant;
    assert_eq!(
        EdgePair::from_ancestor_record(&downward, 0).unwrap_err(),
        EdgeError::NotAnAncestorRecord
    );
}

#[test]
fn write_order_is_root_first_then_ids_then_distance() {
    let mut pairs = [
        edge("b", "d", 1, 1),
        edge("a", "d", 0, 2),
        edge("a", "c", 0, 1),
        edge("a", "b", 0, 1),
        edge("a", "c", 0, 3),
    ];
    pairs.sort_by_key(|pair| pair.order_key());
    let ordered = pairs
        .iter()
        .map(|p| format!("{}>{}@{}", p.ancestor_id(), p.descendant_id(), p.distance()))
        .collect::<Vec<_>>();
    assert_eq!(ordered, vec!["a>b@1", "a>c@1", "a>d@2", "a>c@3", "b>d@1"]);
}

#[test]
fn complete_path_is_returned_root_first() {
    let records = vec![ancestor("c", 1, "b"), ancestor("c", 2, "a")];
    let path = validate_complete_path("c", records, Some("a")).unwrap();
    let ids = path.iter().map(|r| r.other.as_str()).collect::<Vec<_>>();
    assert_eq!(ids, vec!["a", "b"]);
}

#[test]
fn root_has_empty_path() {
    let records = vec![ancestor("a", 1, ROOT)];
    assert!(validate_complete_path("a", records, Some("a")).unwrap().is_empty());

    let records = vec![ancestor("x", 1, ROOT)];
    let err = validate_complete_path("x", records, Some("a")).unwrap_err();
    assert!(matches!(err, TreeError::IncompletePath { .. }));
}

#[test]
fn path_errors_are_classified() {
    let err = validate_complete_path("c", Vec::new(), Some("a")).unwrap_err();
    assert!(matches!(err, TreeError::NoAncestor { .. }));
    assert!(err.is_incomplete_path());

    let err = validate_complete_path("c", vec![ancestor("c", 1, "b")], None).unwrap_err();
    assert!(matches!(err, TreeError::IncompletePath { .. }));

    // far end is not the root
    let err = validate_complete_path("c", vec![ancestor("c", 1, "b")], Some("a")).unwrap_err();
    assert!(matches!(err, TreeError::IncompletePath { .. }));

    // gap at distance 2
    let records = vec![ancestor("d", 1, "c"), ancestor("d", 3, "a")];
    let err = validate_complete_path("d", records, Some("a")).unwrap_err();
    match err {
        TreeError::IncompletePath { reason, .. } => {
            assert_eq!(reason, "missing ancestor at distance 2")
        }
        other => panic!("expected IncompletePath, got {other:?}"),
    }

    // two ancestors at distance 1
    let records = vec![
        ancestor("d", 1, "b"),
        ancestor("d", 1, "c"),
        ancestor("d", 2, "a"),
    ];
    let err = validate_complete_path("d", records, Some("a")).unwrap_err();
    assert!(err.is_multiple_inheritance());
    match err {
        TreeError::MultipleInheritance {
            distance,
            conflicting,
            ..
        } => {
            assert_eq!(distance, 1);
            let ids = conflicting.iter().map(|r| r.other.as_str()).collect::<Vec<_>>();
            assert_eq!(ids, vec!["b", "c"]);
        }
        other => panic!("expected MultipleInheritance, got {other:?}"),
    }
}

#[test]
fn repeated_middle_generation_names_its_distance() {
    let records = vec![
        ancestor("e", 1, "d"),
        ancestor("e", 2, "b"),
        ancestor("e", 2, "c"),
        ancestor("e", 3, "a"),
    ];
    let err = validate_complete_path("e", records, Some("a")).unwrap_err();
    match err {
        TreeError::MultipleInheritance {
            node,
            distance,
            conflicting,
        } => {
            assert_eq!(node, "e");
            assert_eq!(distance, 2);
            let ids = conflicting.iter().map(|r| r.other.as_str()).collect::<Vec<_>>();
            assert_eq!(ids, vec!["b", "c"]);
        }
        other => panic!("expected MultipleInheritance, got {other:?}"),
    }
}

#[test]
fn prefix_and_distance_helpers() {
    let current = vec![
        ancestor("g", 4, "a"),
        ancestor("g", 3, "b"),
        ancestor("g", 2, "e"),
        ancestor("g", 1, "h"),
    ];
    let target = vec![ancestor("f", 2, "a"), ancestor("f", 1, "b"), ancestor("f", 0, "x")];
    assert_eq!(common_prefix_len(&current, &target), 2);
    assert_eq!(common_prefix_len(&current, &[]), 0);

    assert_eq!(distance_to_ancestor(&current, "a"), Some(4));
    assert_eq!(distance_to_ancestor(&current, "h"), Some(1));
    assert_eq!(distance_to_ancestor(&current, "zz"), None);
}
