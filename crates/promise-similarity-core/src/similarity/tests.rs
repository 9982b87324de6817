#[cfg(test)]
#[allow(clippy::module_inception)]
mod tests {
    use crate::error::PromiseError;
    use crate::similarity::{compute, Selection, Similarities, SimilarityEngine, TfidfModel};
    use std::collections::HashSet;

    fn docs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn corpus() -> Vec<String> {
        docs(&[
            "styrke skole lærer",
            "styrke skole lærer kvalitet",
            "bygge vei jernbane",
            "bygge jernbane nord",
            "lærer skole",
            "senke skatt bedrift",
            "skatt bedrift",
        ])
    }

    #[test]
    fn test_shared_term_relates_documents() {
        let result = compute(
            &docs(&["katt hund", "katt fisk", "bil vei"]),
            Selection::Threshold(0.1),
            None,
        )
        .unwrap();

        let zero = result.related(0);
        assert_eq!(zero.len(), 1);
        assert_eq!(zero[0].index, 1);
        assert!(zero[0].score > 0.0);

        let one = result.related(1);
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].index, 0);

        assert!(result.get(2).is_none(), "no shared vocabulary means absent");
        assert!(result.related(2).is_empty());
    }

    #[test]
    fn test_top_two_over_identical_documents() {
        let result = compute(
            &docs(&["katt hund", "katt hund", "katt hund"]),
            Selection::Top(2),
            None,
        )
        .unwrap();

        assert_eq!(result.len(), 3);
        for entry in result.iter() {
            assert_eq!(entry.related.len(), 1, "Top(2) yields k - 1 = 1 other");
            assert_ne!(entry.related[0].index, entry.index, "self is excluded");
            assert!((entry.related[0].score - 1.0).abs() < 1e-9);
        }
        // Ties resolve to the lowest other index
        assert_eq!(result.related(0)[0].index, 1);
        assert_eq!(result.related(1)[0].index, 0);
        assert_eq!(result.related(2)[0].index, 0);
    }

    #[test]
    fn test_top_one_selects_nothing() {
        let result = compute(&docs(&["katt", "katt"]), Selection::Top(1), None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_top_k_length_and_order() {
        let result = compute(&corpus(), Selection::Top(3), None).unwrap();
        for entry in result.iter() {
            assert!(entry.related.len() <= 2);
            assert!(entry.related.iter().all(|r| r.index != entry.index));
            for pair in entry.related.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    #[test]
    fn test_top_k_keeps_unrelated_documents_at_zero() {
        let result = compute(
            &docs(&["katt hund", "katt fisk", "bil vei"]),
            Selection::Top(3),
            None,
        )
        .unwrap();

        assert_eq!(result.len(), 3);
        let unrelated = result.related(2);
        assert_eq!(unrelated.len(), 2);
        assert_eq!(unrelated[0].index, 0);
        assert_eq!(unrelated[1].index, 1);
        assert!(unrelated.iter().all(|r| r.score == 0.0));

        let zero = result.related(0);
        assert_eq!(zero[0].index, 1);
        assert!(zero[0].score > 0.0);
        assert_eq!(zero[1].index, 2);
        assert_eq!(zero[1].score, 0.0);
    }

    #[test]
    fn test_top_k_caps_at_other_documents() {
        let result = compute(
            &docs(&["katt hund", "bil vei", "sol regn"]),
            Selection::Top(5),
            None,
        )
        .unwrap();
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|entry| entry.related.len() == 2));
    }

    #[test]
    fn test_threshold_is_strict_and_excludes_self() {
        let threshold = 0.3;
        let result = compute(&corpus(), Selection::Threshold(threshold), None).unwrap();
        assert!(!result.is_empty());
        for entry in result.iter() {
            for related in &entry.related {
                assert_ne!(related.index, entry.index);
                assert!(related.score > threshold);
            }
            for pair in entry.related.windows(2) {
                assert!(pair[0].score >= pair[1].score);
            }
        }
    }

    #[test]
    fn test_threshold_equal_score_is_excluded() {
        // Orthogonal documents score exactly 0.0, which is not above 0.0
        let model = TfidfModel::fit(&docs(&["katt", "hund"]), None);
        assert_eq!(model.score(0, 1), 0.0);

        let result = compute(&docs(&["katt", "hund"]), Selection::Threshold(0.0), None).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_scores_are_symmetric() {
        let result = compute(&corpus(), Selection::Threshold(0.0), None).unwrap();
        for entry in result.iter() {
            for related in &entry.related {
                let back = result
                    .related(related.index)
                    .iter()
                    .find(|r| r.index == entry.index)
                    .expect("relation must hold both ways");
                assert_eq!(back.score.to_bits(), related.score.to_bits());
            }
        }
    }

    #[test]
    fn test_scores_within_unit_interval() {
        let result = compute(&corpus(), Selection::Top(10), None).unwrap();
        for entry in result.iter() {
            for related in &entry.related {
                assert!((0.0..=1.0).contains(&related.score));
            }
        }
    }

    #[test]
    fn test_degenerate_documents_do_not_fail() {
        let stop_words: HashSet<String> = ["og".to_string()].into_iter().collect();
        let result = compute(
            &docs(&["og og", "", "skole og"]),
            Selection::Threshold(0.0),
            Some(&stop_words),
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_stop_words_change_relatedness() {
        let stop_words: HashSet<String> = ["program".to_string()].into_iter().collect();
        let documents = docs(&["program skole", "program vei"]);

        let without = compute(&documents, Selection::Threshold(0.0), None).unwrap();
        assert_eq!(without.related(0).len(), 1);

        let with = compute(&documents, Selection::Threshold(0.0), Some(&stop_words)).unwrap();
        assert!(with.is_empty());
    }

    #[test]
    fn test_empty_input_is_an_error() {
        let result = SimilarityEngine::new(Selection::Threshold(0.5)).compute(&[]);
        assert!(matches!(result, Err(PromiseError::EmptyInput)));
    }

    #[test]
    fn test_missing_selection_is_a_configuration_error() {
        let result = Selection::from_options(None, None);
        assert!(matches!(result, Err(PromiseError::Configuration(_))));
    }

    #[test]
    fn test_invalid_selection_values() {
        assert!(Selection::from_options(Some(0), None).is_err());
        assert!(Selection::from_options(None, Some(f64::NAN)).is_err());
        assert!(Selection::from_options(None, Some(1.0)).is_err());
        assert_eq!(
            Selection::from_options(Some(20), Some(0.7)).unwrap(),
            Selection::Top(20)
        );
        assert_eq!(
            Selection::from_options(None, Some(0.7)).unwrap(),
            Selection::Threshold(0.7)
        );
    }

    #[test]
    fn test_engine_rejects_invalid_selection() {
        let result =
            SimilarityEngine::new(Selection::Top(0)).compute(&docs(&["katt", "katt hund"]));
        assert!(matches!(result, Err(PromiseError::Configuration(_))));
    }

    #[test]
    fn test_similarities_roundtrip_json() {
        let result = compute(&corpus(), Selection::Threshold(0.2), None).unwrap();
        let json = serde_json::to_string(&result).unwrap();
        let parsed: Similarities = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, result);
        assert_eq!(serde_json::to_string(&parsed).unwrap(), json);
    }

    #[test]
    fn test_similarities_json_shape() {
        let result = compute(&docs(&["katt hund", "katt hund"]), Selection::Top(2), None).unwrap();
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value[0]["index"], 0);
        assert_eq!(value[0]["related"][0]["index"], 1);
        assert_eq!(value[1]["related"][0]["index"], 0);
    }

    #[test]
    fn test_from_entries_drops_empty_and_sorts() {
        use crate::similarity::{DocumentSimilarity, Related};

        let similarities = Similarities::from_entries(vec![
            DocumentSimilarity {
                index: 4,
                related: vec![Related {
                    index: 1,
                    score: 0.9,
                }],
            },
            DocumentSimilarity {
                index: 2,
                related: vec![],
            },
            DocumentSimilarity {
                index: 1,
                related: vec![Related {
                    index: 4,
                    score: 0.9,
                }],
            },
        ]);

        assert_eq!(similarities.len(), 2);
        assert_eq!(similarities.iter().next().unwrap().index, 1);
        assert!(similarities.get(2).is_none());
        assert_eq!(similarities.pair_count(), 2);
        assert_eq!(similarities.max_index(), Some(4));
    }

    #[test]
    fn test_decoding_normalizes_cached_entries() {
        let json = r#"[
            {"index": 3, "related": [{"index": 0, "score": 0.8}]},
            {"index": 1, "related": [{"index": 1, "score": 1.0}]},
            {"index": 0, "related": [{"index": 0, "score": 1.0}, {"index": 3, "score": 0.8}]}
        ]"#;
        let similarities: Similarities = serde_json::from_str(json).unwrap();

        assert_eq!(similarities.len(), 2);
        assert!(similarities.get(1).is_none());
        assert_eq!(similarities.related(0).len(), 1);
        assert_eq!(similarities.related(0)[0].index, 3);
        assert_eq!(similarities.related(3)[0].index, 0);

        let indices: Vec<usize> = similarities.iter().map(|entry| entry.index).collect();
        assert_eq!(indices, vec![0, 3]);
    }
}
