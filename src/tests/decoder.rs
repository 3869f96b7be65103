use crate::errors::CykadaError;
use crate::span::Span;
use crate::{
    ChartDecoder, LabelChain, LabelId, LabelVocabulary, ParseNode, Sentence, SpanScoreMatrix,
    Token,
};

fn chain(parts: &[&str]) -> LabelChain {
    parts.iter().map(|s| s.to_string()).collect()
}

/// 空ラベルに加えてNP, VP, Sを登録した語彙（L = 4）
fn basic_vocab() -> LabelVocabulary {
    LabelVocabulary::from_chains([chain(&["NP"]), chain(&["VP"]), chain(&["S"])]).unwrap()
}

fn basic_sentence() -> Vec<Token> {
    vec![
        Token::new("The", "DT"),
        Token::new("dog", "NN"),
        Token::new("ran", "VBD"),
    ]
}

#[test]
fn test_all_zero_matrix() {
    let decoder = ChartDecoder::new(basic_vocab());
    let mut worker = decoder.new_worker();
    worker.reset_sentence(basic_sentence());

    let matrix = SpanScoreMatrix::zeros(3, 4).unwrap();
    let score = worker.decode(&matrix).unwrap();
    assert_eq!(score, 0.0);

    // Ties on every span resolve to the smallest split and the empty label,
    // so the tree is a right comb of unlabeled binary nodes.
    let expected = ParseNode::internal::<&str>(
        None,
        vec![
            ParseNode::leaf(0, "The", "DT"),
            ParseNode::internal::<&str>(
                None,
                vec![
                    ParseNode::leaf(1, "dog", "NN"),
                    ParseNode::leaf(2, "ran", "VBD"),
                ],
            )
            .unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(worker.tree().unwrap(), expected);
}

#[test]
fn test_three_token_scenario() {
    let decoder = ChartDecoder::new(basic_vocab());
    let vocab = decoder.vocabulary();

    let mut matrix = SpanScoreMatrix::zeros(3, 4).unwrap();
    matrix
        .set_score(Span::new(0, 2).unwrap(), vocab.index_of(&chain(&["NP"])), 5.0)
        .unwrap();
    matrix
        .set_score(Span::new(2, 3).unwrap(), vocab.index_of(&chain(&["VP"])), 4.0)
        .unwrap();
    matrix
        .set_score(Span::new(0, 3).unwrap(), vocab.index_of(&chain(&["S"])), 6.0)
        .unwrap();

    let mut worker = decoder.new_worker();
    worker.reset_sentence(basic_sentence());
    let score = worker.decode(&matrix).unwrap();

    // The root splits at k = 2: S(0,3) + NP(0,2) + VP(2,3) = 6 + 5 + 4 = 15.
    assert_eq!(score, 15.0);

    let expected = ParseNode::internal(
        Some("S"),
        vec![
            ParseNode::internal(
                Some("NP"),
                vec![
                    ParseNode::leaf(0, "The", "DT"),
                    ParseNode::leaf(1, "dog", "NN"),
                ],
            )
            .unwrap(),
            ParseNode::internal(Some("VP"), vec![ParseNode::leaf(2, "ran", "VBD")]).unwrap(),
        ],
    )
    .unwrap();
    assert_eq!(worker.tree().unwrap(), expected);
}

#[test]
fn test_single_token_sentence() {
    let decoder = ChartDecoder::new(basic_vocab());
    let vocab = decoder.vocabulary();

    let mut matrix = SpanScoreMatrix::zeros(1, 4).unwrap();
    matrix
        .set_score(Span::new(0, 1).unwrap(), vocab.index_of(&chain(&["NP"])), 2.0)
        .unwrap();

    let mut worker = decoder.new_worker();
    worker.reset_sentence([Token::new("dogs", "NNS")]);
    let score = worker.decode(&matrix).unwrap();
    assert_eq!(score, 2.0);

    let expected =
        ParseNode::internal(Some("NP"), vec![ParseNode::leaf(0, "dogs", "NNS")]).unwrap();
    assert_eq!(worker.tree().unwrap(), expected);

    // With all scores negative the empty label wins and the tree is a bare leaf.
    let matrix = SpanScoreMatrix::from_fn(1, 4, |_, label| {
        if label.is_empty_label() {
            0.0
        } else {
            -1.0
        }
    })
    .unwrap();
    let score = worker.decode(&matrix).unwrap();
    assert_eq!(score, 0.0);
    assert_eq!(worker.tree().unwrap(), ParseNode::leaf(0, "dogs", "NNS"));
}

#[test]
fn test_unary_chain_expands_to_nested_nodes() {
    let vocab =
        LabelVocabulary::from_chains([chain(&["NP"]), chain(&["S", "VP"])]).unwrap();
    let decoder = ChartDecoder::new(vocab);
    let vocab = decoder.vocabulary();

    let mut matrix = SpanScoreMatrix::zeros(2, 3).unwrap();
    matrix
        .set_score(
            Span::new(0, 2).unwrap(),
            vocab.index_of(&chain(&["S", "VP"])),
            3.0,
        )
        .unwrap();

    let mut worker = decoder.new_worker();
    worker.reset_sentence([Token::new("eat", "VB"), Token::new("apples", "NNS")]);
    let score = worker.decode(&matrix).unwrap();
    assert_eq!(score, 3.0);

    // The collapsed chain S -> VP materializes as two nested nodes over
    // the same span, with the innermost holding both children.
    let expected = ParseNode::internal(
        Some("S"),
        vec![ParseNode::internal(
            Some("VP"),
            vec![
                ParseNode::leaf(0, "eat", "VB"),
                ParseNode::leaf(1, "apples", "NNS"),
            ],
        )
        .unwrap()],
    )
    .unwrap();
    assert_eq!(worker.tree().unwrap(), expected);
}

#[test]
fn test_tie_breaks_prefer_smallest_label() {
    // NP and VP score equally on the only span; NP has the smaller index.
    let decoder = ChartDecoder::new(basic_vocab());
    let vocab = decoder.vocabulary();

    let mut matrix = SpanScoreMatrix::zeros(1, 4).unwrap();
    matrix
        .set_score(Span::new(0, 1).unwrap(), vocab.index_of(&chain(&["NP"])), 1.0)
        .unwrap();
    matrix
        .set_score(Span::new(0, 1).unwrap(), vocab.index_of(&chain(&["VP"])), 1.0)
        .unwrap();

    let mut worker = decoder.new_worker();
    worker.reset_sentence([Token::new("run", "VB")]);
    worker.decode(&matrix).unwrap();

    let expected =
        ParseNode::internal(Some("NP"), vec![ParseNode::leaf(0, "run", "VB")]).unwrap();
    assert_eq!(worker.tree().unwrap(), expected);
}

#[test]
fn test_decoding_is_deterministic() {
    let decoder = ChartDecoder::new(basic_vocab());
    let matrix = SpanScoreMatrix::from_fn(6, 4, |span, label| {
        if label.is_empty_label() {
            0.0
        } else {
            // A fixed pseudo-random pattern with plenty of near ties.
            (((span.start * 7 + span.end * 13 + label.get() as usize * 31) % 11) as f32 - 5.0)
                * 0.25
        }
    })
    .unwrap();
    let sent: Sentence = (0..6).map(|i| Token::new(format!("w{i}"), "XX")).collect();

    let mut worker = decoder.new_worker();
    worker.reset_sentence(sent.tokens().iter().cloned());
    let first = worker.decode(&matrix).unwrap();
    let first_tree = worker.tree().unwrap();

    // Repeated decodes on the same worker and on a fresh one are
    // bit-identical, including the tie-broken tree.
    let second = worker.decode(&matrix).unwrap();
    assert_eq!(first.to_bits(), second.to_bits());
    assert_eq!(first_tree, worker.tree().unwrap());

    let mut other = decoder.new_worker();
    other.reset_sentence(sent.tokens().iter().cloned());
    let third = other.decode(&matrix).unwrap();
    assert_eq!(first.to_bits(), third.to_bits());
    assert_eq!(first_tree, other.tree().unwrap());
}

#[test]
fn test_gold_tree_recovery() {
    // When the gold constituents score high and everything else is
    // penalized, exact decoding must return the gold tree itself.
    let gold = ParseNode::internal(
        Some("S"),
        vec![
            ParseNode::internal(
                Some("NP"),
                vec![
                    ParseNode::leaf(0, "The", "DT"),
                    ParseNode::leaf(1, "dog", "NN"),
                ],
            )
            .unwrap(),
            ParseNode::internal(Some("VP"), vec![ParseNode::leaf(2, "ran", "VBD")]).unwrap(),
        ],
    )
    .unwrap();

    let decoder = ChartDecoder::new(basic_vocab());
    let vocab = decoder.vocabulary();
    let gold_labels: Vec<(Span, LabelId)> = gold
        .span_labels()
        .into_iter()
        .map(|(span, chain)| (span, vocab.index_of(&chain)))
        .collect();

    let matrix = SpanScoreMatrix::from_fn(3, 4, |span, label| {
        if label.is_empty_label() {
            0.0
        } else if gold_labels.contains(&(span, label)) {
            10.0
        } else {
            -2.0
        }
    })
    .unwrap();

    let mut worker = decoder.new_worker();
    worker.reset_sentence(basic_sentence());
    let score = worker.decode(&matrix).unwrap();
    assert_eq!(score, 30.0);
    assert_eq!(worker.tree().unwrap(), gold);
}

#[test]
fn test_empty_sentence_is_rejected() {
    let decoder = ChartDecoder::new(basic_vocab());
    let mut worker = decoder.new_worker();
    worker.reset_sentence([]);

    let matrix = SpanScoreMatrix::zeros(1, 4).unwrap();
    let result = worker.decode(&matrix);
    assert!(matches!(result, Err(CykadaError::InvalidArgument(_))));
}

#[test]
fn test_mismatched_shapes_are_rejected() {
    let decoder = ChartDecoder::new(basic_vocab());
    let mut worker = decoder.new_worker();
    worker.reset_sentence(basic_sentence());

    // Wrong token count.
    let matrix = SpanScoreMatrix::zeros(4, 4).unwrap();
    let result = worker.decode(&matrix);
    assert!(matches!(result, Err(CykadaError::DimensionMismatch(_))));

    // Wrong label count (the vocabulary has 4 labels).
    let matrix = SpanScoreMatrix::zeros(3, 3).unwrap();
    let result = worker.decode(&matrix);
    assert!(matches!(result, Err(CykadaError::DimensionMismatch(_))));
}

#[test]
fn test_accessors_require_a_decode() {
    let decoder = ChartDecoder::new(basic_vocab());
    let mut worker = decoder.new_worker();
    worker.reset_sentence(basic_sentence());

    assert!(matches!(
        worker.total_score(),
        Err(CykadaError::InvalidState(_))
    ));
    assert!(matches!(worker.tree(), Err(CykadaError::InvalidState(_))));

    let matrix = SpanScoreMatrix::zeros(3, 4).unwrap();
    worker.decode(&matrix).unwrap();
    assert_eq!(worker.total_score().unwrap(), 0.0);

    // Resetting the sentence invalidates the previous result.
    worker.reset_sentence(basic_sentence());
    assert!(matches!(worker.tree(), Err(CykadaError::InvalidState(_))));
}
