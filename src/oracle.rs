//! マージン拡張デコードと構造化ヒンジ損失のためのモジュール。
//!
//! このモジュールは、学習モードで使用されるマージンオラクルを提供します。
//! 正解木が与えられたとき、各`(スパン, ラベル)`のスコアにミスマッチコスト
//! （ハミングコスト）を加えてデコードし、得られた拡張最適木と正解木自身の
//! スコアから構造化ヒンジ損失を計算します。
//!
//! コストは単位ハミングコストです。スパン`(i, j)`のラベル`l`が正解木の
//! そのスパンのラベル（正解木が構成素を持たないスパンでは空ラベル）と
//! 一致する場合は0、それ以外は1が加算されます。正解木自身の拡張コストは
//! 0であるため、拡張最適スコアは常に正解木の素のスコア以上であり、
//! 等号はデコード結果が正解木と完全に一致する場合に成立します。
//!
//! デコーダーとオラクルが報告するのは構造とインデックスのみです。
//! スコア行列は外部から供給されるため、スコアの微分可能性は呼び出し側の
//! 責任です。

use hashbrown::HashMap;

use crate::errors::{CykadaError, Result};
use crate::label::{LabelId, LabelVocabulary};
use crate::matrix::SpanScoreMatrix;
use crate::span::Span;
use crate::tree::ParseNode;

/// 正解木のスパンとラベルの集合
///
/// 正解木は、ラベル付きスパンの集合`{(span, label)}`として表現されます。
/// 登録されていないスパンのラベルは空ラベルです。構築時にスパンの境界と
/// ラベルの範囲が検証されるため、デコード中に不正な参照が起こることは
/// ありません。
#[derive(Clone, Debug)]
pub struct GoldTree {
    num_tokens: usize,
    num_labels: usize,
    labels: HashMap<Span, LabelId>,
}

impl GoldTree {
    /// ラベル付きスパンの集合から正解木を作成します。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 文のトークン数
    /// * `num_labels` - 空ラベルを含むラベル数
    /// * `pairs` - `(スパン, ラベル)`の組のイテレータ
    ///
    /// # エラー
    ///
    /// トークン数が0の場合、スパンが文の範囲を超える場合、ラベルが範囲外
    /// または空ラベルの場合、同じスパンが複数回現れる場合、
    /// [`CykadaError::MalformedGoldTree`]が返されます。
    pub fn from_pairs<I>(num_tokens: usize, num_labels: usize, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (Span, LabelId)>,
    {
        if num_tokens == 0 {
            return Err(CykadaError::malformed_gold_tree(
                "a gold tree requires at least one token",
            ));
        }
        let mut labels = HashMap::new();
        for (span, label) in pairs {
            if span.end > num_tokens {
                return Err(CykadaError::malformed_gold_tree(format!(
                    "gold span {span} exceeds the sentence length {num_tokens}"
                )));
            }
            if label.is_empty_label() {
                return Err(CykadaError::malformed_gold_tree(format!(
                    "gold span {span} carries the reserved empty label"
                )));
            }
            if label.get() as usize >= num_labels {
                return Err(CykadaError::malformed_gold_tree(format!(
                    "gold span {span} references label {} outside [0, {num_labels})",
                    label.get()
                )));
            }
            if labels.insert(span, label).is_some() {
                return Err(CykadaError::malformed_gold_tree(format!(
                    "gold span {span} is labeled twice"
                )));
            }
        }
        Ok(Self {
            num_tokens,
            num_labels,
            labels,
        })
    }

    /// 構文木から正解木を作成します。
    ///
    /// 木のラベル付きスパンを収集し、同一スパン上の単項連鎖を語彙の
    /// ラベル連鎖に畳み込んで登録します。
    ///
    /// # 引数
    ///
    /// * `node` - 根ノード
    /// * `vocab` - ラベル連鎖の索引に使用する語彙
    ///
    /// # エラー
    ///
    /// 根スパンが位置0から始まらない場合や、木に語彙に登録されていない
    /// ラベル連鎖が含まれる場合、[`CykadaError::MalformedGoldTree`]が
    /// 返されます。
    pub fn from_node(node: &ParseNode, vocab: &LabelVocabulary) -> Result<Self> {
        let root = node.span();
        if root.start != 0 {
            return Err(CykadaError::malformed_gold_tree(format!(
                "the root span {root} must start at position 0"
            )));
        }
        let pairs = node
            .span_labels()
            .into_iter()
            .map(|(span, chain)| {
                if !vocab.contains(&chain) {
                    return Err(CykadaError::malformed_gold_tree(format!(
                        "label chain {chain:?} at {span} is not in the vocabulary"
                    )));
                }
                Ok((span, vocab.index_of(&chain)))
            })
            .collect::<Result<Vec<_>>>()?;
        Self::from_pairs(root.end, vocab.len(), pairs)
    }

    /// スパンに対応する正解ラベルを返します。
    ///
    /// 正解木が構成素を持たないスパンに対しては[`LabelId::EMPTY`]を返します。
    #[inline]
    pub fn label_at(&self, span: Span) -> LabelId {
        self.labels.get(&span).copied().unwrap_or(LabelId::EMPTY)
    }

    /// 文のトークン数を返します。
    #[inline(always)]
    pub const fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// 空ラベルを含むラベル数を返します。
    #[inline(always)]
    pub const fn num_labels(&self) -> usize {
        self.num_labels
    }

    /// ラベル付きスパンの数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// ラベル付きスパンが存在しないかどうかを判定します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// 正解木自身の素のスコアを計算します。
    ///
    /// 正解木のラベル付きスパンに対して`S(i, j, l)`を合計します。
    /// 空ラベルのスパンのスコアは0であるため、合計には現れません。
    ///
    /// # 引数
    ///
    /// * `matrix` - スパンスコア行列
    ///
    /// # エラー
    ///
    /// 行列の形状が正解木と一致しない場合、
    /// [`CykadaError::DimensionMismatch`]が返されます。
    pub fn score(&self, matrix: &SpanScoreMatrix) -> Result<f32> {
        if matrix.num_tokens() != self.num_tokens || matrix.num_labels() != self.num_labels {
            return Err(CykadaError::dimension_mismatch(
                "matrix",
                format!(
                    "the matrix shape ({}, {}) does not match the gold tree ({}, {})",
                    matrix.num_tokens(),
                    matrix.num_labels(),
                    self.num_tokens,
                    self.num_labels
                ),
            ));
        }
        // Deterministic summation order, independent of the hash map.
        let mut pairs: Vec<_> = self.labels.iter().collect();
        pairs.sort();
        let mut total = 0.0;
        for (&span, &label) in pairs {
            total += matrix.score(span, label)?;
        }
        Ok(total)
    }
}

/// 学習モードのマージンオラクル。
///
/// 正解木を保持し、デコード時のミスマッチコストと、デコード後の
/// 構造化ヒンジ損失の計算を提供します。
///
/// # 例
///
/// ```ignore
/// let oracle = MarginOracle::new(gold);
/// let outcome = worker.decode_with_margin(&matrix, &oracle)?;
/// assert!(outcome.augmented_score >= outcome.gold_score);
/// ```
#[derive(Clone, Debug)]
pub struct MarginOracle {
    gold: GoldTree,
}

impl MarginOracle {
    /// 新しいオラクルを作成します。
    ///
    /// # 引数
    ///
    /// * `gold` - 正解木
    pub fn new(gold: GoldTree) -> Self {
        Self { gold }
    }

    /// 保持している正解木への参照を取得します。
    #[inline(always)]
    pub fn gold(&self) -> &GoldTree {
        &self.gold
    }

    /// `(スパン, ラベル)`のミスマッチコストを返します。
    ///
    /// ラベルが正解木のそのスパンのラベルと一致する場合は0、
    /// それ以外は1です。
    ///
    /// # 引数
    ///
    /// * `span` - 対象のスパン
    /// * `label` - 対象のラベルインデックス
    #[inline]
    pub fn cost(&self, span: Span, label: u32) -> f32 {
        if self.gold.label_at(span).get() == label {
            0.0
        } else {
            1.0
        }
    }

    /// 正解木自身の素のスコアを計算します。
    ///
    /// # 引数
    ///
    /// * `matrix` - スパンスコア行列
    pub fn gold_score(&self, matrix: &SpanScoreMatrix) -> Result<f32> {
        self.gold.score(matrix)
    }

    /// 正解木が行列の形状と整合しているか検証します。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 行列の文のトークン数
    /// * `num_labels` - 行列のラベル数
    pub(crate) fn check_compatibility(&self, num_tokens: usize, num_labels: usize) -> Result<()> {
        if self.gold.num_tokens() != num_tokens || self.gold.num_labels() != num_labels {
            return Err(CykadaError::malformed_gold_tree(format!(
                "the gold tree covers ({}, {}) but the matrix has ({}, {})",
                self.gold.num_tokens(),
                self.gold.num_labels(),
                num_tokens,
                num_labels
            )));
        }
        Ok(())
    }
}

/// マージン拡張デコードの結果。
///
/// 構造化ヒンジ損失と、その計算に使用された両スコアを保持します。
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarginOutcome {
    /// 構造化ヒンジ損失 `max(0, augmented_score - gold_score)`
    pub loss: f32,

    /// ミスマッチコストを加えた競合木の総スコア
    pub augmented_score: f32,

    /// 正解木自身の素の総スコア
    pub gold_score: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::LabelVocabulary;

    fn span(start: usize, end: usize) -> Span {
        Span { start, end }
    }

    #[test]
    fn test_from_pairs_validations() {
        // Out-of-range span.
        let result = GoldTree::from_pairs(3, 4, [(span(1, 4), LabelId(1))]);
        assert!(result.is_err());

        // Empty label.
        let result = GoldTree::from_pairs(3, 4, [(span(0, 2), LabelId::EMPTY)]);
        assert!(result.is_err());

        // Out-of-range label.
        let result = GoldTree::from_pairs(3, 4, [(span(0, 2), LabelId(4))]);
        assert!(result.is_err());

        // Duplicate span.
        let result = GoldTree::from_pairs(
            3,
            4,
            [(span(0, 2), LabelId(1)), (span(0, 2), LabelId(2))],
        );
        assert!(result.is_err());

        // Zero tokens.
        let result = GoldTree::from_pairs(0, 4, []);
        assert!(result.is_err());
    }

    #[test]
    fn test_label_at_defaults_to_empty() {
        let gold = GoldTree::from_pairs(3, 4, [(span(0, 2), LabelId(1))]).unwrap();
        assert_eq!(gold.label_at(span(0, 2)), LabelId(1));
        assert_eq!(gold.label_at(span(1, 3)), LabelId::EMPTY);
    }

    #[test]
    fn test_cost_is_unit_hamming() {
        let gold = GoldTree::from_pairs(3, 4, [(span(0, 2), LabelId(1))]).unwrap();
        let oracle = MarginOracle::new(gold);
        assert_eq!(oracle.cost(span(0, 2), 1), 0.0);
        assert_eq!(oracle.cost(span(0, 2), 2), 1.0);
        assert_eq!(oracle.cost(span(0, 2), 0), 1.0);
        // Spans the gold tree does not label match the empty label.
        assert_eq!(oracle.cost(span(1, 3), 0), 0.0);
        assert_eq!(oracle.cost(span(1, 3), 1), 1.0);
    }

    #[test]
    fn test_gold_score_sums_labeled_spans() {
        let mut matrix = crate::matrix::SpanScoreMatrix::zeros(3, 4).unwrap();
        matrix.set_score(span(0, 2), LabelId(1), 5.0).unwrap();
        matrix.set_score(span(0, 3), LabelId(3), 6.0).unwrap();

        let gold = GoldTree::from_pairs(
            3,
            4,
            [(span(0, 2), LabelId(1)), (span(0, 3), LabelId(3))],
        )
        .unwrap();
        assert_eq!(gold.score(&matrix).unwrap(), 11.0);
    }

    #[test]
    fn test_from_node_uses_vocabulary_chains() {
        let vocab = LabelVocabulary::from_chains([
            vec!["NP".to_string()],
            vec!["S".to_string(), "VP".to_string()],
        ])
        .unwrap();

        let tree = ParseNode::internal(
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

        let gold = GoldTree::from_node(&tree, &vocab).unwrap();
        assert_eq!(gold.num_tokens(), 2);
        assert_eq!(
            gold.label_at(span(0, 2)),
            vocab.index_of(&["S".to_string(), "VP".to_string()])
        );
    }

    #[test]
    fn test_from_node_rejects_unknown_chain() {
        let vocab = LabelVocabulary::from_chains([vec!["NP".to_string()]]).unwrap();
        let tree = ParseNode::internal(
            Some("S"),
            vec![
                ParseNode::leaf(0, "it", "PRP"),
                ParseNode::leaf(1, "runs", "VBZ"),
            ],
        )
        .unwrap();
        assert!(GoldTree::from_node(&tree, &vocab).is_err());
    }
}
