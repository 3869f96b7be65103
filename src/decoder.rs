//! CYKアルゴリズムに基づくチャートデコーダー。
//!
//! このモジュールは、スパンスコア行列から最高スコアの二分化された
//! ラベル付き構成素構文木を求めるメインデコーダーを提供します。
//! 幅の昇順にすべてのスパンを処理する厳密な動的計画法を使用します。
//!
//! # 主要な構造体
//!
//! - [`ChartDecoder`]: デコードを実行するメインデコーダー構造体
//! - [`Worker`]: デコーダーのワーカー。実際のデコード処理を行う
//!
//! # 例
//!
//! ```
//! use cykada::decoder::ChartDecoder;
//! use cykada::label::LabelVocabulary;
//! use cykada::matrix::SpanScoreMatrix;
//! use cykada::sentence::Token;
//!
//! let vocab = LabelVocabulary::from_chains([vec!["S".to_string()]])?;
//! let decoder = ChartDecoder::new(vocab);
//! let mut worker = decoder.new_worker();
//!
//! let matrix = SpanScoreMatrix::zeros(2, 2)?;
//! worker.reset_sentence([Token::new("it", "PRP"), Token::new("runs", "VBZ")]);
//! let score = worker.decode(&matrix)?;
//! assert_eq!(score, 0.0);
//! # Ok::<(), cykada::errors::CykadaError>(())
//! ```

pub(crate) mod chart;
pub mod worker;

use std::sync::Arc;

use crate::decoder::chart::{Chart, ChartCell, INVALID_SPLIT};
use crate::decoder::worker::Worker;
use crate::errors::{CykadaError, Result};
use crate::label::LabelVocabulary;
use crate::matrix::SpanScoreMatrix;
use crate::oracle::MarginOracle;
use crate::span::Span;

/// 構成素構文解析を行うチャートデコーダー。
///
/// `ChartDecoder`は、CYKアルゴリズムを使用してスパンスコア行列から
/// 最高スコアの構文木を求めます。ラベル語彙を保持し、複数の[`Worker`]
/// インスタンスを生成して並列処理を行うことができます。
///
/// デコードは`(n, S, L)`の純粋関数であり、呼び出し間で共有される可変状態は
/// ありません。異なる文（または異なるスコアの同じ文）のデコードは互いに
/// 干渉せず、完全に並列実行できます。
#[derive(Clone)]
pub struct ChartDecoder {
    vocab: Arc<LabelVocabulary>,
}

impl ChartDecoder {
    /// 新しいデコーダーを作成します。
    ///
    /// 語彙はデコーダーに所有権が移動します。複数のデコーダー間で語彙を
    /// 共有する必要がある場合は、[`ChartDecoder::from_shared_vocabulary`]を
    /// 使用してください。
    ///
    /// # 引数
    ///
    /// * `vocab` - デコードに使用するラベル語彙
    pub fn new(vocab: LabelVocabulary) -> Self {
        Self {
            vocab: Arc::new(vocab),
        }
    }

    /// 共有された語彙から新しいデコーダーを作成します。
    ///
    /// これは、複数のデコーダーインスタンスが語彙データを複製することなく
    /// 同じ語彙を共有する必要があるマルチスレッドシナリオで便利です。
    ///
    /// # 引数
    ///
    /// * `vocab` - 共有される語彙への`Arc`参照
    pub fn from_shared_vocabulary(vocab: Arc<LabelVocabulary>) -> Self {
        Self { vocab }
    }

    /// ラベル語彙への参照を取得します。
    #[inline(always)]
    pub fn vocabulary(&self) -> &LabelVocabulary {
        &self.vocab
    }

    /// 新しいワーカーを作成します。
    ///
    /// ワーカーは実際のデコード処理を実行するために使用されます。
    /// 各ワーカーは独立したチャート構造を保持するため、複数のワーカーを
    /// 並列に使用して同時に複数の文をデコードできます。
    pub fn new_worker(&self) -> Worker {
        Worker::new(self.clone())
    }

    /// チャートを構築します。
    ///
    /// 幅の昇順にすべてのスパンを処理する厳密なCYK動的計画法を実行します。
    /// 幅`w`のスパンのスコアは幅`w`未満のスパンのみに依存するため、
    /// 処理順序はこの依存関係を満たします。
    ///
    /// `oracle`が指定された場合、各`(スパン, ラベル)`のスコアに
    /// ミスマッチコストを加えたうえで最適化します（マージン拡張モード）。
    ///
    /// # 引数
    ///
    /// * `matrix` - スパンスコア行列
    /// * `oracle` - マージン拡張に使用するオラクル（省略可能）
    /// * `chart` - 構築するチャート構造
    ///
    /// # エラー
    ///
    /// 行列のラベル数が語彙のラベル数と一致しない場合、
    /// [`CykadaError::DimensionMismatch`]が返されます。
    /// オラクルの正解木が行列の形状と整合しない場合、
    /// [`CykadaError::MalformedGoldTree`]が返されます。
    pub(crate) fn build_chart(
        &self,
        matrix: &SpanScoreMatrix,
        oracle: Option<&MarginOracle>,
        chart: &mut Chart,
    ) -> Result<()> {
        let num_tokens = matrix.num_tokens();
        let num_labels = matrix.num_labels();

        if num_labels != self.vocab.len() {
            return Err(CykadaError::dimension_mismatch(
                "matrix",
                format!(
                    "the matrix has {} labels but the vocabulary has {}",
                    num_labels,
                    self.vocab.len()
                ),
            ));
        }
        if let Some(oracle) = oracle {
            oracle.check_compatibility(num_tokens, num_labels)?;
        }

        chart.reset(num_tokens);

        // Width 1: per-span label argmax seeds the base case.
        for start in 0..num_tokens {
            let span = Span {
                start,
                end: start + 1,
            };
            let (label, score) = best_label(matrix.row(span), span, oracle);
            chart.set(
                span,
                ChartCell {
                    score,
                    label,
                    split: INVALID_SPLIT,
                },
            );
        }

        // Width w > 1: the label term and the split term of
        // S(i,j,l) + best(i,k) + best(k,j) are independent, so each is
        // maximized once per span instead of once per (split, label) pair.
        for width in 2..=num_tokens {
            for start in 0..=(num_tokens - width) {
                let end = start + width;
                let span = Span { start, end };

                let (label, label_score) = best_label(matrix.row(span), span, oracle);

                let mut best_split = start + 1;
                let mut children_score = chart.score(Span {
                    start,
                    end: start + 1,
                }) + chart.score(Span {
                    start: start + 1,
                    end,
                });
                for split in (start + 2)..end {
                    let score = chart.score(Span { start, end: split })
                        + chart.score(Span { start: split, end });
                    // Using > (not >=) keeps the smallest split point on ties,
                    // which makes the output reproducible across runs.
                    if score > children_score {
                        children_score = score;
                        best_split = split;
                    }
                }

                chart.set(
                    span,
                    ChartCell {
                        score: label_score + children_score,
                        label,
                        split: best_split as u32,
                    },
                );
            }
        }

        Ok(())
    }
}

/// スパンのスコアベクトルに対するラベルのargmaxを計算します。
///
/// オラクルが指定された場合、各ラベルのスコアにミスマッチコストを加えます。
/// 同点の場合は最小のラベルインデックスが選ばれます。
#[inline]
fn best_label(row: &[f32], span: Span, oracle: Option<&MarginOracle>) -> (u32, f32) {
    let cost = |label: u32| -> f32 {
        oracle.map_or(0.0, |oracle| oracle.cost(span, label))
    };

    // The empty label scores exactly 0 by contract, plus its margin cost.
    let mut best = 0u32;
    let mut best_score = row[0] + cost(0);
    for (l, &raw) in row.iter().enumerate().skip(1) {
        let score = raw + cost(l as u32);
        // Using > (not >=) keeps the smallest label index on ties.
        if score > best_score {
            best_score = score;
            best = l as u32;
        }
    }
    (best, best_score)
}
