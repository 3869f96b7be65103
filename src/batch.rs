//! 文のバッチを並列にデコードするモジュール。
//!
//! デコードは文ごとに独立した純粋関数であるため、バッチ内の文は
//! スレッドプール上で自由に並列処理できます。各タスクは自分専用の
//! ワーカーを使用し、結果は入力と同じ順序で返されます。

use rayon::prelude::*;

use crate::decoder::ChartDecoder;
use crate::errors::Result;
use crate::matrix::SpanScoreMatrix;
use crate::oracle::{MarginOracle, MarginOutcome};
use crate::sentence::Sentence;
use crate::tree::ParseNode;

/// 1文のデコード結果。
#[derive(Clone, Debug, PartialEq)]
pub struct Parse {
    /// 最適な木の総スコア
    pub score: f32,

    /// 最適な構文木
    pub tree: ParseNode,
}

/// 1文のマージン拡張デコード結果。
#[derive(Clone, Debug, PartialEq)]
pub struct MarginParse {
    /// 損失と両スコア
    pub outcome: MarginOutcome,

    /// 拡張デコードで選ばれた競合木
    pub tree: ParseNode,
}

/// 文のバッチを並列にデコードします。
///
/// 各文は独立したワーカーでデコードされるため、失敗は文ごとに隔離され、
/// バッチ内の他の文には影響しません。
///
/// # 引数
///
/// * `decoder` - 使用するデコーダー
/// * `inputs` - `(文, スコア行列)`の組のスライス
///
/// # 戻り値
///
/// 入力と同じ順序のデコード結果のベクトル
pub fn decode_batch(
    decoder: &ChartDecoder,
    inputs: &[(Sentence, SpanScoreMatrix)],
) -> Vec<Result<Parse>> {
    inputs
        .par_iter()
        .map(|(sent, matrix)| {
            let mut worker = decoder.new_worker();
            worker.reset_sentence(sent.tokens().iter().cloned());
            let score = worker.decode(matrix)?;
            let tree = worker.tree()?;
            Ok(Parse { score, tree })
        })
        .collect()
}

/// 文のバッチをマージン拡張モードで並列にデコードします。
///
/// 学習時のミニバッチ処理を想定しており、各文の構造化ヒンジ損失と
/// 競合木を返します。
///
/// # 引数
///
/// * `decoder` - 使用するデコーダー
/// * `inputs` - `(文, スコア行列, オラクル)`の組のスライス
///
/// # 戻り値
///
/// 入力と同じ順序のマージンデコード結果のベクトル
pub fn decode_batch_with_margin(
    decoder: &ChartDecoder,
    inputs: &[(Sentence, SpanScoreMatrix, MarginOracle)],
) -> Vec<Result<MarginParse>> {
    inputs
        .par_iter()
        .map(|(sent, matrix, oracle)| {
            let mut worker = decoder.new_worker();
            worker.reset_sentence(sent.tokens().iter().cloned());
            let outcome = worker.decode_with_margin(matrix, oracle)?;
            let tree = worker.tree()?;
            Ok(MarginParse { outcome, tree })
        })
        .collect()
}
