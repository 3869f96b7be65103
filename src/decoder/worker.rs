//! デコード処理のためのルーチンを提供するモジュール。
//!
//! このモジュールは、構成素構文解析のための主要なワーカー構造体を提供します。
//! ワーカーは内部データ構造を保持し、再利用することで不要なメモリアロケーションを
//! 避けます。

use crate::decoder::chart::Chart;
use crate::decoder::ChartDecoder;
use crate::errors::{CykadaError, Result};
use crate::matrix::SpanScoreMatrix;
use crate::oracle::{MarginOracle, MarginOutcome};
use crate::sentence::{Sentence, Token};
use crate::tree::{self, ParseNode};

/// デコード処理のためのルーチンを提供する構造体。
///
/// デコードに使用される内部データ構造を保持し、それらを再利用することで
/// 不要なメモリ再割り当てを回避します。チャートの内容はデコードごとに
/// 完全に初期化し直されるため、呼び出し間で状態が漏れることはありません。
///
/// # 例
///
/// ```ignore
/// let mut worker = decoder.new_worker();
/// worker.reset_sentence([Token::new("The", "DT"), Token::new("dog", "NN")]);
/// let score = worker.decode(&matrix)?;
/// let tree = worker.tree()?;
/// ```
pub struct Worker {
    pub(crate) decoder: ChartDecoder,
    pub(crate) sent: Sentence,
    pub(crate) chart: Chart,
    decoded: bool,
}

impl Worker {
    /// 新しいインスタンスを作成します。
    ///
    /// # 引数
    ///
    /// * `decoder` - 使用するデコーダー
    pub(crate) fn new(decoder: ChartDecoder) -> Self {
        Self {
            decoder,
            sent: Sentence::new(),
            chart: Chart::default(),
            decoded: false,
        }
    }

    /// デコードする入力文をリセットします。
    ///
    /// 新しいトークン列を設定し、以前のデコード結果をクリアします。
    ///
    /// # 引数
    ///
    /// * `tokens` - 入力文のトークンのイテレータ
    pub fn reset_sentence<I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = Token>,
    {
        self.sent.set_tokens(tokens);
        self.decoded = false;
    }

    /// 文のトークン数を返します。
    #[inline(always)]
    pub fn num_tokens(&self) -> usize {
        self.sent.len()
    }

    /// 設定された入力文をデコードします。
    ///
    /// スコア行列に対して最高スコアの二分木を求め、その総スコアを返します。
    /// 結果の木は[`Self::tree()`]で取得できます。
    ///
    /// # 引数
    ///
    /// * `matrix` - ニューラルスコアラーが出力したスパンスコア行列
    ///
    /// # 戻り値
    ///
    /// 最適な木の総スコア
    ///
    /// # エラー
    ///
    /// 文が空の場合は[`CykadaError::InvalidArgument`]、行列の形状が文または
    /// 語彙と一致しない場合は[`CykadaError::DimensionMismatch`]が返されます。
    pub fn decode(&mut self, matrix: &SpanScoreMatrix) -> Result<f32> {
        self.check_matrix(matrix)?;
        self.decoder.build_chart(matrix, None, &mut self.chart)?;
        self.decoded = true;
        Ok(self.chart.root_score())
    }

    /// マージン拡張モードで入力文をデコードします。
    ///
    /// 各`(スパン, ラベル)`のスコアにオラクルのミスマッチコストを加えて
    /// デコードし、構造化ヒンジ損失を計算します。拡張デコードで選ばれた
    /// 競合木は[`Self::tree()`]で取得でき、呼び出し側はどのスパンを
    /// 逆伝播すべきか特定できます。
    ///
    /// # 引数
    ///
    /// * `matrix` - スパンスコア行列
    /// * `oracle` - 正解木を保持するマージンオラクル
    ///
    /// # 戻り値
    ///
    /// 損失と両スコアを含む[`MarginOutcome`]
    ///
    /// # エラー
    ///
    /// [`Self::decode()`]と同様のエラーに加え、正解木が文や行列と
    /// 整合しない場合は[`CykadaError::MalformedGoldTree`]が返されます。
    pub fn decode_with_margin(
        &mut self,
        matrix: &SpanScoreMatrix,
        oracle: &MarginOracle,
    ) -> Result<MarginOutcome> {
        self.check_matrix(matrix)?;
        self.decoder
            .build_chart(matrix, Some(oracle), &mut self.chart)?;
        self.decoded = true;

        let augmented_score = self.chart.root_score();
        let gold_score = oracle.gold_score(matrix)?;
        Ok(MarginOutcome {
            loss: (augmented_score - gold_score).max(0.0),
            augmented_score,
            gold_score,
        })
    }

    /// 最後のデコードの総スコアを取得します。
    ///
    /// # エラー
    ///
    /// まだデコードが実行されていない場合、
    /// [`CykadaError::InvalidState`]が返されます。
    pub fn total_score(&self) -> Result<f32> {
        self.check_decoded()?;
        Ok(self.chart.root_score())
    }

    /// 最後のデコード結果から構文木を実体化します。
    ///
    /// バックポインタを根スパンから下向きに走査し、葉ノードと内部ノードの
    /// 明示的な木を構築します。単項連鎖のラベルは、連鎖の要素ごとに
    /// 1つの内部ノードへ展開されます。
    ///
    /// 返された木の所有権は呼び出し側に移り、ワーカーは木への参照を
    /// 一切保持しません。
    ///
    /// # エラー
    ///
    /// まだデコードが実行されていない場合、
    /// [`CykadaError::InvalidState`]が返されます。
    pub fn tree(&self) -> Result<ParseNode> {
        self.check_decoded()?;
        Ok(tree::reconstruct(
            &self.chart,
            self.decoder.vocabulary(),
            &self.sent,
        ))
    }

    fn check_matrix(&self, matrix: &SpanScoreMatrix) -> Result<()> {
        if self.sent.is_empty() {
            return Err(CykadaError::invalid_argument(
                "sentence",
                "the decoder requires at least one token",
            ));
        }
        if matrix.num_tokens() != self.sent.len() {
            return Err(CykadaError::dimension_mismatch(
                "matrix",
                format!(
                    "the matrix covers {} tokens but the sentence has {}",
                    matrix.num_tokens(),
                    self.sent.len()
                ),
            ));
        }
        Ok(())
    }

    fn check_decoded(&self) -> Result<()> {
        if !self.decoded {
            return Err(CykadaError::invalid_state(
                "no decode result is available",
                "call decode() or decode_with_margin() first",
            ));
        }
        Ok(())
    }
}
