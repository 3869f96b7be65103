//! チャート構造の実装モジュール。
//!
//! このモジュールは、構成素構文解析におけるCYKアルゴリズムのための
//! チャート構造を提供します。チャートはスパンごとのセルから構成され、
//! 最高スコアの二分木を見つけるために使用されます。

use crate::label::LabelId;
use crate::span::Span;

const MIN_SCORE: f32 = f32::NEG_INFINITY;

/// 幅1のスパンを示す分割点の番兵値。
pub(crate) const INVALID_SPLIT: u32 = u32::MAX;

/// チャート内の1セル。
///
/// 各セルは1つのスパンに対応し、そのスパンを根とする部分木の最高スコア、
/// 最良ラベル、および（幅が2以上の場合）最良分割点を保持します。
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChartCell {
    /// このスパンを根とする部分木の最高スコア。
    pub score: f32,
    /// 最高スコアを達成するラベルインデックス。
    pub label: u32,
    /// 最高スコアを達成する分割点。幅1のスパンでは[`INVALID_SPLIT`]。
    pub split: u32,
}

impl Default for ChartCell {
    fn default() -> Self {
        Self {
            score: MIN_SCORE,
            label: 0,
            split: INVALID_SPLIT,
        }
    }
}

/// CYKデコード用のチャート構造体。
///
/// スパンの三角行列オフセットで添字付けされたセルの平坦な配列を保持します。
/// セル領域は1回のデコードにスコープされますが、確保済みのバッファ自体は
/// ワーカー内で文をまたいで再利用されます。内容はデコードごとに完全に
/// 初期化し直されるため、学習ステップ間でスコアが漏れることはありません。
#[derive(Default)]
pub(crate) struct Chart {
    cells: Vec<ChartCell>,
    num_tokens: usize,
}

impl Chart {
    /// チャートをリセットし、新しい文の処理を準備します。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 新しい文のトークン数
    pub fn reset(&mut self, num_tokens: usize) {
        self.num_tokens = num_tokens;
        self.cells.clear();
        self.cells.resize(Span::count(num_tokens), ChartCell::default());
    }

    /// 設定された文のトークン数を返します。
    #[inline(always)]
    pub const fn num_tokens(&self) -> usize {
        self.num_tokens
    }

    /// スパンに対応するセルを設定します。
    ///
    /// # 引数
    ///
    /// * `span` - 対象のスパン
    /// * `cell` - 設定するセル
    #[inline(always)]
    pub fn set(&mut self, span: Span, cell: ChartCell) {
        let offset = span.offset(self.num_tokens);
        self.cells[offset] = cell;
    }

    /// スパンの最高スコアを取得します。
    #[inline(always)]
    pub fn score(&self, span: Span) -> f32 {
        self.cells[span.offset(self.num_tokens)].score
    }

    /// スパンの最良ラベルを取得します。
    #[inline(always)]
    pub fn label(&self, span: Span) -> LabelId {
        LabelId(self.cells[span.offset(self.num_tokens)].label)
    }

    /// スパンの最良分割点を取得します。
    ///
    /// # パニック
    ///
    /// 幅1のスパンに対して呼び出した場合、デバッグビルドでパニックします。
    #[inline(always)]
    pub fn split(&self, span: Span) -> usize {
        let split = self.cells[span.offset(self.num_tokens)].split;
        debug_assert_ne!(split, INVALID_SPLIT);
        split as usize
    }

    /// 根スパン`[0, n)`の最高スコアを取得します。
    #[inline(always)]
    pub fn root_score(&self) -> f32 {
        self.score(Span {
            start: 0,
            end: self.num_tokens,
        })
    }
}
