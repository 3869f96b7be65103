//! スパンスコア行列
//!
//! このモジュールは、ニューラルスコアラーが出力したスパンごとのラベルスコアを
//! 保持する密行列を提供します。`n`トークンの文に対して`n(n+1)/2`個のスパンが
//! 存在し、各スパンは`L`要素のスコアベクトルを持ちます。
//!
//! データは平坦な`Vec<f32>`として保持され、スパンの三角行列オフセットと
//! ラベルインデックスの演算で添字が決まります。行列はデコーダーにとって
//! 読み取り専用であり、所有権は常に呼び出し側にあります。

use crate::errors::{CykadaError, Result};
use crate::label::LabelId;
use crate::span::Span;

/// すべてのスパンとラベルに対するスコア表
///
/// 構築時に形状が検証されます。特に、予約された空ラベル（インデックス0）の
/// スコアはすべてのスパンで厳密に0でなければなりません。違反はDP処理が
/// 始まる前に[`CykadaError::DimensionMismatch`]として報告されます。
///
/// # 例
///
/// ```
/// use cykada::matrix::SpanScoreMatrix;
/// use cykada::label::LabelId;
/// use cykada::span::Span;
///
/// let mut matrix = SpanScoreMatrix::zeros(3, 4)?;
/// matrix.set_score(Span::new(0, 2)?, LabelId(1), 5.0)?;
/// assert_eq!(matrix.score(Span::new(0, 2)?, LabelId(1))?, 5.0);
/// assert_eq!(matrix.score(Span::new(0, 2)?, LabelId::EMPTY)?, 0.0);
/// # Ok::<(), cykada::errors::CykadaError>(())
/// ```
#[derive(Clone, Debug)]
pub struct SpanScoreMatrix {
    num_tokens: usize,
    num_labels: usize,
    scores: Vec<f32>,
}

impl SpanScoreMatrix {
    /// すべてのスコアが0の行列を作成します。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 文のトークン数
    /// * `num_labels` - 空ラベルを含むラベル数
    ///
    /// # エラー
    ///
    /// `num_tokens`または`num_labels`が0の場合、
    /// [`CykadaError::InvalidArgument`]が返されます。
    pub fn zeros(num_tokens: usize, num_labels: usize) -> Result<Self> {
        Self::check_shape_args(num_tokens, num_labels)?;
        Ok(Self {
            num_tokens,
            num_labels,
            scores: vec![0.0; Span::count(num_tokens) * num_labels],
        })
    }

    /// 平坦なスコア列から行列を作成します。
    ///
    /// スコアはスパンの三角行列オフセット順（開始位置ごとに幅の昇順）に、
    /// スパンごとに`num_labels`要素ずつ並んでいる必要があります。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 文のトークン数
    /// * `num_labels` - 空ラベルを含むラベル数
    /// * `scores` - 平坦化されたスコア列
    ///
    /// # エラー
    ///
    /// 列の長さが`n(n+1)/2 × L`に一致しない場合や、空ラベル列に非ゼロの
    /// スコアが含まれる場合、[`CykadaError::DimensionMismatch`]が返されます。
    pub fn from_flat(num_tokens: usize, num_labels: usize, scores: Vec<f32>) -> Result<Self> {
        Self::check_shape_args(num_tokens, num_labels)?;
        let expected = Span::count(num_tokens) * num_labels;
        if scores.len() != expected {
            return Err(CykadaError::dimension_mismatch(
                "scores",
                format!(
                    "expected {} scores for {} spans x {} labels, got {}",
                    expected,
                    Span::count(num_tokens),
                    num_labels,
                    scores.len()
                ),
            ));
        }
        let matrix = Self {
            num_tokens,
            num_labels,
            scores,
        };
        matrix.check_empty_label_column()?;
        Ok(matrix)
    }

    /// スパンとラベルごとにスコアを計算する関数から行列を作成します。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 文のトークン数
    /// * `num_labels` - 空ラベルを含むラベル数
    /// * `f` - 各`(スパン, ラベル)`のスコアを返す関数
    ///
    /// # エラー
    ///
    /// `f`が空ラベルに対して非ゼロのスコアを返した場合、
    /// [`CykadaError::DimensionMismatch`]が返されます。
    pub fn from_fn<F>(num_tokens: usize, num_labels: usize, mut f: F) -> Result<Self>
    where
        F: FnMut(Span, LabelId) -> f32,
    {
        Self::check_shape_args(num_tokens, num_labels)?;
        let mut scores = Vec::with_capacity(Span::count(num_tokens) * num_labels);
        for i in 0..num_tokens {
            for j in (i + 1)..=num_tokens {
                let span = Span { start: i, end: j };
                for l in 0..num_labels {
                    scores.push(f(span, LabelId(l as u32)));
                }
            }
        }
        let matrix = Self {
            num_tokens,
            num_labels,
            scores,
        };
        matrix.check_empty_label_column()?;
        Ok(matrix)
    }

    /// 指定したスパンとラベルのスコアを取得します。
    ///
    /// # 引数
    ///
    /// * `span` - 対象のスパン
    /// * `label` - 対象のラベルインデックス
    ///
    /// # エラー
    ///
    /// スパンが文の範囲を超える場合は[`CykadaError::InvalidSpan`]、
    /// ラベルが範囲外の場合は[`CykadaError::InvalidArgument`]が返されます。
    pub fn score(&self, span: Span, label: LabelId) -> Result<f32> {
        span.check_bounds(self.num_tokens)?;
        self.check_label(label)?;
        let offset = span.offset(self.num_tokens) * self.num_labels;
        Ok(self.scores[offset + label.get() as usize])
    }

    /// 指定したスパンとラベルのスコアを設定します。
    ///
    /// # 引数
    ///
    /// * `span` - 対象のスパン
    /// * `label` - 対象のラベルインデックス
    /// * `value` - 設定するスコア
    ///
    /// # エラー
    ///
    /// スパンまたはラベルが範囲外の場合はアクセサと同様のエラー、
    /// 空ラベルに非ゼロの値を設定しようとした場合は
    /// [`CykadaError::DimensionMismatch`]が返されます。
    pub fn set_score(&mut self, span: Span, label: LabelId, value: f32) -> Result<()> {
        span.check_bounds(self.num_tokens)?;
        self.check_label(label)?;
        if label.is_empty_label() && value != 0.0 {
            return Err(CykadaError::dimension_mismatch(
                "scores",
                "the empty label (index 0) must score exactly 0",
            ));
        }
        let offset = span.offset(self.num_tokens) * self.num_labels;
        self.scores[offset + label.get() as usize] = value;
        Ok(())
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

    /// スパンのスコアベクトルへのスライスを返します。
    ///
    /// DPの内側ループで使用される検証なしのアクセサです。
    /// 呼び出し側がスパンの範囲を保証する必要があります。
    #[inline(always)]
    pub(crate) fn row(&self, span: Span) -> &[f32] {
        let offset = span.offset(self.num_tokens) * self.num_labels;
        &self.scores[offset..offset + self.num_labels]
    }

    fn check_shape_args(num_tokens: usize, num_labels: usize) -> Result<()> {
        if num_tokens == 0 {
            return Err(CykadaError::invalid_argument(
                "num_tokens",
                "the decoder requires at least one token",
            ));
        }
        if num_labels == 0 {
            return Err(CykadaError::invalid_argument(
                "num_labels",
                "at least the empty label must exist",
            ));
        }
        Ok(())
    }

    fn check_label(&self, label: LabelId) -> Result<()> {
        if label.get() as usize >= self.num_labels {
            return Err(CykadaError::invalid_argument(
                "label",
                format!(
                    "label index {} is out of range for {} labels",
                    label.get(),
                    self.num_labels
                ),
            ));
        }
        Ok(())
    }

    fn check_empty_label_column(&self) -> Result<()> {
        for (idx, chunk) in self.scores.chunks_exact(self.num_labels).enumerate() {
            if chunk[0] != 0.0 {
                return Err(CykadaError::dimension_mismatch(
                    "scores",
                    format!(
                        "the empty label (index 0) must score exactly 0, \
                         but span offset {} has {}",
                        idx, chunk[0]
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zeros_shape() {
        let matrix = SpanScoreMatrix::zeros(3, 4).unwrap();
        assert_eq!(matrix.num_tokens(), 3);
        assert_eq!(matrix.num_labels(), 4);
        assert_eq!(matrix.score(Span::new(1, 3).unwrap(), LabelId(2)).unwrap(), 0.0);
    }

    #[test]
    fn test_rejects_zero_tokens() {
        assert!(SpanScoreMatrix::zeros(0, 4).is_err());
    }

    #[test]
    fn test_from_flat_rejects_wrong_length() {
        // 3 tokens x 4 labels needs 6 * 4 = 24 scores.
        let result = SpanScoreMatrix::from_flat(3, 4, vec![0.0; 23]);
        assert!(matches!(
            result,
            Err(crate::errors::CykadaError::DimensionMismatch(_))
        ));
    }

    #[test]
    fn test_rejects_nonzero_empty_label() {
        let mut scores = vec![0.0; 6 * 4];
        scores[4] = 1.0; // empty label of the second span
        let result = SpanScoreMatrix::from_flat(3, 4, scores);
        assert!(matches!(
            result,
            Err(crate::errors::CykadaError::DimensionMismatch(_))
        ));

        let mut matrix = SpanScoreMatrix::zeros(3, 4).unwrap();
        let result = matrix.set_score(Span::new(0, 1).unwrap(), LabelId::EMPTY, 1.0);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_fn_layout_matches_accessor() {
        let matrix = SpanScoreMatrix::from_fn(3, 3, |span, label| {
            if label.is_empty_label() {
                0.0
            } else {
                (span.start * 100 + span.end * 10 + label.get() as usize) as f32
            }
        })
        .unwrap();
        assert_eq!(
            matrix.score(Span::new(1, 3).unwrap(), LabelId(2)).unwrap(),
            132.0
        );
    }

    #[test]
    fn test_out_of_range_probes_fail() {
        let matrix = SpanScoreMatrix::zeros(3, 4).unwrap();
        assert!(matrix.score(Span::new(0, 4).unwrap(), LabelId(0)).is_err());
        assert!(matrix.score(Span::new(0, 1).unwrap(), LabelId(4)).is_err());
    }
}
