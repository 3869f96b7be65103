//! トークン列上のスパン
//!
//! このモジュールは、文中の連続したトークン範囲を半開区間 `[start, end)` として
//! 表現するための構造体を提供します。スコア行列とチャートは、同じ三角行列の
//! オフセット計算を通じてスパンを添字に変換します。

use crate::errors::{CykadaError, Result};

/// トークン列上の半開区間 `[start, end)`
///
/// `start < end` が常に保証されます。上限（文のトークン数）に対する検証は、
/// スパンを消費する側（スコア行列・チャート・正解木）が行います。
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, PartialOrd, Ord)]
pub struct Span {
    /// 開始位置（この位置を含む）
    pub start: usize,

    /// 終了位置（この位置を含まない）
    pub end: usize,
}

impl Span {
    /// 新しいスパンを作成します。
    ///
    /// # 引数
    ///
    /// * `start` - 開始位置
    /// * `end` - 終了位置
    ///
    /// # エラー
    ///
    /// `end <= start` の場合、[`CykadaError::InvalidSpan`]が返されます。
    /// 境界は決して切り詰められません。
    pub fn new(start: usize, end: usize) -> Result<Self> {
        if end <= start {
            return Err(CykadaError::invalid_span(
                start,
                end,
                "spans must satisfy start < end",
            ));
        }
        Ok(Self { start, end })
    }

    /// スパンの幅（トークン数）を返します。
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// スパンの幅が1かどうかを判定します。
    #[inline(always)]
    pub const fn is_unit(&self) -> bool {
        self.end - self.start == 1
    }

    /// スパンが`num_tokens`トークンの文に収まっているか検証します。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 文のトークン数
    ///
    /// # エラー
    ///
    /// `end > num_tokens` の場合、[`CykadaError::InvalidSpan`]が返されます。
    pub fn check_bounds(&self, num_tokens: usize) -> Result<()> {
        if self.end > num_tokens {
            return Err(CykadaError::invalid_span(
                self.start,
                self.end,
                format!("span exceeds the sentence length {num_tokens}"),
            ));
        }
        Ok(())
    }

    /// `num_tokens`トークンの文に存在するスパンの総数を返します。
    ///
    /// スパンは `0 <= i < j <= n` を満たす`(i, j)`の組であり、
    /// その総数は `n(n+1)/2` です。
    #[inline(always)]
    pub const fn count(num_tokens: usize) -> usize {
        num_tokens * (num_tokens + 1) / 2
    }

    /// 三角行列内でのこのスパンのオフセットを返します。
    ///
    /// 開始位置`i`ごとにスパンを昇順に並べた平坦な添字であり、
    /// `(0,1), (0,2), ..., (0,n), (1,2), ..., (n-1,n)` の順になります。
    ///
    /// # 引数
    ///
    /// * `num_tokens` - 文のトークン数
    #[inline(always)]
    pub(crate) const fn offset(&self, num_tokens: usize) -> usize {
        let i = self.start;
        // Row i holds (n - i) spans; rows 0..i hold i*(2n - i + 1)/2 in total.
        i * (2 * num_tokens - i + 1) / 2 + (self.end - self.start - 1)
    }
}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_empty() {
        assert!(Span::new(2, 2).is_err());
        assert!(Span::new(3, 1).is_err());
    }

    #[test]
    fn test_offsets_are_dense_and_unique() {
        let n = 5;
        let mut seen = vec![false; Span::count(n)];
        for i in 0..n {
            for j in (i + 1)..=n {
                let off = Span::new(i, j).unwrap().offset(n);
                assert!(!seen[off], "offset {off} assigned twice");
                seen[off] = true;
            }
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_check_bounds() {
        let span = Span::new(1, 4).unwrap();
        assert!(span.check_bounds(4).is_ok());
        assert!(span.check_bounds(3).is_err());
    }
}
