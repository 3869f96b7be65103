//! エラー型の定義
//!
//! このモジュールは、Cykadaライブラリで使用されるすべてのエラー型を定義します。

use std::error::Error;
use std::fmt::{self, Debug};

/// Cykada専用のResult型
///
/// エラー型としてデフォルトで[`CykadaError`]を使用します。
pub type Result<T, E = CykadaError> = std::result::Result<T, E>;

/// Cykadaのエラー型
///
/// このライブラリで発生する可能性のあるすべてのエラーを表現します。
/// 各バリアントは特定のエラー条件に対応しています。
#[derive(Debug, thiserror::Error)]
pub enum CykadaError {
    /// 無効な引数エラー
    ///
    /// [`InvalidArgumentError`]のエラーバリアント。
    #[error(transparent)]
    InvalidArgument(InvalidArgumentError),

    /// 無効なスパンエラー
    ///
    /// [`InvalidSpanError`]のエラーバリアント。
    #[error(transparent)]
    InvalidSpan(InvalidSpanError),

    /// スコア行列の形状不一致エラー
    ///
    /// [`DimensionMismatchError`]のエラーバリアント。
    #[error(transparent)]
    DimensionMismatch(DimensionMismatchError),

    /// 不正な正解木エラー
    ///
    /// [`MalformedGoldTreeError`]のエラーバリアント。
    #[error(transparent)]
    MalformedGoldTree(MalformedGoldTreeError),

    /// 無効な状態エラー
    ///
    /// [`InvalidStateError`]のエラーバリアント。
    #[error(transparent)]
    InvalidState(InvalidStateError),
}

impl CykadaError {
    /// 無効な引数エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 引数の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidArgument(InvalidArgumentError {
            arg,
            msg: msg.into(),
        })
    }

    /// 無効なスパンエラーを生成します
    ///
    /// # 引数
    ///
    /// * `start` - スパンの開始位置
    /// * `end` - スパンの終了位置
    /// * `msg` - エラーメッセージ
    pub(crate) fn invalid_span<S>(start: usize, end: usize, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::InvalidSpan(InvalidSpanError {
            start,
            end,
            msg: msg.into(),
        })
    }

    /// スコア行列の形状不一致エラーを生成します
    ///
    /// # 引数
    ///
    /// * `arg` - 対象の名前
    /// * `msg` - エラーメッセージ
    pub(crate) fn dimension_mismatch<S>(arg: &'static str, msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::DimensionMismatch(DimensionMismatchError {
            arg,
            msg: msg.into(),
        })
    }

    /// 不正な正解木エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    pub(crate) fn malformed_gold_tree<S>(msg: S) -> Self
    where
        S: Into<String>,
    {
        Self::MalformedGoldTree(MalformedGoldTreeError { msg: msg.into() })
    }

    /// 無効な状態エラーを生成します
    ///
    /// # 引数
    ///
    /// * `msg` - エラーメッセージ
    /// * `cause` - エラーの原因
    pub(crate) fn invalid_state<S, M>(msg: S, cause: M) -> Self
    where
        S: Into<String>,
        M: Into<String>,
    {
        Self::InvalidState(InvalidStateError {
            msg: msg.into(),
            cause: cause.into(),
        })
    }
}

/// 引数が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidArgumentError {
    /// 引数の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
    }
}

impl Error for InvalidArgumentError {}

/// スパンの境界が無効な場合に使用されるエラー
///
/// `end <= start`や、`end`が文のトークン数を超える場合に発生します。
/// 境界は決して暗黙に切り詰められません。
#[derive(Debug)]
pub struct InvalidSpanError {
    /// スパンの開始位置
    pub(crate) start: usize,

    /// スパンの終了位置
    pub(crate) end: usize,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for InvalidSpanError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "InvalidSpanError: [{}, {}): {}",
            self.start, self.end, self.msg
        )
    }
}

impl Error for InvalidSpanError {}

/// スコア行列の形状が期待と一致しない場合に使用されるエラー
///
/// スパンの欠落、ラベル数の不一致、空ラベル列の非ゼロスコアなど、
/// DP処理を開始する前の検証で検出されます。
#[derive(Debug)]
pub struct DimensionMismatchError {
    /// 対象の名前
    pub(crate) arg: &'static str,

    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for DimensionMismatchError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "DimensionMismatchError: {}: {}", self.arg, self.msg)
    }
}

impl Error for DimensionMismatchError {}

/// 正解木が不正な場合に使用されるエラー
///
/// スパン境界がトークン境界に整列していない場合や、
/// 語彙の範囲外のラベルを参照している場合に発生します。
#[derive(Debug)]
pub struct MalformedGoldTreeError {
    /// エラーメッセージ
    pub(crate) msg: String,
}

impl fmt::Display for MalformedGoldTreeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "MalformedGoldTreeError: {}", self.msg)
    }
}

impl Error for MalformedGoldTreeError {}

/// 状態が無効な場合に使用されるエラー
#[derive(Debug)]
pub struct InvalidStateError {
    /// エラーメッセージ
    pub(crate) msg: String,

    /// エラーの根本原因
    pub(crate) cause: String,
}

impl fmt::Display for InvalidStateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "InvalidStateError: {}: {}", self.msg, self.cause)
    }
}

impl Error for InvalidStateError {}
