//! # Cykada
//!
//! Cykadaは、CYKアルゴリズムに基づくニューラル構成素構文解析のための
//! チャートデコーダーの実装です。
//!
//! ## 概要
//!
//! このライブラリは、外部のニューラルスコアラーが出力したスパンスコア行列から
//! 最高スコアの二分化されたラベル付き構成素構文木を求める厳密なデコーダーを
//! 提供します。スコアの計算方法には一切関与せず、構造の探索のみを担当します。
//!
//! ## 主な機能
//!
//! - **厳密なCYKデコード**: 幅の昇順の動的計画法による大域最適解の探索
//! - **決定的なタイブレーク**: 同点時は最小の分割点、次に最小のラベルを選択
//! - **マージン拡張デコード**: 単位ハミングコストによる構造化ヒンジ損失の計算
//! - **単項連鎖の展開**: 潰された複合ラベルを入れ子の内部ノードへ再展開
//! - **並列バッチ処理**: 文ごとに独立したワーカーによるミニバッチデコード
//!
//! ## 使用例
//!
//! ```
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use cykada::{ChartDecoder, LabelVocabulary, SpanScoreMatrix, Token};
//! use cykada::span::Span;
//!
//! let vocab = LabelVocabulary::from_chains([
//!     vec!["NP".to_string()],
//!     vec!["VP".to_string()],
//!     vec!["S".to_string()],
//! ])?;
//! let decoder = ChartDecoder::new(vocab);
//! let mut worker = decoder.new_worker();
//!
//! let mut matrix = SpanScoreMatrix::zeros(3, 4)?;
//! let vocab = decoder.vocabulary();
//! matrix.set_score(Span::new(0, 2)?, vocab.index_of(&["NP".to_string()]), 5.0)?;
//! matrix.set_score(Span::new(2, 3)?, vocab.index_of(&["VP".to_string()]), 4.0)?;
//! matrix.set_score(Span::new(0, 3)?, vocab.index_of(&["S".to_string()]), 6.0)?;
//!
//! worker.reset_sentence([
//!     Token::new("The", "DT"),
//!     Token::new("dog", "NN"),
//!     Token::new("ran", "VBD"),
//! ]);
//! let score = worker.decode(&matrix)?;
//! assert_eq!(score, 15.0);
//!
//! let tree = worker.tree()?;
//! assert_eq!(tree.num_leaves(), 3);
//! # Ok(())
//! # }
//! ```
#![cfg_attr(docsrs, feature(doc_cfg))]

/// 並列バッチデコード
pub mod batch;

/// チャートデコーダーの実装
pub mod decoder;

/// エラー型の定義
pub mod errors;

/// ラベル語彙
pub mod label;

/// スパンスコア行列
pub mod matrix;

/// マージンオラクルと構造化ヒンジ損失
pub mod oracle;

/// 入力文の内部表現
pub mod sentence;

/// トークンスパンの定義
pub mod span;

/// 構文木の結果コンテナと再構築
pub mod tree;


// Re-exports
pub use batch::{decode_batch, decode_batch_with_margin, MarginParse, Parse};
pub use decoder::worker::Worker;
pub use decoder::ChartDecoder;
pub use errors::{CykadaError, Result};
pub use label::{LabelChain, LabelId, LabelVocabulary};
pub use matrix::SpanScoreMatrix;
pub use oracle::{GoldTree, MarginOracle, MarginOutcome};
pub use sentence::{Sentence, Token};
pub use tree::ParseNode;

/// このライブラリのバージョン番号
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
