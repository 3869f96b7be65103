//! ラベル語彙
//!
//! このモジュールは、構成素ラベルとコンパクトな整数インデックスの間の
//! 双方向マッピングを提供します。インデックス0は「構成素なし」を表す
//! 空ラベルとして予約されており、デコード時のスコアは常に0に固定されます。
//!
//! 単項連鎖（unary chain）で潰された複合ラベルは、結合文字列ではなく
//! 原子ラベル名の順序付き列（[`LabelChain`]）として明示的に保持します。
//! 区切り文字の規約は存在せず、ラベル名との衝突は構造的に起こりません。

use hashbrown::HashMap;

use crate::errors::{CykadaError, Result};

/// ラベルのインデックス
///
/// `[0, L)` の範囲の整数であり、インデックス0は空ラベルに予約されています。
#[derive(Clone, Copy, Eq, PartialEq, Debug, Hash, PartialOrd, Ord)]
pub struct LabelId(pub u32);

impl LabelId {
    /// 「この位置に構成素ラベルなし」を表す予約インデックス
    pub const EMPTY: Self = Self(0);

    /// 内部のu32値を取得します。
    #[inline(always)]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// このインデックスが空ラベルかどうかを判定します。
    #[inline(always)]
    pub const fn is_empty_label(self) -> bool {
        self.0 == 0
    }
}

impl Default for LabelId {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// 単項連鎖を潰した複合ラベル
///
/// 外側から内側へ向かう原子ラベル名の順序付き列です。
/// 空の列は「構成素ラベルなし」を意味します。
pub type LabelChain = Vec<String>;

/// ラベル連鎖とインデックスの間の双方向マッピング
///
/// 一度構築された後は不変です。ルックアップは全域関数であり、
/// 未知の入力に対しては失敗せずにデフォルト値を返します。
///
/// # 例
///
/// ```
/// use cykada::label::{LabelId, LabelVocabulary};
///
/// let vocab = LabelVocabulary::from_chains([
///     vec!["NP".to_string()],
///     vec!["VP".to_string()],
///     vec!["S".to_string(), "VP".to_string()],
/// ])?;
///
/// assert_eq!(vocab.len(), 4); // 空ラベルを含む
/// assert_eq!(vocab.index_of(&["NP".to_string()]), LabelId(1));
/// assert_eq!(vocab.chain_of(LabelId(3)), &["S".to_string(), "VP".to_string()]);
///
/// // 未知の入力はデフォルト値に落ちる
/// assert_eq!(vocab.index_of(&["XX".to_string()]), LabelId::EMPTY);
/// assert!(vocab.chain_of(LabelId(100)).is_empty());
/// # Ok::<(), cykada::errors::CykadaError>(())
/// ```
#[derive(Clone, Debug)]
pub struct LabelVocabulary {
    chains: Vec<LabelChain>,
    indices: HashMap<LabelChain, u32>,
}

impl Default for LabelVocabulary {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelVocabulary {
    /// 空ラベルのみを含む語彙を作成します。
    pub fn new() -> Self {
        let mut indices = HashMap::new();
        indices.insert(vec![], 0);
        Self {
            chains: vec![vec![]],
            indices,
        }
    }

    /// 与えられた順序でラベル連鎖を登録した語彙を作成します。
    ///
    /// 空ラベルは常にインデックス0に予約され、与えられた連鎖は
    /// インデックス1から順に割り当てられます。
    ///
    /// # 引数
    ///
    /// * `chains` - 登録するラベル連鎖のイテレータ
    ///
    /// # エラー
    ///
    /// 空の連鎖や重複した連鎖が含まれる場合、
    /// [`CykadaError::InvalidArgument`]が返されます。
    pub fn from_chains<I>(chains: I) -> Result<Self>
    where
        I: IntoIterator<Item = LabelChain>,
    {
        let mut vocab = Self::new();
        for chain in chains {
            if chain.is_empty() {
                return Err(CykadaError::invalid_argument(
                    "chains",
                    "the empty chain is reserved at index 0",
                ));
            }
            if vocab.indices.contains_key(&chain) {
                return Err(CykadaError::invalid_argument(
                    "chains",
                    format!("duplicate label chain: {chain:?}"),
                ));
            }
            let id = u32::try_from(vocab.chains.len()).map_err(|_| {
                CykadaError::invalid_argument("chains", "too many label chains")
            })?;
            vocab.indices.insert(chain.clone(), id);
            vocab.chains.push(chain);
        }
        Ok(vocab)
    }

    /// 観測されたラベル連鎖の列から語彙を構築します。
    ///
    /// 連鎖は出現頻度の降順、同頻度の場合は辞書式順序で並べられ、
    /// `min_freq`回以上出現したものだけが登録されます。
    /// 空の連鎖は頻度表に入らず、常にインデックス0に予約されます。
    ///
    /// # 引数
    ///
    /// * `observed` - コーパス中で観測されたラベル連鎖のイテレータ
    /// * `min_freq` - 登録に必要な最小出現回数
    pub fn fit<I>(observed: I, min_freq: usize) -> Self
    where
        I: IntoIterator<Item = LabelChain>,
    {
        let mut freq_table: HashMap<LabelChain, usize> = HashMap::new();
        for chain in observed {
            if chain.is_empty() {
                continue;
            }
            *freq_table.entry(chain).or_insert(0) += 1;
        }

        let mut sorted: Vec<_> = freq_table.into_iter().collect();
        sorted.sort_by(|(c1, f1), (c2, f2)| f2.cmp(f1).then_with(|| c1.cmp(c2)));

        let mut vocab = Self::new();
        for (chain, freq) in sorted {
            if freq < min_freq {
                continue;
            }
            let id = vocab.chains.len() as u32;
            vocab.indices.insert(chain.clone(), id);
            vocab.chains.push(chain);
        }
        vocab
    }

    /// 連鎖に対応するインデックスを返します。
    ///
    /// 未知の連鎖に対しては[`LabelId::EMPTY`]を返します。
    ///
    /// # 引数
    ///
    /// * `chain` - 検索するラベル連鎖
    #[inline]
    pub fn index_of(&self, chain: &[String]) -> LabelId {
        self.indices
            .get(chain)
            .map_or(LabelId::EMPTY, |&id| LabelId(id))
    }

    /// インデックスに対応する連鎖を返します。
    ///
    /// 範囲外のインデックスに対しては空の連鎖を返します。
    ///
    /// # 引数
    ///
    /// * `id` - 検索するラベルインデックス
    #[inline]
    pub fn chain_of(&self, id: LabelId) -> &[String] {
        self.chains
            .get(id.get() as usize)
            .map_or(&[], |chain| chain.as_slice())
    }

    /// 連鎖が語彙に登録されているか判定します。
    #[inline]
    pub fn contains(&self, chain: &[String]) -> bool {
        self.indices.contains_key(chain)
    }

    /// 空ラベルを含むラベル数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.chains.len()
    }

    /// 語彙が空かどうかを判定します。
    ///
    /// 空ラベルが常に存在するため、この関数は常に`false`を返します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        false
    }
}
