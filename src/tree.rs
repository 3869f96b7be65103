//! 構文木の結果コンテナと再構築
//!
//! このモジュールは、デコード結果として得られる二分化された構成素構文木を
//! 表現する型と、チャートのバックポインタから木を実体化する再構築処理を
//! 提供します。
//!
//! 単項連鎖で潰された複合ラベルは、再構築時に連鎖の要素ごとに1つの
//! 内部ノードへ展開されます。つまり、すべての内部ノードは高々1つの
//! ラベルを持ち、連鎖の最内要素以外はただ1つの子を持ちます。
//!
//! 再構築は明示的なスタックを用いた反復処理で行われ、呼び出し環境の
//! コールスタック深度に依存しません。完成した木の所有権は呼び出し側に
//! 移り、チャートやワーカーへの参照は一切残りません。

use crate::decoder::chart::Chart;
use crate::errors::{CykadaError, Result};
use crate::label::{LabelChain, LabelVocabulary};
use crate::sentence::Sentence;
use crate::span::Span;

/// 構文木のノード
///
/// 葉ノードは1つのトークンに対応し、内部ノードはスパンとラベル、
/// および1つ（単項連鎖の繋ぎ）または2つ（二分分割）の子を持ちます。
#[derive(Clone, Debug, PartialEq)]
pub enum ParseNode {
    /// 1トークンに対応する葉ノード
    Leaf(LeafNode),

    /// スパンに対応する内部ノード
    Internal(InternalNode),
}

/// 1トークンに対応する葉ノード
///
/// 語形と品詞タグのコピーを保持するため、木は文から独立して所有できます。
#[derive(Clone, Debug, PartialEq)]
pub struct LeafNode {
    span: Span,
    word: String,
    tag: String,
}

/// スパンに対応する内部ノード
///
/// `label`が`None`のノードは二分化のためだけに存在する無ラベルノードであり、
/// 常に2つの子を持ちます。`Some`のノードは単項連鎖の1要素であり、
/// 1つまたは2つの子を持ちます。
#[derive(Clone, Debug, PartialEq)]
pub struct InternalNode {
    span: Span,
    label: Option<String>,
    children: Vec<ParseNode>,
}

impl LeafNode {
    /// 対応するトークンの文中での添字を返します。
    #[inline(always)]
    pub const fn index(&self) -> usize {
        self.span.start
    }

    /// 語形を取得します。
    #[inline(always)]
    pub fn word(&self) -> &str {
        &self.word
    }

    /// 品詞タグを取得します。
    #[inline(always)]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}

impl InternalNode {
    /// このノードのラベルを取得します。
    ///
    /// 二分化のための無ラベルノードの場合は`None`を返します。
    #[inline(always)]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// 子ノードのスライスを取得します。
    #[inline(always)]
    pub fn children(&self) -> &[ParseNode] {
        &self.children
    }
}

impl ParseNode {
    /// 葉ノードを作成します。
    ///
    /// # 引数
    ///
    /// * `index` - トークンの文中での添字（0から始まる）
    /// * `word` - 語形
    /// * `tag` - 品詞タグ
    pub fn leaf<W, T>(index: usize, word: W, tag: T) -> Self
    where
        W: Into<String>,
        T: Into<String>,
    {
        Self::Leaf(LeafNode {
            span: Span {
                start: index,
                end: index + 1,
            },
            word: word.into(),
            tag: tag.into(),
        })
    }

    /// 内部ノードを作成します。
    ///
    /// ノードのスパンは子のスパンの連結であり、隙間も重なりも許されません。
    /// `label`が`None`のノードは二分化のための無ラベルノードを表します。
    ///
    /// # 引数
    ///
    /// * `label` - このノードのラベル（無ラベルの場合は`None`）
    /// * `children` - 子ノードの列（左から右の順）
    ///
    /// # エラー
    ///
    /// 子が空の場合や、子のスパンが連結になっていない場合、
    /// [`CykadaError`](crate::errors::CykadaError)が返されます。
    pub fn internal<L>(label: Option<L>, children: Vec<ParseNode>) -> Result<Self>
    where
        L: Into<String>,
    {
        let first = children.first().ok_or_else(|| {
            CykadaError::invalid_argument("children", "an internal node requires children")
        })?;
        let start = first.span().start;
        let mut end = start;
        for child in &children {
            if child.span().start != end {
                return Err(CykadaError::invalid_argument(
                    "children",
                    format!(
                        "child spans must concatenate without gap or overlap, \
                         but {} does not start at {}",
                        child.span(),
                        end
                    ),
                ));
            }
            end = child.span().end;
        }
        Ok(Self::Internal(InternalNode {
            span: Span { start, end },
            label: label.map(Into::into),
            children,
        }))
    }

    /// このノードが覆うスパンを返します。
    #[inline(always)]
    pub const fn span(&self) -> Span {
        match self {
            Self::Leaf(leaf) => leaf.span,
            Self::Internal(internal) => internal.span,
        }
    }

    /// このノードが葉かどうかを判定します。
    #[inline(always)]
    pub const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf(_))
    }

    /// ラベル付きスパンの一覧を収集します。
    ///
    /// 同一スパン上で連続する単項ノードは1つのラベル連鎖に畳み込まれます。
    /// 無ラベルの二分化ノードと葉は含まれません。結果は正解木の構築
    /// （[`GoldTree::from_node`](crate::oracle::GoldTree::from_node)）に
    /// 使用できます。
    pub fn span_labels(&self) -> Vec<(Span, LabelChain)> {
        let mut collected = vec![];
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            let internal = match node {
                ParseNode::Internal(internal) => internal,
                ParseNode::Leaf(_) => continue,
            };
            if internal.label.is_none() {
                stack.extend(internal.children.iter());
                continue;
            }

            // Fold the maximal unary chain rooted at this node.
            let mut chain = vec![];
            let mut tail = internal;
            loop {
                if let Some(label) = &tail.label {
                    chain.push(label.clone());
                }
                match tail.children.as_slice() {
                    [ParseNode::Internal(next)]
                        if next.span == tail.span && next.label.is_some() =>
                    {
                        tail = next;
                    }
                    _ => break,
                }
            }
            collected.push((internal.span, chain));
            stack.extend(tail.children.iter());
        }
        collected
    }

    /// 木に含まれる葉の数を返します。
    pub fn num_leaves(&self) -> usize {
        let mut count = 0;
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            match node {
                ParseNode::Leaf(_) => count += 1,
                ParseNode::Internal(internal) => stack.extend(internal.children.iter()),
            }
        }
        count
    }
}

/// 再構築処理の1ステップ
///
/// バックポインタの走査は、子スパンの展開（`Expand`）と、完成した部分木の
/// 結合（`Combine`）の2段階に分けて明示的なスタックで処理されます。
enum Step {
    Expand(Span),
    Combine(Span),
}

/// チャートのバックポインタから構文木を実体化します。
///
/// 根スパン`[0, n)`から下向きに走査し、幅1のスパンでは葉を、
/// それ以外のスパンでは記録された分割点に従って2つの子を持つ内部ノードを
/// 生成します。各スパンに記録されたラベル連鎖は、ノードの入れ子として
/// 展開されます。
///
/// # 引数
///
/// * `chart` - デコード済みのチャート
/// * `vocab` - ラベル連鎖の逆引きに使用する語彙
/// * `sent` - 葉に語形とタグを与える入力文
pub(crate) fn reconstruct(chart: &Chart, vocab: &LabelVocabulary, sent: &Sentence) -> ParseNode {
    let num_tokens = chart.num_tokens();
    debug_assert_eq!(num_tokens, sent.len());
    debug_assert!(num_tokens >= 1);

    let root = Span {
        start: 0,
        end: num_tokens,
    };
    let mut steps = vec![Step::Expand(root)];
    let mut finished: Vec<ParseNode> = vec![];

    while let Some(step) = steps.pop() {
        match step {
            Step::Expand(span) if span.is_unit() => {
                let chain = vocab.chain_of(chart.label(span));
                let token = sent.token(span.start);
                let mut node = ParseNode::Leaf(LeafNode {
                    span,
                    word: token.word().to_string(),
                    tag: token.tag().to_string(),
                });
                for label in chain.iter().rev() {
                    node = unary(span, label.clone(), node);
                }
                finished.push(node);
            }
            Step::Expand(span) => {
                let split = chart.split(span);
                steps.push(Step::Combine(span));
                steps.push(Step::Expand(Span {
                    start: split,
                    end: span.end,
                }));
                steps.push(Step::Expand(Span {
                    start: span.start,
                    end: split,
                }));
            }
            Step::Combine(span) => {
                // The left subtree finished first, so it sits below the right one.
                let right = finished.pop().expect("left/right subtrees must be finished");
                let left = finished.pop().expect("left/right subtrees must be finished");
                let chain = vocab.chain_of(chart.label(span));
                let node = match chain.split_last() {
                    None => ParseNode::Internal(InternalNode {
                        span,
                        label: None,
                        children: vec![left, right],
                    }),
                    Some((innermost, outer)) => {
                        let mut node = ParseNode::Internal(InternalNode {
                            span,
                            label: Some(innermost.clone()),
                            children: vec![left, right],
                        });
                        for label in outer.iter().rev() {
                            node = unary(span, label.clone(), node);
                        }
                        node
                    }
                };
                finished.push(node);
            }
        }
    }

    debug_assert_eq!(finished.len(), 1);
    finished.pop().expect("the root must be finished")
}

#[inline]
fn unary(span: Span, label: String, child: ParseNode) -> ParseNode {
    ParseNode::Internal(InternalNode {
        span,
        label: Some(label),
        children: vec![child],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_internal_rejects_gaps_and_overlaps() {
        // [0,1) followed by [2,3) leaves a gap at [1,2).
        let result = ParseNode::internal(
            Some("S"),
            vec![ParseNode::leaf(0, "a", "DT"), ParseNode::leaf(2, "c", "VB")],
        );
        assert!(result.is_err());

        let result = ParseNode::internal::<&str>(None, vec![]);
        assert!(result.is_err());
    }

    #[test]
    fn test_span_labels_folds_unary_chains() {
        // S over [0,2) wrapping VP over the same span, then two leaves.
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

        let labels = tree.span_labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].0, Span { start: 0, end: 2 });
        assert_eq!(labels[0].1, vec!["S".to_string(), "VP".to_string()]);
    }

    #[test]
    fn test_span_labels_skips_unlabeled_nodes() {
        let tree = ParseNode::internal(
            Some("S"),
            vec![
                ParseNode::internal::<&str>(
                    None,
                    vec![ParseNode::leaf(0, "a", "DT"), ParseNode::leaf(1, "b", "NN")],
                )
                .unwrap(),
                ParseNode::leaf(2, "c", "VB"),
            ],
        )
        .unwrap();

        let labels = tree.span_labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].1, vec!["S".to_string()]);
    }

    #[test]
    fn test_num_leaves() {
        let tree = ParseNode::internal(
            Some("S"),
            vec![
                ParseNode::internal::<&str>(
                    None,
                    vec![ParseNode::leaf(0, "a", "DT"), ParseNode::leaf(1, "b", "NN")],
                )
                .unwrap(),
                ParseNode::leaf(2, "c", "VB"),
            ],
        )
        .unwrap();
        assert_eq!(tree.num_leaves(), 3);
    }
}
