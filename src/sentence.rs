//! 入力文の内部表現を提供するモジュール
//!
//! このモジュールは、デコード対象となる文をトークン列として保持するための
//! データ構造を提供します。各トークンは語形と品詞タグを持ち、文が確定した後は
//! 不変として扱われます。

/// 文中の1トークン
///
/// 語形と品詞タグを保持します。文中での位置は[`Sentence`]内の添字で表されます。
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Token {
    word: String,
    tag: String,
}

impl Token {
    /// 新しいトークンを作成します。
    ///
    /// # 引数
    ///
    /// * `word` - 語形
    /// * `tag` - 品詞タグ
    pub fn new<W, T>(word: W, tag: T) -> Self
    where
        W: Into<String>,
        T: Into<String>,
    {
        Self {
            word: word.into(),
            tag: tag.into(),
        }
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

/// 入力文の内部表現を保持する構造体
///
/// トークン列を保持し、ワーカーが文をまたいでバッファを再利用できるように
/// クリアと再設定をサポートします。
#[derive(Default, Clone, Debug)]
pub struct Sentence {
    tokens: Vec<Token>,
}

impl Sentence {
    /// 新しい空の`Sentence`インスタンスを生成します。
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    /// 保持しているトークン列をクリアします。
    ///
    /// 確保済みのバッファは再利用のために保持されます。
    #[inline(always)]
    pub fn clear(&mut self) {
        self.tokens.clear();
    }

    /// トークン列を設定します。
    ///
    /// # 引数
    ///
    /// * `tokens` - 設定するトークンのイテレータ
    pub fn set_tokens<I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = Token>,
    {
        self.tokens.clear();
        self.tokens.extend(tokens);
    }

    /// 文のトークン数を返します。
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// 文が空かどうかを判定します。
    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// `i`番目のトークンを取得します。
    ///
    /// # 引数
    ///
    /// * `i` - トークンの添字（0から始まる）
    ///
    /// # パニック
    ///
    /// `i`が範囲外の場合、パニックします。
    #[inline(always)]
    pub fn token(&self, i: usize) -> &Token {
        &self.tokens[i]
    }

    /// トークン列へのスライスを取得します。
    #[inline(always)]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}

impl FromIterator<Token> for Sentence {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self {
            tokens: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_clear() {
        let mut sent = Sentence::new();
        sent.set_tokens([Token::new("The", "DT"), Token::new("dog", "NN")]);
        assert_eq!(sent.len(), 2);
        assert_eq!(sent.token(0).word(), "The");
        assert_eq!(sent.token(1).tag(), "NN");

        sent.clear();
        assert!(sent.is_empty());
    }
}
