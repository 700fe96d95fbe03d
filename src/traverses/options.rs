use sqlparser::tokenizer::Token;

use crate::parser::tokens::{self, is_keyword};

/// Table or database options as written after the definition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableOptions {
    pub engine:         Option<String>,
    pub charset:        Option<String>,
    pub collation:      Option<String>,
    pub comment:        Option<String>,
    pub auto_increment: Option<String>,
    pub row_format:     Option<String>,
    pub partitioned:    bool
}

impl TableOptions {
    pub fn parse(options: &[Token]) -> Self {
        let mut parsed = Self::default();
        let mut i = 0;
        while i < options.len() {
            let Some(kw) = tokens::word(&options[i]).map(str::to_ascii_uppercase) else {
                i += 1;
                continue;
            };
            i += 1;
            let key = match kw.as_str() {
                "DEFAULT" | "CONVERT" | "TO" => continue,
                "PARTITION" => {
                    parsed.partitioned = true;
                    break;
                }
                "CHARACTER" if options.get(i).is_some_and(|t| is_keyword(t, "SET")) => {
                    i += 1;
                    "CHARSET".to_string()
                }
                _ => kw
            };
            if matches!(options.get(i), Some(Token::Eq)) {
                i += 1;
            }
            let value = options.get(i).and_then(tokens::value_text);
            i += 1;
            match key.as_str() {
                "ENGINE" => parsed.engine = value,
                "CHARSET" => parsed.charset = value,
                "COLLATE" => parsed.collation = value,
                "COMMENT" => parsed.comment = value,
                "AUTO_INCREMENT" => parsed.auto_increment = value,
                "ROW_FORMAT" => parsed.row_format = value,
                _ => {}
            }
        }
        parsed
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}
