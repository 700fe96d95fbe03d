use sqlparser::{
    ast::{ColumnDef, ColumnOption, DataType, Expr, Ident, Value},
    tokenizer::Token
};

use crate::parser::tokens::{self, is_keyword};

const INTEGER_TYPES: &[&str] = &["TINYINT", "SMALLINT", "MEDIUMINT", "INT", "INTEGER", "BIGINT"];
const BLOB_TEXT_TYPES: &[&str] = &[
    "TINYBLOB",
    "BLOB",
    "MEDIUMBLOB",
    "LONGBLOB",
    "TINYTEXT",
    "TEXT",
    "MEDIUMTEXT",
    "LONGTEXT"
];
const TIME_TYPES: &[&str] = &["DATE", "DATETIME", "TIMESTAMP", "TIME", "YEAR"];
const FLOAT_TYPES: &[&str] = &["FLOAT", "DOUBLE", "REAL"];

/// Types spelled with more than one word, longest first, and their base type.
const MULTI_WORD_TYPES: &[(&[&str], &str)] = &[
    (&["NATIONAL", "CHARACTER", "VARYING"], "VARCHAR"),
    (&["NATIONAL", "CHAR", "VARYING"], "VARCHAR"),
    (&["NATIONAL", "VARCHAR"], "VARCHAR"),
    (&["NATIONAL", "CHARACTER"], "CHAR"),
    (&["NATIONAL", "CHAR"], "CHAR"),
    (&["NCHAR", "VARYING"], "VARCHAR"),
    (&["NCHAR", "VARCHAR"], "VARCHAR"),
    (&["CHARACTER", "VARYING"], "VARCHAR"),
    (&["CHAR", "VARYING"], "VARCHAR"),
    (&["DOUBLE", "PRECISION"], "DOUBLE"),
    (&["LONG", "VARBINARY"], "MEDIUMBLOB"),
    (&["LONG", "VARCHAR"], "MEDIUMTEXT")
];

const TYPE_ALIASES: &[(&str, &str)] = &[
    ("CHARACTER", "CHAR"),
    ("NCHAR", "CHAR"),
    ("NVARCHAR", "VARCHAR"),
    ("LONG", "MEDIUMTEXT")
];

/// One column definition as written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnFacts {
    pub name:           String,
    /// Upper-cased base type, e.g. `VARCHAR`
    pub data_type:      String,
    /// Type arguments, e.g. `["10", "2"]` for `DECIMAL(10, 2)`
    pub type_args:      Vec<String>,
    pub unsigned:       bool,
    pub charset:        Option<String>,
    pub collation:      Option<String>,
    pub not_null:       bool,
    pub default:        Option<String>,
    pub auto_increment: bool,
    pub primary_key:    bool,
    pub unique:         bool,
    pub comment:        Option<String>,
    pub on_update:      Option<String>,
    pub generated:      bool
}

impl ColumnFacts {
    /// Column facts from a parsed definition.
    pub fn from_def(def: &ColumnDef) -> Self {
        Self::from_parts(&def.name, &def.data_type, def.options.iter().map(|o| &o.option))
    }

    /// Column facts from the pieces `CHANGE` and `MODIFY` carry.
    pub fn from_parts<'a>(
        name: &Ident,
        data_type: &DataType,
        options: impl IntoIterator<Item = &'a ColumnOption>
    ) -> Self {
        let mut facts = Self {
            name: name.value.clone(),
            ..Self::default()
        };
        let rendered = tokens::tokenize(&data_type.to_string())
            .map(|raw| tokens::significant(&raw))
            .unwrap_or_default();
        facts.read_type(&rendered);
        for option in options {
            facts.apply_option(option);
        }
        facts
    }

    /// Parse `name type [attributes...]` from tokens.
    pub fn parse(def: &[Token]) -> Option<Self> {
        let name = tokens::word(def.first()?)?.to_string();
        let mut facts = Self {
            name,
            ..Self::default()
        };
        let used = facts.read_type(&def[1..]);
        if used == 0 {
            return None;
        }

        let mut i = 1 + used;
        while i < def.len() {
            let token = &def[i];
            let Some(kw) = tokens::word(token).map(str::to_ascii_uppercase) else {
                if matches!(token, Token::LParen) {
                    i = tokens::matching_paren(def, i).map_or(def.len(), |c| c + 1);
                } else {
                    i += 1;
                }
                continue;
            };
            i += 1;
            match kw.as_str() {
                "CHARSET" => {
                    facts.charset = def.get(i).and_then(tokens::value_text);
                    i += 1;
                }
                "CHARACTER" if def.get(i).is_some_and(|t| is_keyword(t, "SET")) => {
                    facts.charset = def.get(i + 1).and_then(tokens::value_text);
                    i += 2;
                }
                "COLLATE" => {
                    facts.collation = def.get(i).and_then(tokens::value_text);
                    i += 1;
                }
                "NOT" if def.get(i).is_some_and(|t| is_keyword(t, "NULL")) => {
                    facts.not_null = true;
                    i += 1;
                }
                "DEFAULT" => {
                    let (value, used) = read_value(&def[i..]);
                    facts.default = value;
                    i += used;
                }
                "AUTO_INCREMENT" => facts.auto_increment = true,
                "PRIMARY" => {
                    facts.primary_key = true;
                    if def.get(i).is_some_and(|t| is_keyword(t, "KEY")) {
                        i += 1;
                    }
                }
                "UNIQUE" => {
                    facts.unique = true;
                    if def.get(i).is_some_and(|t| is_keyword(t, "KEY")) {
                        i += 1;
                    }
                }
                "COMMENT" => {
                    facts.comment = def.get(i).and_then(tokens::value_text);
                    i += 1;
                }
                "ON" if def.get(i).is_some_and(|t| is_keyword(t, "UPDATE")) => {
                    let (value, used) = read_value(&def[i + 1..]);
                    facts.on_update = value;
                    i += 1 + used;
                }
                "GENERATED" | "AS" => facts.generated = true,
                _ => {}
            }
        }
        Some(facts)
    }

    /// Read `type [(args)] [UNSIGNED] [ZEROFILL]` and report how many tokens it used.
    fn read_type(&mut self, def: &[Token]) -> usize {
        let Some(first) = def.first().and_then(tokens::word) else {
            return 0;
        };
        let (base, mut i) = match MULTI_WORD_TYPES
            .iter()
            .find(|(words, _)| tokens::starts_with(def, words))
        {
            Some((words, base)) => ((*base).to_string(), words.len()),
            None => {
                let upper = first.to_ascii_uppercase();
                let base = TYPE_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == upper)
                    .map_or(upper, |(_, base)| (*base).to_string());
                (base, 1)
            }
        };
        self.data_type = base;

        if matches!(def.get(i), Some(Token::LParen))
            && let Some(close) = tokens::matching_paren(def, i)
        {
            self.type_args = tokens::split_top_level(&def[i + 1..close], |t| {
                matches!(t, Token::Comma)
            })
            .into_iter()
            .filter_map(|arg| arg.first().and_then(tokens::value_text))
            .collect();
            i = close + 1;
        }

        while let Some(token) = def.get(i) {
            if is_keyword(token, "UNSIGNED") {
                self.unsigned = true;
            } else if !is_keyword(token, "SIGNED") && !is_keyword(token, "ZEROFILL") {
                break;
            }
            i += 1;
        }
        i
    }

    fn apply_option(&mut self, option: &ColumnOption) {
        match option {
            ColumnOption::NotNull => self.not_null = true,
            ColumnOption::Default(expr) => self.default = Some(expr_text(expr)),
            ColumnOption::PrimaryKey(_) => self.primary_key = true,
            ColumnOption::Unique(_) => self.unique = true,
            ColumnOption::CharacterSet(name) => self.charset = Some(name.to_string()),
            ColumnOption::Collation(name) => self.collation = Some(name.to_string()),
            ColumnOption::Comment(text) => self.comment = Some(text.clone()),
            ColumnOption::OnUpdate(expr) => self.on_update = Some(expr_text(expr)),
            ColumnOption::Generated { .. } => self.generated = true,
            ColumnOption::DialectSpecific(extra) => {
                if extra.iter().any(|t| is_keyword(t, "AUTO_INCREMENT")) {
                    self.auto_increment = true;
                }
            }
            _ => {}
        }
    }

    /// Canonical type text, e.g. `BIGINT UNSIGNED` or `VARCHAR(64)`.
    pub fn type_text(&self) -> String {
        let mut text = self.data_type.clone();
        if !self.type_args.is_empty() {
            text.push('(');
            text.push_str(&self.type_args.join(","));
            text.push(')');
        }
        if self.unsigned {
            text.push_str(" UNSIGNED");
        }
        text
    }

    pub fn length(&self) -> Option<u32> {
        self.type_args.first().and_then(|n| n.parse().ok())
    }

    pub fn is_integer(&self) -> bool {
        INTEGER_TYPES.contains(&self.data_type.as_str())
    }

    pub fn is_blob_or_text(&self) -> bool {
        BLOB_TEXT_TYPES.contains(&self.data_type.as_str())
    }

    pub fn is_time(&self) -> bool {
        TIME_TYPES.contains(&self.data_type.as_str())
    }

    pub fn is_float(&self) -> bool {
        FLOAT_TYPES.contains(&self.data_type.as_str())
    }

    /// Integer width rank, used to tell widening changes apart.
    pub fn integer_rank(&self) -> Option<usize> {
        match self.data_type.as_str() {
            "TINYINT" => Some(1),
            "SMALLINT" => Some(2),
            "MEDIUMINT" => Some(3),
            "INT" | "INTEGER" => Some(4),
            "BIGINT" => Some(5),
            _ => None
        }
    }

    pub fn defaults_to_current_timestamp(&self) -> bool {
        self.default
            .as_deref()
            .is_some_and(is_current_timestamp)
    }

    pub fn updates_current_timestamp(&self) -> bool {
        self.on_update.as_deref().is_some_and(is_current_timestamp)
    }
}

fn is_current_timestamp(value: &str) -> bool {
    let upper = value.to_ascii_uppercase();
    upper.starts_with("CURRENT_TIMESTAMP") || upper.starts_with("NOW")
}

/// Literal strings lose their quotes, everything else renders as written.
fn expr_text(expr: &Expr) -> String {
    match expr {
        Expr::Value(v) => match &v.value {
            Value::SingleQuotedString(s) | Value::DoubleQuotedString(s) => s.clone(),
            other => other.to_string()
        },
        other => other.to_string()
    }
}

/// Read a default-like value and report how many tokens it used.
fn read_value(rest: &[Token]) -> (Option<String>, usize) {
    match rest {
        [Token::Minus, Token::Number(n, _), ..] => (Some(format!("-{}", n)), 2),
        [Token::LParen, ..] => {
            let close = tokens::matching_paren(rest, 0).unwrap_or(rest.len() - 1);
            (Some(tokens::render(&rest[..=close])), close + 1)
        }
        [Token::Word(_), Token::LParen, ..] => {
            let close = tokens::matching_paren(rest, 1).unwrap_or(rest.len() - 1);
            (Some(tokens::render(&rest[..=close]).replace(" (", "(")), close + 1)
        }
        [first, ..] => (tokens::value_text(first), 1),
        [] => (None, 0)
    }
}
