use std::hash::{DefaultHasher, Hash, Hasher};

use sqlparser::tokenizer::Token;

use super::tokens::tokenize;

/// Canonical form of a statement or batch.
///
/// Comments are removed, identifiers and keywords lower-cased, literals
/// replaced with `?` and literal lists collapsed to `?+`.
pub fn fingerprint(sql: &str) -> String {
    let Ok(tokens) = tokenize(sql) else {
        return sql
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
    };

    let mut pieces: Vec<String> = Vec::with_capacity(tokens.len());
    for token in &tokens {
        let piece = match token {
            Token::Whitespace(_) | Token::EOF => continue,
            Token::Number(..)
            | Token::SingleQuotedString(_)
            | Token::DoubleQuotedString(_)
            | Token::NationalStringLiteral(_)
            | Token::HexStringLiteral(_)
            | Token::EscapedStringLiteral(_) => "?".to_string(),
            Token::Placeholder(_) => "?".to_string(),
            Token::Word(w) => w.value.to_lowercase(),
            other => other.to_string().to_lowercase()
        };

        if piece == "?" && ends_with_list(&pieces) {
            pieces.pop();
            if let Some(last) = pieces.last_mut() {
                *last = "?+".to_string();
            }
            continue;
        }
        pieces.push(piece);
    }
    pieces.join(" ")
}

fn ends_with_list(pieces: &[String]) -> bool {
    match pieces {
        [.., prev, comma] => comma == "," && (prev == "?" || prev == "?+"),
        _ => false
    }
}

/// Short identifier of a canonical string.
pub fn id(canonical: &str) -> String {
    let mut hasher = DefaultHasher::new();
    canonical.hash(&mut hasher);
    format!("{:016X}", hasher.finish())
}

/// Identifier of the canonical form of `sql`.
pub fn fingerprint_id(sql: &str) -> String {
    id(&fingerprint(sql))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literals_become_placeholders() {
        assert_eq!(
            fingerprint("SELECT * FROM t WHERE id = 42 AND name = 'bob'"),
            "select * from t where id = ? and name = ?"
        );
    }

    #[test]
    fn test_in_list_collapses() {
        assert_eq!(
            fingerprint("DELETE FROM t WHERE id IN (1, 2, 3)"),
            fingerprint("delete from t where id in (7, 8)")
        );
        assert!(fingerprint("SELECT 1 FROM t WHERE id IN (1, 2)").contains("( ?+ )"));
    }

    #[test]
    fn test_comments_and_spacing_ignored() {
        let a = fingerprint("UPDATE t  SET a=1 /* note */ WHERE id=2");
        let b = fingerprint("update t set a = 5\n-- other\nwhere id = 9");
        assert_eq!(a, b);
        assert_eq!(id(&a), id(&b));
    }

    #[test]
    fn test_quoted_identifiers_match_bare() {
        assert_eq!(fingerprint("SELECT `a` FROM `t`"), fingerprint("select a from t"));
    }

    #[test]
    fn test_id_shape() {
        let value = fingerprint_id("SELECT 1");
        assert_eq!(value.len(), 16);
        assert!(value.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
