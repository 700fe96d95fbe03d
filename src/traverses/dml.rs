use std::ops::ControlFlow;

use sqlparser::{ast::visit_relations, tokenizer::Token};

use crate::parser::{
    QualifiedName, StmtNode,
    tokens::{self, is_keyword}
};

const JOIN_MODIFIERS: &[&str] = &["LEFT", "RIGHT", "INNER", "OUTER", "CROSS", "NATURAL", "STRAIGHT_JOIN"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmlKind {
    Insert,
    Replace,
    Update,
    Delete
}

impl DmlKind {
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Replace => "REPLACE",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE"
        }
    }

    pub fn is_write_in_place(self) -> bool {
        matches!(self, Self::Update | Self::Delete)
    }
}

/// Facts of one INSERT, REPLACE, UPDATE or DELETE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmlFacts {
    pub kind:              DmlKind,
    /// Tables written to
    pub targets:           Vec<QualifiedName>,
    /// Every table the statement references, subqueries included
    pub tables:            Vec<QualifiedName>,
    pub has_where:         bool,
    pub has_limit:         bool,
    pub has_order_by:      bool,
    pub has_subquery:      bool,
    pub joins_without_on:  usize,
    pub has_column_list:   bool,
    pub insert_select:     bool,
    pub insert_rows:       usize,
    pub on_duplicate:      bool
}

impl DmlFacts {
    pub fn from_stmt(stmt: &StmtNode) -> Option<Self> {
        if !stmt.kind.is_dml() {
            return None;
        }
        let mut facts = Self::from_tokens(&stmt.tokens)?;

        let mut seen: Vec<QualifiedName> = facts.tables.clone();
        let _ = visit_relations(&stmt.statement, |relation| {
            let name = QualifiedName::from_object_name(&relation.to_string());
            if !seen.iter().any(|n| same_table(n, &name)) {
                seen.push(name);
            }
            ControlFlow::<()>::Continue(())
        });
        facts.tables = seen;
        Some(facts)
    }

    pub fn from_tokens(all: &[Token]) -> Option<Self> {
        let kind = match tokens::word(all.first()?)?.to_ascii_uppercase().as_str() {
            "INSERT" => DmlKind::Insert,
            "REPLACE" => DmlKind::Replace,
            "UPDATE" => DmlKind::Update,
            "DELETE" => DmlKind::Delete,
            _ => return None
        };
        let keywords = tokens::top_level_keywords(all);
        let has = |kw: &str| keywords.iter().any(|k| k == kw);

        let mut facts = Self {
            kind,
            targets: Vec::new(),
            tables: Vec::new(),
            has_where: has("WHERE"),
            has_limit: has("LIMIT"),
            has_order_by: keywords.windows(2).any(|w| w[0] == "ORDER" && w[1] == "BY"),
            has_subquery: false,
            joins_without_on: 0,
            has_column_list: false,
            insert_select: false,
            insert_rows: 0,
            on_duplicate: keywords.windows(2).any(|w| w[0] == "ON" && w[1] == "DUPLICATE")
        };

        match kind {
            DmlKind::Insert | DmlKind::Replace => facts.read_insert(all),
            DmlKind::Update => {
                let start = 1 + all[1..]
                    .iter()
                    .take_while(|t| is_keyword(t, "LOW_PRIORITY") || is_keyword(t, "IGNORE"))
                    .count();
                let end = top_level_position(all, &["SET"]).unwrap_or(all.len());
                if start < end {
                    facts.read_table_refs(&all[start..end]);
                }
                facts.has_subquery = nested_select(all);
            }
            DmlKind::Delete => {
                let from = top_level_position(all, &["FROM"]).map_or(1, |i| i + 1);
                let end = top_level_position(all, &["WHERE", "ORDER", "LIMIT"]).unwrap_or(all.len());
                if from < end {
                    facts.read_table_refs(&all[from..end]);
                }
                facts.has_subquery = nested_select(all);
            }
        }
        facts.tables = facts.targets.clone();
        Some(facts)
    }

    fn read_insert(&mut self, all: &[Token]) {
        let modifiers = ["LOW_PRIORITY", "DELAYED", "HIGH_PRIORITY", "IGNORE", "INTO"];
        let mut i = 1;
        while all.get(i).is_some_and(|t| modifiers.iter().any(|m| is_keyword(t, m))) {
            i += 1;
        }
        let Some((table, used)) = QualifiedName::read(&all[i.min(all.len())..]) else {
            return;
        };
        self.targets.push(table);
        i += used;

        match all.get(i) {
            Some(Token::LParen) => {
                if all.get(i + 1).is_some_and(|t| is_keyword(t, "SELECT")) {
                    self.insert_select = true;
                } else {
                    self.has_column_list = true;
                }
            }
            Some(t) if is_keyword(t, "SET") => self.has_column_list = true,
            _ => {}
        }
        if top_level_position(all, &["SELECT"]).is_some() {
            self.insert_select = true;
        }

        if let Some(values) = top_level_position(all, &["VALUES", "VALUE"]) {
            let mut depth = 0usize;
            for token in &all[values + 1..] {
                match token {
                    Token::LParen => {
                        if depth == 0 {
                            self.insert_rows += 1;
                        }
                        depth += 1;
                    }
                    Token::RParen => depth = depth.saturating_sub(1),
                    Token::Word(_) if depth == 0 => break,
                    _ => {}
                }
            }
        }
    }

    /// Read `t1 [alias], t2 JOIN t3 ON ...` into targets and join facts.
    fn read_table_refs(&mut self, refs: &[Token]) {
        for part in tokens::split_top_level(refs, |t| matches!(t, Token::Comma)) {
            let mut starts = vec![0];
            let mut joins = Vec::new();
            let mut depth = 0usize;
            for (idx, token) in part.iter().enumerate() {
                match token {
                    Token::LParen => depth += 1,
                    Token::RParen => depth = depth.saturating_sub(1),
                    _ if depth == 0 && is_keyword(token, "JOIN") => {
                        starts.push(idx + 1);
                        let natural = part[..idx]
                            .iter()
                            .rev()
                            .take_while(|t| JOIN_MODIFIERS.iter().any(|m| is_keyword(t, m)))
                            .any(|t| is_keyword(t, "NATURAL") || is_keyword(t, "CROSS"));
                        joins.push((idx, natural));
                    }
                    _ => {}
                }
            }

            for start in starts {
                if let Some((name, _)) = QualifiedName::read(&part[start.min(part.len())..]) {
                    self.targets.push(name);
                }
            }

            for (n, (at, natural)) in joins.iter().enumerate() {
                if *natural {
                    continue;
                }
                let end = joins.get(n + 1).map_or(part.len(), |(next, _)| *next);
                let segment = &part[at + 1..end];
                let mut depth = 0usize;
                let constrained = segment.iter().any(|t| match t {
                    Token::LParen => {
                        depth += 1;
                        false
                    }
                    Token::RParen => {
                        depth = depth.saturating_sub(1);
                        false
                    }
                    _ => depth == 0 && (is_keyword(t, "ON") || is_keyword(t, "USING"))
                });
                if !constrained {
                    self.joins_without_on += 1;
                }
            }
        }
    }
}

fn same_table(a: &QualifiedName, b: &QualifiedName) -> bool {
    a.name.eq_ignore_ascii_case(&b.name)
        && match (&a.schema, &b.schema) {
            (Some(x), Some(y)) => x.eq_ignore_ascii_case(y),
            _ => true
        }
}

fn top_level_position(all: &[Token], keywords: &[&str]) -> Option<usize> {
    tokens::find_top_level(all, |t| keywords.iter().any(|kw| is_keyword(t, kw)))
}

fn nested_select(all: &[Token]) -> bool {
    let mut depth = 0usize;
    all.iter().any(|t| match t {
        Token::LParen => {
            depth += 1;
            false
        }
        Token::RParen => {
            depth = depth.saturating_sub(1);
            false
        }
        _ => depth > 0 && is_keyword(t, "SELECT")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facts(sql: &str) -> DmlFacts {
        DmlFacts::from_tokens(&tokens::significant(&tokens::tokenize(sql).unwrap())).unwrap()
    }

    #[test]
    fn test_update_without_where() {
        let f = facts("UPDATE t SET name = 'x'");
        assert_eq!(f.kind, DmlKind::Update);
        assert!(!f.has_where);
        assert_eq!(f.targets, vec![QualifiedName::bare("t")]);
    }

    #[test]
    fn test_where_inside_subquery_is_not_top_level() {
        let f = facts("UPDATE t SET a = (SELECT max(b) FROM s WHERE s.id = 1)");
        assert!(!f.has_where);
        assert!(f.has_subquery);
    }

    #[test]
    fn test_join_without_on() {
        let f = facts("UPDATE a JOIN b SET a.x = b.x WHERE a.id = 1");
        assert_eq!(f.joins_without_on, 1);
        let f = facts("UPDATE a JOIN b ON a.id = b.id SET a.x = b.x WHERE a.id = 1");
        assert_eq!(f.joins_without_on, 0);
        assert_eq!(f.targets.len(), 2);
    }

    #[test]
    fn test_insert_shapes() {
        let f = facts("INSERT INTO t (a, b) VALUES (1, 2), (3, 4), (5, 6)");
        assert!(f.has_column_list);
        assert_eq!(f.insert_rows, 3);
        assert!(!f.insert_select);

        let f = facts("INSERT INTO t VALUES (1)");
        assert!(!f.has_column_list);

        let f = facts("INSERT INTO t (a) SELECT a FROM s");
        assert!(f.insert_select);

        let f = facts("INSERT INTO t (a) VALUES (1) ON DUPLICATE KEY UPDATE a = 2");
        assert!(f.on_duplicate);
        assert_eq!(f.insert_rows, 1);
    }

    #[test]
    fn test_delete_targets() {
        let f = facts("DELETE FROM shop.orders WHERE id IN (SELECT id FROM tmp)");
        assert_eq!(f.targets[0].to_string(), "shop.orders");
        assert!(f.has_subquery);
        assert!(f.has_where);
    }
}
