//! Index naming, width, count and redundancy.

use std::collections::HashSet;

use crate::{
    rules::RuleHint,
    traverses::{IndexFacts, IndexKind}
};

/// Checks over indexes a statement defines.
///
/// `existing` holds the indexes the table already has (empty when
/// unknown) and `columns` the known column names (empty when unknown).
pub fn check_indexes(
    table: &str,
    defined: &[IndexFacts],
    existing: &[IndexFacts],
    columns: &[String],
    ctx: &mut RuleHint<'_>
) {
    let params = ctx.params;

    for index in defined {
        if index.kind == IndexKind::Foreign {
            if !params.enable_foreign_key {
                ctx.push(format!("表`{}`禁止使用外键{}", table, quoted(index.name.as_deref())));
            }
            continue;
        }
        check_prefix(index, ctx);
        if index.kind != IndexKind::Primary
            && index.columns.len() > params.secondary_index_max_key_parts as usize
        {
            ctx.push(format!(
                "{}`{}`的列数为{}，超出了规则允许的上限{}",
                index.kind,
                index.display_name(),
                index.columns.len(),
                params.secondary_index_max_key_parts
            ));
        }
        if !columns.is_empty() {
            for column in &index.columns {
                if !columns.iter().any(|c| c.eq_ignore_ascii_case(column)) {
                    ctx.push(format!(
                        "{}`{}`引用的列`{}`不存在",
                        index.kind,
                        index.display_name(),
                        column
                    ));
                }
            }
        }
    }

    check_duplicate_names(defined, existing, ctx);

    let counted = |i: &&IndexFacts| !matches!(i.kind, IndexKind::Primary | IndexKind::Foreign);
    let total = defined.iter().filter(counted).count() + existing.iter().filter(counted).count();
    if total > params.max_index_keys as usize {
        ctx.push(format!(
            "表`{}`的索引数量为{}，超出了规则允许的上限{}",
            table, total, params.max_index_keys
        ));
    }

    if !params.enable_redundant_index {
        check_redundant(defined, existing, ctx);
    }
}

fn quoted(name: Option<&str>) -> String {
    name.map(|n| format!("`{}`", n)).unwrap_or_default()
}

fn check_prefix(index: &IndexFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    let Some(name) = index.name.as_deref() else {
        return;
    };
    let prefix = match index.kind {
        IndexKind::Unique if params.check_uniq_index_prefix => &params.uniq_index_prefix,
        IndexKind::Secondary if params.check_secondary_index_prefix => &params.secondary_index_prefix,
        IndexKind::Fulltext if params.check_fulltext_index_prefix => &params.fulltext_index_prefix,
        _ => return
    };
    let matches = name
        .get(..prefix.len())
        .is_some_and(|head| head.eq_ignore_ascii_case(prefix));
    if !matches {
        ctx.push(format!(
            "{}`{}`必须以`{}`为前缀",
            index.kind,
            name,
            prefix.to_ascii_lowercase()
        ));
    }
}

fn check_duplicate_names(defined: &[IndexFacts], existing: &[IndexFacts], ctx: &mut RuleHint<'_>) {
    let mut seen: HashSet<String> = existing
        .iter()
        .filter_map(|i| i.name.as_deref())
        .map(str::to_ascii_lowercase)
        .collect();
    for name in defined.iter().filter_map(|i| i.name.as_deref()) {
        if !seen.insert(name.to_ascii_lowercase()) {
            ctx.push(format!("索引名`{}`重复", name));
        }
    }
}

/// Equal column lists, or a secondary index that is a leftmost prefix of another.
fn check_redundant(defined: &[IndexFacts], existing: &[IndexFacts], ctx: &mut RuleHint<'_>) {
    let eligible = |i: &IndexFacts| {
        !i.columns.is_empty() && !matches!(i.kind, IndexKind::Foreign | IndexKind::Fulltext | IndexKind::Spatial)
    };
    for (n, index) in defined.iter().enumerate() {
        if !eligible(index) {
            continue;
        }
        let others = defined[n + 1..].iter().chain(existing.iter());
        for other in others.filter(|o| eligible(*o)) {
            let same = index.normalized_columns() == other.normalized_columns();
            let covered = (index.kind == IndexKind::Secondary && index.is_prefix_of(other))
                || (other.kind == IndexKind::Secondary && other.is_prefix_of(index));
            if same || covered {
                ctx.push(format!(
                    "{}`{}`与{}`{}`存在冗余，请检查索引列({})",
                    index.kind,
                    index.display_name(),
                    other.kind,
                    other.display_name(),
                    index.columns.join(",")
                ));
                break;
            }
        }
    }
}
