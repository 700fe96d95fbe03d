//! Table-level checks for `CREATE TABLE` and table options in `ALTER TABLE`.

use super::common::check_identifier;
use crate::{
    rules::RuleHint,
    traverses::{CreateTableFacts, TableOptions}
};

/// Whether options come from a new table or from an `ALTER TABLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsOrigin {
    Create,
    Alter
}

pub fn check_create_as(facts: &CreateTableFacts, ctx: &mut RuleHint<'_>) {
    if facts.as_select && !ctx.params.enable_create_table_as {
        ctx.halt("禁止使用CREATE TABLE AS语法");
    }
}

pub fn check_create_like(facts: &CreateTableFacts, ctx: &mut RuleHint<'_>) {
    if facts.like.is_some() && !ctx.params.enable_create_table_like {
        ctx.halt("禁止使用CREATE TABLE LIKE语法");
    }
}

pub fn check_table_name(facts: &CreateTableFacts, ctx: &mut RuleHint<'_>) {
    let max = ctx.params.max_table_name_length;
    check_identifier("表名", &facts.table.name, max, ctx);
}

/// Engine, charset, collation, row format, auto-increment seed and partitioning.
pub fn check_table_options(
    table: &str,
    options: &TableOptions,
    origin: OptionsOrigin,
    ctx: &mut RuleHint<'_>
) {
    let params = ctx.params;

    if params.check_table_engine {
        match options.engine.as_deref() {
            None if origin == OptionsOrigin::Create => ctx.push(format!(
                "表`{}`必须指定存储引擎，支持的存储引擎为: {}",
                table,
                params.table_support_engine.join(",")
            )),
            Some(engine) if !params.engine_allowed(engine) => ctx.push(format!(
                "表`{}`的存储引擎`{}`不被允许，支持的存储引擎为: {}",
                table,
                engine,
                params.table_support_engine.join(",")
            )),
            _ => {}
        }
    }

    if params.check_table_charset {
        check_charset_and_collation(
            &format!("表`{}`", table),
            options.charset.as_deref(),
            options.collation.as_deref(),
            ctx
        );
    }

    if let Some(format) = options.row_format.as_deref()
        && !params.row_format_allowed(format)
    {
        ctx.push(format!(
            "表`{}`的ROW_FORMAT`{}`不被允许，支持: {}",
            table,
            format,
            params.innodb_row_format.join(",")
        ));
    }

    if origin == OptionsOrigin::Create
        && params.check_table_autoincrement_init_value
        && let Some(seed) = options.auto_increment.as_deref()
        && seed != "1"
    {
        ctx.push(format!("表`{}`的AUTO_INCREMENT初始值必须为1，当前为{}", table, seed));
    }

    if options.partitioned && !params.enable_partition_table {
        ctx.push(format!("表`{}`禁止使用分区表", table));
    }
}

/// Charset must be allowed, collation must be the recommended one for it.
///
/// Only what is written is checked: omitted options inherit server defaults.
pub fn check_charset_and_collation(
    subject: &str,
    charset: Option<&str>,
    collation: Option<&str>,
    ctx: &mut RuleHint<'_>
) {
    let params = ctx.params;
    let charset = charset.map(str::to_string).or_else(|| {
        collation.and_then(|c| c.split('_').next()).map(str::to_string)
    });
    let Some(charset) = charset else {
        return;
    };
    if !params.charset_allowed(&charset) {
        ctx.push(format!(
            "{}的字符集`{}`不被允许，支持的字符集为: {}",
            subject,
            charset,
            params.allowed_charsets()
        ));
        return;
    }
    if let (Some(collation), Some(recommend)) = (collation, params.recommended_collation(&charset))
        && !collation.eq_ignore_ascii_case(recommend)
    {
        ctx.push(format!(
            "{}的排序规则`{}`与推荐的排序规则`{}`不一致",
            subject, collation, recommend
        ));
    }
}

pub fn check_table_comment(facts: &CreateTableFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    if !params.check_table_comment {
        return;
    }
    match facts.options.comment.as_deref() {
        None | Some("") => ctx.push(format!("表`{}`必须要有注释", facts.table.name)),
        Some(comment) if comment.chars().count() > params.table_comment_length as usize => {
            ctx.push(format!(
                "表`{}`的注释长度超出了规则允许的上限{}",
                facts.table.name, params.table_comment_length
            ))
        }
        _ => {}
    }
}

/// Presence, width and shape of the primary key.
///
/// `auto_random` is set when the preprocessor removed a TiDB `AUTO_RANDOM`
/// attribute, which replaces `AUTO_INCREMENT`.
pub fn check_primary_key(facts: &CreateTableFacts, auto_random: bool, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    let Some(pk) = facts.primary_key() else {
        if params.check_table_primary_key {
            ctx.push(format!("表`{}`必须要有主键", facts.table.name));
        }
        return;
    };

    if pk.columns.len() > params.primarykey_max_key_parts as usize {
        ctx.push(format!(
            "表`{}`的主键列数为{}，超出了规则允许的上限{}",
            facts.table.name,
            pk.columns.len(),
            params.primarykey_max_key_parts
        ));
    }

    for name in &pk.columns {
        let Some(column) = facts.column(name) else {
            continue;
        };
        if params.check_primarykey_use_bigint && column.data_type != "BIGINT" {
            ctx.push(format!("主键`{}`必须使用BIGINT类型", column.name));
        }
        if params.check_primarykey_use_unsigned && !column.unsigned {
            ctx.push(format!("主键`{}`必须定义为UNSIGNED", column.name));
        }
        if params.check_primarykey_use_auto_increment && !column.auto_increment && !auto_random {
            ctx.push(format!("主键`{}`必须定义为AUTO_INCREMENT", column.name));
        }
    }
}

/// Creation and modification timestamps must both be present.
pub fn check_audit_columns(facts: &CreateTableFacts, ctx: &mut RuleHint<'_>) {
    if !ctx.params.check_table_audit_type_columns {
        return;
    }
    let updated = facts
        .columns
        .iter()
        .any(|c| c.defaults_to_current_timestamp() && c.updates_current_timestamp());
    let created = facts
        .columns
        .iter()
        .any(|c| c.defaults_to_current_timestamp() && !c.updates_current_timestamp());
    if !(created && updated) {
        ctx.push(format!(
            "表`{}`必须定义审计字段: 创建时间列(DEFAULT CURRENT_TIMESTAMP)和更新时间列(DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP)",
            facts.table.name
        ));
    }
}
