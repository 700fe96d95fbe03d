use std::collections::HashSet;

use super::{common::check_identifier, table::check_charset_and_collation};
use crate::{rules::RuleHint, traverses::ColumnFacts};

/// Duplicate column names inside one definition list.
pub fn check_duplicate_columns<'c>(
    columns: impl IntoIterator<Item = &'c ColumnFacts>,
    ctx: &mut RuleHint<'_>
) {
    let mut seen = HashSet::new();
    for column in columns {
        if !seen.insert(column.name.to_ascii_lowercase()) {
            ctx.push(format!("列`{}`重复定义", column.name));
        }
    }
}

/// Every per-column rule, for new and redefined columns alike.
pub fn check_columns<'c>(columns: impl IntoIterator<Item = &'c ColumnFacts>, ctx: &mut RuleHint<'_>) {
    for column in columns {
        check_column(column, ctx);
    }
}

fn check_column(column: &ColumnFacts, ctx: &mut RuleHint<'_>) {
    let params = ctx.params;
    let name = column.name.as_str();

    check_identifier("列名", name, params.max_column_name_length, ctx);

    if params.check_column_comment && column.comment.as_deref().is_none_or(str::is_empty) {
        ctx.push(format!("列`{}`必须要有注释", name));
    }

    if params.check_column_charset {
        check_charset_and_collation(
            &format!("列`{}`", name),
            column.charset.as_deref(),
            column.collation.as_deref(),
            ctx
        );
    }

    match column.data_type.as_str() {
        "CHAR" => {
            if let Some(len) = column.length()
                && len > params.column_max_char_length
            {
                ctx.push(format!(
                    "列`{}`的CHAR长度为{}，超过{}时请使用VARCHAR类型",
                    name, len, params.column_max_char_length
                ));
            }
        }
        "VARCHAR" => {
            if let Some(len) = column.length()
                && len > params.max_varchar_length
            {
                ctx.push(format!(
                    "列`{}`的VARCHAR长度为{}，超出了规则允许的上限{}",
                    name, len, params.max_varchar_length
                ));
            }
        }
        "JSON" if !params.enable_column_json_type => {
            ctx.push(format!("列`{}`禁止使用JSON类型", name));
        }
        "BIT" if !params.enable_column_bit_type => {
            ctx.push(format!("列`{}`禁止使用BIT类型", name));
        }
        "TIMESTAMP" if !params.enable_column_timestamp_type => {
            ctx.push(format!("列`{}`禁止使用TIMESTAMP类型，请使用DATETIME类型", name));
        }
        _ if column.is_blob_or_text() && !params.enable_column_blob_type => {
            ctx.push(format!("列`{}`禁止使用BLOB/TEXT类型", name));
        }
        _ => {}
    }

    let large_object = column.is_blob_or_text() || column.data_type == "JSON";
    if !params.enable_column_not_null
        && !column.not_null
        && !column.primary_key
        && !large_object
        && !(column.is_time() && params.enable_column_time_null)
    {
        ctx.push(format!("列`{}`必须定义为NOT NULL", name));
    }
    if !params.enable_column_time_null && column.is_time() && !column.not_null {
        ctx.push(format!("时间类型列`{}`必须定义为NOT NULL", name));
    }

    if params.check_column_default_value
        && column.default.is_none()
        && !column.auto_increment
        && !column.primary_key
        && !column.generated
        && !large_object
    {
        ctx.push(format!("列`{}`必须要有默认值", name));
    }

    if params.check_column_float_double && column.is_float() {
        ctx.push(format!("列`{}`的类型为{}，建议使用DECIMAL类型", name, column.data_type));
    }
}
