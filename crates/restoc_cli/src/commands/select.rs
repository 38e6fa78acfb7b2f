//! Select command implementation.

use restoc_codec::from_json;
use restoc_core::{FetchOptions, Filter, Limit, OrderBy};
use std::path::Path;

/// Arguments of the select command.
#[derive(Debug, Default)]
pub struct SelectArgs {
    /// Primary key value(s) as JSON.
    pub ids: Option<String>,
    /// Filter as a JSON object.
    pub filter: Option<String>,
    /// `a,!b` ordering.
    pub order_by: Option<String>,
    /// Row limit.
    pub limit: Option<u64>,
    /// `offset,count`.
    pub range: Option<String>,
    /// `SELECT DISTINCT`.
    pub distinct: bool,
    /// Comma separated columns.
    pub fields: Option<String>,
}

fn parse_range(s: &str) -> Result<Limit, Box<dyn std::error::Error>> {
    let (offset, count) = s.split_once(',').ok_or("range must be offset,count")?;
    Ok(Limit::Range {
        offset: offset.trim().parse()?,
        count: count.trim().parse()?,
    })
}

/// Runs the select command, returning the statement a read would send.
pub fn run(path: &Path, args: &SelectArgs) -> Result<String, Box<dyn std::error::Error>> {
    let (exec, table) = super::open(path)?;

    let ids = args.ids.as_deref().map(from_json).transpose()?;
    let filter = match &args.filter {
        Some(json) => Filter::from_value(&from_json(json)?)?,
        None => Filter::new(),
    };

    let mut opts = FetchOptions::new().distinct(args.distinct);
    if let Some(order_by) = &args.order_by {
        opts = opts.order_by(OrderBy::parse_list(order_by)?);
    }
    if let Some(n) = args.limit {
        opts = opts.limit(Limit::Count(n));
    }
    if let Some(range) = &args.range {
        opts = opts.limit(parse_range(range)?);
    }
    if let Some(fields) = &args.fields {
        opts = opts.fields(fields.split(',').map(str::trim));
    }

    table.get_rows(ids.as_ref(), &filter, &opts)?;
    Ok(exec.last_sql().ok_or("no statement was built")?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::fixture;

    #[test]
    fn everything() {
        let file = fixture::users();
        let args = SelectArgs {
            filter: Some(r#"{"age":{"gte":18}}"#.into()),
            order_by: Some("email,!age".into()),
            range: Some("20, 10".into()),
            fields: Some("_id, email".into()),
            ..SelectArgs::default()
        };
        assert_eq!(
            run(file.path(), &args).unwrap(),
            "SELECT `_id`,`email` FROM `app`.`users` WHERE `age` >= 18 ORDER BY `email`,`age` DESC LIMIT 20, 10"
        );
    }

    #[test]
    fn ids_and_distinct() {
        let file = fixture::users();
        let args = SelectArgs {
            ids: Some("[3,4]".into()),
            distinct: true,
            ..SelectArgs::default()
        };
        assert_eq!(
            run(file.path(), &args).unwrap(),
            "SELECT DISTINCT `_id`,`email`,`age` FROM `app`.`users` WHERE `_id` IN (3,4)"
        );
    }

    #[test]
    fn bad_range() {
        assert!(parse_range("10").is_err());
        assert!(parse_range("a,b").is_err());
    }
}
