//! Parameter binder
//!
//! Produces the argument list a `CompiledQuery` expects, one argument per
//! slot, and checks it against the placeholders actually present in the SQL.

use crate::compiler::{CompiledQuery, ParamSlot};
use crate::dialect::PlaceholderStyle;
use crate::errors::{binding_error, Result};
use chrono::NaiveDate;
use libris_core::model::{BookQuery, NewBook};
use std::collections::BTreeSet;
use std::fmt;
use uuid::Uuid;

/// A bound argument value
#[derive(Clone, PartialEq, Eq)]
pub enum Arg {
    Text(String),
    Integer(i64),
    Uuid(Uuid),
    Date(NaiveDate),
}

impl fmt::Debug for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Text(s) => write!(f, "{:?}", s),
            Arg::Integer(i) => write!(f, "{}", i),
            Arg::Uuid(u) => write!(f, "{}", u),
            Arg::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
        }
    }
}

/// Anything that can supply values for parameter slots
pub trait SlotSource {
    /// The value for `slot`, or `None` if this source has none.
    fn arg_for(&self, slot: ParamSlot) -> Option<Arg>;
}

/// Listing input. The search term is lower-cased here so the SQL only has to
/// lower-case the column side.
impl SlotSource for BookQuery {
    fn arg_for(&self, slot: ParamSlot) -> Option<Arg> {
        match slot {
            ParamSlot::Search => self.search.as_ref().map(|s| Arg::Text(s.to_lowercase())),
            ParamSlot::Limit => Some(Arg::Integer(i64::from(self.limit))),
            ParamSlot::Offset => i64::try_from(self.offset).ok().map(Arg::Integer),
            _ => None,
        }
    }
}

/// A book row about to be inserted
#[derive(Debug, Clone, Copy)]
pub struct BookRow<'a> {
    pub id: Uuid,
    pub book: &'a NewBook,
}

impl SlotSource for BookRow<'_> {
    fn arg_for(&self, slot: ParamSlot) -> Option<Arg> {
        match slot {
            ParamSlot::BookId => Some(Arg::Uuid(self.id)),
            ParamSlot::Title => Some(Arg::Text(self.book.title.clone())),
            ParamSlot::NumberOfPages => Some(Arg::Integer(self.book.number_of_pages)),
            ParamSlot::PublishedAt => Some(Arg::Date(self.book.published_at)),
            _ => None,
        }
    }
}

/// Author rows; `ids` may be empty when only names are needed
#[derive(Debug, Clone, Copy)]
pub struct AuthorRows<'a> {
    pub ids: &'a [Uuid],
    pub names: &'a [String],
}

impl SlotSource for AuthorRows<'_> {
    fn arg_for(&self, slot: ParamSlot) -> Option<Arg> {
        match slot {
            ParamSlot::AuthorId(i) => self.ids.get(i).copied().map(Arg::Uuid),
            ParamSlot::AuthorName(i) => self.names.get(i).cloned().map(Arg::Text),
            _ => None,
        }
    }
}

/// One book linked to several authors
#[derive(Debug, Clone, Copy)]
pub struct LinkRows<'a> {
    pub book_id: Uuid,
    pub author_ids: &'a [Uuid],
}

impl SlotSource for LinkRows<'_> {
    fn arg_for(&self, slot: ParamSlot) -> Option<Arg> {
        match slot {
            ParamSlot::BookId => Some(Arg::Uuid(self.book_id)),
            ParamSlot::AuthorId(i) => self.author_ids.get(i).copied().map(Arg::Uuid),
            _ => None,
        }
    }
}

/// Build the argument list for `query` from `source`
///
/// # Errors
/// `Binding` if a slot has no value in the source, or if the number of
/// arguments does not match the placeholders in the SQL text.
pub fn bind(query: &CompiledQuery, source: &impl SlotSource) -> Result<Vec<Arg>> {
    let args = query
        .slots
        .iter()
        .map(|slot| {
            source.arg_for(*slot).ok_or_else(|| {
                binding_error(query.name, format!("no value for parameter slot {:?}", slot))
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let expected = count_placeholders(&query.sql, query.dialect.placeholder_style());
    if args.len() != expected {
        return Err(binding_error(
            query.name,
            format!(
                "statement has {} placeholders but {} arguments were bound",
                expected,
                args.len()
            ),
        ));
    }
    Ok(args)
}

/// Number of arguments the SQL text expects: distinct numbers for
/// numbered placeholders, occurrences for positional ones. Quoted string
/// literals are skipped.
pub fn count_placeholders(sql: &str, style: PlaceholderStyle) -> usize {
    let mut in_literal = false;
    let mut positional = 0;
    let mut numbered = BTreeSet::new();
    let mut chars = sql.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c == '\'' {
            in_literal = !in_literal;
            continue;
        }
        if in_literal {
            continue;
        }
        match style {
            PlaceholderStyle::Positional { symbol } if symbol.starts_with(c) => positional += 1,
            PlaceholderStyle::Numbered { prefix } if prefix.starts_with(c) => {
                let mut digits = String::new();
                while let Some((_, d)) = chars.peek().copied().filter(|(_, d)| d.is_ascii_digit()) {
                    digits.push(d);
                    chars.next();
                }
                if let Ok(n) = digits.parse::<usize>() {
                    numbered.insert(n);
                }
            }
            _ => {}
        }
    }

    match style {
        PlaceholderStyle::Positional { .. } => positional,
        PlaceholderStyle::Numbered { .. } => numbered.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{compile_insert_book, compile_link_authors, compile_read, ReadShape};
    use crate::dialect::Dialect;
    use libris_core::errors::LbErrorKind;

    #[test]
    fn test_search_bound_once_on_postgres_twice_on_sqlite() {
        let query = BookQuery::default().with_search("DuNe");

        let pg = compile_read(Dialect::Postgres, ReadShape::Page, &query);
        let args = bind(&pg, &query).unwrap();
        assert_eq!(args, vec![Arg::Text("dune".to_string()), Arg::Integer(10)]);

        let lite = compile_read(Dialect::Sqlite, ReadShape::Page, &query);
        let args = bind(&lite, &query).unwrap();
        assert_eq!(
            args,
            vec![
                Arg::Text("dune".to_string()),
                Arg::Text("dune".to_string()),
                Arg::Integer(10)
            ]
        );
    }

    #[test]
    fn test_search_term_is_lower_cased_with_unicode_rules() {
        let query = BookQuery::default().with_search("ÉCOLE Ørsted");
        assert_eq!(
            query.arg_for(ParamSlot::Search),
            Some(Arg::Text("école ørsted".to_string()))
        );
    }

    #[test]
    fn test_missing_slot_value_is_binding_error() {
        let with_search = BookQuery::default().with_search("x");
        let compiled = compile_read(Dialect::Sqlite, ReadShape::Count, &with_search);

        let err = bind(&compiled, &BookQuery::default()).unwrap_err();
        assert_eq!(err.kind(), LbErrorKind::Binding);
    }

    #[test]
    fn test_placeholder_mismatch_is_binding_error() {
        let mut compiled = compile_insert_book(Dialect::Postgres);
        compiled.sql.push_str(" -- $5");
        let book = NewBook {
            title: "t".to_string(),
            number_of_pages: 1,
            published_at: NaiveDate::from_ymd_opt(2000, 1, 1).unwrap(),
            authors: vec!["a".to_string()],
        };

        let err = bind(&compiled, &BookRow { id: Uuid::nil(), book: &book }).unwrap_err();
        assert_eq!(err.kind(), LbErrorKind::Binding);
        assert!(err.message().contains("5 placeholders"));
    }

    #[test]
    fn test_link_rows_bind_book_id_per_row_on_sqlite() {
        let ids = [Uuid::from_u64_pair(0, 1), Uuid::from_u64_pair(0, 2)];
        let book_id = Uuid::from_u64_pair(9, 9);
        let compiled = compile_link_authors(Dialect::Sqlite, 2).unwrap();

        let args = bind(&compiled, &LinkRows { book_id, author_ids: &ids }).unwrap();

        assert_eq!(
            args,
            vec![
                Arg::Uuid(book_id),
                Arg::Uuid(ids[0]),
                Arg::Uuid(book_id),
                Arg::Uuid(ids[1])
            ]
        );
    }

    #[test]
    fn test_count_placeholders_skips_literals() {
        let positional = PlaceholderStyle::Positional { symbol: "?" };
        assert_eq!(count_placeholders("SELECT '?', ? FROM t WHERE a = ?", positional), 2);

        let numbered = PlaceholderStyle::Numbered { prefix: "$" };
        assert_eq!(
            count_placeholders("SELECT $1, '$9' WHERE a = $1 OR b = $2", numbered),
            2
        );
    }

    #[test]
    fn test_arg_debug_is_compact() {
        assert_eq!(format!("{:?}", Arg::Text("ada".into())), "\"ada\"");
        assert_eq!(
            format!("{:?}", Arg::Date(NaiveDate::from_ymd_opt(1999, 12, 31).unwrap())),
            "1999-12-31"
        );
    }
}
