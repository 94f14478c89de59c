use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A catalog author. Names are unique across the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
}

/// A book together with its authors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub number_of_pages: i64,
    pub published_at: NaiveDate,
    #[serde(default)]
    pub authors: Vec<Author>,
}

/// A row of the book/author relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BookAuthor {
    pub book_id: Uuid,
    pub author_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_book_wire_format() {
        let book = Book {
            id: Uuid::nil(),
            title: "Dune".to_string(),
            number_of_pages: 412,
            published_at: NaiveDate::from_ymd_opt(1965, 8, 1).unwrap(),
            authors: vec![Author {
                id: Uuid::nil(),
                name: "Frank Herbert".to_string(),
            }],
        };

        let json = serde_json::to_value(&book).unwrap();
        assert_eq!(json["published_at"], "1965-08-01");
        assert_eq!(json["number_of_pages"], 412);
        assert_eq!(json["authors"][0]["name"], "Frank Herbert");
    }

    #[test]
    fn test_missing_authors_decode_as_empty() {
        let json = r#"{"id":"00000000-0000-0000-0000-000000000000","title":"t","number_of_pages":1,"published_at":"2001-01-01"}"#;
        let book: Book = serde_json::from_str(json).unwrap();
        assert!(book.authors.is_empty());
    }
}
