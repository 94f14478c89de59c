//! Catalog filler
//!
//! Generates books, authors and links from a seeded RNG, then inserts them
//! in one write transaction. Content is reproducible for a given seed; row
//! ids come from the supplied generator so a catalog can be filled twice.

#![allow(clippy::result_large_err)]

use crate::dialect::TxMode;
use crate::errors::Result;
use crate::exec::{in_transaction, Executor};
use crate::repo::CatalogRepo;
use crate::seed::words;
use chrono::{Duration, NaiveDate};
use libris_core::ids::IdGenerator;
use libris_core::model::NewBook;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::time::Instant;
use uuid::Uuid;

/// Authors inserted per statement
const AUTHOR_CHUNK: usize = 100;

/// How much data to generate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedPlan {
    pub books: usize,
    pub authors: usize,
    pub seed: u64,
}

impl Default for SeedPlan {
    fn default() -> Self {
        Self {
            books: 1000,
            authors: 100,
            seed: 0,
        }
    }
}

/// Rows actually inserted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub books: u64,
    pub authors: u64,
    pub links: u64,
}

/// Generated catalog content, before ids are assigned
struct Generated {
    books: Vec<NewBook>,
    author_names: Vec<String>,
    /// `(book index, author index)`; may repeat a pair
    links: Vec<(usize, usize)>,
}

fn generate(plan: &SeedPlan) -> Generated {
    let mut rng = StdRng::seed_from_u64(plan.seed);

    let first = NaiveDate::from_ymd_opt(1950, 1, 1).unwrap_or(NaiveDate::MIN);
    let last = NaiveDate::from_ymd_opt(2022, 12, 31).unwrap_or(first);
    let span = (last - first).num_days();

    let books = (0..plan.books)
        .map(|_| {
            let offset = rng.gen_range(0..=span);
            NewBook {
                title: words::title(&mut rng),
                number_of_pages: rng.gen_range(100..=999),
                published_at: first
                    .checked_add_signed(Duration::days(offset))
                    .unwrap_or(first),
                authors: Vec::new(),
            }
        })
        .collect();

    let mut seen = HashSet::new();
    let author_names = (0..plan.authors)
        .map(|i| {
            let name = words::author_name(&mut rng);
            let name = if seen.contains(&name) {
                format!("{} {}", name, i + 1)
            } else {
                name
            };
            seen.insert(name.clone());
            name
        })
        .collect();

    let mut links = Vec::new();
    if plan.authors > 0 {
        for book in 0..plan.books {
            links.push((book, rng.gen_range(0..plan.authors)));
            while rng.gen_range(0..10) > 5 {
                links.push((book, rng.gen_range(0..plan.authors)));
            }
        }
    }

    Generated {
        books,
        author_names,
        links,
    }
}

/// Fill the catalog according to `plan`
///
/// Authors whose names already exist are reused.
///
/// # Errors
/// Any statement failure; nothing is kept in that case.
pub fn fill(
    exec: &mut dyn Executor,
    ids: &dyn IdGenerator,
    plan: &SeedPlan,
) -> Result<SeedReport> {
    let start = Instant::now();
    let generated = generate(plan);

    let report = in_transaction(exec, TxMode::Write, "seed_fill", |exec| {
        let mut report = SeedReport::default();

        let mut author_ids: HashMap<String, Uuid> = HashMap::new();
        for names in generated.author_names.chunks(AUTHOR_CHUNK) {
            let fresh: Vec<Uuid> = names.iter().map(|_| ids.next_id()).collect();
            report.authors += CatalogRepo::insert_authors_skip_conflicts(exec, &fresh, names)?;
            for author in CatalogRepo::select_authors_by_name(exec, names)? {
                author_ids.insert(author.name, author.id);
            }
        }

        let mut book_ids = Vec::with_capacity(generated.books.len());
        for book in &generated.books {
            book_ids.push(CatalogRepo::insert_book(exec, ids.next_id(), book)?);
            report.books += 1;
        }

        for (book, author) in &generated.links {
            let Some(author_id) = generated
                .author_names
                .get(*author)
                .and_then(|name| author_ids.get(name))
            else {
                continue;
            };
            report.links += CatalogRepo::link_authors(exec, book_ids[*book], &[*author_id])?;
        }

        Ok(report)
    })?;

    tracing::info!(
        component = module_path!(),
        op = "seed_fill",
        books = report.books,
        authors = report.authors,
        links = report.links,
        duration_ms = start.elapsed().as_millis() as u64,
        "catalog filled"
    );
    Ok(report)
}
