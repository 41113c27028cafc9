//! # groupmeans
//!
//! `groupmeans` is a small columnar table summarizer written in Rust. It
//! computes the arithmetic mean of every numeric column of a table, either
//! over the whole table or independently per group of a key column. It
//! supports:
//!
//! - In-memory table construction with per-column type tags (int, float,
//!   string) fixed at build time
//! - Per-cell missing values, excluded from every mean
//! - Memory-mapped CSV loading with parallel chunked parsing
//! - AVX2 SIMD summation for dense numeric columns (scalar fallback)
//!
//! # Example
//!
//! ```rust
//! use groupmeans::aggregator::table::Table;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let table = Table::builder()
//!         .str_column("biofluid", vec![
//!             Some("blood".into()), Some("blood".into()),
//!             Some("urine".into()), Some("urine".into()),
//!         ])
//!         .int_column("males", vec![Some(10), Some(30), Some(40), Some(60)])
//!         .build()?;
//!
//!     // Mean of every numeric column, one row per biofluid
//!     let means = table.column_means(Some("biofluid"))?;
//!     for row in 0..means.row_count() {
//!         println!("{:?} => {:?}", means.group_value(row), means.mean(row, "males"));
//!     }
//!
//!     // Or over the whole table
//!     let overall = table.column_means(None)?;
//!     assert_eq!(overall.mean(0, "males"), Some(35.0));
//!     Ok(())
//! }
//! ```

mod helpers;
pub mod aggregator;
