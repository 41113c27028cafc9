use crate::utils::sample_csv_path;
use groupmeans::aggregator::table::Table;
mod utils;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = sample_csv_path();
    let (table, summary) = Table::load_csv(path.as_path())?;
    println!("Loaded {} rows", summary.rows_processed);

    // Per-biofluid means of every numeric column
    let means = table.column_means(Some("biofluid"))?;
    for row in 0..means.row_count() {
        println!(
            "{:?} => {:?}",
            means.group_value(row),
            means
                .value_columns()
                .iter()
                .zip(means.means(row))
                .collect::<Vec<_>>()
        );
    }

    Ok(())
}
