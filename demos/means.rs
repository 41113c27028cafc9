use groupmeans::aggregator::table::Table;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let table = Table::builder()
        .int_column("var1", vec![Some(1), Some(2), Some(3)])
        .int_column("var2", vec![Some(4), Some(5), Some(6)])
        .build()?;

    // Mean of every numeric column over the whole table
    let means = table.column_means(None)?;
    for (name, mean) in means.value_columns().iter().zip(means.means(0)) {
        println!("{} => {:?}", name, mean);
    }

    Ok(())
}
