use std::io::Write;
use std::path::PathBuf;

/// Writes a small biofluid dataset next to the system temp dir and returns
/// its path.
pub fn sample_csv_path() -> PathBuf {
    let path = std::env::temp_dir().join("groupmeans_sample.csv");
    let mut file = std::fs::File::create(&path).expect("Cannot create sample CSV");
    write!(
        file,
        "id,biofluid,males,females\n\
         1,blood,10,15\n\
         2,blood,20,25\n\
         3,blood,30,NA\n\
         4,urine,40,45\n\
         5,urine,50,55\n\
         6,urine,60,65\n"
    )
    .expect("Cannot write sample CSV");
    path
}
