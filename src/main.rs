// src/main.rs

use clap::Parser;
use log::{error, info};
use std::error::Error;
use std::path::{Path, PathBuf};

use towtank_reduce::data_input::log_parser::{parse_calibration_file, parse_run_log};
use towtank_reduce::data_input::run_config::parse_run_groups;
use towtank_reduce::data_input::run_data::WindowPolicy;
use towtank_reduce::export::{print_averaged_record, write_averaged_records, write_run_results};
use towtank_reduce::results::{aggregate, reduce_run, ResultsTable};

/// Reduces towing-tank propulsion run recordings into per-run quantities
/// and per-setpoint statistics.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Instrument log files, one per run. The run id is the first integer
    /// in the file stem (e.g. run_017.csv -> 17).
    #[arg(required = true)]
    runs: Vec<PathBuf>,

    /// Flat 24-value calibration file shared by the listed runs.
    #[arg(short, long)]
    calibration: PathBuf,

    /// Run-group table (config, setpoint_rpm, first_run, last_run) for the
    /// aggregation phase. Without it only per-run results are produced.
    #[arg(short, long)]
    groups: Option<PathBuf>,

    /// Use the reduced end trims for short-duration runs.
    #[arg(long)]
    short_runs: bool,

    /// Directory for the output tables.
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,
}

/// First contiguous digit sequence in the file stem, the tank's run
/// numbering convention.
fn run_id_from_stem(path: &Path) -> Option<u32> {
    let stem = path.file_stem()?.to_string_lossy();
    let digits: String = stem
        .chars()
        .skip_while(|c| !c.is_ascii_digit())
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().ok()
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let calibration = parse_calibration_file(&cli.calibration)?;
    let window = if cli.short_runs {
        WindowPolicy::short()
    } else {
        WindowPolicy::standard()
    };

    // Per-run loop: each run is independent, a failed run aborts only
    // itself.
    let mut table = ResultsTable::new();
    for path in &cli.runs {
        // A guessed id could collide with a real one and replace its row,
        // so an unidentifiable file is skipped outright.
        let id = match run_id_from_stem(path) {
            Some(id) => id,
            None => {
                error!("{}: no run id in file name, skipping", path.display());
                continue;
            }
        };
        let run = match parse_run_log(path, id, calibration.clone(), window) {
            Ok(run) => run,
            Err(e) => {
                error!("run {id} ({}): {e}", path.display());
                continue;
            }
        };
        match reduce_run(&run) {
            Ok(result) => {
                println!(
                    "run {:>3}: flow {:.3} kg/s, rpm {}/{}, power {:.1} W",
                    result.run_id,
                    result.flow.overall_kg_s,
                    result.rpm_stbd.rpm,
                    result.rpm_port.rpm,
                    result.power_total_w()
                );
                table.insert(result);
            }
            Err(e) => error!("run {id}: {e}"),
        }
    }
    info!("processed {} of {} runs", table.len(), cli.runs.len());

    std::fs::create_dir_all(&cli.out_dir)?;
    let run_table_path = cli.out_dir.join("run_results.tsv");
    write_run_results(&run_table_path, &table)?;
    println!("wrote {}", run_table_path.display());

    // Aggregation phase: groups are external configuration, one bad group
    // does not stop the others.
    if let Some(groups_path) = &cli.groups {
        let groups = parse_run_groups(groups_path)?;
        let mut records = Vec::new();
        for group in &groups {
            match aggregate(&table, group) {
                Ok(record) => {
                    print_averaged_record(&record);
                    records.push(record);
                }
                Err(e) => error!("group {}: {e}", group.label()),
            }
        }
        let averaged_path = cli.out_dir.join("averaged_records.tsv");
        write_averaged_records(&averaged_path, &records)?;
        println!("wrote {}", averaged_path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run_id_from_stem;
    use std::path::Path;

    #[test]
    fn run_id_comes_from_first_digit_group() {
        assert_eq!(run_id_from_stem(Path::new("run_017.csv")), Some(17));
        assert_eq!(run_id_from_stem(Path::new("17b_retest.csv")), Some(17));
        assert_eq!(run_id_from_stem(Path::new("data/tank2019/run3.tsv")), Some(3));
    }

    #[test]
    fn file_without_digits_has_no_run_id() {
        assert_eq!(run_id_from_stem(Path::new("calibration.csv")), None);
    }
}

// src/main.rs
