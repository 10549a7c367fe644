// src/export.rs

use csv::WriterBuilder;
use std::path::Path;

use crate::error::ReductionError;
use crate::results::{AveragedRecord, ResultsTable};

fn fmt_opt(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.4}"),
        None => "n/a".to_string(),
    }
}

/// Writes the per-run results table as tab-separated text, one row per
/// processed run. Signal-quality flags are explicit columns so the file
/// stands alone for review.
pub fn write_run_results(path: &Path, table: &ResultsTable) -> Result<(), ReductionError> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    writer.write_record([
        "run",
        "rate_hz",
        "samples",
        "duration_s",
        "flow_fit_kg_s",
        "flow_interval_kg_s",
        "flow_overall_kg_s",
        "flow_discrepancy_pct",
        "kiel_stbd_v",
        "kiel_port_v",
        "thrust_stbd_n",
        "thrust_port_n",
        "thrust_total_n",
        "torque_stbd_nm",
        "torque_port_nm",
        "torque_total_nm",
        "rpm_stbd",
        "rpm_port",
        "rpm_flags",
        "power_stbd_w",
        "power_port_w",
        "power_total_w",
    ])?;

    for row in table.iter() {
        let rpm_flags = match (row.rpm_stbd.no_signal, row.rpm_port.no_signal) {
            (false, false) => "ok",
            (true, false) => "no_signal_stbd",
            (false, true) => "no_signal_port",
            (true, true) => "no_signal_both",
        };
        writer.write_record([
            row.run_id.to_string(),
            format!("{:.2}", row.sample_rate_hz),
            row.sample_count.to_string(),
            format!("{:.2}", row.duration_s),
            format!("{:.4}", row.flow.instantaneous_kg_s),
            fmt_opt(row.flow.interval_mean_kg_s),
            format!("{:.4}", row.flow.overall_kg_s),
            fmt_opt(row.flow.discrepancy_pct),
            format!("{:.4}", row.kiel_stbd_v.mean),
            format!("{:.4}", row.kiel_port_v.mean),
            format!("{:.3}", row.thrust_stbd_n.mean),
            format!("{:.3}", row.thrust_port_n.mean),
            format!("{:.3}", row.thrust_total_n()),
            format!("{:.4}", row.torque_stbd_nm.mean),
            format!("{:.4}", row.torque_port_nm.mean),
            format!("{:.4}", row.torque_total_nm()),
            row.rpm_stbd.rpm.to_string(),
            row.rpm_port.rpm.to_string(),
            rpm_flags.to_string(),
            format!("{:.2}", row.power_stbd_w),
            format!("{:.2}", row.power_port_w),
            format!("{:.2}", row.power_total_w()),
        ])?;
    }
    writer.flush().map_err(ReductionError::Io)?;
    Ok(())
}

/// Writes the averaged operating-point table: one row per aggregation
/// group, mean / std dev / std error per quantity.
pub fn write_averaged_records(
    path: &Path,
    records: &[AveragedRecord],
) -> Result<(), ReductionError> {
    let mut writer = WriterBuilder::new().delimiter(b'\t').from_path(path)?;
    let mut header: Vec<String> = vec![
        "config".into(),
        "setpoint_rpm".into(),
        "runs".into(),
        "n_runs".into(),
        "n_no_signal".into(),
    ];
    for quantity in [
        "flow_fit_kg_s",
        "flow_interval_kg_s",
        "flow_overall_kg_s",
        "kiel_stbd_v",
        "kiel_port_v",
        "thrust_total_n",
        "torque_total_nm",
        "rpm_stbd",
        "rpm_port",
        "power_total_w",
    ] {
        header.push(format!("{quantity}_mean"));
        header.push(format!("{quantity}_std"));
        header.push(format!("{quantity}_sem"));
    }
    writer.write_record(&header)?;

    for record in records {
        let mut row: Vec<String> = vec![
            record.config.tag().to_string(),
            record.setpoint_rpm.to_string(),
            format!("{}-{}", record.run_ids.start(), record.run_ids.end()),
            record.n_runs.to_string(),
            record.n_no_signal.to_string(),
        ];
        let mut push_stats = |stats: Option<&crate::data_analysis::channel_stats::ChannelStats>| {
            match stats {
                Some(s) => {
                    row.push(format!("{:.4}", s.mean));
                    row.push(format!("{:.4}", s.std_dev));
                    row.push(format!("{:.4}", s.std_err));
                }
                None => {
                    row.push("n/a".into());
                    row.push("n/a".into());
                    row.push("n/a".into());
                }
            }
        };
        push_stats(Some(&record.flow_instantaneous));
        push_stats(record.flow_interval_mean.as_ref());
        push_stats(Some(&record.flow_overall));
        push_stats(Some(&record.kiel_stbd_v));
        push_stats(Some(&record.kiel_port_v));
        push_stats(Some(&record.thrust_total_n));
        push_stats(Some(&record.torque_total_nm));
        push_stats(record.rpm_stbd.as_ref());
        push_stats(record.rpm_port.as_ref());
        push_stats(record.power_total_w.as_ref());
        writer.write_record(&row)?;
    }
    writer.flush().map_err(ReductionError::Io)?;
    Ok(())
}

/// Stdout summary of one averaged record, for quick review during a
/// reduction session.
pub fn print_averaged_record(record: &AveragedRecord) {
    println!(
        "{} @ {} RPM ({} runs, runs {}-{}):",
        record.config.tag(),
        record.setpoint_rpm,
        record.n_runs,
        record.run_ids.start(),
        record.run_ids.end()
    );
    println!(
        "  flow overall: {:.3} +/- {:.3} kg/s (sem {:.3})",
        record.flow_overall.mean, record.flow_overall.std_dev, record.flow_overall.std_err
    );
    match &record.flow_interval_mean {
        Some(s) => println!("  flow interval mean: {:.3} kg/s", s.mean),
        None => println!("  flow interval mean: insufficient data"),
    }
    println!(
        "  thrust total: {:.2} N, torque total: {:.3} Nm",
        record.thrust_total_n.mean, record.torque_total_nm.mean
    );
    match &record.power_total_w {
        Some(s) => println!("  power total: {:.1} W (sem {:.1})", s.mean, s.std_err),
        None => println!("  power total: no fully-instrumented runs"),
    }
    for (label, stats) in [("stbd", &record.rpm_stbd), ("port", &record.rpm_port)] {
        match stats {
            Some(s) => println!("  rpm {}: {:.0} +/- {:.1}", label, s.mean, s.std_dev),
            None => println!("  rpm {label}: no signal"),
        }
    }
    if record.n_no_signal > 0 {
        println!("  ({} shaft trace(s) had no usable RPM signal)", record.n_no_signal);
    }
}


// src/export.rs
