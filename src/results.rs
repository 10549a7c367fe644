// src/results.rs

use log::{info, warn};
use ndarray::{aview1, s};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;

use crate::constants::{FLOW_DISCREPANCY_REVIEW_PCT, RPM_PEAK_THRESHOLD_V, RPM_TRANSIENT_SKIP_SAMPLES};
use crate::data_analysis::calibration::{calibrate, calibrate_wave_probe};
use crate::data_analysis::channel_stats::{windowed_stats, ChannelStats};
use crate::data_analysis::flow_rate::{estimate_flow_rate, FlowRateEstimate};
use crate::data_analysis::shaft_speed::{estimate_shaft_rpm, RpmEstimate};
use crate::data_input::run_config::{PropulsionConfig, RunGroup};
use crate::data_input::run_data::{ChannelRole, Run};
use crate::error::ReductionError;

/// Everything derived from one run. Signal-quality conditions ride along as
/// flags (`RpmEstimate::no_signal`, `FlowRateEstimate::insufficient_data`)
/// so the aggregation layer can filter instead of fail.
#[derive(Debug, Clone)]
pub struct RunResult {
    pub run_id: u32,
    pub sample_rate_hz: f64,
    pub sample_count: usize,
    pub duration_s: f64,
    pub flow: FlowRateEstimate,
    pub kiel_stbd_v: ChannelStats,
    pub kiel_port_v: ChannelStats,
    pub thrust_stbd_n: ChannelStats,
    pub thrust_port_n: ChannelStats,
    pub torque_stbd_nm: ChannelStats,
    pub torque_port_nm: ChannelStats,
    pub rpm_stbd: RpmEstimate,
    pub rpm_port: RpmEstimate,
    pub power_stbd_w: f64,
    pub power_port_w: f64,
}

impl RunResult {
    pub fn thrust_total_n(&self) -> f64 {
        self.thrust_stbd_n.mean + self.thrust_port_n.mean
    }

    pub fn torque_total_nm(&self) -> f64 {
        self.torque_stbd_nm.mean + self.torque_port_nm.mean
    }

    pub fn power_total_w(&self) -> f64 {
        self.power_stbd_w + self.power_port_w
    }
}

/// Mechanical shaft power from mean torque and shaft speed.
pub fn shaft_power_w(torque_nm: f64, rpm: &RpmEstimate) -> f64 {
    torque_nm * 2.0 * std::f64::consts::PI * rpm.rpm as f64 / 60.0
}

/// Runs the full per-run reduction: calibration, window extraction, flow
/// rate and shaft speed, channel statistics, derived power. Strictly
/// sequential; no step needs a later one.
pub fn reduce_run(run: &Run) -> Result<RunResult, ReductionError> {
    let (start, end) = run.window_bounds()?;
    let window_time = run.time.slice(s![start..end]);

    // Wave probe: cumulative collected mass, reduced to a rate.
    let probe_cal = run.calibration.channel(ChannelRole::WaveProbe);
    let (mass_kg, _) = calibrate_wave_probe(run.channel(ChannelRole::WaveProbe), probe_cal.zero);
    let flow = estimate_flow_rate(window_time, mass_kg.slice(s![start..end]))?;

    if let Some(discrepancy) = flow.discrepancy_pct {
        if discrepancy > FLOW_DISCREPANCY_REVIEW_PCT {
            warn!(
                "run {}: flow-rate cross-check off by {:.2}% (interval mean vs overall)",
                run.id, discrepancy
            );
        }
    }
    if flow.insufficient_data {
        warn!("run {}: analysis window shorter than 1 s, interval flow rate absent", run.id);
    }

    // Windowed statistics of the calibrated slow channels.
    let windowed = |role: ChannelRole| -> Result<ChannelStats, ReductionError> {
        let record = run.calibration.channel(role);
        let (physical, _) = calibrate(run.channel(role), record);
        windowed_stats(physical.slice(s![start..end])).ok_or(ReductionError::EmptyWindow {
            start_trim: start,
            end_trim: run.sample_count() - end,
            len: run.sample_count(),
        })
    };
    let kiel_stbd_v = windowed(ChannelRole::KielStbd)?;
    let kiel_port_v = windowed(ChannelRole::KielPort)?;
    let thrust_stbd_n = windowed(ChannelRole::ThrustStbd)?;
    let thrust_port_n = windowed(ChannelRole::ThrustPort)?;
    let torque_stbd_nm = windowed(ChannelRole::TorqueStbd)?;
    let torque_port_nm = windowed(ChannelRole::TorquePort)?;

    // Shaft speed from the raw inductive traces (thresholds are in sensor
    // volts, so no calibration pass here).
    let rpm_stbd = estimate_shaft_rpm(
        &run.time,
        run.channel(ChannelRole::RpmStbd),
        RPM_TRANSIENT_SKIP_SAMPLES,
        RPM_PEAK_THRESHOLD_V,
    );
    let rpm_port = estimate_shaft_rpm(
        &run.time,
        run.channel(ChannelRole::RpmPort),
        RPM_TRANSIENT_SKIP_SAMPLES,
        RPM_PEAK_THRESHOLD_V,
    );
    for (shaft, estimate) in [("stbd", &rpm_stbd), ("port", &rpm_port)] {
        if estimate.no_signal {
            info!("run {}: no usable {} RPM signal", run.id, shaft);
        }
    }

    let power_stbd_w = shaft_power_w(torque_stbd_nm.mean, &rpm_stbd);
    let power_port_w = shaft_power_w(torque_port_nm.mean, &rpm_port);

    Ok(RunResult {
        run_id: run.id,
        sample_rate_hz: run.sample_rate(),
        sample_count: run.sample_count(),
        duration_s: run.duration_s(),
        flow,
        kiel_stbd_v,
        kiel_port_v,
        thrust_stbd_n,
        thrust_port_n,
        torque_stbd_nm,
        torque_port_nm,
        rpm_stbd,
        rpm_port,
        power_stbd_w,
        power_port_w,
    })
}

/// Per-run results keyed by run id. A skipped or failed run is simply
/// absent; there are no placeholder rows for downstream code to filter.
#[derive(Debug, Default)]
pub struct ResultsTable {
    rows: BTreeMap<u32, RunResult>,
}

impl ResultsTable {
    pub fn new() -> Self {
        ResultsTable::default()
    }

    /// Inserts a result; re-processing the same run id replaces the row.
    pub fn insert(&mut self, result: RunResult) {
        if self.rows.insert(result.run_id, result).is_some() {
            info!("results table: replaced existing row");
        }
    }

    pub fn get(&self, run_id: u32) -> Option<&RunResult> {
        self.rows.get(&run_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &RunResult> {
        self.rows.values()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Cross-run statistics for one aggregation group. Every quantity carries
/// mean / std dev / std error over the group's rows (n = number of runs).
/// RPM, shaft-power and interval-flow statistics are absent when no member
/// run had a usable value; the fabricated zero RPM (and the zero power
/// derived from it) of a no-signal row never enters the averages.
#[derive(Debug, Clone)]
pub struct AveragedRecord {
    pub config: PropulsionConfig,
    pub setpoint_rpm: u32,
    pub run_ids: RangeInclusive<u32>,
    pub n_runs: usize,
    pub n_no_signal: usize,
    pub flow_instantaneous: ChannelStats,
    pub flow_interval_mean: Option<ChannelStats>,
    pub flow_overall: ChannelStats,
    pub kiel_stbd_v: ChannelStats,
    pub kiel_port_v: ChannelStats,
    pub thrust_stbd_n: ChannelStats,
    pub thrust_port_n: ChannelStats,
    pub thrust_total_n: ChannelStats,
    pub torque_stbd_nm: ChannelStats,
    pub torque_port_nm: ChannelStats,
    pub torque_total_nm: ChannelStats,
    pub rpm_stbd: Option<ChannelStats>,
    pub rpm_port: Option<ChannelStats>,
    pub power_stbd_w: Option<ChannelStats>,
    pub power_port_w: Option<ChannelStats>,
    pub power_total_w: Option<ChannelStats>,
}

fn cross_run_stats(values: &[f64]) -> Option<ChannelStats> {
    windowed_stats(aview1(values))
}

const ZERO_STATS: ChannelStats = ChannelStats {
    mean: 0.0,
    std_dev: 0.0,
    std_err: 0.0,
};

/// Combines the group's present rows into an `AveragedRecord`. Group
/// membership is externally supplied; a group whose id range matches no
/// processed run is a configuration error.
pub fn aggregate(table: &ResultsTable, group: &RunGroup) -> Result<AveragedRecord, ReductionError> {
    let members: Vec<&RunResult> = group
        .run_ids
        .clone()
        .filter_map(|id| table.get(id))
        .collect();
    if members.is_empty() {
        return Err(ReductionError::NoGroupMembers {
            tag: group.label(),
        });
    }

    let column = |f: &dyn Fn(&RunResult) -> f64| -> ChannelStats {
        let values: Vec<f64> = members.iter().map(|r| f(r)).collect();
        cross_run_stats(&values).unwrap_or(ZERO_STATS)
    };

    // RPM columns exclude no-signal rows; an inactive shaft in a
    // single-train configuration legitimately has none at all.
    let rpm_column = |f: &dyn Fn(&RunResult) -> &RpmEstimate| -> Option<ChannelStats> {
        let values: Vec<f64> = members
            .iter()
            .map(|r| f(r))
            .filter(|e| !e.no_signal)
            .map(|e| e.rpm as f64)
            .collect();
        cross_run_stats(&values)
    };

    // Shaft power is derived from the RPM estimate, so a no-signal row's
    // power is just as fabricated as its zero RPM and is filtered the same
    // way. The total needs both shafts instrumented.
    let power_column = |signal: &dyn Fn(&RunResult) -> bool,
                        value: &dyn Fn(&RunResult) -> f64|
     -> Option<ChannelStats> {
        let values: Vec<f64> = members
            .iter()
            .filter(|r| signal(r))
            .map(|r| value(r))
            .collect();
        cross_run_stats(&values)
    };

    let interval_values: Vec<f64> = members
        .iter()
        .filter_map(|r| r.flow.interval_mean_kg_s)
        .collect();
    let n_no_signal = members
        .iter()
        .map(|r| usize::from(r.rpm_stbd.no_signal) + usize::from(r.rpm_port.no_signal))
        .sum();

    Ok(AveragedRecord {
        config: group.config,
        setpoint_rpm: group.setpoint_rpm,
        run_ids: group.run_ids.clone(),
        n_runs: members.len(),
        n_no_signal,
        flow_instantaneous: column(&|r| r.flow.instantaneous_kg_s),
        flow_interval_mean: cross_run_stats(&interval_values),
        flow_overall: column(&|r| r.flow.overall_kg_s),
        kiel_stbd_v: column(&|r| r.kiel_stbd_v.mean),
        kiel_port_v: column(&|r| r.kiel_port_v.mean),
        thrust_stbd_n: column(&|r| r.thrust_stbd_n.mean),
        thrust_port_n: column(&|r| r.thrust_port_n.mean),
        thrust_total_n: column(&|r| r.thrust_total_n()),
        torque_stbd_nm: column(&|r| r.torque_stbd_nm.mean),
        torque_port_nm: column(&|r| r.torque_port_nm.mean),
        torque_total_nm: column(&|r| r.torque_total_nm()),
        rpm_stbd: rpm_column(&|r| &r.rpm_stbd),
        rpm_port: rpm_column(&|r| &r.rpm_port),
        power_stbd_w: power_column(&|r| !r.rpm_stbd.no_signal, &|r| r.power_stbd_w),
        power_port_w: power_column(&|r| !r.rpm_port.no_signal, &|r| r.power_port_w),
        power_total_w: power_column(
            &|r| !r.rpm_stbd.no_signal && !r.rpm_port.no_signal,
            &|r| r.power_total_w(),
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(mean: f64) -> ChannelStats {
        ChannelStats {
            mean,
            std_dev: 0.0,
            std_err: 0.0,
        }
    }

    fn synthetic_result(run_id: u32, flow_overall: f64) -> RunResult {
        RunResult {
            run_id,
            sample_rate_hz: 800.0,
            sample_count: 24000,
            duration_s: 30.0,
            flow: FlowRateEstimate {
                instantaneous_kg_s: flow_overall,
                interval_mean_kg_s: Some(flow_overall),
                overall_kg_s: flow_overall,
                discrepancy_pct: Some(0.0),
                insufficient_data: false,
            },
            kiel_stbd_v: stats(1.2),
            kiel_port_v: stats(1.1),
            thrust_stbd_n: stats(40.0),
            thrust_port_n: stats(42.0),
            torque_stbd_nm: stats(6.0),
            torque_port_nm: stats(6.1),
            rpm_stbd: RpmEstimate::measured(1500),
            rpm_port: RpmEstimate::measured(1498),
            power_stbd_w: 940.0,
            power_port_w: 955.0,
        }
    }

    fn group(first: u32, last: u32) -> RunGroup {
        RunGroup::new(PropulsionConfig::Combined, 1500, first, last).unwrap()
    }

    #[test]
    fn single_run_group_is_the_identity() {
        let mut table = ResultsTable::new();
        table.insert(synthetic_result(4, 2.5));
        let record = aggregate(&table, &group(4, 4)).unwrap();
        assert_eq!(record.n_runs, 1);
        assert_eq!(record.flow_overall.mean, 2.5);
        assert_eq!(record.flow_overall.std_dev, 0.0);
        assert_eq!(record.thrust_total_n.mean, 82.0);
        assert_eq!(record.power_total_w.unwrap().mean, 1895.0);
    }

    #[test]
    fn identical_members_have_zero_spread() {
        let mut table = ResultsTable::new();
        for id in 1..=5 {
            table.insert(synthetic_result(id, 3.25));
        }
        let record = aggregate(&table, &group(1, 5)).unwrap();
        assert_eq!(record.n_runs, 5);
        assert_eq!(record.flow_instantaneous.mean, 3.25);
        assert_eq!(record.flow_instantaneous.std_dev, 0.0);
        assert_eq!(record.flow_instantaneous.std_err, 0.0);
    }

    #[test]
    fn repeated_runs_aggregate_mean_and_spread() {
        let mut table = ResultsTable::new();
        for (id, flow) in [(7, 2.50), (8, 2.52), (9, 2.48)] {
            table.insert(synthetic_result(id, flow));
        }
        let record = aggregate(&table, &group(7, 9)).unwrap();
        assert!((record.flow_overall.mean - 2.50).abs() < 1e-12);
        assert!((record.flow_overall.std_dev - 0.02).abs() < 1e-9);
        assert!((record.flow_overall.std_err - 0.02 / 3.0f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn absent_runs_are_skipped_not_zeroed() {
        let mut table = ResultsTable::new();
        table.insert(synthetic_result(1, 2.0));
        table.insert(synthetic_result(3, 4.0));
        // Run 2 failed and was never inserted.
        let record = aggregate(&table, &group(1, 3)).unwrap();
        assert_eq!(record.n_runs, 2);
        assert!((record.flow_overall.mean - 3.0).abs() < 1e-12);
    }

    #[test]
    fn group_with_no_members_is_an_error() {
        let table = ResultsTable::new();
        assert!(matches!(
            aggregate(&table, &group(1, 3)),
            Err(ReductionError::NoGroupMembers { .. })
        ));
    }

    #[test]
    fn no_signal_rpm_rows_are_filtered() {
        let mut table = ResultsTable::new();
        let mut degraded = synthetic_result(1, 2.5);
        degraded.rpm_stbd = RpmEstimate::no_signal();
        table.insert(degraded);
        table.insert(synthetic_result(2, 2.5));
        let record = aggregate(&table, &group(1, 2)).unwrap();
        assert_eq!(record.n_no_signal, 1);
        // Only run 2 contributes a starboard RPM.
        assert_eq!(record.rpm_stbd.unwrap().mean, 1500.0);
        // Port shaft had signal on both runs.
        assert_eq!(record.rpm_port.unwrap().mean, 1499.0);
    }

    #[test]
    fn degraded_shaft_power_stays_out_of_group_statistics() {
        let mut table = ResultsTable::new();
        table.insert(synthetic_result(1, 2.5));
        let mut degraded = synthetic_result(2, 2.5);
        degraded.rpm_stbd = RpmEstimate::no_signal();
        degraded.power_stbd_w = 0.0;
        table.insert(degraded);
        let record = aggregate(&table, &group(1, 2)).unwrap();
        // The fabricated zero power of the dead starboard sensor must not
        // halve the group mean.
        assert_eq!(record.power_stbd_w.unwrap().mean, 940.0);
        assert_eq!(record.power_stbd_w.unwrap().std_dev, 0.0);
        // The port shaft had signal on both runs.
        assert_eq!(record.power_port_w.unwrap().mean, 955.0);
        // The system total only averages fully-instrumented runs.
        assert_eq!(record.power_total_w.unwrap().mean, 1895.0);
    }

    #[test]
    fn group_without_any_shaft_signal_has_no_power_statistics() {
        let mut table = ResultsTable::new();
        for id in 1..=2 {
            let mut degraded = synthetic_result(id, 2.5);
            degraded.rpm_stbd = RpmEstimate::no_signal();
            degraded.power_stbd_w = 0.0;
            table.insert(degraded);
        }
        let record = aggregate(&table, &group(1, 2)).unwrap();
        assert!(record.rpm_stbd.is_none());
        assert!(record.power_stbd_w.is_none());
        assert!(record.power_total_w.is_none());
        // The healthy port shaft still aggregates.
        assert_eq!(record.power_port_w.unwrap().mean, 955.0);
    }

    #[test]
    fn reprocessing_a_run_replaces_its_row() {
        let mut table = ResultsTable::new();
        table.insert(synthetic_result(2, 2.0));
        table.insert(synthetic_result(2, 9.0));
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(2).unwrap().flow.overall_kg_s, 9.0);
    }
}

// src/results.rs
