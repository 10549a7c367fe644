// src/data_input/run_config.rs

use csv::ReaderBuilder;
use std::fs::File;
use std::io::BufReader;
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::ReductionError;

/// Which propulsion train(s) were active for a run. Externally supplied per
/// run group; never inferred from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropulsionConfig {
    PortOnly,
    StarboardOnly,
    Combined,
}

impl PropulsionConfig {
    pub fn parse(tag: &str) -> Result<Self, ReductionError> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "port" | "port_only" => Ok(PropulsionConfig::PortOnly),
            "stbd" | "starboard" | "stbd_only" => Ok(PropulsionConfig::StarboardOnly),
            "combined" | "both" => Ok(PropulsionConfig::Combined),
            other => Err(ReductionError::UnknownConfigTag(other.to_string())),
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            PropulsionConfig::PortOnly => "port",
            PropulsionConfig::StarboardOnly => "stbd",
            PropulsionConfig::Combined => "combined",
        }
    }
}

/// One aggregation group: repeated runs at a nominal shaft-speed setpoint
/// under one propulsion configuration, identified by a contiguous run-id
/// range.
#[derive(Debug, Clone)]
pub struct RunGroup {
    pub config: PropulsionConfig,
    pub setpoint_rpm: u32,
    pub run_ids: RangeInclusive<u32>,
}

impl RunGroup {
    pub fn new(
        config: PropulsionConfig,
        setpoint_rpm: u32,
        first_run: u32,
        last_run: u32,
    ) -> Result<Self, ReductionError> {
        if first_run > last_run {
            return Err(ReductionError::EmptyGroup {
                tag: format!("{} @ {} RPM", config.tag(), setpoint_rpm),
            });
        }
        Ok(RunGroup {
            config,
            setpoint_rpm,
            run_ids: first_run..=last_run,
        })
    }

    pub fn label(&self) -> String {
        format!(
            "{} @ {} RPM (runs {}-{})",
            self.config.tag(),
            self.setpoint_rpm,
            self.run_ids.start(),
            self.run_ids.end()
        )
    }
}

/// Loads the run-group table: delimited rows
/// `config,setpoint_rpm,first_run,last_run` with a header row.
pub fn parse_run_groups(path: &Path) -> Result<Vec<RunGroup>, ReductionError> {
    let file = File::open(path)?;
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(BufReader::new(file));

    let mut groups = Vec::new();
    for (row_index, result) in reader.records().enumerate() {
        let record = result?;
        let field = |idx: usize| -> Result<&str, ReductionError> {
            record.get(idx).ok_or_else(|| {
                ReductionError::MalformedLog(format!(
                    "run-group row {} is missing field {}",
                    row_index + 1,
                    idx
                ))
            })
        };
        let parse_u32 = |s: &str| -> Result<u32, ReductionError> {
            s.parse().map_err(|_| {
                ReductionError::MalformedLog(format!(
                    "bad integer '{}' in run-group row {}",
                    s,
                    row_index + 1
                ))
            })
        };

        let config = PropulsionConfig::parse(field(0)?)?;
        let setpoint_rpm = parse_u32(field(1)?)?;
        let first_run = parse_u32(field(2)?)?;
        let last_run = parse_u32(field(3)?)?;
        groups.push(RunGroup::new(config, setpoint_rpm, first_run, last_run)?);
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_tags_parse_both_directions() {
        assert_eq!(
            PropulsionConfig::parse("Stbd").unwrap(),
            PropulsionConfig::StarboardOnly
        );
        assert_eq!(PropulsionConfig::parse("combined").unwrap().tag(), "combined");
        assert!(PropulsionConfig::parse("sideways").is_err());
    }

    #[test]
    fn inverted_run_range_is_rejected() {
        assert!(matches!(
            RunGroup::new(PropulsionConfig::PortOnly, 1500, 9, 4),
            Err(ReductionError::EmptyGroup { .. })
        ));
    }
}

// src/data_input/run_config.rs
