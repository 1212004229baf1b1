//! Channel-list strings.
//!
//! The driver accepts and reports lists of physical and virtual channels as comma-separated
//! strings where consecutive numbered names may be written as a range: `Dev1/ai0:3` stands for
//! `Dev1/ai0, Dev1/ai1, Dev1/ai2, Dev1/ai3`. Ranges may count down (`Dev1/ai3:0`) and the upper
//! end may repeat the prefix (`Dev1/ai0:Dev1/ai3`).

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DaqError, ErrorCode, Result};

static TRAILING_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<prefix>.*?)(?P<index>\d+)$").expect("trailing-number pattern compiles"));

fn invalid(channel: &str, why: &str) -> DaqError {
    DaqError::Driver {
        code: ErrorCode::Other(-200170),
        message: format!("Physical channel range syntax in '{}' is invalid: {}", channel, why),
        task_name: None,
    }
}

fn split_trailing_number(name: &str) -> Option<(&str, &str)> {
    let caps = TRAILING_NUMBER.captures(name)?;
    let prefix = caps.name("prefix")?.as_str();
    let index = caps.name("index")?.as_str();
    Some((prefix, index))
}

/// Expands a channel-list string into individual channel names.
pub fn unflatten_channel_string(channel_names: &str) -> Result<Vec<String>> {
    let mut result = Vec::new();
    for item in channel_names.split(',') {
        let item = item.trim();
        if item.is_empty() {
            continue;
        }
        let Some((first, last)) = item.split_once(':') else {
            result.push(item.to_string());
            continue;
        };
        let (prefix, start) = split_trailing_number(first).ok_or_else(|| invalid(item, "the range start is not numbered"))?;
        let end = match split_trailing_number(last) {
            Some((last_prefix, end)) if last_prefix.is_empty() || last_prefix == prefix => end,
            Some(_) => return Err(invalid(item, "the range ends on a different prefix")),
            None => return Err(invalid(item, "the range end is not numbered")),
        };
        let width = if start.len() > 1 && start.starts_with('0') { start.len() } else { 0 };
        let start: u64 = start.parse().map_err(|_| invalid(item, "the range start is too large"))?;
        let end: u64 = end.parse().map_err(|_| invalid(item, "the range end is too large"))?;
        let indices: Box<dyn Iterator<Item = u64>> = if start <= end {
            Box::new(start..=end)
        } else {
            Box::new((end..=start).rev())
        };
        result.extend(indices.map(|index| format!("{}{:0width$}", prefix, index, width = width)));
    }
    Ok(result)
}

/// Joins channel names into a channel-list string, collapsing consecutive runs into ranges.
pub fn flatten_channel_string<S: AsRef<str>>(channel_names: &[S]) -> String {
    let mut groups: Vec<String> = Vec::new();
    // (prefix, first index, last index, step)
    let mut run: Option<(String, u64, u64, i64)> = None;

    let close_run = |run: &mut Option<(String, u64, u64, i64)>, groups: &mut Vec<String>| {
        if let Some((prefix, first, last, _)) = run.take() {
            if first == last {
                groups.push(format!("{}{}", prefix, first));
            } else {
                groups.push(format!("{}{}:{}", prefix, first, last));
            }
        }
    };

    for name in channel_names {
        let name = name.as_ref().trim();
        let parsed = split_trailing_number(name)
            .filter(|(_, index)| !(index.len() > 1 && index.starts_with('0')))
            .and_then(|(prefix, index)| index.parse::<u64>().ok().map(|index| (prefix, index)));
        let Some((prefix, index)) = parsed else {
            close_run(&mut run, &mut groups);
            groups.push(name.to_string());
            continue;
        };
        let extends = match &run {
            Some((run_prefix, _, last, step)) if run_prefix == prefix => {
                let delta = index as i64 - *last as i64;
                delta.abs() == 1 && (*step == 0 || *step == delta)
            }
            _ => false,
        };
        if extends {
            if let Some((_, _, last, step)) = run.as_mut() {
                *step = index as i64 - *last as i64;
                *last = index;
            }
        } else {
            close_run(&mut run, &mut groups);
            run = Some((prefix.to_string(), index, index, 0));
        }
    }
    close_run(&mut run, &mut groups);
    groups.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_ranges() {
        assert_eq!(
            unflatten_channel_string("Dev1/ai0:3").unwrap(),
            vec!["Dev1/ai0", "Dev1/ai1", "Dev1/ai2", "Dev1/ai3"]
        );
        assert_eq!(
            unflatten_channel_string("Dev1/ai2:0, Dev2/port0/line1").unwrap(),
            vec!["Dev1/ai2", "Dev1/ai1", "Dev1/ai0", "Dev2/port0/line1"]
        );
        assert_eq!(unflatten_channel_string("Dev1/ctr0:Dev1/ctr1").unwrap(), vec!["Dev1/ctr0", "Dev1/ctr1"]);
        assert!(unflatten_channel_string("").unwrap().is_empty());
    }

    #[test]
    fn rejects_mismatched_range_prefix() {
        assert!(unflatten_channel_string("Dev1/ai0:Dev2/ai3").is_err());
        assert!(unflatten_channel_string("Dev1/aiX:3").is_err());
    }

    #[test]
    fn collapses_runs() {
        let names = ["Dev1/ai0", "Dev1/ai1", "Dev1/ai2", "Dev1/ao0", "myChan", "Dev1/ai5", "Dev1/ai4"];
        assert_eq!(flatten_channel_string(&names), "Dev1/ai0:2, Dev1/ao0, myChan, Dev1/ai5:4");
    }

    #[test]
    fn flatten_inverts_unflatten() {
        let flat = "Dev1/port0/line0:7, Dev1/ctr1";
        let names = unflatten_channel_string(flat).unwrap();
        assert_eq!(flatten_channel_string(&names), flat);
    }
}
