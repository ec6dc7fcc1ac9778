use std::collections::BTreeMap;

use anyhow::Result;
use rangeset::RangeSet;

use crate::argsets::PlanArgs;
use regcache::drivers::JsonDriver;
use regcache::readers::{plan_reads, ReaderConfig};
use regcache::registers::{DeviceFamily, ReadFunction};

/// One line per read transaction
pub fn format_plan(plan: &BTreeMap<ReadFunction, RangeSet>) -> Vec<String> {
    plan.iter()
        .flat_map(|(function, set)| {
            set.iter().map(move |r| {
                let len = r.len();
                format!(
                    "{} {}-{} ({} {})",
                    function,
                    r.first(),
                    r.last(),
                    len,
                    if len == 1 { "word" } else { "words" }
                )
            })
        })
        .collect()
}

pub fn plan(args: PlanArgs) -> Result<()> {
    let driver = JsonDriver::load(&args.driver)?;
    let mut config = ReaderConfig::from_env();
    if let Some(words) = args.max_words {
        config.set_max_read_words(words);
    }

    let sets = driver.address_sets(args.group);
    let plan = plan_reads(&sets, config.max_read_words);
    let lines = format_plan(&plan);
    log::info!(
        "Read plan for '{}': {} transactions of at most {} words",
        driver.name(),
        lines.len(),
        config.max_read_words
    );
    for line in lines {
        println!("{}", line);
    }
    Ok(())
}
