use std::fs;

use anyhow::{anyhow, Result};

use crate::argsets::DecodeArgs;
use regcache::drivers::JsonDriver;
use regcache::helpers::epoch_ms_to_iso;
use regcache::registers::{parse_register_dump, RegisterStore};

pub fn decode(args: DecodeArgs) -> Result<()> {
    let driver = JsonDriver::load(&args.driver)?;
    let text = fs::read_to_string(&args.dump)
        .map_err(|e| anyhow!("Failed to read dump {}: {}", args.dump.display(), e))?;
    let words = parse_register_dump(&text)
        .map_err(|e| anyhow!("Failed to parse dump {}: {}", args.dump.display(), e))?;

    let store = RegisterStore::new();
    store.update(|h| {
        h.save_word_map(words);
        true
    });
    let snapshot = store.snapshot();
    log::debug!("{}", snapshot.debug_string());

    let record = driver.read_record(&snapshot)?;
    log::info!(
        "Decoded {} of {} fields from snapshot taken {}",
        record.present_fields().count(),
        record.all_fields().len(),
        epoch_ms_to_iso(record.get_timestamp())
    );
    println!("{}", serde_json::to_string_pretty(record.all_fields())?);
    Ok(())
}
