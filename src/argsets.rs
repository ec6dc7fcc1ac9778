use std::path::PathBuf;

use regcache::registers::ReadGroup;

pub struct PlanArgs {
    pub driver: PathBuf,
    pub group: Option<ReadGroup>,
    pub max_words: Option<i64>,
}

pub struct DecodeArgs {
    pub driver: PathBuf,
    pub dump: PathBuf,
}
