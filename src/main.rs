mod argsets;
mod command;

use anyhow::{anyhow, Result};
use env_logger::Env;

use regcache::constants::{defaults, envvars};
use regcache::helpers::load_dotenv;

const CMD_PLAN: &str = "plan";
const CMD_DECODE: &str = "decode";

fn main() -> Result<()> {
    let loaded = load_dotenv();
    env_logger::Builder::from_env(Env::default().filter_or(envvars::LOG_LEVEL, defaults::LOG_LEVEL))
        .init();
    for path in loaded {
        log::debug!("Loaded {}", path);
    }

    let mut args = pico_args::Arguments::from_env();
    match args.subcommand()?.as_deref() {
        Some(CMD_PLAN) => command::plan(argsets::PlanArgs {
            group: args.opt_value_from_str("--group")?,
            max_words: args.opt_value_from_str("--max-words")?,
            driver: args.free_from_str()?,
        }),
        Some(CMD_DECODE) => command::decode(argsets::DecodeArgs {
            driver: args.free_from_str()?,
            dump: args.free_from_str()?,
        }),
        _ => Err(anyhow!("Subcommand must be one of 'plan', 'decode'")),
    }
}
