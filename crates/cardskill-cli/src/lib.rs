pub mod cli_args;

use std::ffi::OsString;

use cardskill_core::{
    CardError, CardQuery, DatasetCache, FileCacheStore, Game, HttpFetcher, LoggingDestination,
    QueryOutcome, Rendered, Tunables, init_logging, json_error, render_result, run_query,
};
use tracing::debug;

use crate::cli_args::Cli;

/// Run one query end to end and return the process exit code.
pub fn run(cli: Cli) -> i32 {
    let query = cli.to_query();
    let tunables = Tunables::from_env();

    let log_dir = tunables
        .as_ref()
        .ok()
        .and_then(|tunables| tunables.log_dir.as_deref());
    if let Err(err) = init_logging(LoggingDestination::from_log_dir(log_dir)) {
        eprintln!("Logging disabled: {err}");
    }

    let result = tunables.and_then(|tunables| execute(&query, &tunables));
    let rendered = render_result(result, query.json, query.locale());
    emit(&rendered);
    rendered.exit_code
}

fn execute(query: &CardQuery, tunables: &Tunables) -> Result<QueryOutcome, CardError> {
    debug!(cache_dir = %tunables.cache_dir.display(), "Preparing dataset cache");
    let fetcher = HttpFetcher::new(tunables.http_timeout)?;
    let cache = Game::ALL.into_iter().fold(
        DatasetCache::new(
            FileCacheStore::new(&tunables.cache_dir),
            fetcher,
            tunables.cache_ttl,
        ),
        |cache, game| {
            let cache = cache.with_url(game, tunables.cards_url(game));
            match tunables.skills_url(game) {
                Some(url) => cache.with_skills_url(game, url),
                None => cache,
            }
        },
    );
    run_query(query, &cache)
}

fn emit(rendered: &Rendered) {
    for line in &rendered.stderr {
        eprintln!("{line}");
    }
    if !rendered.stdout.is_empty() {
        println!("{}", rendered.stdout);
    }
}

/// Short flags that consume the rest of their cluster as a value.
const VALUE_SHORTS: &[char] = &['g', 'p', 'c', 'u', 'r', 'a', 's', 'n'];

/// True when the raw arguments ask for JSON output, even if they fail to parse.
pub fn wants_json(args: &[OsString]) -> bool {
    args.iter()
        .skip(1)
        .take_while(|arg| *arg != "--")
        .any(|arg| arg == "--json" || short_cluster_has_json(&arg.to_string_lossy()))
}

fn short_cluster_has_json(arg: &str) -> bool {
    let Some(cluster) = arg.strip_prefix('-') else {
        return false;
    };
    if cluster.starts_with('-') {
        return false;
    }
    for flag in cluster.chars() {
        if flag == 'j' {
            return true;
        }
        if VALUE_SHORTS.contains(&flag) {
            return false;
        }
    }
    false
}

/// A clap usage error in the JSON error shape.
pub fn usage_error_json(err: &clap::Error) -> String {
    let rendered = err.render().to_string();
    let message = rendered
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("invalid arguments");
    json_error(message.strip_prefix("error: ").unwrap_or(message))
}
