mod constants;
mod fetcher;
mod imports;
mod macros;
mod output;
mod source;
mod types;
mod utils;
mod vendors;

use clap::{CommandFactory, Parser};
use std::env;
use std::io;
use std::process;

use crate::fetcher::Fetcher;
use crate::imports::*;
use crate::output::{write_detail, write_events, write_search_result};
use crate::source::{event_source, find_event, list_events_or_empty, EventSource};
use crate::types::*;

#[derive(Parser, Debug)]
#[clap(about = "Find race photos by bib number on Taiwanese marathon photo sites")]
pub struct CliArgs {
    /// Logging verbosity level (valid values: off, error, warn, info, debug, trace)
    #[clap(short, long, value_name = "LEVEL", default_value = "info")]
    verbosity: log::LevelFilter,

    #[clap(flatten)]
    options: Options,
}

async fn list(source: &dyn EventSource, fetcher: &Fetcher, query: &ListQuery, json: bool) -> Result<()> {
    let mut events = list_events_or_empty(source, fetcher, query).await;
    if let Some(limit) = query.limit {
        events.truncate(limit);
    }
    write_events(&mut io::stdout(), source.vendor(), &events, json)
}

async fn search(source: &dyn EventSource, fetcher: &Fetcher, options: &Options, bib: &str) -> Result<()> {
    let (event_id, event) = match (&options.event_id, &options.event) {
        (Some(event_id), _) => (event_id.clone(), None),
        (None, Some(keyword)) => {
            let event = find_event(source, fetcher, keyword).await?;
            info!("Using event [{}] {}", event.id, event.name);
            (event.id.clone(), Some(event))
        }
        (None, None) => bail!("--bib needs --event-id or --event"),
    };
    let mut result = source
        .search_by_bib(fetcher, &event_id, bib, &SearchOptions::from(options))
        .await
        .with_context(|| format!("Failed to search {} for bib {:?}", source.vendor().display_name(), bib))?;
    if let Some(event) = event {
        result.event_name = result.event_name.or(Some(event.name));
        result.event_date = result.event_date.or_else(|| Some(event.date).filter(|d| !d.is_empty()));
    }
    info!("Found {} photo(s) for bib {:?}", result.total_count, bib);
    write_search_result(&mut io::stdout(), &result, options.json)
}

async fn run(options: &Options) -> Result<()> {
    let source = event_source(options.vendor);
    let fetcher = Fetcher::new()?;
    if options.list_events {
        list(source.as_ref(), &fetcher, &ListQuery::from(options), options.json).await
    } else if options.detail {
        let event_id = options.event_id.as_ref().ok_or_else(|| anyhow!("--detail needs --event-id"))?;
        let detail = source.event_detail(&fetcher, event_id).await?;
        write_detail(&mut io::stdout(), &detail, options.json)
    } else if let Some(bib) = &options.bib {
        search(source.as_ref(), &fetcher, options, bib).await
    } else if let Some(keyword) = &options.event {
        let query = ListQuery { keyword: Some(keyword.clone()), limit: options.limit };
        list(source.as_ref(), &fetcher, &query, options.json).await
    } else {
        CliArgs::command().print_help().context("Failed to print help")?;
        println!();
        Ok(())
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let cli_args = CliArgs::parse();
    if env::var(env_logger::DEFAULT_FILTER_ENV).is_ok() {
        env_logger::init();
    } else {
        env_logger::builder()
            // Also covers the racephoto_shared crate
            .filter(Some(env!("CARGO_BIN_NAME")), cli_args.verbosity)
            .format_timestamp(None)
            .format_target(false)
            .init();
    }
    if let Err(error) = run(&cli_args.options).await {
        error!("{:?}", error);
        process::exit(1);
    }
}
