use std::{error::Error, process::ExitCode};

use clap::Parser;
use futures::future;
use serde_json::Value;

use mediawiki_storage::{
    MediawikiStorage, PageRequest, PageSelector, StorageConfig,
};

/// Print the json stored on MediaWiki pages.
///
/// Every selector given is fetched as its own request, all of them at once.
/// Results are printed one per line, page names first, then page ids, then
/// revision ids. Failures are logged instead.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Wiki host, e.g. www.mediawiki.org
    #[arg(long)]
    host: Option<String>,
    #[arg(long = "page-name")]
    page_names: Vec<String>,
    #[arg(long = "page-id")]
    page_ids: Vec<String>,
    #[arg(long = "revision-id", alias = "rev-id")]
    revision_ids: Vec<String>,
    /// A whole request as json, e.g. '{"host": "w.org", "pageName": "Config"}'
    #[arg(long, conflicts_with_all = ["host", "page_names", "page_ids", "revision_ids"])]
    request: Option<String>,
    #[arg(long)]
    pretty: bool,
}

impl Args {
    fn page_requests(&self) -> Result<Vec<PageRequest>, Box<dyn Error>> {
        if let Some(raw) = &self.request {
            let value = serde_json::from_str::<Value>(raw)
                .map_err(|e| format!("--request is not json: {}", e))?;
            return Ok(vec![PageRequest::from_value(&value)?]);
        }

        let host = self.host.clone().unwrap_or_default();
        let selectors = self
            .page_names
            .iter()
            .cloned()
            .map(PageSelector::PageName)
            .chain(self.page_ids.iter().cloned().map(PageSelector::PageId))
            .chain(self.revision_ids.iter().cloned().map(PageSelector::RevisionId))
            .map(|selector| PageRequest::for_selector(host.as_str(), selector))
            .collect::<Vec<_>>();

        if selectors.is_empty() {
            // Let validation explain what is missing.
            return Ok(vec![PageRequest::new(host)]);
        }
        Ok(selectors)
    }
}

fn print_value(value: &Value, pretty: bool) {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    match text {
        Ok(text) => println!("{}", text),
        Err(e) => log::error!("Failed to serialise result: {}", e),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let storage = match MediawikiStorage::from_config(&StorageConfig::from_env()) {
        Ok(storage) => storage,
        Err(e) => {
            log::error!("Failed to create http client: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let requests = match args.page_requests() {
        Ok(requests) => requests,
        Err(e) => {
            log::error!("{}", e);
            return ExitCode::from(2);
        }
    };

    let mut pending = vec![];
    for request in requests {
        match storage.get(request) {
            Ok(page) => pending.push(page),
            Err(e) => {
                log::error!("{}", e);
                return ExitCode::from(2);
            }
        }
    }

    let total = pending.len();
    let mut failed = 0;
    for outcome in future::join_all(pending).await {
        match outcome {
            Ok(value) => print_value(&value, args.pretty),
            Err(e) => {
                failed += 1;
                log::error!("{}: {}", e.kind(), e);
            }
        }
    }

    log::info!("Fetched {} page(s), {} failed", total, failed);
    if failed == 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
