//! Shortlist CLI - browse collections and change memberships in bulk.

use std::io::Write;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use shortlist_bulk::{BulkCoordinator, BulkJob, CollectionApi, LoopbackConnector};
use shortlist_client::{HttpClient, WsConnector};
use shortlist_core::{CollectionView, CompanyId, JobReport, MembershipOp, ProgressEvent};

mod config;

use config::Config;

/// Shortlist CLI - Collection management tool
#[derive(Parser)]
#[command(name = "shortlist")]
#[command(about = "Browse company collections and change memberships in bulk", long_about = None)]
struct Cli {
    /// Collections API base URL
    #[arg(long, env = "SHORTLIST_API_URL", global = true)]
    api_url: Option<String>,

    /// Progress relay WebSocket URL
    #[arg(long, env = "SHORTLIST_PROGRESS_URL", global = true)]
    progress_url: Option<String>,

    /// Companies per batch in bulk operations
    #[arg(long, env = "SHORTLIST_BATCH_SIZE", global = true)]
    batch_size: Option<usize>,

    /// Report progress through an in-process channel instead of the relay
    #[arg(long, global = true)]
    local_progress: bool,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all collections
    Collections,

    /// Show one page of a collection
    Show {
        /// Collection ID
        collection: String,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Add companies from a collection to a list (the liked list by default)
    Like {
        /// Collection the companies are picked from
        collection: String,

        /// Company IDs to add
        ids: Vec<CompanyId>,

        /// Select every company in the collection
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        /// Name of the target list
        #[arg(long)]
        list: Option<String>,

        #[command(flatten)]
        page: PageArgs,
    },

    /// Remove companies from a collection
    Remove {
        /// Collection to remove from
        collection: String,

        /// Company IDs to remove
        ids: Vec<CompanyId>,

        /// Select every company in the collection
        #[arg(long, conflicts_with = "ids")]
        all: bool,

        #[command(flatten)]
        page: PageArgs,
    },
}

#[derive(Args)]
struct PageArgs {
    /// Zero-based page to show
    #[arg(long, default_value_t = 0)]
    page: usize,

    /// Rows per page
    #[arg(long)]
    page_size: Option<usize>,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(url) = &self.api_url {
            config.api_url = url.clone();
        }
        if let Some(url) = &self.progress_url {
            config.progress_url = url.clone();
        }
        if let Some(size) = self.batch_size {
            config.batch_size = size;
        }
        config.local_progress = self.local_progress;
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Logs go to stderr so tables on stdout stay clean.
    let directive = if cli.verbose { "shortlist=debug" } else { "shortlist=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let config = cli.config();
    let api = Arc::new(HttpClient::new(&config.api_url));

    match cli.command {
        Commands::Collections => {
            list_collections(&api).await?;
        }
        Commands::Show { collection, page } => {
            let mut view = open_view(&config, collection, &page)?;
            refresh(&api, &mut view).await?;
            print_page(&view);
        }
        Commands::Like {
            collection,
            ids,
            all,
            list,
            page,
        } => {
            let mut view = open_view(&config, collection, &page)?;
            select(&api, &mut view, ids, all).await?;
            let list = list.unwrap_or_else(|| config.liked_list_name.clone());
            bulk(&config, &api, &mut view, MembershipOp::add(list)).await?;
        }
        Commands::Remove {
            collection,
            ids,
            all,
            page,
        } => {
            let mut view = open_view(&config, collection, &page)?;
            select(&api, &mut view, ids, all).await?;
            let op = MembershipOp::remove(view.collection_id().clone());
            bulk(&config, &api, &mut view, op).await?;
        }
    }

    Ok(())
}

fn open_view(
    config: &Config,
    collection: String,
    page: &PageArgs,
) -> Result<CollectionView, Box<dyn std::error::Error>> {
    let page_size = page.page_size.unwrap_or(config.page_size);
    let mut view = CollectionView::new(collection).with_page_size(page_size)?;
    view.set_page(page.page, page_size)?;
    Ok(view)
}

async fn list_collections(api: &HttpClient) -> Result<(), Box<dyn std::error::Error>> {
    let collections = api.list_collections().await?;

    println!("Collections ({}):", collections.len());
    println!("{:<36}  {}", "ID", "NAME");
    println!("{}", "-".repeat(60));

    for collection in collections {
        println!("{:<36}  {}", collection.id, collection.collection_name);
    }

    Ok(())
}

async fn refresh(api: &HttpClient, view: &mut CollectionView) -> Result<(), Box<dyn std::error::Error>> {
    let page = api
        .fetch_page(view.collection_id(), view.offset(), view.page_size())
        .await?;
    view.apply_page(page);
    Ok(())
}

async fn select(
    api: &HttpClient,
    view: &mut CollectionView,
    ids: Vec<CompanyId>,
    all: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    if all {
        let members = api.fetch_all_member_ids(view.collection_id()).await?;
        info!(collection = %view.collection_id(), count = members.len(), "Selecting all companies in collection");
        view.select_all(members);
    } else {
        view.select_all(ids);
    }
    Ok(())
}

/// Run a bulk job over the view's selection, then reconcile and reprint.
async fn bulk(
    config: &Config,
    api: &Arc<HttpClient>,
    view: &mut CollectionView,
    op: MembershipOp,
) -> Result<(), Box<dyn std::error::Error>> {
    if view.selection().is_empty() {
        println!("Nothing selected.");
        return Ok(());
    }

    let coordinator = BulkCoordinator::new(Arc::clone(api)).with_batch_size(config.batch_size)?;
    let selection = view.selection().to_vec();

    let started = if config.local_progress {
        coordinator.run(selection, op.clone(), &LoopbackConnector).await
    } else {
        coordinator
            .run(selection, op.clone(), &WsConnector::new(&config.progress_url))
            .await
    };

    // On abort nothing was mutated and the selection is left as it was.
    let job = match started {
        Ok(job) => job,
        Err(e) => {
            eprintln!("Bulk operation aborted: {}", e);
            return Err(e.into());
        }
    };

    println!("{} company(ies): {}", job.total_items(), op);
    let report = follow(job).await?;
    print_report(&report);

    let Some(reconciliation) = view.apply_report(&report) else {
        eprintln!(
            "Progress channel lost; outcome is indeterminate. Selection of {} kept.",
            view.selection().len()
        );
        return Ok(());
    };
    if reconciliation.refresh {
        refresh(api, view).await?;
    }
    print_page(view);

    Ok(())
}

/// Render progress until the job's event stream ends.
async fn follow(mut job: BulkJob) -> Result<JobReport, Box<dyn std::error::Error>> {
    let show = job.shows_progress();

    while let Some(event) = job.next_event().await {
        match event {
            ProgressEvent::Progress { percentage } if show => {
                eprint!("\r{}", progress_bar(percentage, 40));
                std::io::stderr().flush()?;
            }
            ProgressEvent::Progress { .. } | ProgressEvent::Completed => {}
        }
    }
    if show {
        eprintln!();
    }

    Ok(job.wait().await?)
}

fn progress_bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!(
        "[{}{}] {:>5.1}%",
        "#".repeat(filled),
        " ".repeat(width - filled),
        percentage
    )
}

fn print_report(report: &JobReport) {
    println!(
        "Done: {} succeeded, {} failed ({} ms)",
        report.succeeded,
        report.failures.len(),
        report.duration_ms()
    );
    for failure in &report.failures {
        println!("  - {}: {}", failure.company_id, failure.cause);
    }
}

fn print_page(view: &CollectionView) {
    let name = view.collection_name().unwrap_or("?");
    println!(
        "{} ({}) - page {}/{}, {} total",
        name,
        view.collection_id(),
        view.page() + 1,
        view.page_count().max(1),
        view.total()
    );
    println!("{:<10}  {:<6}  {}", "ID", "LIKED", "COMPANY");
    println!("{}", "-".repeat(60));

    for company in view.rows() {
        let liked = if company.liked { "yes" } else { "" };
        println!("{:<10}  {:<6}  {}", company.id, liked, company.company_name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "[    ]   0.0%");
        assert_eq!(progress_bar(50.0, 4), "[##  ]  50.0%");
        assert_eq!(progress_bar(100.0, 4), "[####] 100.0%");
    }

    #[test]
    fn test_cli_parses_bulk_commands() {
        let cli = Cli::try_parse_from([
            "shortlist",
            "--batch-size",
            "50",
            "remove",
            "c1",
            "3",
            "4",
            "--page-size",
            "10",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.batch_size, 50);
        match cli.command {
            Commands::Remove { collection, ids, all, page } => {
                assert_eq!(collection, "c1");
                assert_eq!(ids, vec![CompanyId::new(3), CompanyId::new(4)]);
                assert!(!all);
                assert_eq!(page.page_size, Some(10));
            }
            _ => panic!("expected remove"),
        }
    }

    #[test]
    fn test_all_conflicts_with_ids() {
        assert!(Cli::try_parse_from(["shortlist", "like", "c1", "1", "--all"]).is_err());
    }

    #[test]
    fn test_open_view_positions_page() {
        let config = Config::default();
        let page = PageArgs {
            page: 2,
            page_size: None,
        };
        let view = open_view(&config, "c1".to_string(), &page).unwrap();
        assert_eq!(view.offset(), 50);
        assert_eq!(view.page_size(), 25);
    }
}
