use std::{collections::BTreeMap, path::PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use shelf_core::{
    BinChange, CollectionView, Config, ConfigFileStore, CoverSide, MatchMode, PreferencesStore,
    SortDirection, SortField, SortSpec, report,
    shelf_state::{self, Record, RecordId, sa},
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the config file
    #[arg(long, default_value = Config::FILENAME)]
    config: PathBuf,

    /// Read the collection from a local JSON file instead of the server.
    /// Bin changes are not persisted in this mode.
    #[arg(long)]
    file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the collection
    List(ListArgs),
    /// Inspect or change bin assignments
    Bins {
        #[command(subcommand)]
        command: BinsCommand,
    },
    /// Show where cover images are looked for
    Covers {
        /// Only show this record
        id: Option<String>,
        /// Show back cover candidates instead
        #[arg(long)]
        back: bool,
    },
    /// Summarise the (filtered) collection
    Report(FilterArgs),
}

#[derive(Subcommand)]
enum BinsCommand {
    /// Show the bins in shelf order
    Show,
    /// Mark or unmark records as the last in their bin, then reassign bins
    Toggle {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Reassign bins from the current boundaries
    Apply,
    /// Clear all bins
    Reset {
        /// Confirm that all bin assignments should be discarded
        #[arg(long)]
        yes: bool,
    },
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Search titles, artists and track titles
    #[arg(short, long)]
    search: Option<String>,
    #[arg(long)]
    genre: Option<String>,
    #[arg(long)]
    label: Option<String>,
    #[arg(long)]
    year: Option<String>,
    /// Match genre and label exactly instead of by substring
    #[arg(long)]
    exact: bool,
}

#[derive(clap::Args)]
struct ListArgs {
    #[command(flatten)]
    filter: FilterArgs,
    /// Sort order; defaults to the remembered one
    #[arg(long, value_enum)]
    sort: Option<SortArg>,
    /// Sort descending (for field sorts)
    #[arg(long)]
    desc: bool,
    /// Remember the sort and match mode for next time
    #[arg(long)]
    remember: bool,
    /// Print the rows as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    Recent,
    Alphabetical,
    Title,
    Artist,
    Year,
    DateAdded,
}
impl SortArg {
    fn to_spec(self, desc: bool) -> SortSpec {
        let field = match self {
            SortArg::Recent => return SortSpec::Recent,
            SortArg::Alphabetical => return SortSpec::Alphabetical,
            SortArg::Title => SortField::Title,
            SortArg::Artist => SortField::Artist,
            SortArg::Year => SortField::Year,
            SortArg::DateAdded => SortField::DateAdded,
        };
        let direction = if desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        SortSpec::Field { field, direction }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("shelf=info")),
        )
        .init();

    let args = Args::parse();
    let config = Config::load(&args.config)?;
    let client = sa::Client::new(config.server.base_url.clone());

    let (records, assignments) = load_collection(&client, args.file.as_ref()).await?;
    let mut view = CollectionView::from_config(&config);
    view.replace_records(records);
    view.seed_bins(&assignments);

    match args.command {
        Command::List(list) => {
            apply_filters(&mut view, &list.filter);
            if let Some(sort) = list.sort {
                view.set_sort(sort.to_spec(list.desc));
            }
            if list.remember {
                ConfigFileStore::new(&args.config).save_preferences(view.preferences())?;
            }
            if list.json {
                println!("{}", serde_json::to_string_pretty(view.rows())?);
            } else {
                print_rows(view.rows());
            }
        }
        Command::Bins { command } => {
            let persist = args.file.is_none();
            match command {
                BinsCommand::Show => print_bins(&view),
                BinsCommand::Toggle { ids } => {
                    for id in ids {
                        match view.toggle_boundary(&RecordId::new(&id)) {
                            Some(true) => println!("{id} now ends its bin"),
                            Some(false) => println!("{id} no longer ends its bin"),
                            None => println!("no record with id {id}"),
                        }
                    }
                    let changes = view.apply_bins();
                    persist_changes(&client, &changes, persist).await;
                    print_bins(&view);
                }
                BinsCommand::Apply => {
                    let changes = view.apply_bins();
                    persist_changes(&client, &changes, persist).await;
                    print_bins(&view);
                }
                BinsCommand::Reset { yes } => {
                    anyhow::ensure!(yes, "resetting discards every bin; pass --yes to confirm");
                    let changes = view.reset_bins();
                    persist_changes(&client, &changes, persist).await;
                    println!("cleared bins for {} records", changes.len());
                }
            }
        }
        Command::Covers { id, back } => {
            let side = if back { CoverSide::Back } else { CoverSide::Front };
            let records: Vec<&Record> = match &id {
                Some(id) => vec![
                    view.record(&RecordId::new(id))
                        .with_context(|| format!("no record with id {id}"))?,
                ],
                None => view.records().iter().collect(),
            };
            for record in records {
                let candidates = shelf_core::build_candidates_for(record, &config.images.dir, side);
                println!("{record} [{}]", record.id);
                for candidate in candidates {
                    println!("  {}", client.resolve(&candidate));
                }
            }
        }
        Command::Report(filter) => {
            apply_filters(&mut view, &filter);
            print_report(&view);
        }
    }

    Ok(())
}

/// Loads the collection and its persisted bins. Network failures leave an
/// empty collection rather than failing.
async fn load_collection(
    client: &sa::Client,
    file: Option<&PathBuf>,
) -> anyhow::Result<(Vec<Record>, BTreeMap<RecordId, u32>)> {
    if let Some(file) = file {
        let bytes =
            std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
        return Ok((shelf_state::parse_collection(&bytes), BTreeMap::new()));
    }

    let records = match shelf_state::fetch_collection(client).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("failed to fetch collection from {}: {e}", client.base_url());
            vec![]
        }
    };
    let assignments = match shelf_state::fetch_bin_assignments(client).await {
        Ok(assignments) => assignments,
        Err(e) => {
            tracing::warn!("failed to fetch bin assignments: {e}");
            BTreeMap::new()
        }
    };
    Ok((records, assignments))
}

fn apply_filters(view: &mut CollectionView, filter: &FilterArgs) {
    if filter.exact {
        view.set_match_mode(MatchMode::Exact);
    }
    if let Some(genre) = &filter.genre {
        view.set_genre(genre.as_str());
    }
    if let Some(label) = &filter.label {
        view.set_label(label.as_str());
    }
    if let Some(year) = &filter.year {
        view.set_year(year.as_str());
    }
    if let Some(search) = &filter.search {
        view.set_search_term(search.as_str());
    }
}

/// Sends each changed bin to the server. Failures are logged; the local
/// assignment stands either way.
async fn persist_changes(client: &sa::Client, changes: &[BinChange], persist: bool) {
    if !persist {
        if !changes.is_empty() {
            tracing::warn!("reading from a file, {} bin changes not saved", changes.len());
        }
        return;
    }

    let mut failures = 0;
    for change in changes {
        if let Err(e) = client.set_bin(change.id.as_str(), change.after).await {
            tracing::warn!("failed to save bin for {}: {e}", change.id);
            failures += 1;
        }
    }
    tracing::info!(
        "saved {} of {} bin changes",
        changes.len() - failures,
        changes.len()
    );
}

fn print_rows(rows: &[Record]) {
    for record in rows {
        let bin = record.bin.map(|b| b.to_string()).unwrap_or_default();
        let year = record.year.map(|y| y.to_string()).unwrap_or_default();
        println!(
            "{bin:>3}  {record}  {year:>4}  {}  {}",
            record.joined_genre(),
            record.joined_label()
        );
    }
    println!("{} records", rows.len());
}

fn print_bins(view: &CollectionView) {
    let ranges = view.bin_ranges();
    if ranges.is_empty() {
        println!("no bins assigned");
        return;
    }
    let name = |id: &RecordId| {
        view.record(id)
            .map(|record| record.to_string())
            .unwrap_or_else(|| id.to_string())
    };
    for range in ranges {
        println!(
            "bin {:>3}: {} to {} ({} records)",
            range.bin,
            name(&range.first),
            name(&range.last),
            range.count
        );
    }
}

fn print_report(view: &CollectionView) {
    let rows = view.rows();
    println!("{} records", rows.len());

    let sections = [
        ("By genre", report::genre_counts(rows)),
        ("By label", report::label_counts(rows)),
        ("By decade", report::decade_counts(rows)),
    ];
    for (title, counts) in sections {
        println!("\n{title}");
        for (name, count) in counts {
            println!("  {count:>5}  {name}");
        }
    }

    println!("\nGrowth");
    for point in report::growth_series(rows) {
        println!("  {}  +{:<4} {}", point.date, point.added, point.total);
    }
}
