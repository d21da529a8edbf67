mod config;
mod geocode;
mod model;
mod reconcile;
mod sample;
mod source;
mod store;

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::Result;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use config::PipelineConfig;
use geocode::Geocoder;
use model::Collection;
use store::StoreError;

#[derive(Parser)]
#[command(name = "mof_scraper", about = "MOF craftspeople dataset pipeline")]
struct Cli {
    /// Optional JSON config file overriding paths, source URL,
    /// category keywords and the geocode cap
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the directory page, merge into the dataset, geocode new
    /// or changed addresses
    Scrape,
    /// Merge a curated seed file of verified records into the dataset
    Import {
        /// JSON array of raw records (name, specialty, address, year, website)
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Geocode existing records that have an address but no coordinates
    Geocode {
        /// Max lookups this run (default: config max_geocode, else all)
        #[arg(short = 'n', long)]
        limit: Option<usize>,
    },
    /// Clear addresses and coordinates of records not on a trust list
    Cleanse {
        /// JSON array of trusted names
        #[arg(short, long)]
        trust: PathBuf,
    },
    /// Fill every record with a synthetic placeholder address and
    /// coordinates near a catalog city (demonstration data)
    Sample,
    /// Show dataset statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();
    let config = PipelineConfig::load(cli.config.as_deref())?;

    let result = match cli.command {
        Commands::Scrape => {
            // A missing dataset is the bootstrap case for a first scrape.
            let mut collection = match store::load(&config.data_path) {
                Ok(c) => c,
                Err(StoreError::NotFound(path)) => {
                    println!("No dataset at {}, starting a new one.", path);
                    Collection::empty(&config.directory_url)
                }
                Err(e) => return Err(e.into()),
            };

            let incoming =
                source::fetch_directory(&config.directory_url, &config.food_categories).await?;
            if incoming.is_empty() {
                println!("Directory page yielded no records; dataset left untouched.");
                return Ok(());
            }

            let summary = reconcile::reconcile(&mut collection, &incoming);
            summary.print();
            geocode_records(&mut collection, &summary.needs_geocode, config.max_geocode).await?;
            store::save(
                &mut collection,
                &config.data_path,
                &config.public_path,
                Some("addresses scraped from the public directory"),
            )?;
            print_counts(&collection);
            Ok(())
        }
        Commands::Import { file } => {
            let mut collection = store::load(&config.data_path)?;
            let incoming = source::load_seed(&file)?;
            println!("Importing {} curated records...", incoming.len());

            let summary = reconcile::reconcile(&mut collection, &incoming);
            summary.print();
            geocode_records(&mut collection, &summary.needs_geocode, config.max_geocode).await?;
            store::save(
                &mut collection,
                &config.data_path,
                &config.public_path,
                Some("addresses are verified"),
            )?;
            print_counts(&collection);
            Ok(())
        }
        Commands::Geocode { limit } => {
            let mut collection = store::load(&config.data_path)?;
            let pending: Vec<usize> = collection
                .mof
                .iter()
                .enumerate()
                .filter(|(_, r)| r.address.is_some() && !r.coordinates.is_resolved())
                .map(|(i, _)| i)
                .collect();
            if pending.is_empty() {
                println!("Nothing to geocode: every addressed record has coordinates.");
                return Ok(());
            }

            let cap = limit.or(config.max_geocode);
            let resolved = geocode_records(&mut collection, &pending, cap).await?;
            if resolved == 0 {
                println!("No address could be resolved; dataset left untouched.");
                return Ok(());
            }
            store::save(&mut collection, &config.data_path, &config.public_path, None)?;
            print_counts(&collection);
            Ok(())
        }
        Commands::Cleanse { trust } => {
            let mut collection = store::load(&config.data_path)?;
            let trusted = source::load_trust_list(&trust)?;
            println!("Cleansing against {} trusted names...", trusted.len());

            let cleared = reconcile::cleanse(&mut collection, &trusted);
            println!("Cleared {} unverified addresses.", cleared);
            store::save(
                &mut collection,
                &config.data_path,
                &config.public_path,
                Some("only verified addresses are kept"),
            )?;
            print_counts(&collection);
            Ok(())
        }
        Commands::Sample => {
            let mut collection = store::load(&config.data_path)?;
            let filled = sample::fill_placeholders(
                &mut collection,
                &config.city_catalog,
                &config.street_names,
            );
            println!("Filled {} records with placeholder addresses.", filled);
            store::save(
                &mut collection,
                &config.data_path,
                &config.public_path,
                Some("addresses are synthetic placeholders"),
            )?;
            print_counts(&collection);
            println!("Placeholder data is for demonstration only; run 'cleanse' before publishing.");
            Ok(())
        }
        Commands::Stats => {
            let collection = store::load(&config.data_path)?;
            print_counts(&collection);
            print_specialties(&collection);
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

/// Geocode the records at the given indices, honoring the optional
/// per-run cap. Returns how many addresses resolved; failures stay
/// unresolved and the run continues.
async fn geocode_records(
    collection: &mut Collection,
    indices: &[usize],
    cap: Option<usize>,
) -> Result<usize> {
    if indices.is_empty() {
        return Ok(0);
    }

    let capped = match cap {
        Some(max) if indices.len() > max => {
            println!("Geocoding {} of {} addresses (capped).", max, indices.len());
            &indices[..max]
        }
        _ => {
            println!("Geocoding {} addresses...", indices.len());
            indices
        }
    };

    let geocoder = Geocoder::new()?;
    let pb = ProgressBar::new(capped.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} (eta {eta})")?
            .progress_chars("=> "),
    );

    let mut resolved = 0usize;
    for &idx in capped {
        let record = &mut collection.mof[idx];
        info!(
            "Geocoding {}: {}",
            record.name,
            record.address.as_deref().unwrap_or("-")
        );
        record.coordinates = geocoder.geocode(record.address.as_deref()).await;
        if record.coordinates.is_resolved() {
            resolved += 1;
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    println!(
        "Geocoded {} addresses ({} resolved, {} unresolved).",
        capped.len(),
        resolved,
        capped.len() - resolved
    );
    Ok(resolved)
}

fn print_counts(collection: &Collection) {
    let with_address = collection.mof.iter().filter(|r| r.address.is_some()).count();
    let with_coords = collection.mof.iter().filter(|r| r.coordinates.is_resolved()).count();
    let with_website = collection.mof.iter().filter(|r| r.website.is_some()).count();

    println!("Total records:    {}", collection.mof.len());
    println!("With address:     {}", with_address);
    println!("With coordinates: {}", with_coords);
    println!("With website:     {}", with_website);
    if let Some(note) = &collection.meta.note {
        println!("Note:             {}", note);
    }
}

fn print_specialties(collection: &Collection) {
    let mut by_specialty: HashMap<&str, usize> = HashMap::new();
    for record in &collection.mof {
        let key = record.specialty.as_deref().unwrap_or("(unknown)");
        *by_specialty.entry(key).or_insert(0) += 1;
    }

    let mut rows: Vec<(&str, usize)> = by_specialty.into_iter().collect();
    rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));

    println!("\nBy specialty:");
    for (specialty, count) in rows {
        println!("{:>4}  {}", count, specialty);
    }
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
