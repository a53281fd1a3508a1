//! GDF Browser
//!
//! Prints the volume information and directory listing of an Xbox or
//! Xbox 360 disc image.
//!
//! # Usage
//!
//! ```bash
//! # Disc type and root directory
//! gdf-browser game.iso
//!
//! # Every directory, down to listing.max_depth
//! gdf-browser --recursive game.iso
//!
//! # Look up one root entry
//! gdf-browser --find default.xex game.iso
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use gdf_browser::config::{get_config, AppConfig, ListingConfig};
use gdf_browser::disc::browse::{
    open_filesystem, sort_directories_first, FileEntry, Filesystem, FilesystemError, GdfFilesystem,
};
use gdf_browser::disc::VolumeDescriptor;

/// List the contents of Xbox / Xbox 360 GDF disc images.
#[derive(Parser, Debug)]
#[command(name = "gdf-browser")]
#[command(version)]
#[command(about = "List the contents of Xbox / Xbox 360 GDF disc images")]
struct Args {
    /// Disc image to read (.iso, .xiso or .chd)
    #[arg(value_name = "IMAGE")]
    image: PathBuf,

    /// Also list subdirectories
    #[arg(short, long)]
    recursive: bool,

    /// Look up a single root directory entry by name
    #[arg(long, value_name = "NAME")]
    find: Option<String>,

    /// Print JSON instead of text
    #[arg(long)]
    json: bool,

    /// Configuration file to use instead of config.json
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(short, long)]
    verbose: bool,
}

/// JSON output document
#[derive(Serialize)]
struct Report<'a> {
    volume: &'a VolumeDescriptor,
    entries: Vec<&'a FileEntry>,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => AppConfig::load_from_path(path)?,
        None => get_config().clone(),
    };

    let mut fs = open_filesystem(&args.image)?;
    let root = fs.root()?;

    if let Some(name) = &args.find {
        let entry = fs.find_entry(&root, name)?;
        if args.json {
            println!("{}", serde_json::to_string_pretty(&entry)?);
        } else {
            print_entry(&entry, 0);
        }
        return Ok(());
    }

    let mut listing = Vec::new();
    collect_listing(&mut fs, &root, &config.listing, args.recursive, 0, &mut listing)?;

    if args.json {
        let report = Report {
            volume: fs.descriptor(),
            entries: listing.iter().map(|(_, entry)| entry).collect(),
        };
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let descriptor = fs.descriptor();
    println!("Disc type: {}", descriptor.disc_type);
    println!(
        "Volume size: {} bytes ({} sectors of {} bytes)",
        descriptor.volume_size, descriptor.volume_sectors, descriptor.sector_size
    );
    println!(
        "Root directory: sector {}, {} bytes",
        descriptor.root_dir_sector, descriptor.root_dir_size
    );
    println!("Contents:");
    for (depth, entry) in &listing {
        print_entry(entry, *depth);
    }

    Ok(())
}

/// Gather `directory`'s entries, descending into subdirectories when asked
fn collect_listing(
    fs: &mut GdfFilesystem,
    directory: &FileEntry,
    listing: &ListingConfig,
    recursive: bool,
    depth: usize,
    out: &mut Vec<(usize, FileEntry)>,
) -> Result<(), FilesystemError> {
    let mut entries = fs.list_directory(directory)?;

    if !listing.show_hidden {
        entries.retain(|entry| !entry.is_hidden());
    }
    if listing.directories_first {
        sort_directories_first(&mut entries);
    }

    for entry in entries {
        let descend = recursive && entry.is_directory();
        out.push((depth, entry.clone()));

        if !descend {
            continue;
        }
        if depth + 1 > listing.max_depth {
            log::warn!(
                "Not descending into {}: deeper than {} levels",
                entry.path,
                listing.max_depth
            );
            continue;
        }
        collect_listing(fs, &entry, listing, recursive, depth + 1, out)?;
    }

    Ok(())
}

fn print_entry(entry: &FileEntry, depth: usize) {
    let indent = "    ".repeat(depth);
    if entry.is_directory() {
        println!("\t{}{}/", indent, entry.name);
    } else {
        println!("\t{}{:<40} {:>10}", indent, entry.name, entry.size_string());
    }
}
