use std::io::Write;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use log::{Level, LevelFilter, Log, Metadata, Record};

use fat12_reader::fs::{ChecksumPolicy, DirectoryEntry, Fat12Volume, ImageFile};

const USAGE: &str = "\
usage: fat12-reader [-v] [--strict] [--json] <image> <command>

commands:
  info                    boot sector summary
  list                    root directory listing
  show <name>             details of one entry
  cat <name>              write a file's contents to stdout
  extract <name> <dest>   copy a file out of the image";

#[derive(Debug, PartialEq)]
enum Command {
    Info,
    List,
    Show(String),
    Cat(String),
    Extract(String, PathBuf),
}

#[derive(Debug, PartialEq)]
struct Options {
    verbose: bool,
    strict: bool,
    json: bool,
    image: PathBuf,
    command: Command,
}

fn parse_args(args: impl IntoIterator<Item = String>) -> Result<Options> {
    let mut verbose = false;
    let mut strict = false;
    let mut json = false;
    let mut positional = Vec::new();

    for arg in args {
        match arg.as_str() {
            "-v" | "--verbose" => verbose = true,
            "--strict" => strict = true,
            "--json" => json = true,
            s if s.starts_with('-') && s.len() > 1 => bail!("unknown option {s}\n\n{USAGE}"),
            _ => positional.push(arg),
        }
    }

    let mut positional = positional.into_iter();
    let Some(image) = positional.next() else {
        bail!("missing image path\n\n{USAGE}");
    };
    let verb = positional.next().unwrap_or_else(|| "list".to_string());
    let mut operand = |what: &str| {
        positional
            .next()
            .with_context(|| format!("`{verb}` needs {what}\n\n{USAGE}"))
    };

    let command = match verb.as_str() {
        "info" => Command::Info,
        "list" | "ls" => Command::List,
        "show" => Command::Show(operand("a file name")?),
        "cat" => Command::Cat(operand("a file name")?),
        "extract" => {
            let name = operand("a file name")?;
            Command::Extract(name, PathBuf::from(operand("a destination path")?))
        }
        other => bail!("unknown command {other}\n\n{USAGE}"),
    };

    Ok(Options {
        verbose,
        strict,
        json,
        image: PathBuf::from(image),
        command,
    })
}

/// Timestamped log lines on stderr.
struct StderrLogger;

impl Log for StderrLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S");
            eprintln!("[{now}] {:<5} {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

static LOGGER: StderrLogger = StderrLogger;

fn init_logging(verbose: bool) -> Result<()> {
    log::set_logger(&LOGGER).context("logger already installed")?;
    log::set_max_level(if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    });
    Ok(())
}

fn format_datetime(entry: &DirectoryEntry) -> String {
    entry
        .last_written()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

fn print_info(volume: &Fat12Volume<ImageFile>, json: bool) -> Result<()> {
    let g = volume.geometry();
    if json {
        println!("{}", serde_json::to_string_pretty(g)?);
        return Ok(());
    }
    let rows: [(&str, String); 17] = [
        ("Bytes per sector", g.header_bytes_per_sector.to_string()),
        ("Sectors per cluster", g.sectors_per_cluster.to_string()),
        ("Reserved sectors", g.reserved_sectors.to_string()),
        ("Number of FATs", g.fat_count.to_string()),
        ("Max root entries", g.max_root_entries.to_string()),
        ("Total sectors", g.total_sectors.to_string()),
        ("Sectors per FAT", g.sectors_per_fat.to_string()),
        ("Sectors per track", g.sectors_per_track.to_string()),
        ("Number of heads", g.head_count.to_string()),
        ("Boot signature", format!("{:#04x}", g.boot_signature)),
        ("Volume id", format!("{:08X}", g.volume_id)),
        ("Volume label", g.volume_label.clone()),
        ("File system type", g.fs_type.clone()),
        ("Root directory sectors", g.root_dir_sectors.to_string()),
        ("Root directory start", g.root_dir_start.to_string()),
        ("Data start", g.data_start.to_string()),
        ("Total clusters", g.total_clusters().to_string()),
    ];
    for (label, value) in rows {
        println!("{label:<28}{value}");
    }
    if g.degraded {
        println!("(header sector size ignored, using {})", g.bytes_per_sector);
    }
    Ok(())
}

fn print_listing(entries: &[DirectoryEntry], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entries)?);
        return Ok(());
    }
    for entry in entries {
        let kind = if entry.is_directory() {
            "<DIR>"
        } else if entry.is_volume_label() {
            "<VOL>"
        } else {
            ""
        };
        println!(
            "{:<16}  {:>5}  {:>10}  {}",
            format_datetime(entry),
            kind,
            entry.file_size,
            entry.name
        );
    }
    println!("{} entries", entries.len());
    Ok(())
}

fn print_entry(
    volume: &Fat12Volume<ImageFile>,
    entry: &DirectoryEntry,
    json: bool,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(entry)?);
        return Ok(());
    }
    let chain = volume
        .clusters_of(entry)
        .map(|c| format!("{c:?}"))
        .unwrap_or_else(|e| format!("unreadable: {e}"));
    println!("{:<24}{}", "Name", entry.name);
    println!("{:<24}{}", "Short name", entry.short_name);
    println!("{:<24}{}", "Extension", entry.extension);
    println!("{:<24}{}", "Attributes", entry.attributes.names().join(", "));
    println!(
        "{:<24}{}",
        "Created",
        entry.created().map(|d| d.to_string()).unwrap_or_default()
    );
    println!(
        "{:<24}{}",
        "Last accessed",
        entry.last_accessed().map(|d| d.to_string()).unwrap_or_default()
    );
    println!("{:<24}{}", "Last written", format_datetime(entry));
    println!("{:<24}{}", "First cluster", entry.first_cluster);
    println!("{:<24}{}", "File size", entry.file_size);
    println!("{:<24}{}", "Clusters", chain);
    Ok(())
}

fn run(opts: Options) -> Result<()> {
    let policy = if opts.strict {
        ChecksumPolicy::Strict
    } else {
        ChecksumPolicy::Ignore
    };
    let mut volume = Fat12Volume::open_path(&opts.image)
        .with_context(|| format!("cannot open {}", opts.image.display()))?
        .with_checksum_policy(policy);

    match &opts.command {
        Command::Info => print_info(&volume, opts.json)?,
        Command::List => {
            let entries = volume
                .root_entries()
                .context("cannot read root directory")?;
            print_listing(&entries, opts.json)?;
        }
        Command::Show(name) => {
            let entry = volume.find(name)?;
            print_entry(&volume, &entry, opts.json)?;
        }
        Command::Cat(name) => {
            let entry = volume.find(name)?;
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            volume
                .write_file_to(&entry, &mut out)
                .with_context(|| format!("cannot read {name}"))?;
            out.flush()?;
        }
        Command::Extract(name, dest) => {
            let entry = volume.find(name)?;
            let mut file = std::fs::File::create(dest)
                .with_context(|| format!("cannot create {}", dest.display()))?;
            let written = volume
                .write_file_to(&entry, &mut file)
                .with_context(|| format!("cannot read {name}"))?;
            log::info!("extracted {written} bytes to {}", dest.display());
        }
    }
    Ok(())
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "-h" || a == "--help") {
        println!("fat12-reader {}\n\n{USAGE}", env!("APP_VERSION"));
        return;
    }
    if args.iter().any(|a| a == "-V" || a == "--version") {
        println!("fat12-reader {}", env!("APP_VERSION"));
        return;
    }

    let result = parse_args(args).and_then(|opts| {
        init_logging(opts.verbose)?;
        run(opts)
    });
    if let Err(e) = result {
        if log::log_enabled!(Level::Error) {
            log::error!("{e:#}");
        } else {
            eprintln!("error: {e:#}");
        }
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults_to_list() {
        let opts = parse_args(args(&["disk.img"])).unwrap();
        assert_eq!(opts.image, PathBuf::from("disk.img"));
        assert_eq!(opts.command, Command::List);
        assert!(!opts.verbose && !opts.strict && !opts.json);
    }

    #[test]
    fn test_parse_flags_and_extract() {
        let opts = parse_args(args(&[
            "-v", "--strict", "disk.img", "extract", "README.TXT", "out.txt", "--json",
        ]))
        .unwrap();
        assert!(opts.verbose && opts.strict && opts.json);
        assert_eq!(
            opts.command,
            Command::Extract("README.TXT".into(), PathBuf::from("out.txt"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["disk.img", "show"])).is_err());
        assert!(parse_args(args(&["disk.img", "frobnicate"])).is_err());
        assert!(parse_args(args(&["--bogus", "disk.img"])).is_err());
    }
}
