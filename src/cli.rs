use std::{
    fmt, fs,
    io::{self, Read},
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, bail};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use owo_colors::{OwoColorize, Stream};

use crate::{
    config::{DEFAULT_STORE_FILE, STORE_ENV},
    derive::DerivedFields,
    entry::BibliographicEntry,
    error::StoreError,
    export::{export_biblatex, export_tei},
    store::Store,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// JSON file holding entries, categories and languages
    #[arg(long, global = true, env = STORE_ENV, default_value = DEFAULT_STORE_FILE)]
    pub store: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the fields derived from one or more annotated references, one JSON object per line
    Derive {
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,
        /// Exit with an error if any reference fails to parse
        #[arg(long)]
        strict: bool,
    },
    /// Print the TEI rendering of one or more annotated references
    Tei {
        #[arg(value_name = "SRC", required = true)]
        from: Vec<Source>,
        /// Exit with an error if any reference fails to parse
        #[arg(long)]
        strict: bool,
    },
    /// Derive the fields of a reference and save it to the store
    Add {
        #[arg(value_name = "SRC")]
        from: Source,
        /// Name of an existing language
        #[arg(long)]
        language: Option<String>,
        /// Name of an existing category; may be repeated
        #[arg(long = "category", value_name = "NAME")]
        categories: Vec<String>,
    },
    /// List stored entries ordered by reference
    List {
        /// Only entries in this language
        #[arg(long)]
        language: Option<String>,
    },
    /// Export stored entries (all of them when no id is given)
    Export {
        #[arg(value_name = "ID")]
        ids: Vec<u64>,
        #[arg(long, value_enum, default_value_t = Format::Tei)]
        format: Format,
        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage bibliographic categories
    Category {
        #[command(subcommand)]
        action: CategoryAction,
    },
    /// Manage languages
    Language {
        #[command(subcommand)]
        action: LanguageAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum CategoryAction {
    /// Add a category
    Add { name: String },
    /// Find categories whose name contains QUERY
    Search { query: String },
}

#[derive(Subcommand, Debug)]
pub enum LanguageAction {
    /// Add a language
    Add {
        name: String,
        /// Display colour, e.g. #800000
        #[arg(long, default_value = "")]
        color: String,
    },
    /// Find languages whose name contains QUERY
    Search { query: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Tei,
    Biblatex,
}

#[derive(Clone, Debug)]
/// Where an annotated reference comes from:
///
/// - `-` reads standard input,
/// - anything starting with `<` is the markup itself,
/// - everything else must be an existing file.
pub enum Source {
    Stdin,
    File(PathBuf),
    Markup(String),
}

impl FromStr for Source {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            return Ok(Source::Stdin);
        }
        if s.trim_start().starts_with('<') {
            return Ok(Source::Markup(s.to_string()));
        }
        fs::canonicalize(s)
            .map(Source::File)
            .map_err(|e| format!("no such reference file {s}: {e}"))
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Stdin => f.write_str("<stdin>"),
            Source::File(path) => write!(f, "{}", path.display()),
            Source::Markup(_) => f.write_str("<inline markup>"),
        }
    }
}

impl Source {
    pub fn read(&self) -> anyhow::Result<String> {
        match self {
            Source::Stdin => {
                let mut body = String::new();
                io::stdin()
                    .read_to_string(&mut body)
                    .context("failed to read reference from stdin")?;
                Ok(body)
            }
            Source::File(path) => fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display())),
            Source::Markup(markup) => Ok(markup.clone()),
        }
    }

    fn derive(&self) -> anyhow::Result<DerivedFields> {
        let raw = self.read()?;
        DerivedFields::from_markup(&raw).with_context(|| format!("cannot derive fields from {self}"))
    }
}

pub fn run() -> anyhow::Result<()> {
    let args = Cli::parse();
    let store = args.store.as_path();
    match args.command {
        Command::Derive { from, strict } => {
            derive_each(&from, strict, |fields| Ok(serde_json::to_string(fields)?))
        }
        Command::Tei { from, strict } => derive_each(&from, strict, |fields| Ok(fields.tei_entry.clone())),
        Command::Add {
            from,
            language,
            categories,
        } => add_command(store, &from, language.as_deref(), &categories),
        Command::List { language } => list_command(store, language.as_deref()),
        Command::Export {
            ids,
            format,
            output,
        } => export_command(store, &ids, format, output.as_deref()),
        Command::Category { action } => category_command(store, action),
        Command::Language { action } => language_command(store, action),
    }
}

/// Derive every source, printing one rendered line per success and a tally on stderr.
fn derive_each(
    from: &[Source],
    strict: bool,
    render: impl Fn(&DerivedFields) -> anyhow::Result<String>,
) -> anyhow::Result<()> {
    let mut ok = 0usize;
    let mut failed = 0usize;
    for src in from {
        match src.derive().and_then(|fields| render(&fields)) {
            Ok(line) => {
                println!("{line}");
                ok += 1;
            }
            Err(e) => {
                eprintln!(
                    "{} {e:#}",
                    "error:".if_supports_color(Stream::Stderr, |t| t.red())
                );
                failed += 1;
            }
        }
    }
    eprintln!(
        "{} {ok}  {} {failed}",
        "✓".if_supports_color(Stream::Stderr, |t| t.green()),
        "✗".if_supports_color(Stream::Stderr, |t| t.red()),
    );
    if strict && failed > 0 {
        bail!("{failed} of {} references could not be derived", from.len());
    }
    Ok(())
}

fn open_store(path: &Path) -> anyhow::Result<Store> {
    Store::open(path).with_context(|| format!("failed to open store {}", path.display()))
}

fn persist_store(store: &Store, path: &Path) -> anyhow::Result<()> {
    store
        .persist(path)
        .with_context(|| format!("failed to write store {}", path.display()))
}

fn language_id(store: &Store, name: &str) -> Result<u64, StoreError> {
    store
        .language_by_name(name)
        .map(|l| l.id)
        .ok_or_else(|| StoreError::UnknownName {
            kind: "language",
            name: name.to_string(),
        })
}

fn add_command(
    path: &Path,
    from: &Source,
    language: Option<&str>,
    categories: &[String],
) -> anyhow::Result<()> {
    let raw = from.read()?;
    let mut store = open_store(path)?;
    let mut entry = BibliographicEntry::new(raw);
    entry.language = language.map(|name| language_id(&store, name)).transpose()?;
    for name in categories {
        let category = store
            .category_by_name(name)
            .ok_or_else(|| StoreError::UnknownName {
                kind: "category",
                name: name.clone(),
            })?;
        entry.categories.push(category.id);
    }
    let id = store
        .save_entry(entry)
        .with_context(|| format!("cannot save reference from {from}"))?;
    persist_store(&store, path)?;
    if let Some(saved) = store.entry(id) {
        println!("{id}\t{saved}");
    }
    Ok(())
}

fn list_command(path: &Path, language: Option<&str>) -> anyhow::Result<()> {
    let store = open_store(path)?;
    let language = language.map(|name| language_id(&store, name)).transpose()?;
    for entry in store.entries(language) {
        let language = entry
            .language
            .and_then(|id| store.language(id))
            .map(|l| l.name.as_str())
            .unwrap_or("");
        println!(
            "{}\t{}\t{}\t{}\t{}",
            entry.id.unwrap_or_default(),
            entry.reference_name,
            entry.title_article,
            entry.title_monograph,
            language,
        );
    }
    Ok(())
}

fn export_command(
    path: &Path,
    ids: &[u64],
    format: Format,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let store = open_store(path)?;
    let entries = if ids.is_empty() {
        store.entries(None)
    } else {
        ids.iter()
            .map(|&id| store.entry(id).ok_or(StoreError::UnknownEntry(id)))
            .collect::<Result<Vec<_>, _>>()?
    };

    let pb = ProgressBar::new(entries.len() as u64);
    pb.set_style(ProgressStyle::default_bar().template("{bar:30.green} {pos}/{len} {msg}")?);
    pb.set_message("exporting");
    let entries = entries.into_iter().progress_with(pb.clone());
    let result = match format {
        Format::Tei => export_tei(entries).map_err(anyhow::Error::from),
        Format::Biblatex => export_biblatex(entries),
    };
    // The bar goes before any error is reported.
    pb.finish_and_clear();
    let body = result.context("export failed")?;

    match output {
        Some(out) => {
            fs::write(out, body).with_context(|| format!("failed to write {}", out.display()))?
        }
        None => print!("{body}"),
    }
    Ok(())
}

fn category_command(path: &Path, action: CategoryAction) -> anyhow::Result<()> {
    let mut store = open_store(path)?;
    match action {
        CategoryAction::Add { name } => {
            let id = store.add_category(&name)?;
            persist_store(&store, path)?;
            println!("{id}\t{name}");
        }
        CategoryAction::Search { query } => {
            for category in store.search_categories(&query) {
                println!("{}\t{category}", category.id);
            }
        }
    }
    Ok(())
}

fn language_command(path: &Path, action: LanguageAction) -> anyhow::Result<()> {
    let mut store = open_store(path)?;
    match action {
        LanguageAction::Add { name, color } => {
            let id = store.add_language(&name, &color)?;
            persist_store(&store, path)?;
            println!("{id}\t{name}");
        }
        LanguageAction::Search { query } => {
            for language in store.search_languages(&query) {
                println!("{}\t{language}\t{}", language.id, language.color);
            }
        }
    }
    Ok(())
}
