//! tsuzuri - assemble EPUB 3 books from annotated plain text

use std::fs;
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;

use tsuzuri::config::Config;
use tsuzuri::convert::image_section_lines;
use tsuzuri::{
    BookInfo, EpubAssembler, LogDiagnostics, TextConverter, WritingDirection, decode_text,
};

/// Encoding tried when the input is not UTF-8.
const SOURCE_ENCODING: &str = "shift_jis";

#[derive(Parser)]
#[command(name = "tsuzuri")]
#[command(version, about = "Assemble EPUB 3 books from annotated plain text", long_about = None)]
#[command(after_help = "EXAMPLES:
    tsuzuri neko.txt                       Write neko.epub next to the input
    tsuzuri neko.zip out/neko.epub         Read text and images from a zip
    tsuzuri --cover cover.jpg neko.txt     Use a separate cover image")]
struct Cli {
    /// Input text file, or a zip holding one
    #[arg(value_name = "INPUT")]
    input: PathBuf,

    /// Output EPUB file (defaults to INPUT with an .epub extension)
    #[arg(value_name = "OUTPUT")]
    output: Option<PathBuf>,

    /// Book title (defaults to the first line of the text)
    #[arg(short, long)]
    title: Option<String>,

    /// Book creator (defaults to the second line of the text)
    #[arg(short = 'a', long)]
    creator: Option<String>,

    /// Cover image path or http(s) URL
    #[arg(long)]
    cover: Option<String>,

    /// Lay the book out horizontally instead of vertically
    #[arg(long)]
    horizontal: bool,

    /// TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Print the assembly report as JSON
    #[arg(long)]
    json: bool,

    /// More log output (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress output messages
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, _) => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), String> {
    let config = match &cli.config {
        Some(path) => Config::load(path).map_err(|e| e.to_string())?,
        None => Config::default(),
    };

    let (text, entry_hint) = read_source(&cli.input).map_err(|e| e.to_string())?;
    let book = book_info(cli, &config, &text);
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("epub"));

    let assembler = EpubAssembler::new()
        .with_config(config.epub_config())
        .with_assets(config.assets().map_err(|e| e.to_string())?);

    let assembled = assembler
        .assemble(
            &mut TextConverter::new(),
            &mut Cursor::new(text.as_bytes()),
            &cli.input,
            entry_hint.as_deref(),
            &output,
            &book,
            &mut LogDiagnostics,
        )
        .map_err(|e| e.to_string())?;

    if cli.json {
        let json = serde_json::to_string_pretty(&assembled).map_err(|e| e.to_string())?;
        println!("{json}");
    } else if !cli.quiet {
        println!("Output: {}", output.display());
        println!("Title: {}", book.title);
        println!("Sections: {}", assembled.sections.len());
        println!("Chapters: {}", assembled.chapters.len());
        println!("Images: {}", assembled.images.len());
        if let Some(cover) = &assembled.cover {
            println!("Cover: {}", cover.file_name);
        }
        if !assembled.missing.is_empty() {
            println!("Missing images: {}", assembled.missing.join(", "));
        }
    }

    Ok(())
}

/// Read the source text, from a plain file or the first `.txt` entry of a zip.
///
/// Returns the decoded text and, for zips, the name of the text entry.
fn read_source(path: &Path) -> tsuzuri::Result<(String, Option<String>)> {
    let is_zip = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("zip"));

    if !is_zip {
        let bytes = fs::read(path)?;
        return Ok((decode_text(&bytes, Some(SOURCE_ENCODING)).into_owned(), None));
    }

    let mut archive = zip::ZipArchive::new(fs::File::open(path)?)?;
    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = decode_text(entry.name_raw(), Some(SOURCE_ENCODING)).into_owned();
        if entry.is_dir() || !name.to_lowercase().ends_with(".txt") {
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        let text = decode_text(&bytes, Some(SOURCE_ENCODING)).into_owned();
        return Ok((text, Some(name)));
    }

    Err(tsuzuri::Error::Io(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("no .txt entry in {}", path.display()),
    )))
}

fn book_info(cli: &Cli, config: &Config, text: &str) -> BookInfo {
    // Aozora texts open with the title line followed by the author line
    let header: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(2)
        .collect();
    let title = cli
        .title
        .clone()
        .or_else(|| header.first().map(|s| s.to_string()))
        .unwrap_or_default();
    let creator = cli
        .creator
        .clone()
        .or_else(|| header.get(1).map(|s| s.to_string()))
        .unwrap_or_default();

    let direction = if cli.horizontal {
        WritingDirection::Horizontal
    } else {
        config.direction.unwrap_or_default()
    };

    let mut book = BookInfo::new(title, creator)
        .with_direction(direction)
        .with_image_section_lines(image_section_lines(text));
    if let Some(language) = &config.language {
        book.language = language.clone();
    }
    book.cover = cli.cover.clone();
    book
}
