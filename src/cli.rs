use anyhow::Result;
use clap::{Parser, Subcommand};
use mediamate::api::stoic::StoicQuotes;
use mediamate::config::{Config, CONFIG_FILE};
use mediamate::quote::{format_quote, resolve_quote, QuoteSource};
use mediamate::video::{self, PictureRequest};
use mediamate::{init, init_tracing, scrape, voice};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mediamate-cli", about = "Quote videos from templates, pictures and music")]
struct Cli {
    /// Path to config.json
    #[arg(long, default_value = CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a quote onto a template video
    Template {
        /// Template video; a random file from the templates folder when omitted
        #[arg(short, long)]
        template: Option<PathBuf>,
        /// Quote text; falls back to the configured default, then the quote API
        #[arg(short, long)]
        quote: Option<String>,
        #[arg(long)]
        font: Option<PathBuf>,
    },
    /// Loop a picture over a music clip
    Picture {
        #[arg(short, long)]
        image: PathBuf,
        #[arg(long)]
        url: String,
        /// MM:SS or HH:MM:SS
        #[arg(long)]
        start: String,
        /// MM:SS or HH:MM:SS
        #[arg(long)]
        end: String,
        #[arg(short, long)]
        quote: Option<String>,
        #[arg(long)]
        font: Option<PathBuf>,
        /// Use the picture as-is (it already carries text)
        #[arg(long)]
        no_overlay: bool,
    },
    /// Download pin images from a page
    Scrape {
        url: String,
        #[arg(short, long)]
        folder: PathBuf,
        /// How many "next page" links to follow
        #[arg(long, default_value_t = 0)]
        pages: u32,
        /// Resize the folder to 1080x1350 afterwards
        #[arg(long)]
        resize: bool,
    },
    /// Resize every image in a folder to 1080x1350
    Resize { folder: PathBuf },
    /// Print a quote from the quote API
    Quote,
    /// Show how a quote is broken into overlay lines
    Format { quote: String },
    /// Download a reference voice
    Voice { url: String, name: String },
    /// Narrate text to an mp3
    Tts {
        text: String,
        #[arg(short, long, default_value = "narration.mp3")]
        out: PathBuf,
    },
    /// Download the default font if it is missing
    Font,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let cfg = Config::load_or_default(&cli.config).await?;
    init::ensure_directories(&cfg).await?;
    let client = scrape::build_client()?;
    let quotes = StoicQuotes::new(client.clone(), &cfg);

    match cli.command {
        Commands::Template { template, quote, font } => {
            init::report_tools().await;
            let font = match font {
                Some(f) => f,
                None => {
                    init::ensure_default_font(&client, &cfg).await?;
                    cfg.font_path.clone()
                }
            };
            let template = match template {
                Some(t) => t,
                None => video::random_file(&cfg.templates_dir)?,
            };
            let quote = resolve_quote(quote.as_deref(), cfg.fallback_quote(), &quotes).await?;
            let out = video::template_video(&quote, &template, &font, &cfg.videos_dir).await?;
            println!("{}", out.display());
        }
        Commands::Picture { image, url, start, end, quote, font, no_overlay } => {
            init::report_tools().await;
            let font = match font {
                Some(f) => f,
                None => {
                    init::ensure_default_font(&client, &cfg).await?;
                    cfg.font_path.clone()
                }
            };
            let req = PictureRequest {
                image,
                music_start: start,
                music_end: end,
                music_url: url,
                quote,
                font,
                overlay: !no_overlay,
                videos_dir: cfg.videos_dir.clone(),
            };
            let out = video::picture_video(&req, cfg.fallback_quote(), &quotes).await?;
            println!("{}", out.display());
        }
        Commands::Scrape { url, folder, pages, resize } => {
            let saved = scrape::scrape_images(&client, &url, &folder, pages).await?;
            println!("{} images saved", saved);
            if resize {
                let n = scrape::resize_images(&folder)?;
                println!("{} images resized", n);
            }
        }
        Commands::Resize { folder } => {
            let n = scrape::resize_images(&folder)?;
            println!("{} images resized", n);
        }
        Commands::Quote => {
            println!("{}", quotes.next_quote().await?);
        }
        Commands::Format { quote } => {
            for line in format_quote(&quote) {
                println!("|{}|", line.trim_end_matches('\n'));
            }
        }
        Commands::Voice { url, name } => {
            let out = voice::download_voice(&url, &name, &cfg.voices_dir).await?;
            println!("{}", out.display());
        }
        Commands::Tts { text, out } => {
            let out = voice::generate_tts(&client, &cfg, &text, &out).await?;
            println!("{}", out.display());
        }
        Commands::Font => {
            if init::ensure_default_font(&client, &cfg).await? {
                println!("downloaded {}", cfg.font_path.display());
            } else {
                println!("{} already present", cfg.font_path.display());
            }
        }
    }

    Ok(())
}
