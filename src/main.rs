use std::{
    env,
    path::{Path, PathBuf},
    time::Instant,
};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use piet_common::PietText;
use tracing::{info, instrument};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

use cardgen::{images, Config, FontRegistry, ImageResolver, MemberCardBuilder, RankCardBuilder};

const DEFAULT_CONFIG: &str = "config.toml";

#[derive(Parser, Debug)]
#[command(name = "cardgen", version)]
struct Cli {
    /// Configuration file. Defaults to $CARDGEN_CONFIG, then config.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Draw a rank card.
    Rank(CardArgs),
    /// Draw a member (welcome) card.
    Member(CardArgs),
}

#[derive(Parser, Debug)]
struct CardArgs {
    /// Card description in JSON. Missing fields take their default value.
    #[arg(long)]
    card: Option<PathBuf>,

    /// Output PNG path.
    #[arg(long, default_value = "card.png")]
    out: PathBuf,
}

// ---------------------------------------- Main -----------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::Layer::new().compact().with_writer(std::io::stderr));
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();
    let config_path = cli
        .config
        .or_else(|| env::var_os("CARDGEN_CONFIG").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG));
    let config = Config::load(&config_path)?;

    // Fonts are registered once, before any card is drawn
    let fonts = FontRegistry::from_config(&mut PietText::new(), &config.fonts);

    let fallback = images::load_fallback(config.images.fallback.as_deref())
        .context("cannot load fallback image")?;
    let resolver = ImageResolver::with_timeout(config.images.timeout(), fallback)?;

    match cli.cmd {
        Command::Rank(args) => rank(&args, &resolver, &fonts).await,
        Command::Member(args) => member(&args, &resolver, &fonts).await,
    }
}

#[instrument(skip(resolver, fonts))]
async fn rank(args: &CardArgs, resolver: &ImageResolver, fonts: &FontRegistry) -> anyhow::Result<()> {
    let t_0 = Instant::now();

    let builder: RankCardBuilder = read_description(args.card.as_deref())?;
    let card = builder.build().context("invalid rank card")?;
    let png = card.render_with(resolver, fonts).await?;
    write_card(&args.out, &png)?;

    info!("Rank card generated in {} µs", t_0.elapsed().as_micros());
    Ok(())
}

#[instrument(skip(resolver, fonts))]
async fn member(args: &CardArgs, resolver: &ImageResolver, fonts: &FontRegistry) -> anyhow::Result<()> {
    let t_0 = Instant::now();

    let builder: MemberCardBuilder = read_description(args.card.as_deref())?;
    let card = builder.build().context("invalid member card")?;
    let png = card.render_with(resolver, fonts).await?;
    write_card(&args.out, &png)?;

    info!("Member card generated in {} µs", t_0.elapsed().as_micros());
    Ok(())
}

fn read_description<T>(path: Option<&Path>) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned + Default,
{
    let Some(path) = path else {
        return Ok(T::default());
    };
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read card description {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("cannot parse card description {}", path.display()))
}

fn write_card(path: &Path, png: &[u8]) -> anyhow::Result<()> {
    std::fs::write(path, png).with_context(|| format!("cannot write {}", path.display()))?;
    info!("Card saved to {} ({} bytes)", path.display(), png.len());
    Ok(())
}
