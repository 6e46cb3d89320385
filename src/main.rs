use std::{fs, path::PathBuf, process};

use clap::{Args as ClapArgs, Parser, Subcommand};
use log::{error, info};
use trackpaint::{
    AppConfig, Channel, JsonlSessionSource, NamedPalette, PaletteSpec, SessionKey, SessionViews,
    SvgRenderer, TrackpaintError,
};

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
struct Args {
    /// Config file, defaults to the one in the user config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs, Debug)]
struct SessionArgs {
    #[arg(long)]
    season: u16,
    #[arg(long)]
    event: String,
    #[arg(long, default_value = "R")]
    session: String,
    /// Root of the JSON-lines session tree, overrides the config
    #[arg(short, long)]
    data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List drivers of a session
    Drivers {
        #[command(flatten)]
        session: SessionArgs,
    },
    /// Fastest lap colored by gear
    Gear {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        driver: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fastest lap colored by speed
    Speed {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        driver: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fastest lap colored by any channel
    Track {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        driver: String,
        #[arg(long, value_enum)]
        channel: Channel,
        #[arg(long, value_enum, default_value_t = NamedPalette::Viridis)]
        palette: NamedPalette,
        /// Bucket integer levels 1 to 8 instead of a continuous gradient
        #[arg(long)]
        discrete: bool,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Quick lap times colored by tire compound
    Laps {
        #[command(flatten)]
        session: SessionArgs,
        #[arg(long)]
        driver: String,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Write the default config file if there is none
    InitConfig,
}

fn load_config(path: &Option<PathBuf>) -> Result<AppConfig, TrackpaintError> {
    match path {
        Some(path) => AppConfig::from_path(path),
        None => Ok(AppConfig::from_local_file()?.unwrap_or_default()),
    }
}

fn source_for(
    config: &AppConfig,
    session: &SessionArgs,
) -> Result<(JsonlSessionSource, SessionKey), TrackpaintError> {
    let data_dir = session
        .data_dir
        .clone()
        .unwrap_or_else(|| config.data_dir.clone());
    let source =
        JsonlSessionSource::new(data_dir).with_quick_lap_filter(config.quick_lap_filter()?);
    let key = SessionKey::new(session.season, &session.event, &session.session);
    Ok((source, key))
}

fn views<'a>(
    config: &AppConfig,
    source: &'a JsonlSessionSource,
    key: SessionKey,
) -> Result<SessionViews<'a>, TrackpaintError> {
    Ok(SessionViews::new(source, key)
        .with_gear_palette(config.gear_palette)
        .with_speed_palette(config.speed_palette)
        .with_compound_colors(config.compound_colors()?))
}

fn write_svg(output: &PathBuf, svg: String) -> Result<(), TrackpaintError> {
    fs::write(output, svg).map_err(|e| TrackpaintError::WriterError { source: e })?;
    info!("Wrote {:?}", output);
    Ok(())
}

fn run(args: &Args) -> Result<(), TrackpaintError> {
    let config = load_config(&args.config)?;
    let renderer = SvgRenderer::with_config(config.render.clone());

    match &args.command {
        Commands::Drivers { session } => {
            let (source, key) = source_for(&config, session)?;
            for driver in views(&config, &source, key)?.drivers()? {
                println!("{}", driver);
            }
        }
        Commands::Gear {
            session,
            driver,
            output,
        } => {
            let (source, key) = source_for(&config, session)?;
            let path = views(&config, &source, key)?.gear_shift_map(driver)?;
            write_svg(output, renderer.render_path(&path)?)?;
        }
        Commands::Speed {
            session,
            driver,
            output,
        } => {
            let (source, key) = source_for(&config, session)?;
            let path = views(&config, &source, key)?.speed_map(driver)?;
            write_svg(output, renderer.render_path(&path)?)?;
        }
        Commands::Track {
            session,
            driver,
            channel,
            palette,
            discrete,
            output,
        } => {
            let (source, key) = source_for(&config, session)?;
            let palette_spec = if *discrete {
                PaletteSpec::gears(*palette)
            } else {
                PaletteSpec::continuous(*palette)
            };
            let session_views = views(&config, &source, key)?;
            let title = format!(
                "{} {} - {} - {}",
                session_views.key().event,
                session_views.key().season,
                driver,
                channel
            );
            let path = session_views.channel_map(driver, *channel, &palette_spec, title)?;
            write_svg(output, renderer.render_path(&path)?)?;
        }
        Commands::Laps {
            session,
            driver,
            output,
        } => {
            let (source, key) = source_for(&config, session)?;
            let chart = views(&config, &source, key)?.lap_times(driver)?;
            write_svg(output, renderer.render_lap_chart(&chart)?)?;
        }
        Commands::InitConfig => {
            let path = AppConfig::default_path()?;
            if path.exists() {
                println!("Config already exists at {:?}", path);
            } else {
                AppConfig::default().save_to(&path)?;
                println!("Wrote default config to {:?}", path);
            }
        }
    }
    Ok(())
}

fn main() {
    #[cfg(debug_assertions)]
    colog::init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        error!("{}", e);
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
