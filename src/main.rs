use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use storycam::camera::{CameraSessionBuilder, FacingMode, SyntheticCamera};
use storycam::form::{ConsoleView, FormOptions, StorySubmissionForm};
use storycam::map::{FixedGeolocation, LocationPicker, MapMode, MemoryMap, PickerOptions};
use storycam::{HttpStoryApi, PhotoFile, SelectedLocation, StoryFeed, StorycamConfig, TokenStore};

#[derive(Parser, Debug)]
#[command(name = "storycam")]
#[command(about = "Share geotagged photo stories from the command line")]
#[command(version)]
#[command(long_about = "A story-sharing client: log in, browse stories that carry a location, \
and post new stories with a photo taken from a file or the camera and a location on the map.")]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "storycam.toml", help = "Path to TOML configuration file")]
    config: String,

    /// Enable debug logging (most verbose)
    #[arg(short, long, help = "Enable debug level logging")]
    debug: bool,

    /// Enable verbose logging (info level)
    #[arg(short, long, help = "Enable verbose info level logging")]
    verbose: bool,

    /// Enable quiet mode (errors only)
    #[arg(short, long, help = "Enable quiet mode - only log errors")]
    quiet: bool,

    /// Validate configuration and exit
    #[arg(long, help = "Validate configuration file and exit")]
    validate_config: bool,

    /// Print default configuration and exit
    #[arg(long, help = "Print default configuration in TOML format and exit")]
    print_config: bool,

    /// Override log format (json, pretty, compact)
    #[arg(long, value_name = "FORMAT", help = "Log output format: json, pretty, or compact")]
    log_format: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Log in and remember the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Forget the saved session token
    Logout,

    /// List stories that carry a location
    Stories,

    /// Post a new story
    Submit {
        /// Story text
        #[arg(long)]
        description: String,

        /// Image file to upload
        #[arg(long, conflicts_with = "camera")]
        photo: Option<PathBuf>,

        /// Capture the photo from the built-in test pattern camera
        #[arg(long)]
        camera: bool,

        /// Camera to capture from: environment (rear) or user (front)
        #[arg(long, value_name = "FACING")]
        facing: Option<FacingMode>,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_config {
        print_default_config()?;
        return Ok(());
    }

    init_logging(&args)?;

    info!("Starting storycam v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration file: {}", args.config);

    let config = match StorycamConfig::load_from_file(&args.config) {
        Ok(config) => {
            info!("Configuration loaded successfully from: {}", args.config);
            config
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    if args.validate_config {
        match config.validate() {
            Ok(()) => {
                info!("Configuration validation successful");
                println!("✓ Configuration is valid");
                return Ok(());
            }
            Err(e) => {
                error!("Configuration validation failed: {}", e);
                eprintln!("✗ Configuration validation failed: {}", e);
                std::process::exit(1);
            }
        }
    }

    config.validate()?;

    let Some(command) = args.command else {
        bail!("No command given; run with --help to see the available commands");
    };

    let store = Arc::new(TokenStore::open(&config.auth.token_path).await?);
    let api = Arc::new(HttpStoryApi::new(&config.api, store.clone())?);

    match command {
        Command::Register {
            name,
            email,
            password,
        } => {
            let response = api.register(&name, &email, &password).await?;
            println!("{}", response.message);
        }
        Command::Login { email, password } => {
            let session = api.login(&email, &password).await?;
            let name = session.name.clone();
            store.save(session).await?;
            println!("Logged in as {}", name);
        }
        Command::Logout => {
            store.clear().await?;
            println!("Logged out");
        }
        Command::Stories => list_stories(&config, api).await?,
        Command::Submit {
            description,
            photo,
            camera,
            facing,
            lat,
            lon,
        } => {
            if photo.is_none() && !camera {
                bail!("Choose a photo with --photo <FILE> or capture one with --camera");
            }
            submit_story(&config, api, description, photo, facing, lat, lon).await?;
        }
    }

    Ok(())
}

async fn list_stories(config: &StorycamConfig, api: Arc<HttpStoryApi>) -> Result<()> {
    let (lat, lon) = config.map.default_center;
    let picker = LocationPicker::new(
        Arc::new(MemoryMap::new()),
        Arc::new(FixedGeolocation::unsupported()),
        MapMode::Display,
        PickerOptions::from_config(&config.map, &config.geolocation),
    );
    picker.initialize("stories-map", SelectedLocation::new(lat, lon)?)?;

    let feed = StoryFeed::new(api, picker.clone());
    let result = feed.load().await;
    picker.destroy();
    let summary = result?;

    for story in &summary.stories {
        let location = story
            .location()
            .map(|l| format!("{:.6}, {:.6}", l.lat, l.lon))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {:<20}  {:<24}  {}",
            story.created_at.format("%Y-%m-%d"),
            story.name,
            location,
            story.description
        );
    }

    match summary.bounds {
        Some(bounds) => println!(
            "{} stories, {} on the map around {}",
            summary.stories.len(),
            summary.mapped,
            bounds.center()
        ),
        None => println!("{} stories, none with a location", summary.stories.len()),
    }
    Ok(())
}

async fn submit_story(
    config: &StorycamConfig,
    api: Arc<HttpStoryApi>,
    description: String,
    photo: Option<PathBuf>,
    facing: Option<FacingMode>,
    lat: f64,
    lon: f64,
) -> Result<()> {
    let mut camera_config = config.camera.clone();
    if let Some(facing) = facing {
        camera_config.default_facing = facing;
    }
    let camera = CameraSessionBuilder::new()
        .device(Arc::new(SyntheticCamera::new()))
        .config(&camera_config)
        .build()?;

    let picker = LocationPicker::new(
        Arc::new(MemoryMap::new()),
        Arc::new(FixedGeolocation::unsupported()),
        MapMode::Select,
        PickerOptions::from_config(&config.map, &config.geolocation),
    );

    let mut form = StorySubmissionForm::new(
        Arc::new(ConsoleView),
        camera,
        picker,
        api,
        FormOptions::from_config(config)?,
    );

    let outcome = fill_and_submit(&mut form, description, photo, lat, lon).await;
    form.destroy().await;
    outcome
}

async fn fill_and_submit(
    form: &mut StorySubmissionForm,
    description: String,
    photo: Option<PathBuf>,
    lat: f64,
    lon: f64,
) -> Result<()> {
    form.render()?;
    form.set_description(description);

    match photo {
        Some(path) => form.choose_file(PhotoFile::from_path(path).await?)?,
        None => {
            form.start_camera().await?;
            form.capture_photo().await?;
        }
    }

    form.select_location(lat, lon)?;
    form.submit().await?;
    Ok(())
}

fn init_logging(args: &Args) -> Result<()> {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

    let log_level = if args.debug {
        "debug"
    } else if args.verbose {
        "info"
    } else if args.quiet {
        "error"
    } else {
        "warn"
    };

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("storycam={}", log_level)));

    let fmt_layer = match args.log_format.as_deref() {
        Some("json") => fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .boxed(),
        Some("compact") => fmt::layer()
            .compact()
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .boxed(),
        Some("pretty") | None => fmt::layer()
            .pretty()
            .with_target(true)
            .with_thread_ids(args.debug)
            .with_file(args.debug)
            .with_line_number(args.debug)
            .boxed(),
        Some(format) => {
            eprintln!("Warning: Unknown log format '{}', using default", format);
            fmt::layer()
                .with_target(true)
                .with_thread_ids(args.debug)
                .with_file(args.debug)
                .with_line_number(args.debug)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();

    Ok(())
}

/// Print default configuration in TOML format
fn print_default_config() -> Result<()> {
    println!("# Storycam Configuration File");
    println!("# Every key can also be set as STORYCAM__<SECTION>__<KEY>");
    println!();
    println!("{}", toml::to_string_pretty(&StorycamConfig::default())?);
    Ok(())
}
