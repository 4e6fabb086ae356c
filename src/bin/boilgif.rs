use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use boilgif::{
    BoilConfig, BoilError, DirDelivery, FsSubjectSource, Gifsicle, PostOptimizer, Session, Subject,
};

#[derive(Parser, Debug)]
#[command(name = "boilgif", version)]
struct Cli {
    /// JSON config file. Missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Composite one image into a template and write the GIF.
    Compose(ComposeArgs),
    /// Boil a subject: fetch their image, reuse or refresh the cache, deliver the result.
    Boil(BoilArgs),
    /// Deliver the pet animation.
    Pet(PetArgs),
    /// List cache entries for a subject.
    Cache(CacheArgs),
}

#[derive(Parser, Debug)]
struct ComposeArgs {
    /// Template GIF (defaults to the configured template).
    #[arg(long)]
    template: Option<PathBuf>,

    /// Image to paste into the green region.
    #[arg(long)]
    image: PathBuf,

    /// Output GIF path.
    #[arg(long)]
    out: PathBuf,

    /// Palette size per frame.
    #[arg(long)]
    colors: Option<u16>,

    /// Gaussian sigma for the pasted image; 0 disables blurring.
    #[arg(long)]
    blur_radius: Option<f32>,

    /// Skip the external optimizer even when it is installed.
    #[arg(long)]
    no_optimize: bool,
}

#[derive(Parser, Debug)]
struct BoilArgs {
    /// Subject id; their image is read from `<images-dir>/<subject>.<ext>`.
    #[arg(long)]
    subject: String,

    /// Directory holding subject images.
    #[arg(long)]
    images_dir: PathBuf,

    /// Directory the finished GIF is copied into.
    #[arg(long)]
    out_dir: PathBuf,

    /// How to address the subject in the caption (defaults to the id).
    #[arg(long)]
    mention: Option<String>,
}

#[derive(Parser, Debug)]
struct PetArgs {
    /// Directory the pet animation is copied into.
    #[arg(long)]
    out_dir: PathBuf,
}

#[derive(Parser, Debug)]
struct CacheArgs {
    /// Subject id.
    #[arg(long)]
    subject: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = load_config(cli.config.as_deref())?;
    if !cfg.template_path.is_file() {
        tracing::warn!(
            path = %cfg.template_path.display(),
            "template GIF not found, boil commands will fail"
        );
    }

    let res = match cli.cmd {
        Command::Compose(args) => cmd_compose(cfg, args),
        Command::Boil(args) => cmd_boil(cfg, args),
        Command::Pet(args) => cmd_pet(cfg, args),
        Command::Cache(args) => cmd_cache(cfg, args),
    };
    if let Err(e) = &res {
        eprintln!("{}", e.user_message());
    }
    res.map_err(anyhow::Error::from)
}

fn load_config(path: Option<&Path>) -> anyhow::Result<BoilConfig> {
    match path {
        Some(p) => Ok(BoilConfig::from_json_path(p)?),
        None => Ok(BoilConfig::default()),
    }
}

fn cmd_compose(mut cfg: BoilConfig, args: ComposeArgs) -> Result<(), BoilError> {
    if let Some(colors) = args.colors {
        cfg.compose.colors = colors;
    }
    if let Some(sigma) = args.blur_radius {
        cfg.compose.blur_radius = sigma;
    }
    let template = args.template.unwrap_or(cfg.template_path);

    let composed = boilgif::compose_files(&template, &args.image, &cfg.compose)?;
    let optimizer = if cfg.optimizer.enabled && !args.no_optimize {
        Gifsicle::detect(cfg.optimizer.gifsicle)
    } else {
        None
    };
    let bytes = boilgif::optimize::refine(
        optimizer.as_ref().map(|g| g as &dyn PostOptimizer),
        composed.bytes,
    );

    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, &bytes)
        .with_context(|| format!("write gif '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} ({} frames, {} composited, {} bytes)",
        args.out.display(),
        composed.stats.frames,
        composed.stats.composited,
        bytes.len()
    );
    Ok(())
}

fn cmd_boil(cfg: BoilConfig, args: BoilArgs) -> Result<(), BoilError> {
    let source = FsSubjectSource::new(args.images_dir);
    let session = Session::from_config(cfg, Box::new(source))?;

    let mut subject = Subject::new(args.subject);
    if let Some(mention) = args.mention {
        subject = subject.with_mention(mention);
    }

    let mut delivery = DirDelivery::new(args.out_dir);
    let report = session.boil(&subject, &mut delivery)?;
    for (path, caption) in delivery.delivered() {
        println!("{}\t{caption}", path.display());
    }
    eprintln!(
        "{} ({:?}, {} bytes)",
        report.key.file_name(),
        report.origin,
        report.size_bytes
    );
    Ok(())
}

fn cmd_pet(cfg: BoilConfig, args: PetArgs) -> Result<(), BoilError> {
    let session = Session::new(cfg, Box::new(FsSubjectSource::new(".")), None)?;
    let mut delivery = DirDelivery::new(args.out_dir);
    session.pet(&mut delivery)?;
    for (path, caption) in delivery.delivered() {
        println!("{}\t{caption}", path.display());
    }
    Ok(())
}

fn cmd_cache(cfg: BoilConfig, args: CacheArgs) -> Result<(), BoilError> {
    let store = boilgif::CacheStore::open(&cfg.cache_dir)?;
    for path in store.entries_for(&args.subject)? {
        println!("{}", path.display());
    }
    Ok(())
}
