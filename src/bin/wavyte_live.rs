use std::{
    io::{Read as _, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use wavyte_live::{
    GenerationConfig, GenerationController, GenerationOutcome, GenerationSink, GeneratorConfig, HttpTransport,
    LivePreview, ModuleRegistry, Preset, PreviewOpts, PreviewStatus, ThemeColors,
};

#[derive(Parser, Debug)]
#[command(name = "wavyte-live", version, about = "Prompt, stream and preview generated motion graphics")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the system prompt for a generation config.
    Prompt(GenerationArgs),
    /// List every identifier generated code may use.
    Globals,
    /// Compile a source file and optionally render one frame as JSON.
    Compile(CompileArgs),
    /// Stream a generation from a service and compile it live.
    Generate(GenerateArgs),
}

#[derive(Parser, Debug)]
struct GenerationArgs {
    /// Generation config JSON (camelCase fields). Flags below override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Authoring preset.
    #[arg(long)]
    preset: Option<Preset>,

    /// Style key (minimal, bold, playful, corporate, neon, elegant, retro).
    #[arg(long)]
    style: Option<String>,

    /// Clip duration in seconds.
    #[arg(long)]
    duration: Option<f64>,

    /// Theme colors as `primary,secondary,accent,background`.
    #[arg(long)]
    theme: Option<String>,

    /// Reference media URL; repeatable.
    #[arg(long = "media")]
    media: Vec<String>,
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Source file, or `-` for stdin.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Render this frame (0-based) and print it as JSON.
    #[arg(long)]
    frame: Option<u64>,

    /// Surface duration in seconds used when rendering.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Surface width used when rendering.
    #[arg(long, default_value_t = 1920)]
    width: u32,

    /// Surface height used when rendering.
    #[arg(long, default_value_t = 1080)]
    height: u32,
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Free-text description of the animation.
    #[arg(long)]
    prompt: String,

    /// Streaming endpoint URL. Ignored when `--generator` is given.
    #[arg(long, required_unless_present = "generator")]
    endpoint: Option<String>,

    /// Generator config JSON (endpoint, model, timeouts, headers).
    #[arg(long)]
    generator: Option<PathBuf>,

    /// Downstream model identifier; overrides the generator config.
    #[arg(long)]
    model: Option<String>,

    /// Preview options JSON (width, height, compileIntervalMs).
    #[arg(long)]
    preview: Option<PathBuf>,

    /// Write the final source here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    #[command(flatten)]
    generation: GenerationArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Prompt(args) => cmd_prompt(args),
        Command::Globals => cmd_globals(),
        Command::Compile(args) => cmd_compile(args),
        Command::Generate(args) => cmd_generate(args),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,wavyte_live={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl GenerationArgs {
    fn resolve(&self) -> anyhow::Result<GenerationConfig> {
        let mut cfg = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("read generation config '{}'", path.display()))?;
                text.parse::<GenerationConfig>()
                    .with_context(|| format!("parse generation config '{}'", path.display()))?
            }
            None => GenerationConfig::default(),
        };
        if let Some(p) = self.preset {
            cfg.preset = p;
        }
        if let Some(s) = &self.style {
            cfg.style = Some(s.clone());
        }
        if let Some(d) = self.duration {
            cfg.duration_seconds = d;
        }
        if let Some(t) = &self.theme {
            cfg.theme_colors = Some(parse_theme(t)?);
        }
        cfg.media_urls.extend(self.media.iter().cloned());
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_theme(s: &str) -> anyhow::Result<ThemeColors> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    let [primary, secondary, accent, background] = parts.as_slice() else {
        anyhow::bail!("--theme expects four comma-separated colors, got {}", parts.len());
    };
    Ok(ThemeColors {
        primary: (*primary).to_owned(),
        secondary: (*secondary).to_owned(),
        accent: (*accent).to_owned(),
        background: (*background).to_owned(),
    })
}

fn cmd_prompt(args: GenerationArgs) -> anyhow::Result<()> {
    let cfg = args.resolve()?;
    let prompt = wavyte_live::build_default_system_prompt(&cfg)?;
    print!("{prompt}");
    Ok(())
}

fn cmd_globals() -> anyhow::Result<()> {
    let registry = ModuleRegistry::global();
    let mut out = std::io::stdout().lock();
    for (module, names) in registry.modules() {
        for name in names {
            let kind = registry.resolve(name).map(|e| e.kind()).unwrap_or("unknown");
            writeln!(out, "{module}\t{name}\t{kind}")?;
        }
    }
    Ok(())
}

fn read_source(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut s = String::new();
        std::io::stdin().read_to_string(&mut s).context("read source from stdin")?;
        return Ok(s);
    }
    std::fs::read_to_string(path).with_context(|| format!("read source '{}'", path.display()))
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let source = read_source(&args.in_path)?;
    let result = wavyte_live::compile(&source);
    if let Some(err) = result.error {
        anyhow::bail!("{err}");
    }
    let Some(component) = result.component else {
        anyhow::bail!("'{}' contains no source", args.in_path.display());
    };

    let Some(frame) = args.frame else {
        println!("{}", component.name());
        return Ok(());
    };
    let surface = wavyte_live::VideoConfig::from_seconds(args.width, args.height, args.duration)?;
    let rendered = component
        .render(frame, &surface)
        .with_context(|| format!("render frame {frame} of {}", component.name()))?;
    println!("{}", serde_json::to_string_pretty(&rendered)?);
    Ok(())
}

/// Forwards to the preview and reports status changes on stderr.
struct Progress<'a> {
    preview: &'a mut LivePreview,
    deltas: usize,
    shown: Option<String>,
}

impl Progress<'_> {
    fn report(&mut self) {
        let now = self.preview.component().map(|c| c.name().to_owned());
        if now != self.shown {
            if let Some(name) = &now {
                eprintln!("preview: {name} (after {} deltas)", self.deltas);
            }
            self.shown = now;
        }
    }
}

impl GenerationSink for Progress<'_> {
    fn on_delta(&mut self, source: &str) {
        self.deltas += 1;
        self.preview.on_delta(source);
        self.report();
    }

    fn on_finish(&mut self, outcome: &GenerationOutcome) {
        self.preview.on_finish(outcome);
        self.report();
    }
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let cfg = args.generation.resolve()?;
    let mut gen_cfg = match (&args.generator, &args.endpoint) {
        (Some(path), _) => GeneratorConfig::from_path(path)?,
        (None, Some(endpoint)) => GeneratorConfig::new(endpoint.clone()),
        (None, None) => anyhow::bail!("either --endpoint or --generator is required"),
    };
    if args.model.is_some() {
        gen_cfg.model = args.model.clone();
    }
    let opts = match &args.preview {
        Some(path) => PreviewOpts::from_path(path)?,
        None => PreviewOpts::default(),
    };

    let controller = GenerationController::new(HttpTransport::new(&gen_cfg)?).with_model(gen_cfg.model.clone());
    let mut preview = LivePreview::new(&opts, cfg.frame_count()?)?;
    let cancel = controller.cancel_handle();

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    let outcome = rt.block_on(async {
        let mut sink = Progress {
            preview: &mut preview,
            deltas: 0,
            shown: None,
        };
        let run = controller.generate(&cfg, &args.prompt, &mut sink);
        tokio::pin!(run);
        tokio::select! {
            out = &mut run => out,
            _ = tokio::signal::ctrl_c() => {
                eprintln!("cancelling...");
                cancel.cancel();
                run.await
            }
        }
    })?;

    match outcome {
        GenerationOutcome::Done { source } => {
            write_source(args.out.as_deref(), &source)?;
            match preview.status() {
                PreviewStatus::Failed(msg) => anyhow::bail!("generated source did not compile: {msg}"),
                _ => Ok(()),
            }
        }
        GenerationOutcome::Failed { error, source } => {
            if !source.is_empty() {
                write_source(args.out.as_deref(), &source)?;
            }
            Err(error).context("generation failed")
        }
        GenerationOutcome::Cancelled { source } => {
            eprintln!("cancelled after {} bytes", source.len());
            if !source.is_empty() {
                write_source(args.out.as_deref(), &source)?;
            }
            Ok(())
        }
    }
}

fn write_source(out: Option<&Path>, source: &str) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, source).with_context(|| format!("write '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(source.as_bytes())?;
            if !source.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}
