// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// Use library instead of local modules
use registry_code::{
    generate, generate_from_canonical, load_rows, parse_birth_date, process_rows, write_results,
    BatchSummary, Config, InputValidator, RawIdentity, RegistryCode,
};

#[derive(Parser, Debug)]
#[command(name = "registry-code")]
#[command(about = "Generate student registry codes", version = registry_code::VERSION, long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "registry-code.yaml")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate the code for one student
    Generate {
        #[command(flatten)]
        identity: IdentityArgs,

        /// Fold this canonical string directly instead of the identity fields
        #[arg(long, conflicts_with_all = ["surname", "given_name", "patronymic", "birth_date", "group_id"])]
        canonical: Option<String>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Recompute a student's code and compare it with an existing one
    Verify {
        code: String,

        #[command(flatten)]
        identity: IdentityArgs,
    },
    /// Generate codes for every row of a CSV file
    Batch {
        input: PathBuf,

        /// Write results here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Interactive form (default)
    Ui,
}

#[derive(Args, Debug)]
struct IdentityArgs {
    #[arg(long)]
    surname: Option<String>,
    #[arg(long)]
    given_name: Option<String>,
    #[arg(long)]
    patronymic: Option<String>,
    /// YYYY-MM-DD
    #[arg(long)]
    birth_date: Option<String>,
    #[arg(long)]
    group_id: Option<String>,
}

impl IdentityArgs {
    fn into_raw(self) -> Result<RawIdentity> {
        let birth_date = self.birth_date.context("--birth-date is required")?;
        Ok(RawIdentity {
            surname: self.surname.context("--surname is required")?,
            given_name: self.given_name.context("--given-name is required")?,
            patronymic: self.patronymic.context("--patronymic is required")?,
            birth_date: parse_birth_date(&birth_date)?,
            group_id: self.group_id.context("--group-id is required")?,
        })
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Command::Ui));
    init_logging(interactive);

    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Some(Command::Generate { identity, canonical, json }) => run_generate(identity, canonical, json),
        Some(Command::Verify { code, identity }) => run_verify(&code, identity),
        Some(Command::Batch { input, output }) => run_batch(&input, output.as_deref()),
        None | Some(Command::Ui) => run_ui_mode(&config),
    }
}

fn init_logging(interactive: bool) {
    // Keep the alternate screen clean unless logging was asked for explicitly
    if interactive && std::env::var_os("RUST_LOG").is_none() {
        return;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "registry_code=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run_generate(identity: IdentityArgs, canonical: Option<String>, json: bool) -> Result<()> {
    let (canonical, code) = match canonical {
        Some(canonical) => {
            let code = generate_from_canonical(&canonical);
            (canonical, code)
        }
        None => {
            let record = InputValidator::new().validate(&identity.into_raw()?)?;
            (record.canonical_string(), generate(&record))
        }
    };

    if json {
        let out = serde_json::json!({ "code": code, "canonical": canonical });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!("{}", code);
    }

    Ok(())
}

fn run_verify(expected: &str, identity: IdentityArgs) -> Result<()> {
    let expected = RegistryCode::parse(expected.trim())?;
    let record = InputValidator::new().validate(&identity.into_raw()?)?;
    let actual = generate(&record);

    if actual != expected {
        bail!("code mismatch: expected {}, computed {}", expected, actual);
    }

    println!("✓ {} matches", actual);
    Ok(())
}

fn run_batch(input: &std::path::Path, output: Option<&std::path::Path>) -> Result<()> {
    let rows = load_rows(input)?;
    let results = process_rows(&rows, &InputValidator::new());

    match output {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?;
            write_results(file, &results)?;
        }
        None => write_results(std::io::stdout().lock(), &results)?,
    }

    eprintln!("{}", BatchSummary::from_results(&results).summary());
    Ok(())
}

#[cfg(feature = "tui")]
fn run_ui_mode(config: &Config) -> Result<()> {
    let mut app = ui::App::new(config.form.default_birth_date);
    ui::run_ui(&mut app)
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_config: &Config) -> Result<()> {
    eprintln!("❌ TUI mode not available!");
    eprintln!("   Rebuild with: cargo build --features tui");
    eprintln!("   Or use: registry-code generate --help");
    std::process::exit(1);
}
