use bug_report::commands::{run_check, run_collect};
use bug_report::config::{CollectOptions, InstallPolicy, default_work_dir};
use bug_report::error::USAGE_EXIT_CODE;
use bug_report::host::SystemHost;
use bug_report::prompt::TerminalPrompt;
use clap::{Parser, Subcommand};
use env_logger::Env;
use std::io::IsTerminal;
use std::path::PathBuf;

#[derive(Parser)]
#[clap(name = "bug-report", version, about = "Collect GPU server diagnostics into bug-report.tar.gz")]
struct Cli {
    /// Install missing diagnostic tools: ask, always (yes) or never (no)
    #[clap(long, env = "BUG_REPORT_INSTALL", value_enum, ignore_case = true, default_value_t = InstallPolicy::Ask)]
    install: InstallPolicy,

    /// Tool registry replacing the built-in list (TOML)
    #[clap(long, env = "BUG_REPORT_REGISTRY")]
    registry: Option<PathBuf>,

    /// Directory the archive is written to
    #[clap(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Parent of the private working directory created for the run (default: $TMPDIR)
    #[clap(long)]
    work_dir: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show which diagnostic tools are present, without collecting or installing
    Check,
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // --help and --version
        Err(e) if !e.use_stderr() => e.exit(),
        Err(e) => {
            let _ = e.print();
            std::process::exit(USAGE_EXIT_CODE);
        }
    };
    let host = SystemHost::new();

    let result = match cli.command {
        Some(Commands::Check) => run_check(cli.registry.as_deref(), &host).map(|_| ()),
        None => {
            if !host.is_root() {
                prime_sudo();
            }
            let options = CollectOptions {
                install: cli.install,
                registry: cli.registry,
                output_dir: cli.output_dir,
                work_dir: cli.work_dir.unwrap_or_else(default_work_dir),
            };
            run_collect(&options, &host, &mut TerminalPrompt).map(|archive| {
                println!("✅ Bug report written to {}", archive.display());
            })
        }
    };

    if let Err(e) = result {
        eprintln!("❌ {e}");
        std::process::exit(e.exit_code());
    }
}

/// Cache sudo credentials up front so privileged probes can run with
/// `sudo -n`. Only attempted when someone can type a password.
fn prime_sudo() {
    if !std::io::stdin().is_terminal() {
        return;
    }
    println!("🔐 Some diagnostics need root; sudo may ask for your password.");
    if let Err(e) = duct::cmd!("sudo", "-v").run() {
        tracing::warn!(error = %e, "sudo unavailable; privileged diagnostics may be placeholders");
    }
}
