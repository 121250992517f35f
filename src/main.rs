use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use taskdeck::catalog::builtin_registry;
use taskdeck::cli::report::{print_run_report, print_task_list};
use taskdeck::cli::{confirm, print_error};
use taskdeck::config::{load_config, TaskdeckConfig};
use taskdeck::hooks::{patch_hooks, EnvDescriptor};
use taskdeck::release::{self, Increment};
use taskdeck::runner::{Runner, RunnerOptions};
use taskdeck::setup;

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(version, about = "Tagged task runner and project scaffold tooling")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all tasks with their tags and version matrices
    List,
    /// Run a task by name, or every task carrying a tag
    Run {
        /// Task name or tag
        target: String,
        /// Extra arguments passed to steps that accept them (after `--`)
        #[arg(last = true)]
        args: Vec<String>,
    },
    /// First-time git setup: init, remote, main/develop branches
    SetupGit {
        /// Project directory
        #[arg(default_value = ".")]
        path: String,
        /// GitHub account for the remote (default: from config)
        #[arg(long)]
        user: Option<String>,
        /// Repository name (default: from config)
        #[arg(long)]
        name: Option<String>,
    },
    /// Wire the GitHub remote for an already-initialized repo
    SetupRemote {
        /// Project directory
        #[arg(default_value = ".")]
        path: String,
        /// GitHub account for the remote (default: from config)
        #[arg(long)]
        user: Option<String>,
        /// Repository name (default: from config)
        #[arg(long)]
        name: Option<String>,
    },
    /// Cut a release branch, bump version files, and commit
    PrepareRelease {
        /// Project directory
        #[arg(default_value = ".")]
        path: String,
        /// Force a specific version increment
        #[arg(long)]
        increment: Option<Increment>,
        /// Skip the confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },
    /// Extract the newest changelog section into body.md
    ReleaseNotes {
        /// Project directory
        #[arg(default_value = ".")]
        path: String,
    },
    /// Rewrite git hooks to activate the current virtual environment
    PatchHooks {
        /// Hooks directory
        #[arg(default_value = ".git/hooks")]
        hooks_dir: String,
    },
}

fn main() {
    taskdeck::observability::init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::List => {
            cmd_list();
        }
        Commands::Run { target, args } => {
            cmd_run(&target, &args);
        }
        Commands::SetupGit { path, user, name } => {
            cmd_setup_git(&path, user.as_deref(), name.as_deref());
        }
        Commands::SetupRemote { path, user, name } => {
            cmd_setup_remote(&path, user.as_deref(), name.as_deref());
        }
        Commands::PrepareRelease {
            path,
            increment,
            yes,
        } => {
            cmd_prepare_release(&path, increment, yes);
        }
        Commands::ReleaseNotes { path } => {
            cmd_release_notes(&path);
        }
        Commands::PatchHooks { hooks_dir } => {
            cmd_patch_hooks(&hooks_dir);
        }
    }
}

// ---------------------------------------------------------------------------
// CLI command implementations
// ---------------------------------------------------------------------------

fn project_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|e| {
        print_error(&format!("cannot resolve current directory: {e}"));
        process::exit(1);
    })
}

fn load_registry(config: &TaskdeckConfig) -> taskdeck::task::TaskRegistry {
    builtin_registry(config).unwrap_or_else(|e| {
        print_error(&format!("task catalog is inconsistent: {e}"));
        process::exit(1);
    })
}

fn cmd_list() {
    let dir = project_dir();
    let config = load_config(Some(&dir));
    let registry = load_registry(&config);
    print_task_list(&registry);
}

fn cmd_run(target: &str, args: &[String]) {
    let dir = project_dir();
    let config = load_config(Some(&dir));
    let registry = load_registry(&config);

    let mut options = RunnerOptions::new(&dir);
    options.installer = config.tools.installer.clone();
    options.show_progress = console::user_attended();

    let runner = Runner::new(&registry, options);
    let report = runner.run(target, args).unwrap_or_else(|e| {
        print_error(&e.to_string());
        process::exit(1);
    });
    print_run_report(&report);

    // Installing pre-commit hooks leaves them pointing at whatever
    // interpreter pre-commit ran under; re-anchor them to the active venv.
    if target == "pre-commit"
        && args.first().map(String::as_str) == Some("install")
        && report.all_passed()
    {
        patch_active_env_hooks(&dir);
    }

    process::exit(report.exit_code());
}

fn patch_active_env_hooks(dir: &Path) {
    let Some(env) = EnvDescriptor::from_active_env() else {
        tracing::debug!("no active virtual environment, hooks left untouched");
        return;
    };
    if let Err(e) = patch_hooks(&dir.join(".git").join("hooks"), &env) {
        print_error(&format!("hook patching failed: {e}"));
        process::exit(1);
    }
}

fn cmd_setup_git(path: &str, user: Option<&str>, name: Option<&str>) {
    let dir = existing_dir_or_exit(path);
    let config = load_config(Some(&dir));
    let user = user.unwrap_or(&config.project.github_user);
    let name = name.unwrap_or(&config.project.name);

    setup::setup_git(&dir, user, name).unwrap_or_else(|e| {
        print_error(&e.to_string());
        process::exit(1);
    });
    eprintln!("[taskdeck] Repository initialized with remote {user}/{name}.");
}

fn cmd_setup_remote(path: &str, user: Option<&str>, name: Option<&str>) {
    let dir = existing_dir_or_exit(path);
    let config = load_config(Some(&dir));
    let user = user.unwrap_or(&config.project.github_user);
    let name = name.unwrap_or(&config.project.name);

    setup::setup_remote(&dir, user, name).unwrap_or_else(|e| {
        print_error(&e.to_string());
        process::exit(1);
    });
    eprintln!("[taskdeck] Remote configured as {user}/{name}.");
}

fn cmd_prepare_release(path: &str, increment: Option<Increment>, yes: bool) {
    let dir = existing_dir_or_exit(path);

    let bump = release::dry_run_bump(&dir, increment).unwrap_or_else(|e| {
        print_error(&e.to_string());
        process::exit(1);
    });

    let prompt = format!("Prepare release {} (from {})?", bump.new, bump.current);
    if !confirm(&prompt, yes) {
        eprintln!("[taskdeck] Release aborted.");
        process::exit(1);
    }

    let bump = release::prepare_release(&dir, increment).unwrap_or_else(|e| {
        print_error(&e.to_string());
        process::exit(1);
    });
    eprintln!(
        "[taskdeck] Release branch release/{} ready — review and push.",
        bump.new
    );
}

fn cmd_release_notes(path: &str) {
    let dir = existing_dir_or_exit(path);
    let out = release::write_release_notes(&dir).unwrap_or_else(|e| {
        print_error(&e.to_string());
        process::exit(1);
    });
    eprintln!("[taskdeck] Release notes written to {}.", out.display());
}

fn cmd_patch_hooks(hooks_dir: &str) {
    let Some(env) = EnvDescriptor::from_active_env() else {
        print_error("no active virtual environment (VIRTUAL_ENV is unset)");
        process::exit(1);
    };
    patch_hooks(Path::new(hooks_dir), &env).unwrap_or_else(|e| {
        print_error(&format!("hook patching failed: {e}"));
        process::exit(1);
    });
    eprintln!("[taskdeck] Hooks in {hooks_dir} now activate {}.", env.virtual_env);
}

fn existing_dir_or_exit(path: &str) -> PathBuf {
    setup::existing_dir(path).unwrap_or_else(|e| {
        print_error(&e.to_string());
        process::exit(1);
    })
}
