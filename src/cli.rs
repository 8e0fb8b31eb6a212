//! Command-line interface and run orchestration.
//!
//! `run` wires the pipeline together: resolve options (flag > config >
//! default), probe the server, then per configured repository post the
//! workspace node, scan the tree, classify resources first and modules
//! second, and plan/execute/report each matched file. All state is threaded
//! through explicitly; there are no ambient globals.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::Parser;
use tracing::{debug, error, info};

use crate::classify::{classify, ClassificationBucket};
use crate::error::{PlanError, StartupError};
use crate::glob::{compile_all, GlobRule};
use crate::load_config::{load_config, RepositoryConfig};
use crate::plan::{Category, Planner, UploadRequest};
use crate::report::{report, report_leftovers};
use crate::scan::scan;
use crate::upload::{execute, server_reachable, Credentials, Transport};

pub const DEFAULT_SERVER: &str = "http://localhost:8080";
pub const DEFAULT_USER: &str = "author";
pub const DEFAULT_PASSWORD: &str = "author";

const SAMPLE_CONFIG: &str = r#"# Config file for Pantheon v2 uploader
## server: Pantheon server URL
## repository: a unique name, which is visible in the user facing URL

## Note: Due to yaml syntax, any filepaths that start with a wildcard must be surrounded in quotes like so:
# modules:
#  - '*.adoc'

server: http://localhost:8080
repositories:
  - name: pantheonSampleRepo
    attributes: path/to/attribute.adoc

    modules:
      - master.adoc
      - modules/*.adoc

    resources:
      - shared/legal.adoc
      - shared/foreword.adoc
      - resources/*
"#;

/// Bulk upload tool for Pantheon 2: scans a directory recursively and
/// uploads relevant files.
#[derive(Debug, Parser)]
#[clap(
    name = "pantheon-uploader",
    version,
    about = "Scan a documentation directory and bulk-upload modules and resources to a Pantheon 2 server"
)]
pub struct Cli {
    /// Type of operation, default push
    #[clap(default_value = "push")]
    pub operation: String,

    /// The Pantheon server to upload modules to
    #[clap(long, short)]
    pub server: Option<String>,

    /// The name of the Pantheon repository
    #[clap(long, short)]
    pub repository: Option<String>,

    /// Path to the attribute file
    #[clap(long = "attr-file", short = 'f')]
    pub attr_file: Option<String>,

    /// Username for authentication
    #[clap(long, short)]
    pub user: Option<String>,

    /// Password for authentication. If '-' is supplied, prompt for the
    /// password.
    #[clap(long, short)]
    pub password: Option<String>,

    /// Directory to upload, default is the current working directory
    #[clap(long, short)]
    pub directory: Option<PathBuf>,

    /// Dry run; print what would be uploaded without uploading
    #[clap(long, short = 'D')]
    pub dry: bool,

    /// Push to the user's personal sandbox. Overrides --repository
    #[clap(long, short = 'b')]
    pub sandbox: bool,

    /// Print information that may be helpful for debugging
    #[clap(long, short)]
    pub verbose: bool,

    /// Print a sample pantheon2.yml file to stdout
    #[clap(long, short = 'S')]
    pub sample: bool,
}

/// Flag > config value > built-in default.
fn resolve_option(flag: Option<String>, config: Option<String>, default: &str) -> String {
    flag.or(config).unwrap_or_else(|| default.to_string())
}

fn remove_trailing_slash(server: &str) -> &str {
    server.strip_suffix('/').unwrap_or(server)
}

fn resolve_password(flag: Option<&str>) -> Result<String> {
    match flag {
        Some("-") => Ok(rpassword::prompt_password("Password: ")?),
        Some(password) => Ok(password.to_string()),
        None => Ok(DEFAULT_PASSWORD.to_string()),
    }
}

/// Entrypoint shared by the binary and the integration tests.
pub fn run<T: Transport + ?Sized>(cli: &Cli, transport: &T) -> Result<()> {
    if cli.sample {
        print!("{SAMPLE_CONFIG}");
        return Ok(());
    }

    let directory = match &cli.directory {
        Some(dir) => dir.clone(),
        None => std::env::current_dir()?,
    };
    let user = cli.user.clone().unwrap_or_else(|| DEFAULT_USER.to_string());
    let password = resolve_password(cli.password.as_deref())?;

    let config = load_config(&directory)?;

    let server = resolve_option(
        cli.server.clone(),
        config.as_ref().and_then(|c| c.server.clone()),
        DEFAULT_SERVER,
    );
    let server = remove_trailing_slash(&server).to_string();

    if !server_reachable(transport, &server) {
        return Err(StartupError::Unreachable(server).into());
    }
    info!("Using server: {server}");

    let auth = Credentials {
        user,
        password,
    };

    // Without a config there are no patterns; a single synthetic pass
    // claims every scanned file as a resource. A config that is present but
    // lists no repositories processes nothing.
    let (repositories, all_resources) = match &config {
        Some(c) => (c.repositories.clone(), false),
        None => (vec![RepositoryConfig::default()], true),
    };

    for repo in &repositories {
        push_repository(cli, transport, &auth, &directory, &server, repo, all_resources)?;
    }

    println!("Finished!");
    Ok(())
}

fn push_repository<T: Transport + ?Sized>(
    cli: &Cli,
    transport: &T,
    auth: &Credentials,
    directory: &Path,
    server: &str,
    repo: &RepositoryConfig,
    all_resources: bool,
) -> Result<()> {
    let mode = if cli.sandbox { "sandbox" } else { "repository" };
    // The sandbox is named after the authenticated user.
    let repository = if cli.sandbox {
        auth.user.clone()
    } else {
        cli.repository
            .clone()
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| repo.name.clone())
    };
    if repository.is_empty() {
        return Err(StartupError::MissingRepository.into());
    }

    let attribute_file = cli.attr_file.clone().or_else(|| repo.attributes.clone());
    if let Some(attr) = &attribute_file {
        // A CLI-supplied path is taken relative to the upload directory, a
        // config-supplied one as written.
        let attr_path = if cli.attr_file.is_some() {
            directory.join(attr)
        } else {
            PathBuf::from(attr.trim())
        };
        if !attr_path.is_file() {
            return Err(
                StartupError::MissingAttributeFile(attr_path.display().to_string()).into(),
            );
        }
    }

    info!("Using {mode}: {repository}");
    if let Some(attr) = &attribute_file {
        info!("Using attributes: {attr}");
    }
    println!("--------------");

    let planner = Planner::new(server, cli.sandbox, &repository);

    let workspace = planner.workspace(attribute_file.as_deref());
    dispatch(cli, transport, auth, &workspace, Path::new(&repository));

    let module_rules = compile_all(&repo.modules)?;
    let mut resource_rules = compile_all(&repo.resources)?;
    if let Some(attr) = &attribute_file {
        resource_rules.push(GlobRule::compile(attr)?);
    }

    let pool = scan(directory)?;
    let (resources, pool) = if all_resources {
        (
            ClassificationBucket {
                category: Category::Resources,
                entries: pool,
            },
            Vec::new(),
        )
    } else {
        classify(pool, &resource_rules, Category::Resources)
    };
    let (modules, leftovers) = classify(pool, &module_rules, Category::Modules);

    for bucket in [resources, modules] {
        for entry in &bucket.entries {
            match planner.plan(entry, bucket.category) {
                Ok(request) => dispatch(cli, transport, auth, &request, &entry.rel_path),
                Err(skip @ PlanError::Resource { .. }) => error!("{skip}"),
                Err(skip) => debug!("{skip}"),
            }
        }
    }
    report_leftovers(leftovers.len());
    Ok(())
}

/// Executes and reports one planned request, or only logs it in dry-run
/// mode.
fn dispatch<T: Transport + ?Sized>(
    cli: &Cli,
    transport: &T,
    auth: &Credentials,
    request: &UploadRequest,
    path: &Path,
) {
    if cli.dry {
        info!(url = %request.url, kind = request.label, "dry run: would upload {}", path.display());
        return;
    }
    let outcome = execute(transport, request, auth);
    report(request.label, path, &outcome);
}
