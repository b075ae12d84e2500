use std::path::PathBuf;
use std::process::exit;

use clap::builder::NonEmptyStringValueParser;
use clap::error::ErrorKind;
use clap::{ArgAction, Parser};
use owo_colors::{OwoColorize, Stream};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use url::Url;

use crate::api::adoptium::{AdoptiumApi, ADOPTIUM_BASE_URL};
use crate::api::def::JdkBinaryApi;
use crate::config::InstallSettings;
use crate::error::{ESResult, JdklinkError, UserMessage};
use crate::lifecycle::Lifecycle;
use crate::symlink::{link_name, LinkOutcome};
use crate::tui::success;

mod api;
mod archive;
mod config;
mod content_disposition_parser;
mod download;
mod error;
mod http_client;
mod installer;
mod lifecycle;
mod probe;
mod progress;
mod symlink;
#[cfg(test)]
mod test_support;
mod tui;

/// Install the latest release of a JDK major version and point jdk-<VERSION> at it.
#[derive(Debug, Parser)]
#[clap(name = "jdklink", version)]
struct Jdklink {
    /// Log more, repeat for even more.
    #[clap(short, long, action = ArgAction::Count)]
    verbose: u8,
    /// Base URL of the Adoptium API.
    #[clap(long, hide = true, default_value = ADOPTIUM_BASE_URL)]
    api_base_url: Url,
    /// Existing directory to install into.
    install_dir: PathBuf,
    /// JDK major version, e.g. 8, 11 or 17.
    #[clap(value_name = "VERSION", value_parser = NonEmptyStringValueParser::new())]
    major: String,
}

fn main() {
    let mut lifecycle = Lifecycle::register(
        std::env::args_os().map(|arg| arg.to_string_lossy().into_owned()),
    );
    let exit_code = match Jdklink::try_parse() {
        Ok(args) => {
            init_logging(args.verbose);
            report_result(run(args, &mut lifecycle))
        }
        Err(err) => {
            let _ = err.print();
            let code = usage_exit_code(&err);
            if code != 0 {
                eprintln!("\n{}", usage_example());
            }
            code
        }
    };
    lifecycle.finish(exit_code);
    exit(exit_code);
}

/// `--help` and `--version` end the run successfully, anything else clap rejects is a usage error.
fn usage_exit_code(err: &clap::Error) -> i32 {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => 0,
        _ => JdklinkError::Usage.exit_code(),
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(format!(
            "warn,{}={}",
            env!("CARGO_CRATE_NAME"),
            level
        )))
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}

fn run(args: Jdklink, lifecycle: &mut Lifecycle) -> ESResult<(), JdklinkError> {
    let settings = InstallSettings::new(args.install_dir, args.major, args.api_base_url)?;
    debug!("Running with {:?}", settings);
    let api = AdoptiumApi::new(settings.api_base_url.clone());
    let outcome = installer::install(&api, &settings, lifecycle)?;
    if !outcome.downloaded && !outcome.extracted {
        info!(
            "{} was already installed from {}",
            outcome.jdk_dir_name,
            outcome.archive.display()
        );
    }
    let verb = match outcome.link_outcome {
        LinkOutcome::Created => "now available",
        LinkOutcome::Unchanged => "still available",
        LinkOutcome::Repointed { .. } => "updated",
    };
    success(format!(
        "JDK {} {} at {} -> {}",
        settings.version,
        verb,
        outcome.link.display(),
        outcome.jdk_dir_name
    ));
    Ok(())
}

fn report_result(result: ESResult<(), JdklinkError>) -> i32 {
    let Err(report) = result else {
        return 0;
    };
    match report.downcast_ref::<UserMessage>() {
        Some(user_message) => {
            eprintln!(
                "{}",
                format!("Error: {}", user_message.message)
                    .if_supports_color(Stream::Stderr, |s| s.red())
            );
            debug!("{:?}", report);
        }
        None => eprintln!(
            "{}",
            format!("Error: {:?}", report).if_supports_color(Stream::Stderr, |s| s.red())
        ),
    }
    report.current_context().exit_code()
}

/// Worked example appended to usage errors.
fn usage_example() -> String {
    const VERSION: &str = "8";
    const INSTALL_DIR: &str = "/opt/java";
    let url = Url::parse(ADOPTIUM_BASE_URL)
        .map(AdoptiumApi::new)
        .ok()
        .and_then(|api| api.binary_url(VERSION).ok())
        .map(|url| url.to_string())
        .unwrap_or_default();
    format!(
        "Example:\n  jdklink {dir} {version}\n\
         \n  probes    {url}\
         \n  downloads {dir}/OpenJDK8U-jdk_x64_linux_hotspot_8u312b07.tar.gz\
         \n  extracts  {dir}/jdk8u312-b07\
         \n  links     {dir}/{link} -> jdk8u312-b07",
        dir = INSTALL_DIR,
        version = VERSION,
        url = url,
        link = link_name(VERSION),
    )
}
