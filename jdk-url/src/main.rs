//! Prints the download URL of the JDK release named by a version keyword.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Keywords and the URL of the JDK release they stand for.
const JDK_URLS: &[(&str, &str)] = &[
    (
        "java17",
        "https://github.com/bell-sw/Liberica/releases/download/17.0.13+12/bellsoft-jdk17.0.13+12-linux-amd64.tar.gz",
    ),
    (
        "java21",
        "https://github.com/bell-sw/Liberica/releases/download/21.0.5+11/bellsoft-jdk21.0.5+11-linux-amd64.tar.gz",
    ),
    (
        "java23",
        "https://github.com/bell-sw/Liberica/releases/download/23.0.1+13/bellsoft-jdk23.0.1+13-linux-amd64.tar.gz",
    ),
];

const UNKNOWN_VERSION: &str = "Unknown java version";

#[derive(Parser, Debug)]
#[command(name = "jdk-url", about = "Prints the download URL of a JDK release")]
struct Opt {
    /// Log level (off|error|warn|info|debug|trace).
    #[arg(long = "log", default_value = "warn", env = "JDK_URL_LOG")]
    log_level: String,

    /// The JDK version keyword, such as `java17`.
    version: String,
}

/// The download URL for a version keyword.
fn resolve(keyword: &str) -> Option<&'static str> {
    JDK_URLS
        .iter()
        .find(|(known, _)| *known == keyword)
        .map(|(_, url)| *url)
}

fn main() -> anyhow::Result<ExitCode> {
    let opt = Opt::parse();

    // stdout only ever carries the URL
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::try_new(&opt.log_level).context("could not parse log configuration")?,
        )
        .with_writer(std::io::stderr)
        .init();

    match resolve(&opt.version) {
        Some(url) => {
            tracing::debug!(version = %opt.version, "resolved JDK download URL");
            println!("{url}");
            Ok(ExitCode::SUCCESS)
        }
        None => {
            tracing::debug!(version = %opt.version, "no JDK release for this keyword");
            println!("{UNKNOWN_VERSION}");
            Ok(ExitCode::from(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keywords_resolve() {
        assert_eq!(
            resolve("java17"),
            Some(
                "https://github.com/bell-sw/Liberica/releases/download/17.0.13+12/bellsoft-jdk17.0.13+12-linux-amd64.tar.gz"
            )
        );
        assert!(resolve("java21").unwrap().contains("bellsoft-jdk21"));
        assert!(resolve("java23").unwrap().contains("bellsoft-jdk23"));
    }

    #[test]
    fn unknown_keywords_do_not_resolve() {
        assert_eq!(resolve("java8"), None);
        assert_eq!(resolve("JAVA17"), None);
        assert_eq!(resolve(""), None);
    }

    #[test]
    fn keywords_are_unique() {
        for (index, (keyword, _)) in JDK_URLS.iter().enumerate() {
            assert!(
                JDK_URLS[index + 1..].iter().all(|(other, _)| other != keyword),
                "{keyword} is listed twice"
            );
        }
    }
}
