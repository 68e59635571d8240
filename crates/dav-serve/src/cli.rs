//! Command-line surface.
//!
//! Flags keep their traditional single-dash spelling (`-http :9000`,
//! `-read-only`). [`normalize_args`] rewrites them into the double-dash form
//! clap expects, so `-flag`, `--flag` and `-flag=value` are all accepted.

use crate::config::{ServerConfig, DEFAULT_CERT_FILE, DEFAULT_KEY_FILE, DEFAULT_LISTEN_ADDR};
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use std::ffi::OsString;
use std::path::PathBuf;

/// Flags that consume the following argument as their value.
const VALUE_FLAGS: &[&str] = &[
    "d",
    "http",
    "https-cert-file",
    "https-key-file",
    "user",
    "password",
];

/// Serve a directory over WebDAV.
///
/// GET on a directory returns a browsable HTML index; every other request
/// is handled by the WebDAV engine.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "dav-serve")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// WebDAV root directory
    #[arg(short = 'd', value_name = "DIR", default_value = ".", allow_hyphen_values = true)]
    pub root_dir: PathBuf,

    /// HTTP or HTTPS listen address
    #[arg(
        long = "http",
        value_name = "ADDR",
        default_value = DEFAULT_LISTEN_ADDR,
        allow_hyphen_values = true
    )]
    pub http: String,

    /// Serve HTTPS instead of HTTP
    #[arg(
        long = "https-mode",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub https_mode: bool,

    /// HTTPS certificate file (PEM)
    #[arg(
        long = "https-cert-file",
        value_name = "FILE",
        default_value = DEFAULT_CERT_FILE,
        allow_hyphen_values = true
    )]
    pub cert_file: PathBuf,

    /// HTTPS private key file (PEM)
    #[arg(
        long = "https-key-file",
        value_name = "FILE",
        default_value = DEFAULT_KEY_FILE,
        allow_hyphen_values = true
    )]
    pub key_file: PathBuf,

    /// User name for Basic authentication
    #[arg(
        long = "user",
        value_name = "NAME",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub user: String,

    /// Password for Basic authentication
    #[arg(
        long = "password",
        value_name = "PASS",
        default_value = "",
        allow_hyphen_values = true
    )]
    pub password: String,

    /// Reject PUT, DELETE, PROPPATCH, MKCOL, COPY and MOVE
    #[arg(
        long = "read-only",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub read_only: bool,

    /// Print the parsed configuration (password shown as ********) and enable debug logging
    #[arg(
        long = "Verbose",
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_value = "false",
        default_missing_value = "true",
        value_parser = BoolishValueParser::new()
    )]
    pub verbose: bool,
}

impl Cli {
    /// Parse the process arguments, exiting with usage on error.
    pub fn parse_env() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }

    /// Parse an explicit argument list (first item is the program name).
    pub fn try_parse_args<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }
}

impl From<Cli> for ServerConfig {
    fn from(cli: Cli) -> Self {
        Self {
            root_dir: cli.root_dir,
            listen_addr: cli.http,
            https_mode: cli.https_mode,
            cert_file: cli.cert_file,
            key_file: cli.key_file,
            username: cli.user,
            password: cli.password,
            read_only: cli.read_only,
            verbose: cli.verbose,
        }
    }
}

/// Rewrite single-dash long flags (`-read-only`) into clap's `--read-only`.
///
/// Values following a value-taking flag are left untouched, as is everything
/// after a literal `--`.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut iter = args.into_iter().map(Into::into);
    let mut out: Vec<OsString> = iter.next().into_iter().collect();
    let mut expect_value = false;
    let mut flags_done = false;

    for arg in iter {
        if expect_value || flags_done {
            expect_value = false;
            out.push(arg);
            continue;
        }

        let text = match arg.to_str() {
            Some(text) => text.to_owned(),
            None => {
                out.push(arg);
                continue;
            }
        };
        if text == "--" {
            flags_done = true;
            out.push(arg);
            continue;
        }

        let flag = match text.strip_prefix('-') {
            Some(rest) => rest.strip_prefix('-').unwrap_or(rest),
            None => {
                out.push(arg);
                continue;
            }
        };
        let (name, inline_value) = match flag.split_once('=') {
            Some((name, _)) => (name, true),
            None => (flag, false),
        };
        if name.is_empty() {
            out.push(arg);
            continue;
        }

        expect_value = !inline_value && VALUE_FLAGS.contains(&name);
        if name.chars().count() == 1 {
            out.push(format!("-{}", flag).into());
        } else {
            out.push(format!("--{}", flag).into());
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        let mut full = vec!["dav-serve"];
        full.extend_from_slice(args);
        Cli::try_parse_args(full).unwrap()
    }

    #[test]
    fn defaults_match_server_config() {
        let config = ServerConfig::from(parse(&[]));
        assert_eq!(config, ServerConfig::default());
    }

    #[test]
    fn single_dash_flags_are_accepted() {
        let cli = parse(&[
            "-d",
            "/srv/data",
            "-http",
            "127.0.0.1:9000",
            "-https-mode",
            "-https-cert-file",
            "/etc/tls/cert.pem",
            "-https-key-file",
            "/etc/tls/key.pem",
            "-user",
            "alice",
            "-password",
            "secret",
            "-read-only",
            "-Verbose",
        ]);

        assert_eq!(cli.root_dir, PathBuf::from("/srv/data"));
        assert_eq!(cli.http, "127.0.0.1:9000");
        assert!(cli.https_mode);
        assert_eq!(cli.cert_file, PathBuf::from("/etc/tls/cert.pem"));
        assert_eq!(cli.key_file, PathBuf::from("/etc/tls/key.pem"));
        assert_eq!(cli.user, "alice");
        assert_eq!(cli.password, "secret");
        assert!(cli.read_only);
        assert!(cli.verbose);
    }

    #[test]
    fn dash_styles_parse_identically() {
        let single = parse(&["-http", ":9000", "-read-only", "-user=bob"]);
        let double = parse(&["--http", ":9000", "--read-only", "--user", "bob"]);
        let joined = parse(&["-http=:9000", "--read-only=true", "-user", "bob"]);

        assert_eq!(single, double);
        assert_eq!(single, joined);
        assert_eq!(single.http, ":9000");
        assert_eq!(single.user, "bob");
        assert!(single.read_only);
    }

    #[test]
    fn boolean_flags_take_explicit_values() {
        let cli = parse(&["-read-only=false", "-https-mode=1", "-Verbose=no"]);
        assert!(!cli.read_only);
        assert!(cli.https_mode);
        assert!(!cli.verbose);
    }

    #[test]
    fn values_that_look_like_flags_are_kept() {
        let cli = parse(&["-password", "-http", "-user", "u"]);
        assert_eq!(cli.password, "-http");
        assert_eq!(cli.user, "u");
        assert_eq!(cli.http, DEFAULT_LISTEN_ADDR);
    }

    #[test]
    fn normalize_leaves_short_flags_alone() {
        let args = normalize_args(["dav-serve", "-d", "dir", "-read-only", "--", "-x"]);
        let args: Vec<_> = args.iter().map(|a| a.to_str().unwrap()).collect();
        assert_eq!(args, ["dav-serve", "-d", "dir", "--read-only", "--", "-x"]);
    }

    #[test]
    fn verbose_help_mentions_masked_password() {
        use clap::CommandFactory;
        let command = Cli::command();
        let verbose = command
            .get_arguments()
            .find(|arg| arg.get_id() == "verbose")
            .unwrap();
        assert!(verbose.get_help().unwrap().to_string().contains("********"));
    }

    #[test]
    fn unknown_flag_is_an_error() {
        assert!(Cli::try_parse_args(["dav-serve", "-bogus"]).is_err());
    }
}
