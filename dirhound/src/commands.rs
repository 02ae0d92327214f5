use crate::CLAP_STYLING;
use clap::{ArgAction, arg, command};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("dirhound")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("dirhound")
        .about("Concurrent web path and directory scanner")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress the banner, progress display and summary")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Enable debug logging on stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("init")
                .about("Installs the bundled wordlists into your configuration directory")
                .arg(
                    arg!([PATH])
                        .required(false)
                        .help("Configuration directory")
                        .default_value(crate::handlers::DEFAULT_CONFIG_DIR),
                )
                .arg(
                    arg!(-f - -"force")
                        .help("Overwrite existing wordlists without asking")
                        .required(false),
                ),
        )
        .subcommand(
            command!("scan")
                .about(
                    "Brute-force paths on a target using a wordlist, optionally crawling \
                matched pages for more.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("Target base URL, e.g. https://example.com"),
                )
                .arg(
                    arg!(-w --"wordlist" <PATH>)
                        .required(false)
                        .help("Path wordlist (default: ~/.config/dirhound/wordlists/default.txt)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-a --"user-agents" <PATH>)
                        .required(false)
                        .help("Newline-delimited user-agent strings to rotate through")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-X --"method" <METHOD>)
                        .required(false)
                        .help("HTTP method: GET, POST, HEAD, PUT, DELETE, PATCH, OPTIONS")
                        .default_value("GET"),
                )
                .arg(
                    arg!(-t --"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("10"),
                )
                .arg(
                    arg!(-r --"follow-redirects")
                        .required(false)
                        .help("Follow redirects and match on the final status")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(-k --"cookies" <COOKIES>)
                        .required(false)
                        .help("Cookies as 'a=1,b=2' or 'a=1; b=2'"),
                )
                .arg(
                    arg!(-p --"proxy" <URL>)
                        .required(false)
                        .help("Proxy for all requests, e.g. http://127.0.0.1:8080"),
                )
                .arg(
                    arg!(-H --"header" <HEADER>)
                        .required(false)
                        .help("Extra header 'Name: value' (repeatable)")
                        .action(ArgAction::Append),
                )
                .arg(
                    arg!(-c --"concurrency" <NUM_WORKERS>)
                        .required(false)
                        .help("Maximum number of requests in flight at once")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(-y --"retries" <COUNT>)
                        .required(false)
                        .help("Extra attempts after a timeout or transport error")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("0"),
                )
                .arg(
                    arg!(--"rate-limit" <PER_SECOND>)
                        .required(false)
                        .help("Maximum requests per second across all workers")
                        .value_parser(clap::value_parser!(f64)),
                )
                .arg(
                    arg!(--"crawl")
                        .required(false)
                        .help("Queue same-origin links found in matched HTML pages")
                        .action(ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"crawl-depth" <DEPTH>)
                        .required(false)
                        .help("How many link hops to follow from wordlist hits")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("2"),
                )
                .arg(
                    arg!(-m --"match-codes" <CODES>)
                        .required(false)
                        .help("Comma separated status codes to report (default: 200-204,301,302,307,308,401,403)"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save the report to a file")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format (default: from the output file extension)")
                        .value_parser(["text", "json", "csv"]),
                ),
        )
}
