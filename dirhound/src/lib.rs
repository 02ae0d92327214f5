pub mod commands;
pub mod handlers;

pub use commands::command_argument_builder;
pub use handlers::{
    build_policy, expand_config_dir, handle_init, handle_scan, install_wordlists, load_agents,
    load_candidates, resolve_report_format,
};

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);
