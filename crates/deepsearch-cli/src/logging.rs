use tracing_subscriber::EnvFilter;

const CRATES: &[&str] = &[
    "deepsearch_cli",
    "deepsearch_web",
    "deepsearch_agents",
    "deepsearch_tools",
    "deepsearch_llm",
    "deepsearch_config",
    "deepsearch_client",
];

/// Directive used when `RUST_LOG` is unset
pub fn default_directive(verbose: bool) -> String {
    let level = if verbose { "debug" } else { "info" };
    let mut directives: Vec<String> = CRATES.iter().map(|c| format!("{c}={level}")).collect();
    directives.push(format!("tower_http={}", if verbose { "debug" } else { "warn" }));
    directives.join(",")
}

/// Install the global subscriber; `RUST_LOG` wins over `--verbose`
pub fn init(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
