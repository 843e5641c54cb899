use tracing_subscriber::EnvFilter;

/// Log targets owned by this workspace. Dependencies stay silent unless
/// `RUST_LOG` asks for them.
const TARGETS: &[&str] = &["cadence", "cadence_core"];

/// Level for the count of `-v` flags: warnings by default, then info,
/// debug and trace.
fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

fn directives(level: &str) -> String {
    TARGETS
        .iter()
        .map(|target| format!("{target}={level}"))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the stderr subscriber. A `RUST_LOG` value replaces the
/// verbosity-derived directives entirely.
pub fn init(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives(level_for(verbosity))));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        assert_eq!(level_for(0), "warn");
        assert_eq!(level_for(2), "debug");
        assert_eq!(level_for(9), "trace");
    }

    #[test]
    fn test_directives_cover_workspace_targets() {
        assert_eq!(directives("info"), "cadence=info,cadence_core=info");
    }
}
