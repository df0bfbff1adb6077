use colored::Colorize;
use gridkit::ServerState;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a remediation hint under an error
pub fn hint(msg: &str) {
    eprintln!("  {} {}", "hint:".yellow(), msg.dimmed());
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

// ============================================================================
// Server Formatting
// ============================================================================

/// Colored lifecycle state name
pub fn state(state: ServerState) -> String {
    let name = state.name();
    match state {
        ServerState::Active => name.green().to_string(),
        ServerState::Inactive => name.dimmed().to_string(),
        ServerState::Activating | ServerState::Deactivating | ServerState::Destroying => {
            name.yellow().to_string()
        }
        ServerState::ActivationTimedOut | ServerState::Destroyed => name.red().to_string(),
    }
}

/// Colored enablement marker, padded to a fixed width
pub fn enabled(enabled: bool) -> String {
    if enabled {
        pad("enabled", 8).green().to_string()
    } else {
        pad("disabled", 8).yellow().to_string()
    }
}

/// Pad `s` to `width` display columns
pub fn pad(s: &str, width: usize) -> String {
    let len = s.chars().count();
    if len >= width {
        s.to_string()
    } else {
        format!("{s}{}", " ".repeat(width - len))
    }
}

/// Print one server row: marker, padded id, then details
pub fn server_row(marker: &str, id: &str, width: usize, details: &str) {
    println!("  {marker} {} {details}", pad(id, width));
}

/// Column width for a list of server ids
pub fn id_width<'a>(ids: impl IntoIterator<Item = &'a str>) -> usize {
    ids.into_iter().map(|id| id.chars().count()).max().unwrap_or(0)
}

/// "1 server" / "3 servers"
pub fn servers(count: usize) -> String {
    if count == 1 {
        "1 server".to_string()
    } else {
        format!("{count} servers")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pad() {
        assert_eq!(pad("api", 5), "api  ");
        assert_eq!(pad("worker", 3), "worker");
        assert_eq!(pad("", 2), "  ");
    }

    #[test]
    fn test_id_width() {
        assert_eq!(id_width(["a", "worker", "api"]), 6);
        assert_eq!(id_width(Vec::<&str>::new()), 0);
    }

    #[test]
    fn test_servers_plural() {
        assert_eq!(servers(0), "0 servers");
        assert_eq!(servers(1), "1 server");
        assert_eq!(servers(2), "2 servers");
    }

    #[test]
    fn test_state_names_survive_coloring() {
        colored::control::set_override(false);
        assert_eq!(state(ServerState::Active), "Active");
        assert_eq!(enabled(false), "disabled");
        assert_eq!(enabled(true), "enabled ");
    }
}
