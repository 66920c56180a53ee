use std::fmt;
use std::path::Path;

/// Name reported when neither an override nor a program name is available
pub const DEFAULT_AGENT_NAME: &str = "range_client";

/// User-Agent sent with every request: `name/version (user; hostname)`.
///
/// Resolved once per client so that range server operators can trace a
/// query back to the program, user and machine that issued it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserAgent(String);

impl UserAgent {
    /// Resolves the agent from the local environment
    pub fn resolve(name: Option<&str>) -> Self {
        let name = name
            .filter(|n| !n.is_empty())
            .map(String::from)
            .or_else(program_name)
            .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string());
        let user = std::env::var("USER")
            .or_else(|_| std::env::var("USERNAME"))
            .unwrap_or_else(|_| "unknown".to_string());
        let hostname = gethostname::gethostname().to_string_lossy().to_string();

        Self::from_parts(&name, env!("CARGO_PKG_VERSION"), &user, &hostname)
    }

    pub fn from_parts(name: &str, version: &str, user: &str, hostname: &str) -> Self {
        UserAgent(format!("{}/{} ({}; {})", name, version, user, hostname))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn program_name() -> Option<String> {
    let arg0 = std::env::args_os().next()?;
    Path::new(&arg0)
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .filter(|name| !name.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_parts_format() {
        let agent = UserAgent::from_parts("deployer", "2.0", "alice", "build01");
        assert_eq!(agent.as_str(), "deployer/2.0 (alice; build01)");
    }

    #[test]
    fn test_resolve_prefers_override() {
        let agent = UserAgent::resolve(Some("inventory-sync"));
        let expected_prefix = format!("inventory-sync/{} (", env!("CARGO_PKG_VERSION"));
        assert!(agent.as_str().starts_with(&expected_prefix));
        assert!(agent.as_str().ends_with(')'));
    }

    #[test]
    fn test_resolve_falls_back_to_program_name() {
        let agent = UserAgent::resolve(None);
        let name = agent.as_str().split('/').next().unwrap();
        assert!(!name.is_empty());
    }
}
