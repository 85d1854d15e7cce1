//! Host registry: remote hosts used by earlier spawns (an append-only cache
//! file) merged with the `Host` entries of the ssh client configuration.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub struct HostRegistry {
    cache: PathBuf,
    ssh_config: PathBuf,
}

impl HostRegistry {
    pub fn new(cache: impl Into<PathBuf>, ssh_config: impl Into<PathBuf>) -> Self {
        Self {
            cache: cache.into(),
            ssh_config: ssh_config.into(),
        }
    }

    /// Cached hosts first (in spawn order), then ssh config hosts. No
    /// duplicates. Unreadable files contribute nothing.
    pub fn known_hosts(&self) -> Vec<String> {
        let cached = read_optional(&self.cache)
            .map(|s| parse_cache(&s))
            .unwrap_or_default();
        let configured = read_optional(&self.ssh_config)
            .map(|s| parse_ssh_config_hosts(&s))
            .unwrap_or_default();

        let mut seen = HashSet::new();
        cached
            .into_iter()
            .chain(configured)
            .filter(|h| seen.insert(h.clone()))
            .collect()
    }

    /// Append `host` to the cache unless it is already there. Returns whether
    /// a line was written.
    pub fn remember(&self, host: &str) -> io::Result<bool> {
        let host = host.trim();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Ok(false);
        }
        let existing = read_optional(&self.cache).unwrap_or_default();
        if parse_cache(&existing).iter().any(|h| h == host) {
            return Ok(false);
        }
        if let Some(parent) = self.cache.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new().create(true).append(true).open(&self.cache)?;
        if !existing.is_empty() && !existing.ends_with('\n') {
            writeln!(file)?;
        }
        writeln!(file, "{host}")?;
        tracing::debug!(host, cache = %self.cache.display(), "remembered host");
        Ok(true)
    }
}

fn read_optional(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(s) => Some(s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => None,
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "cannot read host list");
            None
        }
    }
}

fn parse_cache(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Concrete host aliases from `Host` lines. Patterns (`*`, `?`, `!`) are
/// skipped since they name no single machine.
pub fn parse_ssh_config_hosts(text: &str) -> Vec<String> {
    let mut hosts = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        let Some((keyword, rest)) = line.split_once(|c: char| c.is_whitespace() || c == '=')
        else {
            continue;
        };
        if !keyword.eq_ignore_ascii_case("host") {
            continue;
        }
        for alias in rest.trim_start_matches(['=', ' ', '\t']).split_whitespace() {
            if alias.starts_with('#') {
                break;
            }
            if alias.contains(['*', '?', '!']) || hosts.iter().any(|h| h == alias) {
                continue;
            }
            hosts.push(alias.to_string());
        }
    }
    hosts
}

#[cfg(test)]
mod tests {
    use super::*;

    const SSH_CONFIG: &str = "\
Host *
    ServerAliveInterval 30

Host devbox gpu-1
    HostName 10.0.0.5
  host=build
Host *.corp !bastion
HostName not-a-host
Host devbox # again
";

    #[test]
    fn parses_concrete_hosts() {
        assert_eq!(parse_ssh_config_hosts(SSH_CONFIG), vec!["devbox", "gpu-1", "build"]);
    }

    #[test]
    fn union_without_duplicates() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = dir.path().join("hosts");
        let config = dir.path().join("config");
        fs::write(&cache, "gpu-1\nlab\n").expect("write");
        fs::write(&config, SSH_CONFIG).expect("write");
        let registry = HostRegistry::new(&cache, &config);
        assert_eq!(registry.known_hosts(), vec!["gpu-1", "lab", "devbox", "build"]);
    }

    #[test]
    fn missing_files_yield_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = HostRegistry::new(dir.path().join("a"), dir.path().join("b"));
        assert!(registry.known_hosts().is_empty());
    }

    #[test]
    fn remember_appends_once() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = dir.path().join("nested/tmux-pilot/hosts");
        let registry = HostRegistry::new(&cache, dir.path().join("none"));
        assert!(registry.remember("devbox").expect("write"));
        assert!(!registry.remember("devbox").expect("write"));
        assert!(registry.remember("lab").expect("write"));
        assert_eq!(fs::read_to_string(&cache).expect("read"), "devbox\nlab\n");
    }

    #[test]
    fn remember_rejects_blank() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = HostRegistry::new(dir.path().join("h"), dir.path().join("c"));
        assert!(!registry.remember("  ").expect("ok"));
        assert!(!registry.remember("two words").expect("ok"));
    }
}
