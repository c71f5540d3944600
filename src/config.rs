// src/config.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeSet, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::record::TransmitterId;

pub const ENV_CONFIG_PATH: &str = "DRIFTERS_CONFIG_PATH";
pub const ENV_OUTPUT_DIR: &str = "DRIFTERS_OUTPUT_DIR";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "DRIFTERS_FETCH_TIMEOUT_SECS";
pub const ENV_METRICS_PATH: &str = "DRIFTERS_METRICS_PATH";

pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 30;

/// One feed and the transmitters in it worth keeping.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Source {
    #[serde(rename = "Url", alias = "url", alias = "location")]
    pub location: String,
    /// Year the feed's first record of each transmitter belongs to.
    #[serde(rename = "Year", alias = "year", alias = "base_year")]
    pub base_year: i32,
    #[serde(rename = "Esns", alias = "esns", alias = "transmitter_ids", default)]
    pub transmitter_ids: BTreeSet<TransmitterId>,
}

/// A named track, possibly stitched together from several transmitters.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Drifter {
    #[serde(rename = "Name", alias = "name")]
    pub name: String,
    #[serde(rename = "Esns", alias = "esns", alias = "transmitter_ids", default)]
    pub transmitter_ids: Vec<TransmitterId>,
    /// Unix seconds; `0` or absent means unbounded.
    #[serde(
        rename = "From",
        alias = "from",
        alias = "window_start",
        default,
        deserialize_with = "zero_as_none"
    )]
    pub window_start: Option<i64>,
    #[serde(
        rename = "To",
        alias = "to",
        alias = "window_end",
        default,
        deserialize_with = "zero_as_none"
    )]
    pub window_end: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    #[serde(rename = "Sources", alias = "sources", default)]
    pub sources: Vec<Source>,
    #[serde(rename = "Drifters", alias = "drifters", default)]
    pub drifters: Vec<Drifter>,
}

fn zero_as_none<'de, D>(d: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let v: Option<i64> = Option::deserialize(d)?;
    Ok(v.filter(|&t| t != 0))
}

impl Config {
    /// Load from an explicit path. Supports TOML or JSON formats.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading drifter config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let cfg = parse_config(&content, ext.as_str())
            .with_context(|| format!("parsing drifter config {}", path.display()))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load using env var + fallbacks:
    /// 1) $DRIFTERS_CONFIG_PATH
    /// 2) ./drifters.json
    /// 3) ./drifters.toml
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self::load_from(&pb);
            }
            return Err(anyhow!(
                "{ENV_CONFIG_PATH} points to non-existent path {}",
                pb.display()
            ));
        }
        for candidate in ["drifters.json", "drifters.toml"] {
            let p = PathBuf::from(candidate);
            if p.exists() {
                return Self::load_from(&p);
            }
        }
        Err(anyhow!(
            "no drifter config found (set {ENV_CONFIG_PATH} or provide ./drifters.json)"
        ))
    }

    /// Reject configurations that cannot produce a meaningful run.
    pub fn validate(&self) -> Result<()> {
        if self.sources.is_empty() {
            bail!("config declares no sources");
        }
        for (i, s) in self.sources.iter().enumerate() {
            if s.location.trim().is_empty() {
                bail!("source #{i} has an empty feed location");
            }
        }

        let mut seen = HashSet::new();
        for d in &self.drifters {
            let name = d.name.as_str();
            if name.trim().is_empty() {
                bail!("drifter with empty name");
            }
            if name.contains(['/', '\\']) || name == "." || name == ".." {
                bail!("drifter name {name:?} cannot be used as a file name");
            }
            if !seen.insert(name) {
                bail!("duplicate drifter name {name:?}");
            }
        }

        let declared: HashSet<TransmitterId> = self
            .sources
            .iter()
            .flat_map(|s| s.transmitter_ids.iter().copied())
            .collect();
        for d in &self.drifters {
            for esn in d.transmitter_ids.iter().filter(|e| !declared.contains(*e)) {
                tracing::warn!(
                    drifter = %d.name,
                    esn = esn,
                    "transmitter not declared by any source; it will contribute no points"
                );
            }
        }
        Ok(())
    }
}

fn parse_config(s: &str, hint_ext: &str) -> Result<Config> {
    match hint_ext {
        "toml" => Ok(toml::from_str(s)?),
        "json" => Ok(serde_json::from_str(s)?),
        _ => {
            // No usable extension: sniff the content.
            if s.trim_start().starts_with('{') {
                Ok(serde_json::from_str(s)?)
            } else {
                Ok(toml::from_str(s)?)
            }
        }
    }
}

/// Runtime knobs that live outside the drifter config.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSettings {
    pub output_dir: PathBuf,
    pub fetch_timeout: Duration,
    /// Where to write the Prometheus text dump after a run; `None` disables metrics.
    pub metrics_path: Option<PathBuf>,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            fetch_timeout: Duration::from_secs(DEFAULT_FETCH_TIMEOUT_SECS),
            metrics_path: None,
        }
    }
}

impl RunSettings {
    /// Read `DRIFTERS_OUTPUT_DIR`, `DRIFTERS_FETCH_TIMEOUT_SECS` and
    /// `DRIFTERS_METRICS_PATH`, falling back to defaults when unset.
    pub fn from_env() -> Result<Self> {
        let mut out = Self::default();
        if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
            if !dir.trim().is_empty() {
                out.output_dir = PathBuf::from(dir);
            }
        }
        if let Ok(secs) = std::env::var(ENV_FETCH_TIMEOUT_SECS) {
            let secs: u64 = secs
                .trim()
                .parse()
                .with_context(|| format!("{ENV_FETCH_TIMEOUT_SECS} must be whole seconds"))?;
            out.fetch_timeout = Duration::from_secs(secs);
        }
        out.metrics_path = std::env::var(ENV_METRICS_PATH)
            .ok()
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{env, fs};

    const JSON: &str = r#"{
        "Sources": [
            { "Url": "http://example.test/drift_2014_1.dat", "Year": 2014, "Esns": [995094, 995095] }
        ],
        "Drifters": [
            { "Name": "charger", "Esns": [995094], "From": 1400000000, "To": 0 }
        ]
    }"#;

    #[test]
    fn historical_json_layout_parses() {
        let cfg = parse_config(JSON, "json").unwrap();
        assert_eq!(cfg.sources.len(), 1);
        assert_eq!(cfg.sources[0].base_year, 2014);
        assert!(cfg.sources[0].transmitter_ids.contains(&995095));
        let d = &cfg.drifters[0];
        assert_eq!(d.name, "charger");
        assert_eq!(d.window_start, Some(1_400_000_000));
        assert_eq!(d.window_end, None);
    }

    #[test]
    fn toml_with_lowercase_keys_parses() {
        let toml = r#"
[[sources]]
url = "file:///tmp/feed.dat"
year = 2020
esns = [5, 7]

[[drifters]]
name = "alpha"
esns = [5, 7]
to = 1600000000
"#;
        let cfg = parse_config(toml, "toml").unwrap();
        assert_eq!(cfg.sources[0].transmitter_ids.len(), 2);
        assert_eq!(cfg.drifters[0].window_start, None);
        assert_eq!(cfg.drifters[0].window_end, Some(1_600_000_000));
    }

    #[test]
    fn sniffing_picks_json_without_extension() {
        assert!(parse_config(JSON, "").is_ok());
    }

    #[test]
    fn validation_rejects_bad_names_and_duplicates() {
        let mut cfg = parse_config(JSON, "json").unwrap();
        cfg.validate().unwrap();

        let mut dup = cfg.clone();
        dup.drifters.push(dup.drifters[0].clone());
        assert!(dup.validate().is_err());

        cfg.drifters[0].name = "../escape".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn validation_rejects_missing_sources() {
        let cfg = Config {
            sources: vec![],
            drifters: vec![],
        };
        assert!(cfg.validate().is_err());
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_fallbacks() {
        let old = env::current_dir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        env::set_current_dir(tmp.path()).unwrap();
        env::remove_var(ENV_CONFIG_PATH);

        // Nothing on disk → error
        assert!(Config::load_default().is_err());

        // Fallback ./drifters.json
        fs::write(tmp.path().join("drifters.json"), JSON).unwrap();
        let cfg = Config::load_default().unwrap();
        assert_eq!(cfg.drifters[0].name, "charger");

        // Env takes precedence, and must exist
        env::set_var(ENV_CONFIG_PATH, tmp.path().join("missing.json"));
        assert!(Config::load_default().is_err());
        env::remove_var(ENV_CONFIG_PATH);

        env::set_current_dir(&old).unwrap();
    }

    #[serial_test::serial]
    #[test]
    fn run_settings_read_env() {
        env::set_var(ENV_OUTPUT_DIR, "tracks");
        env::set_var(ENV_FETCH_TIMEOUT_SECS, "5");
        env::set_var(ENV_METRICS_PATH, "metrics/drifters.prom");
        let s = RunSettings::from_env().unwrap();
        assert_eq!(s.output_dir, PathBuf::from("tracks"));
        assert_eq!(s.fetch_timeout, Duration::from_secs(5));
        assert_eq!(s.metrics_path, Some(PathBuf::from("metrics/drifters.prom")));
        env::remove_var(ENV_METRICS_PATH);

        env::set_var(ENV_FETCH_TIMEOUT_SECS, "soon");
        assert!(RunSettings::from_env().is_err());

        env::remove_var(ENV_OUTPUT_DIR);
        env::remove_var(ENV_FETCH_TIMEOUT_SECS);
        assert_eq!(RunSettings::from_env().unwrap(), RunSettings::default());
    }
}
