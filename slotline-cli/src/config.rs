use anyhow::{Context, Result, anyhow, bail};
use chrono::Weekday;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use slotline_core::time::{MINUTES_PER_DAY, parse_clock};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::state::ensure_slotline_home;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub schedule: ScheduleSection,
    #[serde(default)]
    pub engine: EngineSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSection {
    pub batch_size: usize,
    /// "HH:MM"
    pub start_time: String,
    /// "HH:MM"
    pub end_time: String,
    pub stage_duration_minutes: u32,
    /// Weekday name ("Sun") or "none".
    pub rest_day: String,
    /// IANA zone the clock times are in.
    pub timezone: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSection {
    /// Stop writing after this many seconds; partial results are still reported.
    pub timeout_secs: Option<u64>,
    /// Fixed shuffle seed (reproducible batches).
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schedule: ScheduleSection {
                batch_size: 5,
                start_time: "09:00".to_string(),
                end_time: "17:00".to_string(),
                stage_duration_minutes: 60,
                rest_day: "Sun".to_string(),
                timezone: "UTC".to_string(),
            },
            engine: EngineSection::default(),
        }
    }
}

impl ScheduleSection {
    pub fn timezone(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow!("invalid timezone: {}", self.timezone))
    }

    pub fn rest_day(&self) -> Result<Option<Weekday>> {
        parse_rest_day(&self.rest_day)
    }
}

pub fn parse_rest_day(s: &str) -> Result<Option<Weekday>> {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    s.parse::<Weekday>()
        .map(Some)
        .map_err(|_| anyhow!("invalid rest day: {s}"))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_slotline_home()?.join("config.toml"))
}

impl Config {
    /// Read and validate `path`; a missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        let cfg: Config = match fs::read_to_string(path) {
            Ok(s) => toml::from_str(&s).with_context(|| format!("parse {}", path.display()))?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => Config::default(),
            Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
        };
        cfg.validate()
            .with_context(|| format!("invalid config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let s = toml::to_string_pretty(self).context("serialize config")?;
        fs::write(path, s).with_context(|| format!("write {}", path.display()))
    }

    /// Check every field the `schedule` command falls back on.
    pub fn validate(&self) -> Result<()> {
        let s = &self.schedule;
        if s.batch_size == 0 {
            bail!("batch_size must be positive");
        }
        if s.stage_duration_minutes == 0 || s.stage_duration_minutes > MINUTES_PER_DAY {
            bail!(
                "stage_duration_minutes must be between 1 and {MINUTES_PER_DAY}, got {}",
                s.stage_duration_minutes
            );
        }
        let start = parse_clock(&s.start_time)?;
        let end = parse_clock(&s.end_time)?;
        if end <= start {
            bail!("end_time {} must be after start_time {}", s.end_time, s.start_time);
        }
        s.timezone()?;
        s.rest_day()?;
        Ok(())
    }
}

pub fn load_config() -> Result<Config> {
    Config::load_from(&config_path()?)
}

/// Write the default config unless one exists. Returns whether it was written.
pub fn init_config_at(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    Config::default().save_to(path)?;
    Ok(true)
}

pub fn init_config() -> Result<(PathBuf, bool)> {
    let path = config_path()?;
    let written = init_config_at(&path)?;
    Ok((path, written))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let cfg = Config::default();
        let s = toml::to_string_pretty(&cfg).unwrap();
        let back: Config = toml::from_str(&s).unwrap();
        assert_eq!(back.schedule.batch_size, 5);
        assert_eq!(back.schedule.timezone().unwrap(), Tz::UTC);
        assert_eq!(back.schedule.rest_day().unwrap(), Some(Weekday::Sun));
    }

    #[test]
    fn engine_section_is_optional() {
        let s = r#"
[schedule]
batch_size = 4
start_time = "10:00"
end_time = "16:00"
stage_duration_minutes = 30
rest_day = "none"
timezone = "Asia/Kolkata"
"#;
        let cfg: Config = toml::from_str(s).unwrap();
        assert!(cfg.engine.timeout_secs.is_none());
        assert_eq!(cfg.schedule.rest_day().unwrap(), None);
        assert_eq!(cfg.schedule.timezone().unwrap(), chrono_tz::Asia::Kolkata);
    }

    #[test]
    fn rest_day_accepts_full_names() {
        assert_eq!(parse_rest_day("saturday").unwrap(), Some(Weekday::Sat));
        assert!(parse_rest_day("someday").is_err());
    }

    fn scratch(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("slotline-config-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn missing_file_loads_defaults_and_init_does_not_overwrite() {
        let dir = scratch("init");
        let path = dir.join("config.toml");

        let cfg = Config::load_from(&path).unwrap();
        assert_eq!(cfg.schedule.stage_duration_minutes, 60);

        assert!(init_config_at(&path).unwrap());
        let mut edited = Config::load_from(&path).unwrap();
        edited.schedule.batch_size = 8;
        edited.save_to(&path).unwrap();

        assert!(!init_config_at(&path).unwrap());
        assert_eq!(Config::load_from(&path).unwrap().schedule.batch_size, 8);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn invalid_values_are_rejected_on_load() {
        let dir = scratch("invalid");
        let path = dir.join("config.toml");

        let mut cfg = Config::default();
        cfg.schedule.stage_duration_minutes = 1_431_655_766;
        cfg.save_to(&path).unwrap();
        let err = Config::load_from(&path).unwrap_err();
        assert!(format!("{err:#}").contains("stage_duration_minutes"));

        let mut cfg = Config::default();
        cfg.schedule.end_time = "08:00".to_string();
        cfg.save_to(&path).unwrap();
        assert!(Config::load_from(&path).is_err());

        let mut cfg = Config::default();
        cfg.schedule.timezone = "Mars/Olympus".to_string();
        cfg.save_to(&path).unwrap();
        assert!(Config::load_from(&path).is_err());

        fs::remove_dir_all(&dir).unwrap();
    }
}
