use clap::Parser;

use crate::gallery::GalleryConfig;

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc           : Close lightbox / quit
  q             : Quit
  Left          : Previous photo
  Right         : Next photo
  Space         : Play / pause slideshow
  Enter         : Open lightbox on current photo

Mouse:
  Click arrows      : Previous / next photo
  Click thumbnail   : Jump to photo
  Click photo       : Open lightbox
  Drag horizontally : Swipe to previous / next
";

#[derive(Parser)]
#[command(name = "gv", about = "A slideshow photo gallery viewer", after_help = HELP_KEYS)]
pub struct Cli {
    /// Files or directories to show
    #[arg(required_unless_present = "file_list")]
    pub paths: Vec<std::path::PathBuf>,

    /// Load photo list from a text file (one path per line)
    #[arg(short = 'L', long, value_name = "FILE")]
    pub file_list: Option<std::path::PathBuf>,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Memory budget for the decode cache (e.g. 512MB, 2GB). Default: 10% of RAM.
    #[arg(short, long)]
    pub memory: Option<String>,

    /// Do not start the slideshow automatically
    #[arg(long)]
    pub no_autoplay: bool,

    /// Slideshow interval in milliseconds
    #[arg(long, default_value = "5000")]
    pub interval: u64,

    /// Fade transition duration in milliseconds
    #[arg(long, default_value = "400")]
    pub transition: u64,

    /// Ignore keyboard navigation
    #[arg(long)]
    pub no_keyboard: bool,

    /// Ignore swipe gestures
    #[arg(long)]
    pub no_touch: bool,
}

impl Cli {
    pub fn gallery_config(&self) -> GalleryConfig {
        GalleryConfig {
            autoplay: !self.no_autoplay,
            autoplay_interval: std::time::Duration::from_millis(self.interval.max(1)),
            transition_duration: std::time::Duration::from_millis(self.transition),
            keyboard: !self.no_keyboard,
            touch: !self.no_touch,
        }
    }
}

pub fn parse_memory_budget(s: &str) -> u64 {
    let s = s.trim().to_uppercase();
    if let Some(num) = s.strip_suffix("GB") {
        num.trim().parse::<f64>().unwrap_or(1.0) as u64 * 1024 * 1024 * 1024
    } else if let Some(num) = s.strip_suffix("MB") {
        num.trim().parse::<f64>().unwrap_or(512.0) as u64 * 1024 * 1024
    } else {
        s.parse::<f64>().unwrap_or(512.0) as u64 * 1024 * 1024
    }
}

pub fn default_memory_budget() -> u64 {
    let mut sys = sysinfo::System::new();
    sys.refresh_memory();
    sys.total_memory() / 10
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_budget_suffixes() {
        assert_eq!(parse_memory_budget("2GB"), 2 * 1024 * 1024 * 1024);
        assert_eq!(parse_memory_budget(" 512mb "), 512 * 1024 * 1024);
        assert_eq!(parse_memory_budget("128"), 128 * 1024 * 1024);
    }

    #[test]
    fn flags_map_onto_config() {
        let cli = Cli::parse_from([
            "gv",
            "photos/",
            "--no-autoplay",
            "--interval",
            "2500",
            "--no-touch",
        ]);
        let config = cli.gallery_config();
        assert!(!config.autoplay);
        assert_eq!(config.autoplay_interval.as_millis(), 2500);
        assert!(config.keyboard);
        assert!(!config.touch);
    }
}
