use serde::Deserialize;
use std::error::Error;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

// The JSON file has the following structure:
// {
//    "destinations": ["Madrid", ...],
//    "participants": ["Suzi", ...],
//    "draws": 100
// }
// "draws" may be omitted and defaults to 100.
#[derive(Debug, Deserialize)]
pub struct DrawConfig {
    #[serde(default)]
    pub destinations: Vec<String>,
    #[serde(default)]
    pub participants: Vec<String>,
    #[serde(default = "default_draws")]
    pub draws: u32,
}

fn default_draws() -> u32 {
    100
}

pub fn read_draw_config_from_json(path: impl AsRef<Path>) -> Result<DrawConfig, Box<dyn Error>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut config: DrawConfig = serde_json::from_reader(reader)?;
    config.destinations = tidy_labels(config.destinations);
    config.participants = tidy_labels(config.participants);
    Ok(config)
}

// Labels arrive as user-typed lines; trim them and drop the blank ones.
// Duplicates are kept on purpose (see run_simulation).
fn tidy_labels(labels: Vec<String>) -> Vec<String> {
    labels
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_draw_config_from_json() {
        let config = read_draw_config_from_json("draw_config.json").expect("should read file");
        assert!(config.destinations.len() >= 2, "Expected at least 2 destinations");
        assert!(!config.participants.is_empty(), "Expected at least 1 participant");
        assert!(config.draws > 0);
    }

    #[test]
    fn test_labels_are_trimmed_and_blanks_dropped() {
        let path = std::env::temp_dir().join("draw_config_trim_test.json");
        let mut file = File::create(&path).expect("create temp config");
        write!(
            file,
            r#"{{"destinations": ["  Madrid ", "", "Malta", "   "], "participants": [" Suzi"]}}"#
        )
        .expect("write temp config");

        let config = read_draw_config_from_json(&path).expect("should parse");
        assert_eq!(config.destinations, vec!["Madrid", "Malta"]);
        assert_eq!(config.participants, vec!["Suzi"]);
        assert_eq!(config.draws, 100);

        std::fs::remove_file(&path).ok();
    }
}
