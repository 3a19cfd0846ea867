use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteOption {
    pub summary: String,
    pub distance_meters: u32,
    pub duration_secs: u32,
    #[serde(default)]
    pub steps: Vec<String>,
}

impl RouteOption {
    pub fn duration_minutes(&self) -> u32 {
        self.duration_secs.div_ceil(60)
    }

    /// Lowercase ASCII words of the summary joined by `-`, e.g. `via-ne-40th-st`.
    pub fn slug(&self) -> String {
        self.summary
            .split(|ch: char| !ch.is_ascii_alphanumeric())
            .filter(|word| !word.is_empty())
            .map(str::to_ascii_lowercase)
            .collect::<Vec<_>>()
            .join("-")
    }

    pub fn distance_label(&self) -> String {
        if self.distance_meters < 1_000 {
            format!("{} m", self.distance_meters)
        } else {
            format!("{:.1} km", f64::from(self.distance_meters) / 1_000.0)
        }
    }
}
