//! Output state: geometry, refresh rate and orientation of the render target
//!
//! Values are stored exactly as given. Hardware discovery upstream is
//! responsible for sanity, so nothing here clamps or rejects.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geometry::Rect;

/// Physical screen orientation, e.g. from an accelerometer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScreenOrientation {
    /// Whatever the panel's native orientation is
    #[default]
    Primary,
    Landscape,
    Portrait,
    InvertedLandscape,
    InvertedPortrait,
}

impl ScreenOrientation {
    /// Clockwise rotation relative to landscape
    pub fn rotation_degrees(&self) -> u32 {
        match self {
            ScreenOrientation::Primary | ScreenOrientation::Landscape => 0,
            ScreenOrientation::Portrait => 90,
            ScreenOrientation::InvertedLandscape => 180,
            ScreenOrientation::InvertedPortrait => 270,
        }
    }

    pub fn is_portrait(&self) -> bool {
        matches!(
            self,
            ScreenOrientation::Portrait | ScreenOrientation::InvertedPortrait
        )
    }
}

/// Which output property a setter touched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputProperty {
    Geometry,
    RefreshRate,
    Orientation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputState {
    geometry: Rect,
    refresh_rate: i32,
    orientation: ScreenOrientation,
}

impl Default for OutputState {
    fn default() -> Self {
        Self::new(Rect::new(0, 0, 1920, 1080), 60, ScreenOrientation::Primary)
    }
}

impl OutputState {
    pub fn new(geometry: Rect, refresh_rate: i32, orientation: ScreenOrientation) -> Self {
        Self {
            geometry,
            refresh_rate,
            orientation,
        }
    }

    pub fn geometry(&self) -> Rect {
        self.geometry
    }

    /// Refresh rate in Hz
    pub fn refresh_rate(&self) -> i32 {
        self.refresh_rate
    }

    pub fn orientation(&self) -> ScreenOrientation {
        self.orientation
    }

    /// Returns true if the stored value changed
    pub fn set_geometry(&mut self, geometry: Rect) -> bool {
        let changed = self.geometry != geometry;
        self.geometry = geometry;
        changed
    }

    pub fn set_refresh_rate(&mut self, hz: i32) -> bool {
        let changed = self.refresh_rate != hz;
        self.refresh_rate = hz;
        changed
    }

    pub fn set_orientation(&mut self, orientation: ScreenOrientation) -> bool {
        let changed = self.orientation != orientation;
        self.orientation = orientation;
        changed
    }

    /// Time between refreshes; `None` when the stored rate is not positive
    pub fn refresh_interval(&self) -> Option<Duration> {
        if self.refresh_rate > 0 {
            Some(Duration::from_secs_f64(1.0 / self.refresh_rate as f64))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setters_are_independent() {
        let mut output = OutputState::default();
        output.set_geometry(Rect::new(0, 0, 1920, 1080));
        output.set_refresh_rate(60);
        assert_eq!(output.geometry(), Rect::new(0, 0, 1920, 1080));

        output.set_orientation(ScreenOrientation::Portrait);
        assert_eq!(output.geometry(), Rect::new(0, 0, 1920, 1080));
        assert_eq!(output.refresh_rate(), 60);
    }

    #[test]
    fn test_values_stored_literally() {
        let mut output = OutputState::default();
        assert!(output.set_geometry(Rect::new(-10, 5, -1, 0)));
        assert!(output.set_refresh_rate(-30));
        assert_eq!(output.geometry(), Rect::new(-10, 5, -1, 0));
        assert_eq!(output.refresh_rate(), -30);
        assert_eq!(output.refresh_interval(), None);
    }

    #[test]
    fn test_unchanged_write_reports_false() {
        let mut output = OutputState::default();
        assert!(!output.set_refresh_rate(60));
        assert!(!output.set_orientation(ScreenOrientation::Primary));
    }

    #[test]
    fn test_orientation_rotation() {
        assert_eq!(ScreenOrientation::InvertedPortrait.rotation_degrees(), 270);
        assert!(ScreenOrientation::Portrait.is_portrait());
        assert!(!ScreenOrientation::Landscape.is_portrait());
    }
}
