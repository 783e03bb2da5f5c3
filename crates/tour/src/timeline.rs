//! Timeline highlighting.
//!
//! Stateless: everything is read from and written to the surface.

/// Horizontal placement of one year entry, in the same coordinate space as
/// its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryGeometry {
    pub left: f64,
    pub width: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerGeometry {
    pub left: f64,
    pub width: f64,
    pub scroll_left: f64,
}

/// The year strip as rendered by the host.
pub trait TimelineSurface {
    fn years(&self) -> Vec<String>;
    fn entry_geometry(&self, year: &str) -> Option<EntryGeometry>;
    fn container_geometry(&self) -> ContainerGeometry;
    fn set_active(&mut self, year: &str, active: bool);
    fn smooth_scroll_to(&mut self, scroll_left: f64);
}

/// Scroll offset that centers `entry` inside `container`.
pub fn centered_scroll_left(entry: EntryGeometry, container: ContainerGeometry) -> f64 {
    entry.left - container.left + container.scroll_left - container.width / 2.0 + entry.width / 2.0
}

/// Marks `year` active, every other entry inactive, and scrolls the active
/// entry to the middle.
pub fn highlight<T: TimelineSurface>(surface: &mut T, year: &str) {
    for entry in surface.years() {
        surface.set_active(&entry, entry == year);
    }
    if let Some(entry) = surface.entry_geometry(year) {
        let target = centered_scroll_left(entry, surface.container_geometry());
        surface.smooth_scroll_to(target);
    }
}

pub fn clear<T: TimelineSurface>(surface: &mut T) {
    for entry in surface.years() {
        surface.set_active(&entry, false);
    }
}

#[cfg(test)]
mod tests {
    use super::{ContainerGeometry, EntryGeometry, centered_scroll_left, clear, highlight};
    use crate::sim::TimelineStrip;
    use pretty_assertions::assert_eq;

    fn strip() -> TimelineStrip {
        TimelineStrip::new(vec!["1900".into(), "1950".into(), "2000".into()])
    }

    #[test]
    fn centers_entry_in_container() {
        let entry = EntryGeometry {
            left: 500.0,
            width: 80.0,
        };
        let container = ContainerGeometry {
            left: 100.0,
            width: 400.0,
            scroll_left: 50.0,
        };
        // 500 - 100 + 50 - 200 + 40
        assert_eq!(centered_scroll_left(entry, container), 290.0);
    }

    #[test]
    fn highlight_is_exclusive() {
        let mut timeline = strip();
        highlight(&mut timeline, "1900");
        highlight(&mut timeline, "1950");
        assert_eq!(timeline.active_years(), vec!["1950".to_string()]);
        assert_eq!(timeline.scroll_history().len(), 2);
    }

    #[test]
    fn unknown_year_deactivates_all_without_scrolling() {
        let mut timeline = strip();
        highlight(&mut timeline, "1900");
        highlight(&mut timeline, "1800");
        assert!(timeline.active_years().is_empty());
        assert_eq!(timeline.scroll_history().len(), 1);
    }

    #[test]
    fn clear_removes_highlight() {
        let mut timeline = strip();
        highlight(&mut timeline, "2000");
        clear(&mut timeline);
        assert!(timeline.active_years().is_empty());
    }
}
