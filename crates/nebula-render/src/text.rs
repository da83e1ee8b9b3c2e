//! Terminal rendition of a [`ForecastView`].
//!
//! Each card gets a small bordered grid standing in for the location
//! image, with marker points projected from their percentage coordinates.

use nebula_types::SpawnKind;

use crate::markers::MarkerPoint;
use crate::view::{ForecastView, SpawnCard, WindowView};

/// Inner width of a card overlay, in characters.
pub const GRID_WIDTH: usize = 24;

/// Inner height of a card overlay, in rows.
pub const GRID_HEIGHT: usize = 8;

const EMPTY_CELL: char = '.';
const COLLISION_CELL: char = '*';
const TITLE: &str = "Nebula Relics Spawn Tracker";
const CYCLE_NOTE: &str = "Spawns occur every 20 minutes, locations rotate hourly";

/// Render a full frame as text, one line per row, without a trailing newline.
pub fn render(view: &ForecastView) -> String {
    let mut lines = vec![
        TITLE.to_owned(),
        "=".repeat(TITLE.len()),
        format!("Server Time: {} {}", view.server_time, view.timezone_label),
        format!("Next spawn in: {}", view.countdown),
        String::new(),
        format!("Current Spawns ({})", view.color_set),
    ];

    for card in &view.current {
        push_card(&mut lines, card);
    }

    for window in &view.upcoming {
        lines.push(String::new());
        push_window(&mut lines, window);
    }

    lines.push(String::new());
    lines.push(legend());
    lines.push(rotation_line(view));
    lines.push(CYCLE_NOTE.to_owned());
    lines.join("\n")
}

/// Draw the marker overlay for one card as grid rows, border included.
pub fn overlay(markers: &[MarkerPoint]) -> Vec<String> {
    let mut grid = vec![vec![EMPTY_CELL; GRID_WIDTH]; GRID_HEIGHT];

    for point in markers {
        let column = project(point.x_percent, GRID_WIDTH);
        let row = project(point.y_percent, GRID_HEIGHT);
        if let Some(cell) = grid.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = if *cell == EMPTY_CELL {
                point.kind.glyph()
            } else {
                COLLISION_CELL
            };
        }
    }

    let border = format!("+{}+", "-".repeat(GRID_WIDTH));
    let mut rows = Vec::with_capacity(GRID_HEIGHT.saturating_add(2));
    rows.push(border.clone());
    rows.extend(
        grid.into_iter()
            .map(|cells| format!("|{}|", cells.into_iter().collect::<String>())),
    );
    rows.push(border);
    rows
}

fn push_window(lines: &mut Vec<String>, window: &WindowView) {
    lines.push(format!(
        "{} at {} {} ({})",
        window.label, window.starts_at, window.timezone_label, window.color_set
    ));
    for card in &window.cards {
        push_card(lines, card);
    }
}

fn push_card(lines: &mut Vec<String>, card: &SpawnCard) {
    lines.push(format!("  {}: {}", card.name, card.kind));
    if let Some(image) = &card.image {
        lines.push(format!("    image: {image}"));
    }
    if card.markers.is_empty() {
        return;
    }
    lines.extend(overlay(&card.markers).into_iter().map(|row| format!("    {row}")));
}

fn legend() -> String {
    format!(
        "Legend: {} {}  {} {}  {COLLISION_CELL} overlap",
        SpawnKind::Chest.glyph(),
        SpawnKind::Chest,
        SpawnKind::Ore.glyph(),
        SpawnKind::Ore,
    )
}

/// Color sets of the current window and the windows after it, in order.
fn rotation_line(view: &ForecastView) -> String {
    let sequence = std::iter::once(view.color_set)
        .chain(view.upcoming.iter().map(|window| window.color_set))
        .map(|color_set| color_set.label())
        .collect::<Vec<_>>()
        .join(" -> ");
    format!("Color Set Rotation (20min cycles): {sequence}")
}

/// Map a 0..=100 percentage onto `0..cells`.
fn project(percent: u8, cells: usize) -> usize {
    usize::from(percent.min(100))
        .saturating_mul(cells.saturating_sub(1))
        .checked_div(100)
        .unwrap_or(0)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]
mod tests {
    use nebula_types::{ColorSet, Location};

    use super::*;

    fn card(markers: Vec<MarkerPoint>) -> SpawnCard {
        SpawnCard {
            location: Location::OrcVillage,
            name: "Orc Village".to_owned(),
            kind: SpawnKind::Ore,
            color_set: ColorSet::Blue,
            image: None,
            markers,
        }
    }

    fn point(x_percent: u8, y_percent: u8, kind: SpawnKind) -> MarkerPoint {
        MarkerPoint {
            x_percent,
            y_percent,
            kind,
        }
    }

    #[test]
    fn projection_spans_the_grid() {
        assert_eq!(project(0, GRID_WIDTH), 0);
        assert_eq!(project(100, GRID_WIDTH), GRID_WIDTH - 1);
        assert_eq!(project(50, GRID_HEIGHT), 3);
        assert_eq!(project(255, GRID_HEIGHT), GRID_HEIGHT - 1);
    }

    #[test]
    fn overlay_places_glyphs() {
        let rows = overlay(&[
            point(0, 0, SpawnKind::Chest),
            point(100, 100, SpawnKind::Ore),
        ]);
        assert_eq!(rows.len(), GRID_HEIGHT + 2);
        assert!(rows[0].starts_with('+'));
        assert!(rows[1].starts_with("|C"));
        assert!(rows[GRID_HEIGHT].ends_with("O|"));
        for row in &rows {
            assert_eq!(row.chars().count(), GRID_WIDTH + 2);
        }
    }

    #[test]
    fn overlapping_markers_collapse() {
        let rows = overlay(&[
            point(45, 80, SpawnKind::Chest),
            point(46, 84, SpawnKind::Ore),
        ]);
        let marked: String = rows.concat().chars().filter(|c| c.is_alphabetic()).collect();
        assert!(marked.is_empty());
        assert_eq!(rows.concat().matches(COLLISION_CELL).count(), 1);
    }

    #[test]
    fn card_without_markers_has_no_grid() {
        let mut lines = Vec::new();
        push_card(&mut lines, &card(Vec::new()));
        assert_eq!(lines, vec!["  Orc Village: Ore".to_owned()]);
    }

    #[test]
    fn frame_has_header_and_legend() {
        let view = ForecastView {
            server_time: "9:05:30 PM".to_owned(),
            timezone_label: "EST".to_owned(),
            countdown: "14m 30s".to_owned(),
            countdown_seconds: 870,
            color_set: ColorSet::Blue,
            current: vec![card(vec![point(15, 65, SpawnKind::Ore)])],
            upcoming: vec![
                WindowView {
                    label: "Next Spawn".to_owned(),
                    starts_at: "9:20:00 PM".to_owned(),
                    timezone_label: "EST".to_owned(),
                    color_set: ColorSet::Green,
                    cards: vec![card(Vec::new())],
                },
                WindowView {
                    label: "Following Spawn".to_owned(),
                    starts_at: "9:40:00 PM".to_owned(),
                    timezone_label: "EST".to_owned(),
                    color_set: ColorSet::Orange,
                    cards: vec![card(Vec::new())],
                },
            ],
        };
        let text = render(&view);
        assert!(text.starts_with(TITLE));
        assert!(text.contains("Server Time: 9:05:30 PM EST"));
        assert!(text.contains("Next spawn in: 14m 30s"));
        assert!(text.contains("Current Spawns (blue)"));
        assert!(text.contains("Next Spawn at 9:20:00 PM EST (green)"));
        assert!(text.contains("Following Spawn at 9:40:00 PM EST (orange)"));
        assert!(text.contains("Legend: C Chest  O Ore  * overlap"));
        assert!(text.contains("Color Set Rotation (20min cycles): blue -> green -> orange"));
        assert!(text.ends_with(CYCLE_NOTE));
    }

    #[test]
    fn window_uses_its_own_zone_label() {
        let window = WindowView {
            label: "Next Spawn".to_owned(),
            starts_at: "3:00:00 AM".to_owned(),
            timezone_label: "EDT".to_owned(),
            color_set: ColorSet::Orange,
            cards: Vec::new(),
        };
        let mut lines = Vec::new();
        push_window(&mut lines, &window);
        assert_eq!(lines, vec!["Next Spawn at 3:00:00 AM EDT (orange)".to_owned()]);
    }
}
