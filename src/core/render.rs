//! PNG rendering of the weekly grid.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use ab_glyph::{FontRef, PxScale};
use chrono::{Local, NaiveDate};
use image::{ImageFormat, Rgb, RgbImage};
use imageproc::drawing::{draw_text_mut, text_size};
use log::{error, info};

use crate::core::schedule::{GRID_END_MINUTE, GRID_START_MINUTE, WeeklyGrid, WeeklySlot, weekly_grid};
use crate::error::ScrapeResult;
use crate::model::class_entry::UNKNOWN_ROOM;
use crate::model::theme::{Color, Palette, Theme};
use crate::model::timetable::Timetable;

pub const IMAGE_WIDTH: u32 = 1400;
pub const IMAGE_HEIGHT: u32 = 1000;

const MARGIN_LEFT: u32 = 90;
const MARGIN_RIGHT: u32 = 30;
const MARGIN_TOP: u32 = 70;
const LEGEND_HEIGHT: u32 = 200;
const BOX_WIDTH_RATIO: f32 = 0.8;
const TOP_STRIP: u32 = 6;
const SWATCH: u32 = 22;
const LEGEND_COLUMNS: u32 = 5;

/// Labels longer than this many characters are cut to `LABEL_KEEP` plus "...".
const LABEL_LIMIT: usize = 20;
const LABEL_KEEP: usize = 18;

static REGULAR_FONT: LazyLock<FontRef<'static>> = LazyLock::new(|| {
    FontRef::try_from_slice(include_bytes!("../../assets/fonts/DejaVuSans.ttf"))
        .expect("Invalid embedded regular font")
});
static BOLD_FONT: LazyLock<FontRef<'static>> = LazyLock::new(|| {
    FontRef::try_from_slice(include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf"))
        .expect("Invalid embedded bold font")
});

/// Renders the timetable to `<stem>_<theme>.png` next to `output`.
///
/// With `generate_all` and the light theme, every other theme is rendered
/// too. Returns the files written; failures are logged.
pub fn render_timetable_image(
    timetable: &Timetable,
    output: &Path,
    theme: Theme,
    generate_all: bool,
) -> Vec<PathBuf> {
    let grid = weekly_grid(timetable);
    if grid.days.is_empty() {
        error!("No days with events found in timetable");
        return Vec::new();
    }

    let themes: Vec<Theme> = if theme == Theme::Light && generate_all {
        Theme::ALL.to_vec()
    } else {
        vec![theme]
    };
    let generated_on = Local::now().date_naive();

    let mut written = Vec::new();
    for (index, theme) in themes.into_iter().enumerate() {
        let path = themed_path(output, theme);
        match save_image(&grid, theme, generated_on, &path) {
            Ok(()) => {
                info!("Timetable image saved as {}", path.display());
                written.push(path);
            }
            Err(err) => {
                error!("Failed to generate {} timetable image: {}", theme, err);
                // The other themes only follow a successful light render.
                if index == 0 {
                    break;
                }
            }
        }
    }
    written
}

/// `out/week.png` + dark -> `out/week_dark.png`.
pub fn themed_path(output: &Path, theme: Theme) -> PathBuf {
    let mut name = output.with_extension("").into_os_string();
    name.push(format!("_{}.png", theme.name()));
    PathBuf::from(name)
}

fn save_image(grid: &WeeklyGrid<'_>, theme: Theme, generated_on: NaiveDate, path: &Path) -> ScrapeResult<()> {
    let image = draw_grid(grid, theme, generated_on);
    image.save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

/// Draws the day x time grid with one labelled box per class, the axis
/// labels, a heading and a room legend.
pub fn draw_grid(grid: &WeeklyGrid<'_>, theme: Theme, generated_on: NaiveDate) -> RgbImage {
    let palette = theme.palette();
    let mut canvas = Canvas::new(IMAGE_WIDTH, IMAGE_HEIGHT, palette.background);
    let area = GridArea::new(grid.days.len() as u32);

    canvas.text(
        TextStyle::bold(26.0, palette.title),
        (IMAGE_WIDTH / 2, MARGIN_TOP / 2),
        (Align::Center, Align::Center),
        &format!("Weekly Timetable - {}", theme.title()),
    );

    // Half-hour lines first so the hour lines draw over them.
    for minute in (GRID_START_MINUTE..GRID_END_MINUTE).step_by(30).skip(1).step_by(2) {
        canvas.dashed_hline(area.left, area.right, area.y(minute), palette.grid, 0.5);
    }
    for minute in (GRID_START_MINUTE..=GRID_END_MINUTE).step_by(60) {
        let y = area.y(minute);
        canvas.hline(area.left, area.right, y, palette.grid, 0.8);
        canvas.hline(area.left - 8, area.left, y, palette.border, 1.0);
        canvas.text(
            TextStyle::regular(14.0, palette.text),
            (area.left - 12, y),
            (Align::End, Align::Center),
            &format!("{:02}:00", minute / 60),
        );
    }
    for column in 1..grid.days.len() as u32 {
        let x = area.left + column * area.column_width;
        canvas.vline(x, area.top, area.bottom, palette.grid, 0.4);
    }
    canvas.rect_outline(area.left, area.top, area.right, area.bottom, palette.border, 1.0);

    for (column, day) in grid.days.iter().enumerate() {
        canvas.text(
            TextStyle::bold(17.0, palette.text),
            (area.column_center(column), area.bottom + 10),
            (Align::Center, Align::Start),
            day,
        );
    }

    for slot in &grid.slots {
        draw_slot(&mut canvas, &area, &palette, slot);
    }

    canvas.text(
        TextStyle::regular(12.0, palette.text),
        (area.right - 6, area.bottom - 6),
        (Align::End, Align::End),
        &format!("Generated: {}", generated_on.format("%Y-%m-%d")),
    );

    draw_legend(&mut canvas, grid, &palette, area.bottom + 44);

    canvas.into_image()
}

fn draw_slot(canvas: &mut Canvas, area: &GridArea, palette: &Palette, slot: &WeeklySlot<'_>) {
    let color = palette.rooms[slot.room_index % palette.rooms.len()];
    let center = area.column_center(slot.column);
    let half = (area.column_width as f32 * BOX_WIDTH_RATIO / 2.0) as u32;
    let (x0, x1) = (center - half, center + half);
    let (y0, y1) = (area.y(slot.start_minute), area.y(slot.end_minute));

    canvas.fill_rect(x0, y0, x1, y1, color, palette.fill_alpha);
    canvas.fill_rect(
        x0,
        y0,
        x1,
        (y0 + TOP_STRIP).min(y1),
        color.darken(0.15),
        (palette.fill_alpha * 1.2).min(1.0),
    );
    canvas.rect_outline(x0, y0, x1, y1, palette.border, 1.0);
    canvas.rect_outline(x0 + 1, y0 + 1, x1.saturating_sub(1), y1.saturating_sub(1), palette.border, 0.6);

    let course = TextStyle::bold(15.0, palette.text);
    let room = (slot.room != UNKNOWN_ROOM).then_some(slot.room);
    let middle = (y0 + y1) / 2;

    canvas.text(
        TextStyle::regular(12.0, palette.text),
        (center, y0 + TOP_STRIP + 2),
        (Align::Center, Align::Start),
        &slot.span.start.format("%H:%M").to_string(),
    );

    if slot.end_minute.saturating_sub(slot.start_minute) > 60 {
        canvas.text(course, (center, y0 + 24), (Align::Center, Align::Start), slot.course_code);
        if let Some(lecturer) = &slot.entry.lecturer {
            canvas.text(
                TextStyle::regular(12.0, palette.text),
                (center, middle),
                (Align::Center, Align::Center),
                &shorten(lecturer),
            );
        }
        if let Some(room) = room {
            canvas.text(
                TextStyle::regular(13.0, palette.text),
                (center, y1.saturating_sub(6)),
                (Align::Center, Align::End),
                room,
            );
        }
    } else if let Some(room) = room {
        canvas.text(course, (center, middle), (Align::Center, Align::End), slot.course_code);
        canvas.text(
            TextStyle::regular(13.0, palette.text),
            (center, middle + 2),
            (Align::Center, Align::Start),
            room,
        );
    } else {
        canvas.text(course, (center, middle + 6), (Align::Center, Align::Center), slot.course_code);
    }
}

/// Swatches with room names, at most `LEGEND_COLUMNS` per row, centred.
fn draw_legend(canvas: &mut Canvas, grid: &WeeklyGrid<'_>, palette: &Palette, top: u32) {
    if grid.rooms.is_empty() {
        return;
    }
    canvas.text(
        TextStyle::bold(16.0, palette.text),
        (IMAGE_WIDTH / 2, top),
        (Align::Center, Align::Start),
        "Room Legend",
    );

    let columns = LEGEND_COLUMNS.min(grid.rooms.len() as u32);
    let cell_width = (IMAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / LEGEND_COLUMNS;
    let left = (IMAGE_WIDTH - columns * cell_width) / 2;
    for (index, room) in grid.rooms.iter().enumerate() {
        let index = index as u32;
        let x = left + (index % columns) * cell_width;
        let y = top + 28 + (index / columns) * (SWATCH + 10);
        if y + SWATCH >= IMAGE_HEIGHT {
            break;
        }
        let color = palette.rooms[index as usize % palette.rooms.len()];
        canvas.fill_rect(x, y, x + SWATCH, y + SWATCH, color, palette.fill_alpha);
        canvas.rect_outline(x, y, x + SWATCH, y + SWATCH, palette.border, 1.0);
        canvas.text(
            TextStyle::regular(13.0, palette.text),
            (x + SWATCH + 8, y + SWATCH / 2),
            (Align::Start, Align::Center),
            &shorten(room),
        );
    }
}

/// `"O'SULLIVAN MAIREAD DR"` style names are cut so they fit inside a box.
fn shorten(label: &str) -> String {
    if label.chars().count() > LABEL_LIMIT {
        let kept: String = label.chars().take(LABEL_KEEP).collect();
        format!("{}...", kept)
    } else {
        label.to_string()
    }
}

/// Pixel geometry of the plotting area.
struct GridArea {
    left: u32,
    right: u32,
    top: u32,
    bottom: u32,
    column_width: u32,
}

impl GridArea {
    fn new(columns: u32) -> Self {
        let left = MARGIN_LEFT;
        let top = MARGIN_TOP;
        let bottom = IMAGE_HEIGHT - LEGEND_HEIGHT;
        let column_width = (IMAGE_WIDTH - MARGIN_LEFT - MARGIN_RIGHT) / columns.max(1);
        GridArea {
            left,
            right: left + column_width * columns.max(1),
            top,
            bottom,
            column_width,
        }
    }

    fn column_center(&self, column: usize) -> u32 {
        self.left + column as u32 * self.column_width + self.column_width / 2
    }

    /// Earlier times sit higher up.
    fn y(&self, minute: u32) -> u32 {
        let minute = minute.clamp(GRID_START_MINUTE, GRID_END_MINUTE);
        let span = (GRID_END_MINUTE - GRID_START_MINUTE) as f32;
        let fraction = (minute - GRID_START_MINUTE) as f32 / span;
        self.top + (fraction * (self.bottom - self.top) as f32).round() as u32
    }
}

#[derive(Debug, Clone, Copy)]
enum Align {
    Start,
    Center,
    End,
}

impl Align {
    fn offset(self, extent: i32) -> i32 {
        match self {
            Align::Start => 0,
            Align::Center => extent / 2,
            Align::End => extent,
        }
    }
}

#[derive(Clone, Copy)]
struct TextStyle {
    font: &'static FontRef<'static>,
    size: f32,
    color: Color,
}

impl TextStyle {
    fn regular(size: f32, color: Color) -> Self {
        TextStyle {
            font: &*REGULAR_FONT,
            size,
            color,
        }
    }

    fn bold(size: f32, color: Color) -> Self {
        TextStyle {
            font: &*BOLD_FONT,
            size,
            color,
        }
    }
}

struct Canvas {
    image: RgbImage,
}

impl Canvas {
    fn new(width: u32, height: u32, background: Color) -> Self {
        Canvas {
            image: RgbImage::from_pixel(width, height, rgb(background)),
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Color, alpha: f32) {
        if x >= self.image.width() || y >= self.image.height() {
            return;
        }
        let pixel = self.image.get_pixel_mut(x, y);
        let mix = |dst: u8, src: u8| (src as f32 * alpha + dst as f32 * (1.0 - alpha)).round() as u8;
        let Rgb([r, g, b]) = *pixel;
        *pixel = Rgb([mix(r, color.0), mix(g, color.1), mix(b, color.2)]);
    }

    fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Color, alpha: f32) {
        for y in y0..y1 {
            for x in x0..x1 {
                self.blend(x, y, color, alpha);
            }
        }
    }

    fn hline(&mut self, x0: u32, x1: u32, y: u32, color: Color, alpha: f32) {
        for x in x0..=x1 {
            self.blend(x, y, color, alpha);
        }
    }

    fn dashed_hline(&mut self, x0: u32, x1: u32, y: u32, color: Color, alpha: f32) {
        for x in (x0..=x1).filter(|x| (x - x0) % 12 < 6) {
            self.blend(x, y, color, alpha);
        }
    }

    fn vline(&mut self, x: u32, y0: u32, y1: u32, color: Color, alpha: f32) {
        for y in y0..=y1 {
            self.blend(x, y, color, alpha);
        }
    }

    fn rect_outline(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: Color, alpha: f32) {
        if x1 < x0 || y1 < y0 {
            return;
        }
        self.hline(x0, x1, y0, color, alpha);
        if y1 > y0 {
            self.hline(x0, x1, y1, color, alpha);
        }
        for y in y0.saturating_add(1)..y1 {
            self.blend(x0, y, color, alpha);
            if x1 > x0 {
                self.blend(x1, y, color, alpha);
            }
        }
    }

    /// Draws `text` so that `anchor` sits at the given alignment of its bounding box.
    fn text(&mut self, style: TextStyle, anchor: (u32, u32), align: (Align, Align), text: &str) {
        if text.is_empty() {
            return;
        }
        let scale = PxScale::from(style.size);
        let (width, height) = text_size(scale, style.font, text);
        let x = anchor.0 as i32 - align.0.offset(width as i32);
        let y = anchor.1 as i32 - align.1.offset(height as i32);
        draw_text_mut(&mut self.image, rgb(style.color), x, y, scale, style.font, text);
    }

    fn into_image(self) -> RgbImage {
        self.image
    }
}

fn rgb(color: Color) -> Rgb<u8> {
    Rgb([color.0, color.1, color.2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::class_entry::ClassEntry;

    fn sample() -> Timetable {
        let mut timetable = Timetable::with_days(["Monday", "Tuesday", "Wednesday"]);
        timetable.push(
            "Monday",
            ClassEntry {
                time: "9:00 - 11:00".into(),
                course_code: Some("CS101".into()),
                room: Some("A1".into()),
                ..Default::default()
            },
        );
        timetable.push(
            "Tuesday",
            ClassEntry {
                time: "14:00 - 15:00".into(),
                course_code: Some("CS102".into()),
                ..Default::default()
            },
        );
        timetable
    }

    fn generated_on() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, 8).unwrap()
    }

    fn single_class(course: &str, lecturer: &str) -> Timetable {
        let mut timetable = Timetable::with_days(["Monday"]);
        timetable.push(
            "Monday",
            ClassEntry {
                time: "10:00 - 12:00".into(),
                course_code: Some(course.into()),
                lecturer: Some(lecturer.into()),
                room: Some("CSG001".into()),
                weeks: Some("Wks:1-13".into()),
            },
        );
        timetable
    }

    fn differs_from_background(image: &RgbImage, background: Color, rows: std::ops::Range<u32>) -> bool {
        rows.flat_map(|y| (0..IMAGE_WIDTH).map(move |x| (x, y)))
            .any(|(x, y)| *image.get_pixel(x, y) != rgb(background))
    }

    #[test]
    fn course_and_lecturer_change_the_picture() {
        let first = single_class("CS101", "Dr. Smith");
        let second = single_class("MA9999", "Prof. Someone Else");
        let a = draw_grid(&weekly_grid(&first), Theme::Light, generated_on());
        let b = draw_grid(&weekly_grid(&second), Theme::Light, generated_on());
        assert_ne!(a, b);

        let again = draw_grid(&weekly_grid(&first), Theme::Light, generated_on());
        assert_eq!(a, again);
    }

    #[test]
    fn heading_and_legend_are_drawn() {
        let timetable = single_class("CS101", "Dr. Smith");
        let image = draw_grid(&weekly_grid(&timetable), Theme::Dark, generated_on());
        let background = Theme::Dark.palette().background;

        assert!(differs_from_background(&image, background, 0..MARGIN_TOP - 5));
        let area = GridArea::new(1);
        assert!(differs_from_background(&image, background, area.bottom + 2..area.bottom + 40));
        assert!(differs_from_background(&image, background, area.bottom + 44..IMAGE_HEIGHT));
    }

    #[test]
    fn long_labels_are_cut() {
        assert_eq!(shorten("Dr. Smith"), "Dr. Smith");
        assert_eq!(shorten("ABCDEFGHIJKLMNOPQRST"), "ABCDEFGHIJKLMNOPQRST");
        assert_eq!(shorten("O'SULLIVAN MAIREAD DR PHD"), "O'SULLIVAN MAIREAD...");
    }

    #[test]
    fn failed_theme_does_not_stop_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("timetable.png");
        std::fs::create_dir(dir.path().join("timetable_dark.png")).unwrap();

        let written = render_timetable_image(&sample(), &output, Theme::Light, true);
        assert_eq!(
            written,
            vec![
                dir.path().join("timetable_light.png"),
                dir.path().join("timetable_blue.png"),
                dir.path().join("timetable_sepia.png"),
                dir.path().join("timetable_contrast.png"),
            ]
        );
    }

    #[test]
    fn failed_light_render_stops_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("timetable.png");
        std::fs::create_dir(dir.path().join("timetable_light.png")).unwrap();

        assert!(render_timetable_image(&sample(), &output, Theme::Light, true).is_empty());
        assert!(!dir.path().join("timetable_dark.png").exists());
    }

    #[test]
    fn themed_path_replaces_extension() {
        assert_eq!(
            themed_path(Path::new("out/week.png"), Theme::Dark),
            PathBuf::from("out/week_dark.png")
        );
        assert_eq!(
            themed_path(Path::new("week"), Theme::Light),
            PathBuf::from("week_light.png")
        );
    }

    #[test]
    fn class_box_is_filled_with_room_colour() {
        let timetable = sample();
        let grid = weekly_grid(&timetable);
        assert_eq!(grid.days, vec!["Monday", "Tuesday"]);

        let palette = Theme::Contrast.palette();
        let image = draw_grid(&grid, Theme::Contrast, generated_on());
        assert_eq!(image.dimensions(), (IMAGE_WIDTH, IMAGE_HEIGHT));

        let area = GridArea::new(2);
        let x = area.left + area.column_width / 2;
        let y = area.y(10 * 60 + 15);
        let expected = rgb(Color(
            (255.0 * palette.fill_alpha).round() as u8,
            0,
            0,
        ));
        assert_eq!(*image.get_pixel(x, y), expected);

        // Nothing is drawn in the Monday column after the class ends.
        let empty = image.get_pixel(x, area.y(16 * 60 + 15));
        assert_eq!(*empty, rgb(palette.background));
    }

    #[test]
    fn writes_one_file_per_theme() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("timetable.png");

        let written = render_timetable_image(&sample(), &output, Theme::Sepia, false);
        assert_eq!(written, vec![dir.path().join("timetable_sepia.png")]);

        let written = render_timetable_image(&sample(), &output, Theme::Light, true);
        assert_eq!(written.len(), Theme::ALL.len());
        for theme in Theme::ALL {
            assert!(dir.path().join(format!("timetable_{}.png", theme.name())).exists());
        }
    }

    #[test]
    fn generate_all_only_applies_to_light() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("timetable.png");
        let written = render_timetable_image(&sample(), &output, Theme::Blue, true);
        assert_eq!(written, vec![dir.path().join("timetable_blue.png")]);
    }

    #[test]
    fn empty_timetable_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("timetable.png");
        let timetable = Timetable::with_days(["Monday"]);
        assert!(render_timetable_image(&timetable, &output, Theme::Light, true).is_empty());
        assert!(!dir.path().join("timetable_light.png").exists());
    }
}
