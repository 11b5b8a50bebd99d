use raylib::prelude::*;
use std::path::PathBuf;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use mediamate::api::stoic::StoicQuotes;
use mediamate::config::{Config, CONFIG_FILE};
use mediamate::quote::resolve_quote;
use mediamate::timecode::validate_time_format;
use mediamate::video::{self, PictureRequest};
use mediamate::{init, init_tracing, platform, scrape, set_log_hook};

const LOG_MAX_LINES: usize = 300;
const LOG_LINE_MAX: usize = 600;

const COLOR_BG: Color = Color::new(25, 25, 25, 255);
const COLOR_BTN: Color = Color::new(40, 90, 170, 255);
const COLOR_BTN_HOVER: Color = Color::new(70, 120, 200, 255);
const COLOR_BTN_DISABLED: Color = Color::new(60, 60, 60, 255);
const COLOR_TAB_ACTIVE: Color = Color::new(90, 90, 90, 255);
const COLOR_FIELD_BG: Color = Color::new(40, 40, 40, 255);
const COLOR_FIELD_FOCUS: Color = Color::new(70, 120, 200, 255);
const COLOR_LOG_BG: Color = Color::new(18, 18, 18, 255);
const COLOR_LOG_TEXT: Color = Color::new(210, 210, 210, 255);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Template,
    Picture,
    Scrape,
    Config,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
enum Field {
    Quote,
    TemplateFile,
    ImagePath,
    MusicStart,
    MusicEnd,
    MusicUrl,
    ScrapeUrl,
    ScrapeFolder,
    ScrollTimes,
    DefaultQuote,
    DefaultFont,
}

#[derive(Default)]
struct Form {
    quote: String,
    template_file: String,
    image_path: String,
    music_start: String,
    music_end: String,
    music_url: String,
    scrape_url: String,
    scrape_folder: String,
    scroll_times: String,
    default_quote: String,
    default_font: String,
    overlay: bool,
}

impl Form {
    fn from_config(cfg: &Config) -> Self {
        Self {
            default_quote: cfg.default_quote.clone(),
            default_font: cfg.font_path.display().to_string(),
            scroll_times: "0".to_string(),
            overlay: true,
            ..Self::default()
        }
    }

    fn get(&self, field: Field) -> &str {
        match field {
            Field::Quote => &self.quote,
            Field::TemplateFile => &self.template_file,
            Field::ImagePath => &self.image_path,
            Field::MusicStart => &self.music_start,
            Field::MusicEnd => &self.music_end,
            Field::MusicUrl => &self.music_url,
            Field::ScrapeUrl => &self.scrape_url,
            Field::ScrapeFolder => &self.scrape_folder,
            Field::ScrollTimes => &self.scroll_times,
            Field::DefaultQuote => &self.default_quote,
            Field::DefaultFont => &self.default_font,
        }
    }

    fn get_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Quote => &mut self.quote,
            Field::TemplateFile => &mut self.template_file,
            Field::ImagePath => &mut self.image_path,
            Field::MusicStart => &mut self.music_start,
            Field::MusicEnd => &mut self.music_end,
            Field::MusicUrl => &mut self.music_url,
            Field::ScrapeUrl => &mut self.scrape_url,
            Field::ScrapeFolder => &mut self.scrape_folder,
            Field::ScrollTimes => &mut self.scroll_times,
            Field::DefaultQuote => &mut self.default_quote,
            Field::DefaultFont => &mut self.default_font,
        }
    }

    fn font(&self, cfg: &Config) -> PathBuf {
        let f = self.default_font.trim();
        if f.is_empty() { cfg.font_path.clone() } else { PathBuf::from(f) }
    }

    /// Generate is enabled once a template is chosen and some quote exists.
    fn can_generate_template(&self) -> bool {
        !self.template_file.trim().is_empty()
            && !(self.quote.trim().is_empty() && self.default_quote.trim().is_empty())
    }

    /// Default quote as currently typed, saved or not.
    fn typed_default(&self) -> Option<String> {
        Some(self.default_quote.trim().to_string()).filter(|q| !q.is_empty())
    }

    fn template_job(&self, cfg: &Config) -> Job {
        Job::Template {
            quote: Some(self.quote.trim().to_string())
                .filter(|q| !q.is_empty())
                .or_else(|| self.typed_default()),
            template: PathBuf::from(self.template_file.trim()),
            font: self.font(cfg),
        }
    }

    fn picture_job(&self, cfg: &Config) -> Result<Job, String> {
        let image = self.image_path.trim();
        let start = self.music_start.trim();
        let end = self.music_end.trim();
        let url = self.music_url.trim();
        if image.is_empty() || start.is_empty() || end.is_empty() || url.is_empty() {
            return Err("Please provide all required inputs for Picture Video.".to_string());
        }
        if validate_time_format(start).is_err() || validate_time_format(end).is_err() {
            return Err("Music start and end times must be in HH:MM:SS or MM:SS format.".to_string());
        }
        Ok(Job::Picture(PictureRequest {
            image: PathBuf::from(image),
            music_start: start.to_string(),
            music_end: end.to_string(),
            music_url: url.to_string(),
            quote: self.typed_default(),
            font: self.font(cfg),
            overlay: self.overlay,
            videos_dir: cfg.videos_dir.clone(),
        }))
    }

    fn scrape_job(&self) -> Result<Job, String> {
        let url = self.scrape_url.trim();
        let folder = self.scrape_folder.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err("Invalid URL format.".to_string());
        }
        let folder_path = PathBuf::from(folder);
        if folder.is_empty() || !folder_path.is_dir() {
            return Err("Invalid or unwritable folder path.".to_string());
        }
        let pages = self
            .scroll_times
            .trim()
            .parse::<u32>()
            .map_err(|_| "Scroll times must be a valid integer.".to_string())?;
        Ok(Job::Scrape {
            url: url.to_string(),
            folder: folder_path,
            pages,
        })
    }
}

enum Job {
    Template {
        quote: Option<String>,
        template: PathBuf,
        font: PathBuf,
    },
    Picture(PictureRequest),
    Scrape {
        url: String,
        folder: PathBuf,
        pages: u32,
    },
}

impl Job {
    fn label(&self) -> &'static str {
        match self {
            Job::Template { .. } => "generate video",
            Job::Picture(_) => "generate picture video",
            Job::Scrape { .. } => "scrape images",
        }
    }
}

async fn run_job(job: Job, cfg: Config) -> anyhow::Result<String> {
    let client = scrape::build_client()?;
    let quotes = StoicQuotes::new(client.clone(), &cfg);
    match job {
        Job::Template { quote, template, font } => {
            let quote = resolve_quote(quote.as_deref(), cfg.fallback_quote(), &quotes).await?;
            let out = video::template_video(&quote, &template, &font, &cfg.videos_dir).await?;
            Ok(format!("Video generated successfully: {}", out.display()))
        }
        Job::Picture(req) => {
            let out = video::picture_video(&req, cfg.fallback_quote(), &quotes).await?;
            Ok(format!("Picture video generated successfully: {}", out.display()))
        }
        Job::Scrape { url, folder, pages } => {
            let saved = scrape::scrape_images(&client, &url, &folder, pages).await?;
            Ok(format!("Images scraped successfully: {} saved", saved))
        }
    }
}

struct AppState {
    running: Arc<AtomicBool>,
    status: Arc<Mutex<String>>,
    log_buffer: Arc<Mutex<Vec<String>>>,
}

fn push_log_line(buffer: &Arc<Mutex<Vec<String>>>, line: &str) {
    let mut guard = buffer.lock().unwrap_or_else(|e| e.into_inner());
    if guard.len() >= LOG_MAX_LINES {
        let excess = guard.len() + 1 - LOG_MAX_LINES;
        guard.drain(0..excess);
    }
    let mut text = line.to_string();
    if text.len() > LOG_LINE_MAX {
        let mut cut = LOG_LINE_MAX;
        while !text.is_char_boundary(cut) {
            cut -= 1;
        }
        text.truncate(cut);
    }
    guard.push(text);
}

fn set_status(state: &AppState, message: impl Into<String>) {
    *state.status.lock().unwrap_or_else(|e| e.into_inner()) = message.into();
}

fn start_job_thread(state: &AppState, job: Job, cfg: Config) {
    if state.running.load(Ordering::SeqCst) {
        return;
    }

    state.running.store(true, Ordering::SeqCst);
    set_status(state, format!("Running: {}...", job.label()));

    let running = Arc::clone(&state.running);
    let status = Arc::clone(&state.status);
    let log_buffer = Arc::clone(&state.log_buffer);

    std::thread::spawn(move || {
        let hook_buffer = Arc::clone(&log_buffer);
        let hook = Arc::new(Mutex::new(move |line: &str| {
            push_log_line(&hook_buffer, line);
        }));

        set_log_hook(Some(hook));
        let label = job.label();
        let message = match tokio::runtime::Runtime::new() {
            Ok(rt) => match rt.block_on(run_job(job, cfg)) {
                Ok(msg) => msg,
                Err(err) => {
                    push_log_line(&log_buffer, &format!("[ERROR] {:#}", err));
                    format!("Failed to {}: {}", label, err)
                }
            },
            Err(err) => format!("Failed to initialize async runtime: {}", err),
        };

        *status.lock().unwrap_or_else(|e| e.into_inner()) = message;
        set_log_hook(None);
        running.store(false, Ordering::SeqCst);
    });
}

fn draw_button(
    d: &mut RaylibDrawHandle,
    rect: Rectangle,
    label: &str,
    enabled: bool,
    font_size: f32,
) -> bool {
    let mouse = d.get_mouse_position();
    let hot = rect.check_collision_point_rec(mouse);

    let bg = if !enabled {
        COLOR_BTN_DISABLED
    } else if hot {
        COLOR_BTN_HOVER
    } else {
        COLOR_BTN
    };

    d.draw_rectangle_rounded(rect, 0.25, 10, bg);
    d.draw_rectangle_rounded_lines(rect, 0.25, 10, Color::new(20, 20, 20, 255));

    let ts = d.measure_text(label, font_size as i32);
    let pos_x = rect.x + (rect.width - ts as f32) * 0.5;
    let pos_y = rect.y + (rect.height - font_size) * 0.5;

    d.draw_text(label, pos_x as i32, pos_y as i32, font_size as i32, Color::RAYWHITE);

    enabled && hot && d.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT)
}

fn draw_tab(d: &mut RaylibDrawHandle, rect: Rectangle, label: &str, active: bool) -> bool {
    let mouse = d.get_mouse_position();
    let hot = rect.check_collision_point_rec(mouse);
    let bg = if active { COLOR_TAB_ACTIVE } else { COLOR_FIELD_BG };
    d.draw_rectangle_rec(rect, bg);
    d.draw_text(label, rect.x as i32 + 12, rect.y as i32 + 8, 18, Color::RAYWHITE);
    hot && d.is_mouse_button_released(MouseButton::MOUSE_BUTTON_LEFT)
}

/// Labelled single-line input. Returns true when clicked.
fn draw_field(
    d: &mut RaylibDrawHandle,
    label: &str,
    value: &str,
    x: f32,
    y: f32,
    width: f32,
    focused: bool,
) -> bool {
    d.draw_text(label, x as i32, y as i32 + 8, 18, Color::new(220, 220, 220, 255));
    let rect = Rectangle::new(x + 150.0, y, width, 32.0);
    d.draw_rectangle_rec(rect, COLOR_FIELD_BG);
    let border = if focused { COLOR_FIELD_FOCUS } else { Color::new(70, 70, 70, 255) };
    d.draw_rectangle_lines_ex(rect, 2.0, border);

    // keep the tail of long values visible
    let max_chars = ((width - 16.0) / 9.0).max(1.0) as usize;
    let count = value.chars().count();
    let shown: String = value.chars().skip(count.saturating_sub(max_chars)).collect();
    let caret = if focused { "_" } else { "" };
    d.draw_text(
        &format!("{}{}", shown, caret),
        rect.x as i32 + 8,
        rect.y as i32 + 7,
        18,
        Color::RAYWHITE,
    );

    let mouse = d.get_mouse_position();
    rect.check_collision_point_rec(mouse) && d.is_mouse_button_pressed(MouseButton::MOUSE_BUTTON_LEFT)
}

fn draw_log_panel(d: &mut RaylibDrawHandle, rect: Rectangle, lines: &[String]) {
    d.draw_rectangle_rec(rect, COLOR_LOG_BG);
    d.draw_rectangle_lines_ex(rect, 2.0, Color::new(40, 40, 40, 255));

    let font_size = 14;
    let pad = 8.0;
    let line_h = 16.0;
    let max_lines = ((rect.height - 2.0 * pad) / line_h).floor().max(1.0) as usize;

    let start = lines.len().saturating_sub(max_lines);

    let mut y = rect.y + pad;
    for line in lines.iter().skip(start) {
        let pos_x = rect.x + pad;
        d.draw_text(line, pos_x as i32, y as i32, font_size, COLOR_LOG_TEXT);
        y += line_h;
    }
}

fn snapshot_logs(buffer: &Arc<Mutex<Vec<String>>>) -> Vec<String> {
    buffer.lock().unwrap_or_else(|e| e.into_inner()).clone()
}

fn clear_logs(buffer: &Arc<Mutex<Vec<String>>>) {
    buffer.lock().unwrap_or_else(|e| e.into_inner()).clear();
}

fn tab_fields(tab: Tab) -> &'static [(Field, &'static str)] {
    match tab {
        Tab::Template => &[(Field::Quote, "Quote:"), (Field::TemplateFile, "Template File:")],
        Tab::Picture => &[
            (Field::ImagePath, "Image Path:"),
            (Field::MusicStart, "Music Start:"),
            (Field::MusicEnd, "Music End:"),
            (Field::MusicUrl, "Music URL:"),
        ],
        Tab::Scrape => &[
            (Field::ScrapeUrl, "URL:"),
            (Field::ScrapeFolder, "Save Folder:"),
            (Field::ScrollTimes, "Next Pages:"),
        ],
        Tab::Config => &[(Field::DefaultQuote, "Default Quote:"), (Field::DefaultFont, "Default Font:")],
    }
}

/// Help line shown under the form for the focused field. Path fields take
/// typed or pasted paths; raylib has no native file dialog.
fn field_hint(field: Field) -> &'static str {
    match field {
        Field::Quote => "Enter a quote for the video.",
        Field::TemplateFile => "Path to a video template (.mp4, .mkv, .avi). Type or paste it.",
        Field::ImagePath => "Path to an image file for the video. Type or paste it.",
        Field::MusicStart => "Music start time in HH:MM:SS or MM:SS format.",
        Field::MusicEnd => "Music end time in HH:MM:SS or MM:SS format.",
        Field::MusicUrl => "URL of the music track.",
        Field::ScrapeUrl => "Page to collect pin images from.",
        Field::ScrapeFolder => "Existing folder the images are saved to. Type or paste it.",
        Field::ScrollTimes => "How many next-page links to follow.",
        Field::DefaultQuote => "Quote used when none is entered. Used right away, saved with Save Config.",
        Field::DefaultFont => "Path to the default .ttf font. Type or paste it.",
    }
}

fn main() {
    init_tracing();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("[ERROR] Failed to create async runtime: {}", err);
            std::process::exit(1);
        }
    };

    let mut cfg = rt.block_on(async {
        let cfg = match Config::load_or_default(CONFIG_FILE).await {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::error!("{:#}; using defaults", err);
                Config::default()
            }
        };
        if let Err(e) = init::ensure_directories(&cfg).await {
            tracing::error!("Failed to create directories: {:#}", e);
        }
        init::report_tools().await;
        match scrape::build_client() {
            Ok(client) => {
                if let Err(e) = init::ensure_default_font(&client, &cfg).await {
                    tracing::error!("Failed to download default font: {:#}", e);
                }
            }
            Err(e) => tracing::error!("{:#}", e),
        }
        cfg
    });

    let (mut rl, thread) = raylib::init()
        .size(960, 620)
        .resizable()
        .title("MediaMate")
        .build();
    rl.set_target_fps(60);

    let state = AppState {
        running: Arc::new(AtomicBool::new(false)),
        status: Arc::new(Mutex::new(String::from("Idle"))),
        log_buffer: Arc::new(Mutex::new(Vec::with_capacity(LOG_MAX_LINES))),
    };

    let mut form = Form::from_config(&cfg);
    let mut tab = Tab::Template;
    let mut focus: Option<Field> = None;

    while !rl.window_should_close() {
        if let Some(field) = focus {
            while let Some(ch) = rl.get_char_pressed() {
                form.get_mut(field).push(ch);
            }
            if rl.is_key_pressed(KeyboardKey::KEY_BACKSPACE) {
                form.get_mut(field).pop();
            }
            if rl.is_key_pressed(KeyboardKey::KEY_ENTER) {
                focus = None;
            }
        }

        let mut d = rl.begin_drawing(&thread);
        d.clear_background(COLOR_BG);

        let tabs = [
            (Tab::Template, "Template"),
            (Tab::Picture, "Picture"),
            (Tab::Scrape, "Scrape"),
            (Tab::Config, "Config"),
        ];
        for (i, (t, label)) in tabs.iter().enumerate() {
            let rect = Rectangle::new(20.0 + i as f32 * 130.0, 15.0, 125.0, 36.0);
            if draw_tab(&mut d, rect, label, tab == *t) {
                tab = *t;
                focus = None;
            }
        }

        let mut y = 75.0;
        for (field, label) in tab_fields(tab) {
            let focused = focus == Some(*field);
            if draw_field(&mut d, label, form.get(*field), 20.0, y, 420.0, focused) {
                focus = Some(*field);
            }
            y += 44.0;
        }
        if let Some(field) = focus {
            d.draw_text(field_hint(field), 20, y as i32, 14, Color::new(160, 160, 160, 255));
        }
        y += 18.0;

        let idle = !state.running.load(Ordering::SeqCst);
        let action = Rectangle::new(170.0, y + 10.0, 260.0, 48.0);
        match tab {
            Tab::Template => {
                if draw_button(&mut d, action, "Generate", idle && form.can_generate_template(), 20.0) {
                    clear_logs(&state.log_buffer);
                    start_job_thread(&state, form.template_job(&cfg), cfg.clone());
                }
            }
            Tab::Picture => {
                let toggle = Rectangle::new(170.0, y - 4.0, 260.0, 32.0);
                let label = if form.overlay { "Overlay quote: ON" } else { "Overlay quote: OFF" };
                if draw_button(&mut d, toggle, label, true, 16.0) {
                    form.overlay = !form.overlay;
                }
                let action = Rectangle::new(170.0, y + 40.0, 260.0, 48.0);
                if draw_button(&mut d, action, "Generate Picture Video", idle, 18.0) {
                    match form.picture_job(&cfg) {
                        Ok(job) => {
                            clear_logs(&state.log_buffer);
                            start_job_thread(&state, job, cfg.clone());
                        }
                        Err(msg) => set_status(&state, format!("Error: {}", msg)),
                    }
                }
            }
            Tab::Scrape => {
                if draw_button(&mut d, action, "Scrape Images", idle, 20.0) {
                    match form.scrape_job() {
                        Ok(job) => {
                            clear_logs(&state.log_buffer);
                            start_job_thread(&state, job, cfg.clone());
                        }
                        Err(msg) => set_status(&state, format!("Error: {}", msg)),
                    }
                }
            }
            Tab::Config => {
                if draw_button(&mut d, action, "Save Config", idle, 20.0) {
                    cfg.default_quote = form.default_quote.trim().to_string();
                    cfg.font_path = form.font(&cfg);
                    match rt.block_on(cfg.save(CONFIG_FILE)) {
                        Ok(()) => set_status(&state, "Config saved."),
                        Err(err) => set_status(&state, format!("Error: {:#}", err)),
                    }
                }
            }
        }

        if draw_button(&mut d, Rectangle::new(20.0, 470.0, 260.0, 40.0), "Open Videos Folder", true, 18.0) {
            if let Err(err) = platform::open_folder(&cfg.videos_dir) {
                set_status(&state, format!("Error: {:#}", err));
            }
        }

        let status = state.status.lock().unwrap_or_else(|e| e.into_inner()).clone();
        d.draw_text(&status, 20, 530, 18, Color::new(220, 220, 220, 255));

        let lines = snapshot_logs(&state.log_buffer);
        draw_log_panel(&mut d, Rectangle::new(620.0, 60.0, 320.0, 540.0), &lines);
        d.draw_text("Log", 620, 25, 22, Color::RAYWHITE);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generate_needs_template_and_some_quote() {
        let mut form = Form::from_config(&Config::default());
        assert!(!form.can_generate_template());
        form.template_file = "Templates/a.mp4".into();
        assert!(!form.can_generate_template());
        form.default_quote = "Fallback".into();
        assert!(form.can_generate_template());
        form.default_quote.clear();
        form.quote = "Own quote".into();
        assert!(form.can_generate_template());
    }

    #[test]
    fn jobs_use_the_unsaved_default_quote() {
        let cfg = Config::default();
        let mut form = Form::from_config(&cfg);
        form.template_file = "Templates/a.mp4".into();
        form.default_quote = "  Typed  ".into();
        assert!(form.can_generate_template());
        assert!(matches!(
            form.template_job(&cfg),
            Job::Template { quote: Some(q), .. } if q == "Typed"
        ));

        form.quote = "Own quote".into();
        assert!(matches!(
            form.template_job(&cfg),
            Job::Template { quote: Some(q), .. } if q == "Own quote"
        ));

        form.image_path = "Pictures/a.jpg".into();
        form.music_start = "0:25".into();
        form.music_end = "0:50".into();
        form.music_url = "https://youtu.be/x".into();
        assert!(matches!(
            form.picture_job(&cfg),
            Ok(Job::Picture(req)) if req.quote.as_deref() == Some("Typed")
        ));
    }

    #[test]
    fn picture_job_validates_times() {
        let cfg = Config::default();
        let mut form = Form::from_config(&cfg);
        assert!(form.picture_job(&cfg).is_err());

        form.image_path = "Pictures/a.jpg".into();
        form.music_start = "0:5".into();
        form.music_end = "0:50".into();
        form.music_url = "https://youtu.be/x".into();
        let err = form.picture_job(&cfg).err().unwrap();
        assert!(err.contains("HH:MM:SS"));

        form.music_start = "0:25".into();
        assert!(matches!(form.picture_job(&cfg), Ok(Job::Picture(req)) if req.overlay && req.music_end == "0:50"));
    }

    #[test]
    fn scrape_job_checks_url_folder_and_count() {
        let dir = tempfile::tempdir().unwrap();
        let mut form = Form::from_config(&Config::default());
        form.scrape_url = "in.pinterest.com/x".into();
        assert_eq!(form.scrape_job().err().as_deref(), Some("Invalid URL format."));

        form.scrape_url = "https://in.pinterest.com/x".into();
        form.scrape_folder = dir.path().join("missing").display().to_string();
        assert!(form.scrape_job().is_err());

        form.scrape_folder = dir.path().display().to_string();
        form.scroll_times = "two".into();
        assert!(form.scrape_job().is_err());

        form.scroll_times = "2".into();
        assert!(matches!(form.scrape_job(), Ok(Job::Scrape { pages: 2, .. })));
    }

    #[test]
    fn path_fields_say_how_to_enter_paths() {
        for field in [Field::TemplateFile, Field::ImagePath, Field::ScrapeFolder, Field::DefaultFont] {
            assert!(field_hint(field).contains("Type or paste"), "{:?}", field);
        }
        assert!(field_hint(Field::MusicStart).contains("HH:MM:SS"));
    }

    #[test]
    fn log_buffer_is_bounded() {
        let buffer = Arc::new(Mutex::new(Vec::new()));
        for i in 0..(LOG_MAX_LINES + 5) {
            push_log_line(&buffer, &format!("line {}", i));
        }
        let lines = snapshot_logs(&buffer);
        assert_eq!(lines.len(), LOG_MAX_LINES);
        assert_eq!(lines[0], "line 5");

        push_log_line(&buffer, &"é".repeat(LOG_LINE_MAX));
        assert!(snapshot_logs(&buffer).last().unwrap().len() <= LOG_LINE_MAX);
    }
}
