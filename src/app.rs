//! The host application: folder picking, the thumbnail grid, and the
//! lightbox overlay wired to the gesture controller.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use iced::widget::{button, column, container, image, row, scrollable, text, Space};
use iced::{Color, Element, Length, Point, Rectangle, Size, Subscription, Task, Theme};

use crate::gesture::TouchEvent;
use crate::modal::ModalState;
use crate::surface::GestureSurface;
use crate::thumbnail;

const THUMBNAIL_BATCH_SIZE: usize = 32;
const THUMB_SIZE: f32 = 160.0;
const THUMB_SPACING: f32 = 8.0;
const GRID_PADDING: f32 = 10.0;
/// Toolbar row height; the grid scroll area starts below it.
const TOOLBAR_HEIGHT: f32 = 48.0;
const STRIP_SIZE: f32 = 56.0;
/// Backdrop alpha behind the lightbox when fully opaque.
const BACKDROP_MAX: f32 = 0.92;

fn boot() -> (Lightbox, Task<Message>) {
    let mut state = Lightbox::default();
    if let Some(folder) = load_last_folder() {
        state.folder = Some(folder.clone());
        state.loading = true;
        let task = Task::perform(scan_folder(folder), Message::ImagesFound);
        return (state, task);
    }
    (state, Task::none())
}

pub fn run() -> iced::Result {
    iced::application(boot, update, view)
        .title("Lightbox")
        .theme(theme)
        .subscription(subscription)
        .centered()
        .run()
}

struct Lightbox {
    folder: Option<PathBuf>,
    image_paths: Vec<PathBuf>,
    thumbnails: Vec<(PathBuf, image::Handle)>,
    pending_thumbnails: Vec<PathBuf>,
    loading: bool,
    modal: ModalState,
    /// Index of the image currently shown (or last shown) full-screen.
    current: Option<usize>,
    window: Size,
    grid_columns: usize,
    grid_scroll_y: f32,
    viewer_cache: HashMap<usize, image::Handle>,
}

impl Default for Lightbox {
    fn default() -> Self {
        let window = Size::new(1024.0, 768.0);
        let mut modal = ModalState::new();
        modal.set_viewport(window);
        Self {
            folder: None,
            image_paths: Vec::new(),
            thumbnails: Vec::new(),
            pending_thumbnails: Vec::new(),
            loading: false,
            modal,
            current: None,
            window,
            grid_columns: columns_for(window.width),
            grid_scroll_y: 0.0,
            viewer_cache: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    OpenFolder,
    FolderSelected(Option<PathBuf>),
    ImagesFound(Vec<PathBuf>),
    ThumbnailBatchReady(Vec<(PathBuf, Vec<u8>, u32, u32)>),
    OpenImage(usize),
    StripImage(usize),
    ViewerImageLoaded(usize, Vec<u8>, u32, u32),
    ViewerImageFailed,
    Touch(TouchEvent),
    GridScrolled(f32),
    WindowResized(Size),
    KeyEscape,
    Tick,
}

fn subscription(state: &Lightbox) -> Subscription<Message> {
    let events = iced::event::listen_with(|event, _status, _window| match event {
        iced::Event::Keyboard(iced::keyboard::Event::KeyPressed { key, .. }) => {
            use iced::keyboard::key::Named;
            use iced::keyboard::Key;
            match key {
                Key::Named(Named::Escape) => Some(Message::KeyEscape),
                _ => None,
            }
        }
        iced::Event::Window(iced::window::Event::Resized(size)) => {
            Some(Message::WindowResized(size))
        }
        _ => None,
    });

    if state.modal.is_animating() {
        Subscription::batch([
            events,
            iced::time::every(Duration::from_millis(16)).map(|_| Message::Tick),
        ])
    } else {
        events
    }
}

fn update(state: &mut Lightbox, message: Message) -> Task<Message> {
    match message {
        Message::OpenFolder => {
            return Task::perform(pick_folder(), Message::FolderSelected);
        }
        Message::FolderSelected(Some(path)) => {
            save_last_folder(&path);
            state.folder = Some(path.clone());
            state.thumbnails.clear();
            state.image_paths.clear();
            state.pending_thumbnails.clear();
            state.viewer_cache.clear();
            state.current = None;
            state.modal = ModalState::new();
            state.modal.set_viewport(state.window);
            state.loading = true;
            return Task::perform(scan_folder(path), Message::ImagesFound);
        }
        Message::FolderSelected(None) => {}
        Message::ImagesFound(paths) => {
            state.image_paths = paths.clone();
            state.pending_thumbnails = paths;
            return load_next_batch(state);
        }
        Message::ThumbnailBatchReady(results) => {
            for (path, rgba, width, height) in results {
                let handle = image::Handle::from_rgba(width, height, rgba);
                state.thumbnails.push((path, handle));
            }
            return load_next_batch(state);
        }
        Message::OpenImage(index) => {
            state.current = Some(index);
            state
                .modal
                .set_source(state.image_paths.get(index).cloned());
            state.modal.open(origin_frame(state, index));
            return preload_current(state);
        }
        Message::StripImage(index) => {
            state.current = Some(index);
            state
                .modal
                .set_source(state.image_paths.get(index).cloned());
            // The close morph should land on the new image's grid cell.
            let frame = origin_frame(state, index);
            state.modal.update_origin(frame);
            evict_distant(state);
            return preload_current(state);
        }
        Message::ViewerImageLoaded(index, rgba, width, height) => {
            let handle = image::Handle::from_rgba(width, height, rgba);
            state.viewer_cache.insert(index, handle);
            evict_distant(state);
        }
        // The failure was already logged; the view falls back to
        // decoding straight from the path.
        Message::ViewerImageFailed => {}
        Message::Touch(event) => {
            state.modal.touch(event, Instant::now());
        }
        Message::GridScrolled(y) => {
            state.grid_scroll_y = y;
            remeasure_origin(state);
        }
        Message::WindowResized(size) => {
            state.window = size;
            state.grid_columns = columns_for(size.width);
            state.modal.set_viewport(size);
            remeasure_origin(state);
        }
        Message::KeyEscape => {
            if state.modal.is_open() {
                state.modal.close();
            }
        }
        Message::Tick => {
            let was_visible = state.modal.is_visible();
            state.modal.tick(Instant::now());
            if was_visible && !state.modal.is_visible() {
                state.viewer_cache.clear();
            }
        }
    }
    Task::none()
}

fn columns_for(width: f32) -> usize {
    ((width - GRID_PADDING * 2.0 + THUMB_SPACING) / (THUMB_SIZE + THUMB_SPACING)).max(1.0)
        as usize
}

/// Window-space rectangle of a grid thumbnail, computed from the same
/// layout constants the grid renders with.
fn origin_frame(state: &Lightbox, index: usize) -> Option<Rectangle> {
    if state.grid_columns == 0 || index >= state.image_paths.len() {
        return None;
    }
    let col = (index % state.grid_columns) as f32;
    let row = (index / state.grid_columns) as f32;
    let x = GRID_PADDING + col * (THUMB_SIZE + THUMB_SPACING);
    let y = TOOLBAR_HEIGHT + GRID_PADDING + row * (THUMB_SIZE + THUMB_SPACING)
        - state.grid_scroll_y;
    Some(Rectangle::new(
        Point::new(x, y),
        Size::new(THUMB_SIZE, THUMB_SIZE),
    ))
}

/// While the overlay is closed, keep the stored origin frame in sync
/// with layout changes so the next open morphs from the right spot.
fn remeasure_origin(state: &mut Lightbox) {
    if state.modal.is_visible() {
        return;
    }
    if let Some(index) = state.current {
        let frame = origin_frame(state, index);
        state.modal.update_origin(frame);
    }
}

/// Keep only full-size images near the current one (strip jumps can be
/// arbitrary, so the cache would otherwise grow unbounded).
fn evict_distant(state: &mut Lightbox) {
    if let Some(current) = state.current {
        let keep_min = current.saturating_sub(3);
        let keep_max = current + 3;
        state
            .viewer_cache
            .retain(|&k, _| k >= keep_min && k <= keep_max);
    }
}

fn load_next_batch(state: &mut Lightbox) -> Task<Message> {
    if state.pending_thumbnails.is_empty() {
        state.loading = false;
        return Task::none();
    }

    let count = THUMBNAIL_BATCH_SIZE.min(state.pending_thumbnails.len());
    let batch: Vec<PathBuf> = state.pending_thumbnails.drain(..count).collect();

    Task::perform(
        async move { thumbnail::generate_batch(&batch, 400) },
        Message::ThumbnailBatchReady,
    )
}

fn preload_current(state: &Lightbox) -> Task<Message> {
    let Some(index) = state.current else {
        return Task::none();
    };
    if state.viewer_cache.contains_key(&index) {
        return Task::none();
    }
    let Some(path) = state.image_paths.get(index).cloned() else {
        return Task::none();
    };

    Task::perform(
        async move {
            match ::image::open(&path) {
                Ok(img) => {
                    let rgba = img.to_rgba8();
                    let (width, height) = rgba.dimensions();
                    Some((index, rgba.into_raw(), width, height))
                }
                Err(e) => {
                    log::warn!("Failed to load image {}: {}", path.display(), e);
                    None
                }
            }
        },
        |result| match result {
            Some((index, rgba, width, height)) => {
                Message::ViewerImageLoaded(index, rgba, width, height)
            }
            None => Message::ViewerImageFailed,
        },
    )
}

fn view(state: &Lightbox) -> Element<'_, Message> {
    let base = grid_view(state);
    if !state.modal.is_visible() {
        return base;
    }
    iced::widget::stack![base, lightbox_view(state)]
        .width(Length::Fill)
        .height(Length::Fill)
        .into()
}

fn grid_view(state: &Lightbox) -> Element<'_, Message> {
    let toolbar = row![
        button("Open Folder").on_press(Message::OpenFolder),
        photo_count(state),
        Space::new().width(Length::Fill),
        text(match &state.folder {
            Some(p) => p.display().to_string(),
            None => "No folder selected".into(),
        })
        .size(14),
    ]
    .spacing(10)
    .padding(10)
    .height(TOOLBAR_HEIGHT);

    let content: Element<'_, Message> = if state.loading && state.thumbnails.is_empty() {
        container(text("Loading...")).center(Length::Fill).into()
    } else if state.thumbnails.is_empty() {
        container(text("Open a folder to browse photos"))
            .center(Length::Fill)
            .into()
    } else {
        let columns = state.grid_columns.max(1);
        let rows: Vec<Element<'_, Message>> = state
            .thumbnails
            .chunks(columns)
            .enumerate()
            .map(|(row_idx, chunk)| {
                let items: Vec<Element<'_, Message>> = chunk
                    .iter()
                    .enumerate()
                    .map(|(col_idx, (_path, handle))| {
                        let index = row_idx * columns + col_idx;
                        let opacity = if state.current == Some(index) {
                            state.modal.thumb_opacity()
                        } else {
                            1.0
                        };
                        button(
                            image(handle.clone())
                                .width(THUMB_SIZE)
                                .height(THUMB_SIZE)
                                .content_fit(iced::ContentFit::Cover)
                                .opacity(opacity),
                        )
                        .on_press(Message::OpenImage(index))
                        .padding(0)
                        .style(button::text)
                        .into()
                    })
                    .collect();
                row(items).spacing(THUMB_SPACING).into()
            })
            .collect();

        scrollable(column(rows).spacing(THUMB_SPACING).padding(GRID_PADDING))
            .on_scroll(|vp| Message::GridScrolled(vp.absolute_offset().y))
            .height(Length::Fill)
            .into()
    };

    container(column![toolbar, content]).into()
}

fn photo_count(state: &Lightbox) -> Element<'_, Message> {
    if state.image_paths.is_empty() {
        return Space::new().into();
    }
    let label = if state.loading {
        format!("{} / {} photos", state.thumbnails.len(), state.image_paths.len())
    } else {
        format!("{} photos", state.image_paths.len())
    };
    text(label).size(13).color(LABEL_COLOR).into()
}

fn lightbox_view(state: &Lightbox) -> Element<'_, Message> {
    let now = Instant::now();
    let frame = state.modal.frame(now);
    let t = state.modal.transform_now(now);

    // Scale around the frame centre; translation is in pre-scale image
    // coordinates, so the screen offset is translate * scale.
    let width = frame.width * t.scale;
    let height = frame.height * t.scale;
    let x = frame.x + frame.width / 2.0 + t.translate_x * t.scale - width / 2.0;
    let y = frame.y + frame.height / 2.0 + t.translate_y * t.scale - height / 2.0;
    let rect = Rectangle::new(Point::new(x, y), Size::new(width, height));

    let img: Element<'_, Message> = match state.current.and_then(|i| state.viewer_cache.get(&i))
    {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(iced::ContentFit::Contain)
            .into(),
        None => match state.current.and_then(|i| state.image_paths.get(i)) {
            Some(path) => image(path.to_string_lossy().to_string())
                .width(Length::Fill)
                .height(Length::Fill)
                .content_fit(iced::ContentFit::Contain)
                .into(),
            None => Space::new().into(),
        },
    };

    let alpha = state.modal.backdrop_opacity(now) * BACKDROP_MAX;
    let backdrop = container(Space::new().width(Length::Fill).height(Length::Fill))
        .width(Length::Fill)
        .height(Length::Fill)
        .style(move |_theme: &Theme| container::Style {
            background: Some(iced::Background::Color(Color {
                r: 0.0,
                g: 0.0,
                b: 0.0,
                a: alpha,
            })),
            ..Default::default()
        });

    let surface = GestureSurface::new(img, rect, Message::Touch);

    if state.image_paths.len() > 1 {
        iced::widget::stack![backdrop, surface, strip_view(state)]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    } else {
        iced::widget::stack![backdrop, surface]
            .width(Length::Fill)
            .height(Length::Fill)
            .into()
    }
}

/// Horizontal strip of small thumbnails along the bottom of the
/// overlay, for switching the full-screen image without closing.
fn strip_view(state: &Lightbox) -> Element<'_, Message> {
    let items: Vec<Element<'_, Message>> = state
        .thumbnails
        .iter()
        .enumerate()
        .map(|(index, (_path, handle))| {
            let thumb = image(handle.clone())
                .width(STRIP_SIZE)
                .height(STRIP_SIZE)
                .content_fit(iced::ContentFit::Cover)
                .opacity(if state.current == Some(index) { 1.0 } else { 0.55 });
            button(thumb)
                .on_press(Message::StripImage(index))
                .padding(0)
                .style(button::text)
                .into()
        })
        .collect();

    let strip = scrollable(row(items).spacing(4).padding(8)).direction(
        scrollable::Direction::Horizontal(scrollable::Scrollbar::default()),
    );

    container(strip)
        .width(Length::Fill)
        .align_bottom(Length::Fill)
        .into()
}

const LABEL_COLOR: Color = Color::from_rgb(0.5, 0.5, 0.55);

fn theme(_state: &Lightbox) -> Theme {
    Theme::Dark
}

async fn pick_folder() -> Option<PathBuf> {
    rfd::AsyncFileDialog::new()
        .set_title("Select a photo folder")
        .pick_folder()
        .await
        .map(|handle| handle.path().to_path_buf())
}

async fn scan_folder(folder: PathBuf) -> Vec<PathBuf> {
    let mut paths = Vec::new();
    let mut stack = vec![folder];
    while let Some(dir) = stack.pop() {
        if let Ok(entries) = std::fs::read_dir(&dir) {
            for entry in entries.flatten() {
                let path = entry.path();
                if path.is_dir() {
                    stack.push(path);
                } else if is_image_file(&path) {
                    paths.push(path);
                }
            }
        }
    }
    paths.sort();
    paths
}

fn is_image_file(path: &std::path::Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "gif" | "bmp" | "webp" | "tiff" | "tif"
        ),
        None => false,
    }
}

fn config_dir() -> Option<PathBuf> {
    dirs_next::home_dir().map(|d| d.join(".lightbox"))
}

fn save_last_folder(path: &std::path::Path) {
    if let Some(dir) = config_dir() {
        let _ = std::fs::create_dir_all(&dir);
        let _ = std::fs::write(dir.join("last_folder"), path.to_string_lossy().as_bytes());
    }
}

fn load_last_folder() -> Option<PathBuf> {
    let dir = config_dir()?;
    let data = std::fs::read_to_string(dir.join("last_folder")).ok()?;
    let path = PathBuf::from(data.trim());
    if path.is_dir() {
        Some(path)
    } else {
        None
    }
}
