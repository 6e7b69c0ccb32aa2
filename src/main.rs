mod animator;
mod app;
mod dismiss;
mod gesture;
mod modal;
mod surface;
mod thumbnail;
mod transform;

fn main() -> iced::Result {
    env_logger::init();
    app::run()
}
