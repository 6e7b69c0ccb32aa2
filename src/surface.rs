//! The full-screen gesture capture surface for the lightbox overlay.
//!
//! A transparent widget that spans the whole window, forwards raw touch
//! events (and left-button mouse input, synthesized as a single finger)
//! to the host synchronously, and draws its child at an arbitrary
//! window rectangle so the morphing/zooming image can be positioned
//! freely, including partly off screen.

use iced::advanced::layout;
use iced::advanced::renderer;
use iced::advanced::widget::tree::Tag;
use iced::advanced::widget::{Operation, Tree};
use iced::advanced::{Clipboard, Layout, Shell, Widget};
use iced::{mouse, touch, Element, Event, Length, Point, Rectangle, Size};

use crate::gesture::{Phase, TouchEvent};

/// Finger id used for synthesized mouse input. Real touch ids come
/// from the windowing system and are remapped up by one.
const MOUSE_FINGER: u64 = 0;

#[derive(Debug, Default)]
struct State {
    /// Left mouse button is currently held down.
    mouse_down: bool,
}

pub struct GestureSurface<'a, Message, Theme = iced::Theme, Renderer = iced::Renderer> {
    content: Element<'a, Message, Theme, Renderer>,
    /// Window rectangle the content is laid out in.
    frame: Rectangle,
    on_touch: Box<dyn Fn(TouchEvent) -> Message + 'a>,
}

impl<'a, Message, Theme, Renderer> GestureSurface<'a, Message, Theme, Renderer> {
    pub fn new(
        content: impl Into<Element<'a, Message, Theme, Renderer>>,
        frame: Rectangle,
        on_touch: impl Fn(TouchEvent) -> Message + 'a,
    ) -> Self {
        Self {
            content: content.into(),
            frame,
            on_touch: Box::new(on_touch),
        }
    }
}

impl<Message, Theme, Renderer> Widget<Message, Theme, Renderer>
    for GestureSurface<'_, Message, Theme, Renderer>
where
    Renderer: iced::advanced::Renderer,
{
    fn tag(&self) -> Tag {
        Tag::of::<State>()
    }

    fn state(&self) -> iced::advanced::widget::tree::State {
        iced::advanced::widget::tree::State::new(State::default())
    }

    fn size(&self) -> Size<Length> {
        Size::new(Length::Fill, Length::Fill)
    }

    fn children(&self) -> Vec<Tree> {
        vec![Tree::new(&self.content)]
    }

    fn diff(&self, tree: &mut Tree) {
        tree.diff_children(std::slice::from_ref(&self.content));
    }

    fn layout(
        &mut self,
        tree: &mut Tree,
        renderer: &Renderer,
        limits: &layout::Limits,
    ) -> layout::Node {
        let size = limits.max();
        let child_limits = layout::Limits::new(
            Size::ZERO,
            Size::new(self.frame.width, self.frame.height),
        );
        let child = self
            .content
            .as_widget_mut()
            .layout(&mut tree.children[0], renderer, &child_limits)
            .move_to(Point::new(self.frame.x, self.frame.y));
        layout::Node::with_children(size, vec![child])
    }

    fn operate(
        &mut self,
        tree: &mut Tree,
        layout: Layout<'_>,
        renderer: &Renderer,
        operation: &mut dyn Operation,
    ) {
        if let Some(child) = layout.children().next() {
            self.content
                .as_widget_mut()
                .operate(&mut tree.children[0], child, renderer, operation);
        }
    }

    fn update(
        &mut self,
        tree: &mut Tree,
        event: &Event,
        _layout: Layout<'_>,
        cursor: iced::mouse::Cursor,
        _renderer: &Renderer,
        _clipboard: &mut dyn Clipboard,
        shell: &mut Shell<'_, Message>,
        _viewport: &Rectangle,
    ) {
        let state = tree.state.downcast_mut::<State>();

        let touch_event = match event {
            Event::Touch(touch::Event::FingerPressed { id, position }) => Some(TouchEvent {
                phase: Phase::Down,
                finger: id.0 + 1,
                position: *position,
            }),
            Event::Touch(touch::Event::FingerMoved { id, position }) => Some(TouchEvent {
                phase: Phase::Move,
                finger: id.0 + 1,
                position: *position,
            }),
            Event::Touch(
                touch::Event::FingerLifted { id, position }
                | touch::Event::FingerLost { id, position },
            ) => Some(TouchEvent {
                phase: Phase::Up,
                finger: id.0 + 1,
                position: *position,
            }),
            Event::Mouse(mouse::Event::ButtonPressed(mouse::Button::Left)) => {
                cursor.position().map(|position| {
                    state.mouse_down = true;
                    TouchEvent {
                        phase: Phase::Down,
                        finger: MOUSE_FINGER,
                        position,
                    }
                })
            }
            Event::Mouse(mouse::Event::CursorMoved { .. }) if state.mouse_down => {
                cursor.position().map(|position| TouchEvent {
                    phase: Phase::Move,
                    finger: MOUSE_FINGER,
                    position,
                })
            }
            Event::Mouse(mouse::Event::ButtonReleased(mouse::Button::Left))
                if state.mouse_down =>
            {
                state.mouse_down = false;
                Some(TouchEvent {
                    phase: Phase::Up,
                    finger: MOUSE_FINGER,
                    position: cursor.position().unwrap_or(Point::ORIGIN),
                })
            }
            _ => None,
        };

        if let Some(touch_event) = touch_event {
            shell.publish((self.on_touch)(touch_event));
        }
    }

    fn draw(
        &self,
        tree: &Tree,
        renderer: &mut Renderer,
        theme: &Theme,
        style: &renderer::Style,
        layout: Layout<'_>,
        cursor: iced::mouse::Cursor,
        viewport: &Rectangle,
    ) {
        if let Some(child) = layout.children().next() {
            self.content.as_widget().draw(
                &tree.children[0],
                renderer,
                theme,
                style,
                child,
                cursor,
                viewport,
            );
        }
    }
}

impl<'a, Message, Theme, Renderer> From<GestureSurface<'a, Message, Theme, Renderer>>
    for Element<'a, Message, Theme, Renderer>
where
    Message: 'a,
    Theme: 'a,
    Renderer: iced::advanced::Renderer + 'a,
{
    fn from(surface: GestureSurface<'a, Message, Theme, Renderer>) -> Self {
        Element::new(surface)
    }
}
