//! Terminal pointer input for pages hosted in a crossterm-driven toolkit.

use crossterm::event::{MouseButton, MouseEvent, MouseEventKind};

use crate::geometry::{Extent, Point};
use crate::page::RootEvent;

/// Turns left-button mouse events into root events, scaling terminal cells
/// to toolkit units.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    cell: Extent,
    last: Option<Point>,
    vector: Point,
}

impl PointerTracker {
    pub fn new(cell: Extent) -> Self {
        Self {
            cell,
            last: None,
            vector: Point::ZERO,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.last.is_some()
    }

    pub fn track(&mut self, event: &MouseEvent) -> Option<RootEvent> {
        let pos = Point::new(
            i32::from(event.column) * self.cell.width,
            i32::from(event.row) * self.cell.height,
        );

        match event.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.last = Some(pos);
                self.vector = Point::ZERO;
                Some(RootEvent::Pressed)
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let last = self.last.replace(pos).unwrap_or(pos);
                self.vector = pos - last;
                Some(RootEvent::Pressing {
                    vector: self.vector,
                })
            }
            MouseEventKind::Up(MouseButton::Left) => {
                // Release usually lands on the last drag position; keep the
                // velocity of the final move in that case.
                let vector = match self.last.take() {
                    Some(last) if last != pos => pos - last,
                    _ => self.vector,
                };
                self.vector = Point::ZERO;
                Some(RootEvent::Released { vector })
            }
            _ => None,
        }
    }
}
