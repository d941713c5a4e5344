use crate::{
    camera::{position::CameraPosition, update::CameraChangeReason},
    core::geo::{LatLng, Point},
    prelude::HashMap,
};
use crossbeam_channel::{Receiver, Sender};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Raw input delivered to the map view
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Touch events (multi-touch)
    Touch {
        event_type: TouchEventType,
        touches: Vec<TouchPoint>,
    },
    /// Viewport/window resize
    Resize { size: Point },
}

/// Types of touch events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TouchEventType {
    Start,
    Move,
    End,
    Cancel,
}

/// Individual touch point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub id: u64,
    pub position: Point,
}

impl TouchPoint {
    pub fn new(id: u64, x: f64, y: f64) -> Self {
        Self {
            id,
            position: Point::new(x, y),
        }
    }
}

impl InputEvent {
    pub fn touch(event_type: TouchEventType, touches: Vec<TouchPoint>) -> Self {
        InputEvent::Touch {
            event_type,
            touches,
        }
    }

    /// Gets the primary position associated with this event, if any
    pub fn position(&self) -> Option<Point> {
        match self {
            InputEvent::Touch { touches, .. } => touches.first().map(|t| t.position),
            InputEvent::Resize { .. } => None,
        }
    }
}

/// Notifications emitted by the map view
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The camera is about to start moving
    CameraWillChange {
        reason: CameraChangeReason,
        animated: bool,
    },
    /// The camera moved
    CameraDidChange {
        reason: CameraChangeReason,
        animated: bool,
        position: CameraPosition,
    },
    /// All camera movement, animations and gestures included, has stopped
    CameraIdle,
    /// A tap hit no pickable
    MapTapped { point: Point, lat_lng: LatLng },
    /// A tap hit an overlay
    OverlayTapped { overlay_id: String, point: Point },
    /// A tap hit a base-map symbol
    SymbolTapped {
        symbol_id: String,
        caption: String,
        point: Point,
    },
    /// A layer group was toggled
    LayerGroupChanged { group: String, enabled: bool },
    /// The view was resized
    Resized { size: Point },
}

impl MapEvent {
    /// Listener key of this event
    pub fn event_type(&self) -> &'static str {
        match self {
            MapEvent::CameraWillChange { .. } => "camerawillchange",
            MapEvent::CameraDidChange { .. } => "cameradidchange",
            MapEvent::CameraIdle => "cameraidle",
            MapEvent::MapTapped { .. } => "maptap",
            MapEvent::OverlayTapped { .. } => "overlaytap",
            MapEvent::SymbolTapped { .. } => "symboltap",
            MapEvent::LayerGroupChanged { .. } => "layergroupchange",
            MapEvent::Resized { .. } => "resize",
        }
    }
}

/// Event listener callback type
pub type EventCallback = Box<dyn Fn(&MapEvent) + Send + Sync>;

/// Events kept for polling before the oldest are dropped
const MAX_QUEUED_EVENTS: usize = 4096;

/// Event management system for the map
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event type
    listeners: HashMap<String, Vec<EventCallback>>,
    /// Channel subscribers receiving every event
    subscribers: Vec<Sender<MapEvent>>,
    /// Event queue for processing
    event_queue: VecDeque<MapEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&MapEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Box::new(callback));
    }

    /// Remove every listener registered for an event type
    pub fn off(&mut self, event_type: &str) {
        self.listeners.remove(event_type);
    }

    /// Returns a channel receiving every processed event
    pub fn subscribe(&mut self) -> Receiver<MapEvent> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        self.subscribers.push(sender);
        receiver
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: MapEvent) {
        if self.event_queue.len() >= MAX_QUEUED_EVENTS {
            log::warn!("event queue full, dropping oldest event");
            self.event_queue.pop_front();
        }
        self.event_queue.push_back(event);
    }

    /// Dispatch all queued events to listeners and subscribers and return them
    pub fn process_events(&mut self) -> Vec<MapEvent> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        for event in &events {
            if let Some(callbacks) = self.listeners.get(event.event_type()) {
                for callback in callbacks {
                    callback(event);
                }
            }
            // drop subscribers whose receiver is gone
            self.subscribers
                .retain(|subscriber| subscriber.send(event.clone()).is_ok());
        }

        events
    }

    /// Clear all events from the queue
    pub fn clear_events(&mut self) {
        self.event_queue.clear();
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}
