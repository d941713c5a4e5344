//! Async frame driving for a shared map view
//!
//! A spawner abstraction sits between the driver and the async runtime so the
//! driver does not name tokio directly; the tokio spawner is installed by
//! default.

use crate::core::map::MapView;
use futures::Future;
use once_cell::sync::OnceCell;
use std::{
    pin::Pin,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

/// A trait for spawning async tasks (object-safe version)
pub trait AsyncSpawner: Send + Sync + 'static {
    fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) -> Box<dyn AsyncHandle>;
}

/// Handle to a spawned async task
pub trait AsyncHandle: Send + Sync {
    fn is_finished(&self) -> bool;

    fn cancel(&self);
}

pub fn spawn<F>(future: F) -> Box<dyn AsyncHandle>
where
    F: Future<Output = ()> + Send + 'static,
{
    runtime().spawn_boxed(Box::pin(future))
}

pub mod spawners {
    use super::*;
    use ::tokio::task::JoinHandle;

    /// Spawns onto the ambient tokio runtime
    pub struct TokioSpawner;

    impl AsyncSpawner for TokioSpawner {
        fn spawn_boxed(&self, future: Pin<Box<dyn Future<Output = ()> + Send + 'static>>) -> Box<dyn AsyncHandle> {
            Box::new(TokioHandle(::tokio::spawn(future)))
        }
    }

    struct TokioHandle(JoinHandle<()>);

    impl AsyncHandle for TokioHandle {
        fn is_finished(&self) -> bool {
            self.0.is_finished()
        }

        fn cancel(&self) {
            self.0.abort();
        }
    }
}

static RUNTIME: OnceCell<Box<dyn AsyncSpawner>> = OnceCell::new();

/// Installs a spawner; returns false if one was already in use
pub fn init_runtime(spawner: Box<dyn AsyncSpawner>) -> bool {
    RUNTIME.set(spawner).is_ok()
}

pub fn runtime() -> &'static dyn AsyncSpawner {
    RUNTIME
        .get_or_init(|| Box::new(spawners::TokioSpawner))
        .as_ref()
}

/// Ticks a shared map view at its preferred frame rate and dispatches the
/// events each frame produces
pub struct FrameDriver {
    view: Arc<Mutex<MapView>>,
    running: Arc<AtomicBool>,
    frames: Arc<AtomicU64>,
    handle: Option<Box<dyn AsyncHandle>>,
}

impl FrameDriver {
    pub fn new(view: MapView) -> Self {
        Self::from_shared(Arc::new(Mutex::new(view)))
    }

    pub fn from_shared(view: Arc<Mutex<MapView>>) -> Self {
        Self {
            view,
            running: Arc::new(AtomicBool::new(false)),
            frames: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    /// The driven view; lock it to issue commands between frames
    pub fn view(&self) -> Arc<Mutex<MapView>> {
        Arc::clone(&self.view)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Frames ticked since the driver was created
    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::SeqCst)
    }

    /// Starts the frame loop on the installed runtime. Must be called from
    /// within that runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            return;
        }

        // fresh flag per run; a stopped loop never sees it set again
        self.running = Arc::new(AtomicBool::new(true));
        let view = Arc::clone(&self.view);
        let running = Arc::clone(&self.running);
        let frames = Arc::clone(&self.frames);
        log::debug!("frame driver started");

        self.handle = Some(spawn(async move {
            let mut last = instant::Instant::now();
            while running.load(Ordering::SeqCst) {
                let interval = match view.lock() {
                    Ok(view) => view.frame_interval(),
                    Err(_) => {
                        log::warn!("map view lock poisoned, stopping frame driver");
                        break;
                    }
                };
                ::tokio::time::sleep(interval).await;
                if !running.load(Ordering::SeqCst) {
                    break;
                }

                let now = instant::Instant::now();
                let delta = now.duration_since(last);
                last = now;

                if let Ok(mut view) = view.lock() {
                    view.tick(delta.min(Duration::from_secs(1)).as_secs_f64());
                    view.process_events();
                }
                frames.fetch_add(1, Ordering::SeqCst);
            }
            running.store(false, Ordering::SeqCst);
        }));
    }

    /// Stops the frame loop; no frame is ticked after this returns
    pub fn stop(&mut self) {
        if self.running.swap(false, Ordering::SeqCst) {
            log::debug!("frame driver stopped after {} frames", self.frames());
        }
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }

    /// Whether the spawned loop has exited
    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().map_or(true, |handle| handle.is_finished())
    }
}

impl Drop for FrameDriver {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        camera::update::{CameraAnimation, CameraUpdate},
        core::{config::MapViewOptions, geo::Point},
    };

    #[::tokio::test]
    async fn test_driver_finishes_transition() {
        let view = MapView::new(MapViewOptions::default(), Point::new(300.0, 300.0)).unwrap();
        let mut driver = FrameDriver::new(view);
        let shared = driver.view();

        let done = {
            let mut view = shared.lock().unwrap();
            let update = CameraUpdate::zoom_to(8.0)
                .animate_with_duration(CameraAnimation::Linear, Duration::from_millis(50));
            view.move_camera_async(update).unwrap()
        };

        driver.start();
        assert!(driver.is_running());
        let cancelled = ::tokio::time::timeout(Duration::from_secs(2), done)
            .await
            .unwrap();
        assert!(!cancelled);
        assert_eq!(shared.lock().unwrap().camera_position().zoom, 8.0);

        driver.stop();
        assert!(!driver.is_running());
        assert!(driver.frames() > 0);
    }

    /// Restarting right after a stop leaves a single loop ticking
    #[::tokio::test]
    async fn test_restart_runs_one_loop() {
        let options = MapViewOptions {
            preferred_frames_per_second: 10.0,
            ..MapViewOptions::default()
        };
        let view = MapView::new(options, Point::new(300.0, 300.0)).unwrap();
        let mut driver = FrameDriver::new(view);

        driver.start();
        ::tokio::time::sleep(Duration::from_millis(20)).await;
        driver.stop();
        let stopped_at = driver.frames();
        ::tokio::time::sleep(Duration::from_millis(250)).await;
        assert_eq!(driver.frames(), stopped_at);

        driver.start();
        let restarted_at = driver.frames();
        ::tokio::time::sleep(Duration::from_millis(1050)).await;
        let ticked = driver.frames() - restarted_at;
        driver.stop();

        // ten frames a second; a second loop would double that
        assert!((8..=12).contains(&ticked), "ticked {} frames", ticked);
    }
}
