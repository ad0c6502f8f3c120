//! Dedicated render thread.
//!
//! All GPU work happens on one thread that owns the [`Renderer`]. The
//! coordination side talks to it through [`RenderHandle`], sending commands
//! over a channel. Frame requests are fire-and-forget and coalesced: when
//! several are queued only the latest intent is drawn. Everything that
//! produces a result replies through a [`Deferred`].

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::JoinHandle;

use retouch_core::{CropRequest, PixelBuffer, PixelState, PixelVersion, RenderIntent};
use tracing::{debug, error, info};

use crate::context::{GpuContext, GpuError};
use crate::renderer::{Renderer, RendererOptions};
use crate::target::ExportError;

enum Command {
    Frame(RenderIntent),
    ApplyCrop {
        request: CropRequest,
        reply: Sender<Result<PixelState, GpuError>>,
    },
    Restore {
        version: PixelVersion,
        reply: Sender<Result<PixelState, GpuError>>,
    },
    Export {
        intent: RenderIntent,
        reply: Sender<Result<PixelBuffer, ExportError>>,
    },
    Snapshot {
        reply: Sender<Result<PixelBuffer, ExportError>>,
    },
    Resize {
        width: u32,
        height: u32,
    },
    Shutdown,
}

/// A result the render thread will deliver later.
#[derive(Debug)]
pub struct Deferred<T> {
    rx: Receiver<T>,
}

impl<T> Deferred<T> {
    /// Block until the result arrives. `None` if the render thread is gone.
    pub fn wait(self) -> Option<T> {
        self.rx.recv().ok()
    }

    /// The result, if it has already arrived.
    pub fn try_get(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

impl<T> Deferred<Result<T, GpuError>> {
    pub fn wait_gpu(self) -> Result<T, GpuError> {
        self.wait().unwrap_or(Err(GpuError::Disconnected))
    }
}

impl<T> Deferred<Result<T, ExportError>> {
    pub fn wait_export(self) -> Result<T, ExportError> {
        self.wait().unwrap_or(Err(ExportError::Disconnected))
    }
}

/// Cheap, cloneable sender side of the render thread.
#[derive(Debug, Clone)]
pub struct RenderHandle {
    tx: Sender<Command>,
}

impl RenderHandle {
    pub fn request_frame(&self, intent: RenderIntent) {
        self.send(Command::Frame(intent));
    }

    pub fn apply_crop(&self, request: CropRequest) -> Deferred<Result<PixelState, GpuError>> {
        self.call(|reply| Command::ApplyCrop { request, reply })
    }

    pub fn restore(&self, version: PixelVersion) -> Deferred<Result<PixelState, GpuError>> {
        self.call(|reply| Command::Restore { version, reply })
    }

    pub fn export(&self, intent: RenderIntent) -> Deferred<Result<PixelBuffer, ExportError>> {
        self.call(|reply| Command::Export { intent, reply })
    }

    /// Capture the view after every frame requested so far has been drawn.
    pub fn snapshot(&self) -> Deferred<Result<PixelBuffer, ExportError>> {
        self.call(|reply| Command::Snapshot { reply })
    }

    pub fn resize(&self, width: u32, height: u32) {
        self.send(Command::Resize { width, height });
    }

    fn call<T>(&self, command: impl FnOnce(Sender<T>) -> Command) -> Deferred<T> {
        let (reply, rx) = mpsc::channel();
        // A failed send drops `reply`, so `wait` reports the thread as gone
        self.send(command(reply));
        Deferred { rx }
    }

    fn send(&self, command: Command) {
        if self.tx.send(command).is_err() {
            debug!("render thread gone, command dropped");
        }
    }
}

/// Owns the render thread and joins it on shutdown.
#[derive(Debug)]
pub struct RenderThread {
    handle: RenderHandle,
    join: Option<JoinHandle<()>>,
}

impl RenderThread {
    /// Start the thread, create the device there and upload `root`.
    ///
    /// Blocks until initialization finished and returns the initial pixels.
    pub fn spawn(root: PixelBuffer, options: RendererOptions) -> Result<(Self, PixelState), GpuError> {
        let (tx, rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();

        let join = std::thread::Builder::new()
            .name("retouch-render".to_string())
            .spawn(move || {
                let renderer = GpuContext::headless()
                    .and_then(|ctx| Renderer::new(ctx, root, options));
                match renderer {
                    Ok(renderer) => {
                        let _ = ready_tx.send(Ok(renderer.pixel_state()));
                        run(renderer, rx);
                    }
                    Err(e) => {
                        error!(error = %e, "render thread failed to start");
                        let _ = ready_tx.send(Err(e));
                    }
                }
            })
            .map_err(|e| GpuError::DeviceRequest(e.to_string()))?;

        let state = ready_rx.recv().unwrap_or(Err(GpuError::Disconnected));
        let thread = Self {
            handle: RenderHandle { tx },
            join: Some(join),
        };
        state.map(|state| (thread, state))
    }

    pub fn handle(&self) -> &RenderHandle {
        &self.handle
    }

    /// Stop the thread after it drains queued work, releasing GPU resources.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        let Some(join) = self.join.take() else {
            return;
        };
        self.handle.send(Command::Shutdown);
        if join.join().is_err() {
            error!("render thread panicked");
        }
    }
}

impl Drop for RenderThread {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(mut renderer: Renderer, rx: Receiver<Command>) {
    info!("render thread started");
    let mut pending_frame: Option<RenderIntent> = None;
    let mut last_drawn: Option<RenderIntent> = None;

    'outer: while let Ok(first) = rx.recv() {
        let mut next = Some(first);
        while let Some(command) = next {
            match command {
                Command::Frame(intent) => {
                    if pending_frame.replace(intent).is_some() {
                        debug!("coalesced frame request");
                    }
                }
                Command::ApplyCrop { request, reply } => {
                    let _ = reply.send(renderer.apply_crop(&request));
                }
                Command::Restore { version, reply } => {
                    let _ = reply.send(renderer.restore(version));
                }
                Command::Export { intent, reply } => {
                    let _ = reply.send(renderer.export(&intent));
                }
                Command::Snapshot { reply } => {
                    if let Some(intent) = pending_frame.take() {
                        renderer.render_frame(&intent);
                        last_drawn = Some(intent);
                    }
                    let _ = reply.send(renderer.snapshot());
                }
                Command::Resize { width, height } => {
                    renderer.resize(width, height);
                    // The new target starts blank
                    pending_frame = pending_frame.or(last_drawn);
                }
                Command::Shutdown => break 'outer,
            }
            next = rx.try_recv().ok();
        }

        if let Some(intent) = pending_frame.take() {
            renderer.render_frame(&intent);
            last_drawn = Some(intent);
        }
    }

    renderer.release();
    info!("render thread stopped");
}
