//! The presentation thread.
//!
//! One OS thread owns the [`MapController`]; everything that touches the
//! viewport, selection, highlight or textures is a [`Command`] sent over a
//! bounded channel and executed there in order. Workers hand finished data
//! over with `DataLoaded`/`TileLoaded` and never see the controller.
//!
//! After every command the thread plans the visible tiles and sends keys
//! it has not asked for yet to the tile loader.

use std::thread;

use bytes::Bytes;
use mappa_client::controller::ControllerError;
use mappa_client::geometry::ScreenPoint;
use mappa_client::renderer::FrameStats;
use mappa_client::{
    ControllerConfig, Criterion, DataStatus, MapController, PointerEvent, PointerOutcome, Raster,
    RegionLayer, RegionSummary, SelectionMode, TileKey, ViewMode,
};
use mappa_shared::{Catalog, RegionDetail, RegionId};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionAction {
    Add,
    Remove,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewUpdate {
    pub selection_mode: Option<SelectionMode>,
    pub view_mode: Option<ViewMode>,
    pub simple_render: Option<bool>,
    /// `(latitude, longitude)` to centre on.
    pub relocate: Option<(f64, f64)>,
    pub zoom: Option<u8>,
}

#[derive(Debug, Clone)]
pub struct FrameSnapshot {
    pub width: u32,
    pub height: u32,
    pub frame: u64,
    /// Whether this request painted a new frame.
    pub repainted: bool,
    pub pixels: Bytes,
    pub stats: FrameStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectionState {
    pub mode: SelectionMode,
    pub filter_active: bool,
    pub selected: Vec<RegionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewState {
    pub latitude: f64,
    pub longitude: f64,
    pub zoom: u8,
    pub width: u32,
    pub height: u32,
    pub view_mode: ViewMode,
    pub selection_mode: SelectionMode,
    pub simple_render: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub data: DataStatus,
    pub regions: usize,
    pub tiles: usize,
    pub frames: u64,
    pub hovered: Option<RegionId>,
    pub last_frame: FrameStats,
}

pub enum Command {
    DataLoaded {
        catalog: Catalog,
        layers: Vec<RegionLayer>,
    },
    DataFailed {
        reason: String,
    },
    TileLoaded {
        key: TileKey,
        raster: Raster,
    },
    TileUnavailable {
        key: TileKey,
    },
    Render {
        reply: oneshot::Sender<FrameSnapshot>,
    },
    HitTest {
        point: ScreenPoint,
        reply: oneshot::Sender<Option<RegionSummary>>,
    },
    Pointer {
        event: PointerEvent,
        reply: oneshot::Sender<PointerOutcome>,
    },
    Selection {
        action: SelectionAction,
        criterion: Criterion,
        reply: oneshot::Sender<Result<SelectionState, ControllerError>>,
    },
    UpdateView {
        update: ViewUpdate,
        reply: oneshot::Sender<ViewState>,
    },
    Regions {
        reply: oneshot::Sender<Vec<RegionSummary>>,
    },
    Detail {
        id: RegionId,
        reply: oneshot::Sender<Option<RegionDetail>>,
    },
    Status {
        reply: oneshot::Sender<StatusReport>,
    },
}

/// Cloneable sender side of the presentation thread.
#[derive(Clone)]
pub struct PresenterHandle {
    tx: mpsc::Sender<Command>,
}

impl PresenterHandle {
    /// Fire-and-forget. Returns `false` once the thread is gone.
    pub async fn send(&self, command: Command) -> bool {
        self.tx.send(command).await.is_ok()
    }

    /// Send a command carrying a reply channel and wait for the answer.
    /// `None` means the presentation thread has stopped.
    pub async fn request<T>(&self, build: impl FnOnce(oneshot::Sender<T>) -> Command) -> Option<T> {
        let (reply, rx) = oneshot::channel();
        self.tx.send(build(reply)).await.ok()?;
        rx.await.ok()
    }
}

/// Tile keys the presentation thread wants loaded, in request order.
pub type TileRequests = mpsc::UnboundedReceiver<TileKey>;

/// Start the presentation thread. It runs until every handle is dropped.
pub fn spawn(
    config: ControllerConfig,
    buffer: usize,
) -> std::io::Result<(PresenterHandle, TileRequests)> {
    let (tx, mut rx) = mpsc::channel(buffer.max(1));
    let (tile_tx, tile_rx) = mpsc::unbounded_channel();
    thread::Builder::new()
        .name("presenter".to_owned())
        .spawn(move || {
            let mut controller = MapController::new(config);
            info!(
                width = config.width,
                height = config.height,
                "Presentation thread started"
            );
            let mut loader_gone = false;
            request_tiles(&mut controller, &tile_tx, &mut loader_gone);
            while let Some(command) = rx.blocking_recv() {
                handle(&mut controller, command);
                request_tiles(&mut controller, &tile_tx, &mut loader_gone);
            }
            info!("Presentation thread stopped");
        })?;
    Ok((PresenterHandle { tx }, tile_rx))
}

fn request_tiles(
    controller: &mut MapController,
    tiles: &mpsc::UnboundedSender<TileKey>,
    loader_gone: &mut bool,
) {
    if *loader_gone {
        return;
    }
    for key in controller.wanted_tiles() {
        if tiles.send(key).is_err() {
            warn!("Tile loader stopped, base map will not fill in further");
            *loader_gone = true;
            return;
        }
    }
}

fn handle(controller: &mut MapController, command: Command) {
    match command {
        Command::DataLoaded { catalog, layers } => controller.load(catalog, layers),
        Command::DataFailed { reason } => controller.load_failed(reason),
        Command::TileLoaded { key, raster } => {
            controller.insert_tile(key, raster);
        }
        Command::TileUnavailable { key } => controller.tile_unavailable(key),
        Command::Render { reply } => {
            let before = controller.frames();
            let (surface, stats) = controller.render();
            let (width, height) = (surface.width(), surface.height());
            let pixels = Bytes::copy_from_slice(surface.as_bytes());
            let frame = controller.frames();
            let _ = reply.send(FrameSnapshot {
                width,
                height,
                frame,
                repainted: frame != before,
                pixels,
                stats,
            });
        }
        Command::HitTest { point, reply } => {
            let hit = controller.hit_test(point);
            let summary = hit.and_then(|id| controller.regions().into_iter().find(|r| r.id == id));
            let _ = reply.send(summary);
        }
        Command::Pointer { event, reply } => {
            debug!(?event, "Pointer event");
            let _ = reply.send(controller.pointer(event));
        }
        Command::Selection {
            action,
            criterion,
            reply,
        } => {
            let result = match action {
                SelectionAction::Add => controller.add_criterion(criterion),
                SelectionAction::Remove => controller.remove_criterion(criterion),
            }
            .map(|_| selection_state(controller));
            let _ = reply.send(result);
        }
        Command::UpdateView { update, reply } => {
            apply_view_update(controller, update);
            let _ = reply.send(view_state(controller));
        }
        Command::Regions { reply } => {
            let _ = reply.send(controller.regions());
        }
        Command::Detail { id, reply } => {
            let _ = reply.send(controller.detail(id));
        }
        Command::Status { reply } => {
            let _ = reply.send(StatusReport {
                data: controller.status().clone(),
                regions: controller.regions().len(),
                tiles: controller.tile_count(),
                frames: controller.frames(),
                hovered: controller.hovered(),
                last_frame: controller.last_stats(),
            });
        }
    }
}

fn apply_view_update(controller: &mut MapController, update: ViewUpdate) {
    if let Some(mode) = update.selection_mode {
        controller.set_selection_mode(mode);
    }
    if let Some(mode) = update.view_mode {
        controller.set_view_mode(mode);
    }
    if let Some(simple) = update.simple_render {
        controller.set_simple_render(simple);
    }
    match (update.relocate, update.zoom) {
        (Some((lat, lon)), Some(zoom)) => controller.set_display_position(lat, lon, zoom),
        (Some((lat, lon)), None) => controller.relocate(lat, lon),
        (None, Some(zoom)) => {
            let (lat, lon) = centre(controller);
            controller.set_display_position(lat, lon, zoom);
        }
        (None, None) => {}
    }
}

fn centre(controller: &MapController) -> (f64, f64) {
    let viewport = controller.viewport();
    viewport.adjusted_position(
        (viewport.width() / 2) as i32,
        (viewport.height() / 2) as i32,
    )
}

fn selection_state(controller: &MapController) -> SelectionState {
    let selection = controller.selection();
    SelectionState {
        mode: selection.mode(),
        filter_active: selection.is_filter_active(),
        selected: selection.selected().iter().copied().collect(),
    }
}

fn view_state(controller: &MapController) -> ViewState {
    let viewport = controller.viewport();
    let (latitude, longitude) = centre(controller);
    ViewState {
        latitude,
        longitude,
        zoom: viewport.zoom(),
        width: viewport.width(),
        height: viewport.height(),
        view_mode: controller.view_mode(),
        selection_mode: controller.selection().mode(),
        simple_render: controller.simple_render(),
    }
}
