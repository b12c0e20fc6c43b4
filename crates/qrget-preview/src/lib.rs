//! qrget 预览窗口
//!
//! 基于 egui/eframe 的二维码窗口。窗口事件循环在独立线程中运行，
//! 对外只暴露 "是否已关闭" 查询和关闭请求。
//!
//! 仅支持 Linux（X11/Wayland 允许在非主线程创建事件循环）。其他平台上
//! 窗口创建失败会作为 [`PreviewError::Open`] 返回。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use eframe::egui;
use log::{debug, error, info};

use qrget_core::{CodeImage, PreviewError, PreviewOpener, PreviewRequest, PreviewSurface};

/// 等待窗口出现的上限
const STARTUP_TIMEOUT: Duration = Duration::from_secs(10);

/// 窗口线程上报的启动结果
type Startup = Result<(), String>;

/// 窗口线程与协调器共享的状态
#[derive(Default)]
struct Shared {
    closed: AtomicBool,
    close_requested: AtomicBool,
    ctx: Mutex<Option<egui::Context>>,
}

/// 已打开的预览窗口
pub struct PreviewWindow {
    shared: Arc<Shared>,
}

impl PreviewSurface for PreviewWindow {
    fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.shared.close_requested.store(true, Ordering::SeqCst);

        // 窗口尚未创建时，由第一帧检查 close_requested
        if let Ok(guard) = self.shared.ctx.lock()
            && let Some(ctx) = guard.as_ref()
        {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            ctx.request_repaint();
        }
    }
}

/// egui 预览窗口工厂
#[derive(Debug, Default, Clone, Copy)]
pub struct EguiPreview;

impl PreviewOpener for EguiPreview {
    /// 启动窗口线程，阻塞到窗口创建完成或事件循环报错
    fn open(&self, request: PreviewRequest) -> Result<Arc<dyn PreviewSurface>, PreviewError> {
        let shared = Arc::new(Shared::default());
        let window_state = shared.clone();
        let (started_tx, started_rx) = mpsc::channel::<Startup>();

        thread::Builder::new()
            .name("qrget-preview".to_string())
            .spawn(move || {
                let failure = started_tx.clone();
                if let Err(e) = run_window(request, window_state.clone(), started_tx) {
                    error!("Preview window failed: {}", e);
                    let _ = failure.send(Err(e.to_string()));
                }
                window_state.closed.store(true, Ordering::SeqCst);
                debug!("Preview event loop exited");
            })
            .map_err(|e| PreviewError::Open(e.to_string()))?;

        if let Err(e) = wait_for_startup(&started_rx, STARTUP_TIMEOUT) {
            // 窗口可能稍后才出现，让第一帧直接关闭它
            shared.close_requested.store(true, Ordering::SeqCst);
            return Err(e);
        }

        Ok(Arc::new(PreviewWindow { shared }))
    }
}

/// 等待窗口线程的第一条启动结果
///
/// 发送端全部释放（线程退出或 panic）而没有结果时，视为打开失败。
fn wait_for_startup(started: &Receiver<Startup>, limit: Duration) -> Result<(), PreviewError> {
    match started.recv_timeout(limit) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(reason)) => Err(PreviewError::Open(reason)),
        Err(RecvTimeoutError::Timeout) => Err(PreviewError::Open(format!(
            "window did not appear within {:?}",
            limit
        ))),
        Err(RecvTimeoutError::Disconnected) => Err(PreviewError::Open(
            "preview event loop exited before the window was created".to_string(),
        )),
    }
}

fn run_window(
    request: PreviewRequest,
    shared: Arc<Shared>,
    started: Sender<Startup>,
) -> eframe::Result {
    let PreviewRequest { image, title, size } = request;

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([size.0, size.1])
            .with_resizable(false)
            .with_title(title.clone()),
        #[cfg(target_os = "linux")]
        event_loop_builder: Some(Box::new(|builder| allow_any_thread(builder))),
        ..Default::default()
    };

    info!("Opening preview window \"{}\"", title);
    eframe::run_native(
        &title,
        options,
        Box::new(move |cc| {
            let app = QrApp::new(cc, &image, shared);
            let _ = started.send(Ok(()));
            Ok(Box::new(app))
        }),
    )
}

#[cfg(target_os = "linux")]
fn allow_any_thread<T: 'static>(builder: &mut winit::event_loop::EventLoopBuilder<T>) {
    // X11 与 Wayland 共用同一个 any_thread 标志
    use winit::platform::x11::EventLoopBuilderExtX11;
    builder.with_any_thread(true);
}

struct QrApp {
    texture: egui::TextureHandle,
    shared: Arc<Shared>,
}

impl QrApp {
    fn new(cc: &eframe::CreationContext<'_>, image: &CodeImage, shared: Arc<Shared>) -> Self {
        let pixels = egui::ColorImage::from_gray(
            [image.width as usize, image.height as usize],
            &image.pixels,
        );
        let texture = cc
            .egui_ctx
            .load_texture("qrcode", pixels, egui::TextureOptions::NEAREST);

        if let Ok(mut slot) = shared.ctx.lock() {
            *slot = Some(cc.egui_ctx.clone());
        }

        Self { texture, shared }
    }
}

impl eframe::App for QrApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if self.shared.close_requested.load(Ordering::SeqCst) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.centered_and_justified(|ui| {
                ui.add(egui::Image::new(&self.texture));
            });
        });
    }
}
