//! High-resolution screenshot export
//!
//! Captures the scene at a requested resolution independent of the window:
//! the camera aspect is overridden and the render target resized, one frame
//! is rendered and read back, the PNG is handed to a [`DownloadSink`], and
//! the viewport's window size is re-applied. The restore lives in
//! `CaptureSession::drop`, so it runs on every path once the capture size
//! has been applied, including failures.
//!
//! The capture aspect defaults to 1.0 regardless of the requested width and
//! height. Non-square requests therefore stretch the image; pass `None` to
//! [`ScreenshotExporter::new`] to derive the aspect from the request instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::export::download::{Download, DownloadSink};
use crate::export::filename;
use crate::export::image_export::encode_png;
use crate::render::target::CaptureError;
use crate::viewport::{RenderSurface, Viewport};

/// Capture aspect used unless configured otherwise
pub const DEFAULT_CAPTURE_ASPECT: Option<f32> = Some(1.0);

/// Errors surfaced to the action that triggered an export
#[derive(Debug)]
pub enum ExportError {
    /// Width or height not a positive 32-bit size; nothing was touched
    InvalidDimensions { width: i64, height: i64 },
    /// Render, readback or encode failed; the viewport was restored
    ExportFailed(CaptureError),
    /// Another export is running; nothing was touched
    ExportInProgress,
}

impl std::fmt::Display for ExportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportError::InvalidDimensions { width, height } => {
                write!(f, "Invalid capture dimensions: {}x{}", width, height)
            }
            ExportError::ExportFailed(e) => write!(f, "Export failed: {}", e),
            ExportError::ExportInProgress => write!(f, "An export is already in progress"),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::ExportFailed(e) => Some(e),
            _ => None,
        }
    }
}

impl From<CaptureError> for ExportError {
    fn from(error: CaptureError) -> Self {
        ExportError::ExportFailed(error)
    }
}

/// Validated capture resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportRequest {
    pub width: u32,
    pub height: u32,
}

impl ExportRequest {
    pub fn new(width: i64, height: i64) -> Result<Self, ExportError> {
        match (u32::try_from(width), u32::try_from(height)) {
            (Ok(w), Ok(h)) if w > 0 && h > 0 => Ok(Self { width: w, height: h }),
            _ => Err(ExportError::InvalidDimensions { width, height }),
        }
    }

    /// Aspect of the requested resolution
    pub fn aspect(&self) -> f32 {
        self.width as f32 / self.height as f32
    }
}

/// What a successful export produced
#[derive(Debug, Clone, PartialEq)]
pub struct ExportReport {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    /// Size of the encoded PNG in bytes
    pub encoded_len: usize,
}

/// Drives captures against a [`RenderSurface`]
///
/// Clones share one busy flag, so only one export runs at a time across all
/// of them.
#[derive(Debug, Clone)]
pub struct ScreenshotExporter {
    busy: Arc<AtomicBool>,
    capture_aspect: Option<f32>,
}

impl Default for ScreenshotExporter {
    fn default() -> Self {
        Self::new(DEFAULT_CAPTURE_ASPECT)
    }
}

impl ScreenshotExporter {
    /// `capture_aspect` of `None` uses the requested width / height
    pub fn new(capture_aspect: Option<f32>) -> Self {
        Self {
            busy: Arc::new(AtomicBool::new(false)),
            capture_aspect,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub fn capture_aspect(&self) -> Option<f32> {
        self.capture_aspect
    }

    /// Export the scene at `width` x `height` and hand the PNG to `sink`
    pub fn export_image<S, D>(
        &self,
        surface: &mut S,
        viewport: &Viewport,
        sink: &mut D,
        width: i64,
        height: i64,
    ) -> Result<ExportReport, ExportError>
    where
        S: RenderSurface + ?Sized,
        D: DownloadSink + ?Sized,
    {
        let request = ExportRequest::new(width, height)?;
        let _busy = BusyGuard::acquire(&self.busy)?;

        let aspect = self.capture_aspect.unwrap_or_else(|| request.aspect());
        let mut session = CaptureSession { surface, viewport };
        let encoded = match session.capture(request, aspect) {
            Ok(encoded) => encoded,
            Err(e) => {
                log::warn!("Capture at {}x{} failed: {}", request.width, request.height, e);
                return Err(ExportError::ExportFailed(e));
            }
        };

        let report = ExportReport {
            file_name: filename::default_file_name(".png"),
            width: request.width,
            height: request.height,
            encoded_len: encoded.len(),
        };
        sink.deliver(Download {
            file_name: report.file_name.clone(),
            bytes: encoded,
        });
        drop(session);

        log::info!(
            "Exported {}x{} capture as '{}' ({} bytes)",
            report.width,
            report.height,
            report.file_name,
            report.encoded_len
        );
        Ok(report)
    }
}

struct BusyGuard<'a>(&'a AtomicBool);

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, ExportError> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map(|_| Self(flag))
            .map_err(|_| ExportError::ExportInProgress)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Capture-sized surface; dropping it restores the window size
struct CaptureSession<'a, S: RenderSurface + ?Sized> {
    surface: &'a mut S,
    viewport: &'a Viewport,
}

impl<S: RenderSurface + ?Sized> CaptureSession<'_, S> {
    fn capture(&mut self, request: ExportRequest, aspect: f32) -> Result<Vec<u8>, CaptureError> {
        self.viewport
            .apply_capture_size(&mut *self.surface, request.width, request.height, aspect)?;
        let pixels = self.surface.render_capture()?;
        log::debug!("Read back {} bytes at {}x{}", pixels.len(), request.width, request.height);
        encode_png(request.width, request.height, &pixels)
    }
}

impl<S: RenderSurface + ?Sized> Drop for CaptureSession<'_, S> {
    fn drop(&mut self) {
        if let Err(e) = self.viewport.apply_window_size(&mut *self.surface) {
            log::error!("Failed to restore viewport after capture: {}", e);
        }
    }
}
