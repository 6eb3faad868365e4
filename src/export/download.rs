//! Download delivery for encoded captures
//!
//! Delivery is fire-and-forget: [`FileDownloader`] moves the encoded bytes
//! into a writer thread and returns immediately. The bytes are dropped when
//! the writer finishes, whether the write succeeded or not, and the outcome
//! is reported over a channel the UI loop polls.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

/// An encoded file ready to be handed to a sink
#[derive(Debug, Clone, PartialEq)]
pub struct Download {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Receives finished captures
pub trait DownloadSink {
    /// Start delivering `download`; must not block on the delivery itself
    fn deliver(&mut self, download: Download);
}

/// Collects downloads in memory
impl DownloadSink for Vec<Download> {
    fn deliver(&mut self, download: Download) {
        self.push(download);
    }
}

/// Outcome of a background write
pub type SaveResult = std::io::Result<PathBuf>;

/// Writes downloads into a directory on background threads
pub struct FileDownloader {
    output_dir: PathBuf,
    sender: mpsc::Sender<SaveResult>,
    receiver: mpsc::Receiver<SaveResult>,
    in_flight: usize,
}

impl FileDownloader {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        let (sender, receiver) = mpsc::channel();
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            sender,
            receiver,
            in_flight: 0,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Number of writes started but not yet collected
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// Collect finished writes without blocking
    pub fn poll(&mut self) -> Vec<SaveResult> {
        let finished: Vec<SaveResult> = self.receiver.try_iter().collect();
        self.in_flight -= finished.len().min(self.in_flight);
        finished
    }

    /// Block until the next write finishes or `timeout` elapses
    pub fn wait(&mut self, timeout: Duration) -> Option<SaveResult> {
        let result = self.receiver.recv_timeout(timeout).ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(result)
    }
}

impl DownloadSink for FileDownloader {
    fn deliver(&mut self, download: Download) {
        let dir = self.output_dir.clone();
        let sender = self.sender.clone();
        self.in_flight += 1;

        thread::spawn(move || {
            let Download { file_name, bytes } = download;
            let path = dir.join(&file_name);
            let result = fs::create_dir_all(&dir)
                .and_then(|()| fs::write(&path, &bytes))
                .map(|()| path);
            // Release the encoded image before reporting
            drop(bytes);
            let _ = sender.send(result);
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_sink_collects() {
        let mut sink: Vec<Download> = Vec::new();
        sink.deliver(Download {
            file_name: "a.png".to_string(),
            bytes: vec![1, 2, 3],
        });
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].bytes, vec![1, 2, 3]);
    }

    #[test]
    fn test_file_downloader_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("shots");
        let mut downloader = FileDownloader::new(&output);

        downloader.deliver(Download {
            file_name: "10-15-2026 at 3.04.05 PM.png".to_string(),
            bytes: b"png bytes".to_vec(),
        });
        assert_eq!(downloader.in_flight(), 1);

        let path = downloader.wait(Duration::from_secs(5)).unwrap().unwrap();
        assert_eq!(path, output.join("10-15-2026 at 3.04.05 PM.png"));
        assert_eq!(fs::read(&path).unwrap(), b"png bytes");
        assert_eq!(downloader.in_flight(), 0);
    }

    #[test]
    fn test_file_downloader_reports_failure() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the output directory should be
        let blocker = dir.path().join("not_a_dir");
        fs::write(&blocker, b"").unwrap();
        let mut downloader = FileDownloader::new(&blocker);

        downloader.deliver(Download {
            file_name: "x.png".to_string(),
            bytes: vec![0],
        });
        let result = downloader.wait(Duration::from_secs(5)).unwrap();
        assert!(result.is_err());
    }
}
