// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared capture buffer for compiler and app output.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;

/// Append-only byte buffer shared between pump tasks and status readers.
///
/// Stdout and stderr are pumped into the same buffer, so chunks from
/// the two streams interleave in arrival order.
#[derive(Debug, Clone, Default)]
pub struct OutputLog {
    buf: Arc<Mutex<Vec<u8>>>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, bytes: &[u8]) {
        self.buf.lock().extend_from_slice(bytes);
    }

    /// Append a line of daemon-authored text, adding the trailing newline.
    pub fn append_line(&self, line: &str) {
        let mut buf = self.buf.lock();
        buf.extend_from_slice(line.as_bytes());
        buf.push(b'\n');
    }

    /// Everything captured so far, with invalid UTF-8 replaced.
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buf.lock()).into_owned()
    }

    pub fn len(&self) -> usize {
        self.buf.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.lock().is_empty()
    }

    /// Copy `reader` into the buffer until EOF or a read error.
    pub fn pump<R>(&self, mut reader: R) -> JoinHandle<()>
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let log = self.clone();
        tokio::spawn(async move {
            let mut chunk = [0u8; 8192];
            loop {
                match reader.read(&mut chunk).await {
                    Ok(0) => break,
                    Ok(n) => log.append(&chunk[..n]),
                    Err(e) => {
                        tracing::debug!(error = %e, "output pump stopped");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;
