//! Server-sent events endpoint for live reload.
//!
//! The stream speaks a three-beat protocol: `data: connected` on open,
//! `: ping` comments every 30 seconds while idle, then `data: reload`
//! followed by end-of-stream once a rebuild lands. Browsers reconnect
//! through `EventSource`'s built-in retry, which re-fetches the page's
//! updated markup on reload.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use crossbeam::channel::RecvTimeoutError;
use tiny_http::{Header, Request, Response};

use crate::core::is_shutdown;
use crate::debug;
use crate::serve::hub::{ReloadHub, ReloadSignal, Subscriber};
use crate::utils::mime;

/// Idle interval between keep-alive comments.
const KEEPALIVE: Duration = Duration::from_secs(30);

const CONNECTED_FRAME: &[u8] = b"data: connected\n\n";
const PING_FRAME: &[u8] = b": ping\n\n";
const RELOAD_FRAME: &[u8] = b"data: reload\n\n";

#[derive(Clone, Copy)]
enum StreamState {
    /// Greeting not yet emitted.
    Opening,
    /// Greeting sent; waiting on the mailbox, pinging while idle.
    Idle,
    /// Final frame queued; emit it and end the stream.
    Closing(&'static [u8]),
    Closed,
}

/// A blocking `Read` adapter that tiny_http drains into the response.
///
/// Each pull either forwards a queued frame or waits on the subscriber
/// mailbox with a keep-alive timeout. Returning `Ok(0)` ends the chunked
/// response, which is how the stream closes after `data: reload`.
pub struct EventStream {
    hub: Arc<ReloadHub>,
    subscriber: Subscriber,
    state: StreamState,
    pending: &'static [u8],
}

impl EventStream {
    pub fn new(hub: Arc<ReloadHub>) -> Self {
        let subscriber = hub.register();
        Self {
            hub,
            subscriber,
            state: StreamState::Opening,
            pending: &[],
        }
    }

    /// Decide the next frame to emit, blocking while idle.
    fn next_frame(&mut self) -> &'static [u8] {
        loop {
            match self.state {
                StreamState::Opening => {
                    self.state = StreamState::Idle;
                    return CONNECTED_FRAME;
                }
                StreamState::Idle => match self.subscriber.rx.recv_timeout(KEEPALIVE) {
                    Ok(ReloadSignal::Reload) => {
                        // Leave the registry before emitting the final frame
                        // so a broadcast racing with this close cannot target
                        // a stream that is already gone.
                        self.hub.unregister(self.subscriber.id);
                        self.state = StreamState::Closing(RELOAD_FRAME);
                    }
                    Ok(ReloadSignal::Shutdown) | Err(RecvTimeoutError::Disconnected) => {
                        self.state = StreamState::Closed;
                        return &[];
                    }
                    Err(RecvTimeoutError::Timeout) => {
                        if is_shutdown() {
                            self.state = StreamState::Closed;
                            return &[];
                        }
                        return PING_FRAME;
                    }
                },
                StreamState::Closing(frame) => {
                    self.state = StreamState::Closed;
                    return frame;
                }
                StreamState::Closed => return &[],
            }
        }
    }
}

impl Read for EventStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if self.pending.is_empty() {
            if matches!(self.state, StreamState::Closed) {
                return Ok(0);
            }
            self.pending = self.next_frame();
            if self.pending.is_empty() {
                return Ok(0);
            }
        }

        let n = self.pending.len().min(buf.len());
        buf[..n].copy_from_slice(&self.pending[..n]);
        self.pending = &self.pending[n..];
        Ok(n)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        // Covers client disconnects; a no-op after a reload-close
        self.hub.unregister(self.subscriber.id);
    }
}

/// Answer `GET /__reload` with a live event stream.
pub fn respond_event_stream(request: Request, hub: Arc<ReloadHub>) {
    debug!("reload"; "client connected from {:?}", request.remote_addr());

    let stream = EventStream::new(hub);
    let response = Response::new(
        tiny_http::StatusCode(200),
        vec![
            header("Content-Type", mime::types::EVENT_STREAM),
            header("Cache-Control", "no-cache"),
            header("Access-Control-Allow-Origin", "*"),
            header("X-Accel-Buffering", "no"),
        ],
        stream,
        None,
        None,
    );

    // The send blocks this connection thread until the stream ends
    let _ = request.respond(response);
}

fn header(field: &str, value: &str) -> Header {
    Header::from_bytes(field.as_bytes(), value.as_bytes())
        .unwrap_or_else(|()| unreachable!("static header"))
}
