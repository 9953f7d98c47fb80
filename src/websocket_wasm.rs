//! WASM WebSocket client for the packet capture backend
//!
//! Browser callbacks answer the Engine.IO handshake and heartbeats and push
//! data frames into a shared buffer that the app drains in update().

use crate::core::{control_frame, ControlFrame};
use crate::ws_state::WsState;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use tracing::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CloseEvent, ErrorEvent, MessageEvent, WebSocket};

/// Shared message buffer: WS callback pushes, app drains in update()
pub type MessageBuffer = Rc<RefCell<VecDeque<String>>>;

/// Frames held while the app is not draining (hidden tab)
pub const QUEUE_CAPACITY: usize = 4096;

const NAMESPACE_CONNECT: &str = "40";
const PONG: &str = "3";

/// WASM WebSocket client. Dropping it detaches the callbacks and closes
/// the socket, so nothing is delivered afterwards.
pub struct WsClient {
    ws: WebSocket,
    _on_open: Closure<dyn Fn(JsValue)>,
    _on_msg: Closure<dyn Fn(MessageEvent)>,
    _on_err: Closure<dyn Fn(ErrorEvent)>,
    _on_close: Closure<dyn Fn(CloseEvent)>,
}

impl WsClient {
    /// Connect to a WebSocket endpoint
    ///
    /// Data frames are buffered into `msg_buffer` for the app to drain with a time budget.
    pub fn connect(
        url: &str,
        msg_buffer: MessageBuffer,
        state: Rc<RefCell<WsState>>,
    ) -> Result<Self, JsValue> {
        info!(url, "Connecting to WebSocket");

        let ws = WebSocket::new(url)?;

        let state_clone = state.clone();
        let on_open = Closure::wrap(Box::new(move |_| {
            info!("WebSocket connected");
            *state_clone.borrow_mut() = WsState::Connected;
        }) as Box<dyn Fn(JsValue)>);
        ws.set_onopen(Some(on_open.as_ref().unchecked_ref()));

        // Handshake replies go out on the same socket
        let ws_clone = ws.clone();
        let on_msg = Closure::wrap(Box::new(move |e: MessageEvent| {
            let Ok(txt) = e.data().dyn_into::<js_sys::JsString>() else {
                return;
            };
            let msg: String = txt.into();
            let reply = match control_frame(&msg) {
                Some(ControlFrame::Open) => {
                    debug!("Engine.IO open, joining namespace");
                    NAMESPACE_CONNECT
                }
                Some(ControlFrame::Ping) => PONG,
                Some(ControlFrame::Close) => {
                    warn!("Session closed by server");
                    return;
                }
                None => {
                    let mut buf = msg_buffer.borrow_mut();
                    if buf.len() < QUEUE_CAPACITY {
                        buf.push_back(msg);
                    } else {
                        debug!("Message buffer full, dropping frame");
                    }
                    return;
                }
            };
            if let Err(e) = ws_clone.send_with_str(reply) {
                error!(?e, "Failed to answer handshake");
            }
        }) as Box<dyn Fn(MessageEvent)>);
        ws.set_onmessage(Some(on_msg.as_ref().unchecked_ref()));

        let state_clone = state.clone();
        let on_err = Closure::wrap(Box::new(move |e: ErrorEvent| {
            let msg = e.message();
            error!(error = %msg, "WebSocket error");
            *state_clone.borrow_mut() = WsState::Error(msg);
        }) as Box<dyn Fn(ErrorEvent)>);
        ws.set_onerror(Some(on_err.as_ref().unchecked_ref()));

        let on_close = Closure::wrap(Box::new(move |e: CloseEvent| {
            let code = e.code();
            let reason = e.reason();
            warn!(code, reason = %reason, "WebSocket closed");
            *state.borrow_mut() = WsState::Disconnected;
        }) as Box<dyn Fn(CloseEvent)>);
        ws.set_onclose(Some(on_close.as_ref().unchecked_ref()));

        Ok(Self {
            ws,
            _on_open: on_open,
            _on_msg: on_msg,
            _on_err: on_err,
            _on_close: on_close,
        })
    }
}

impl Drop for WsClient {
    fn drop(&mut self) {
        // Detach before the closures are freed
        self.ws.set_onopen(None);
        self.ws.set_onmessage(None);
        self.ws.set_onerror(None);
        self.ws.set_onclose(None);
        if let Err(e) = self.ws.close() {
            warn!(?e, "Failed to close WebSocket");
        }
        info!("Ingestion channel released");
    }
}
