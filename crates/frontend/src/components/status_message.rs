//! The floating status line: one message at a time, success confirmations
//! auto-clearing after a short delay.

use dioxus::prelude::*;
use gloo_timers::future::TimeoutFuture;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

impl StatusKind {
    pub fn css_class(&self) -> &'static str {
        match self {
            StatusKind::Info => "info",
            StatusKind::Success => "success",
            StatusKind::Error => "error",
        }
    }

    /// Only confirmations disappear on their own; errors and info persist
    /// until replaced.
    pub fn auto_clears(&self) -> bool {
        matches!(self, StatusKind::Success)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    pub text: String,
    pub kind: StatusKind,
}

const AUTO_CLEAR_MS: u32 = 3_000;

/// Handle for publishing status messages from any collaborator. The
/// sequence number keeps an old auto-clear timer from wiping a message
/// that replaced it.
#[derive(Clone, Copy)]
pub struct StatusSink {
    message: Signal<Option<StatusMessage>>,
    seq: Signal<u64>,
}

impl StatusSink {
    pub fn new(message: Signal<Option<StatusMessage>>, seq: Signal<u64>) -> Self {
        Self { message, seq }
    }

    pub fn show(&mut self, text: String, kind: StatusKind) {
        let my_seq = {
            let mut seq = self.seq.write();
            *seq += 1;
            *seq
        };
        self.message.set(Some(StatusMessage { text, kind }));
        if kind.auto_clears() {
            let sink = *self;
            wasm_bindgen_futures::spawn_local(async move {
                TimeoutFuture::new(AUTO_CLEAR_MS).await;
                let mut sink = sink;
                if *sink.seq.peek() == my_seq {
                    sink.message.set(None);
                }
            });
        }
    }

    pub fn clear(&mut self) {
        *self.seq.write() += 1;
        self.message.set(None);
    }
}

#[component]
pub fn StatusLine(message: ReadSignal<Option<StatusMessage>>) -> Element {
    match &*message.read() {
        Some(msg) => {
            let class = format!("message-box {}", msg.kind.css_class());
            rsx! {
                div { class: "{class}", "{msg.text}" }
            }
        }
        None => rsx! {},
    }
}
