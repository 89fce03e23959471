use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event, KeyEvent, KeyEventKind};

pub enum AppEvent {
    Key(KeyEvent),
    /// No input within the tick interval; used to expire notices.
    Tick,
    Resize,
}

/// Reads terminal input on a background thread so the UI loop can block on
/// a single channel.
pub struct EventHandler {
    rx: mpsc::Receiver<AppEvent>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        thread::spawn(move || pump(&tx, tick_rate));
        Self { rx }
    }

    pub fn next(&self) -> anyhow::Result<AppEvent> {
        Ok(self.rx.recv()?)
    }
}

fn pump(tx: &mpsc::Sender<AppEvent>, tick_rate: Duration) {
    loop {
        let next = match event::poll(tick_rate) {
            Ok(true) => match event::read() {
                // Release and repeat events would double every action
                Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => AppEvent::Key(key),
                Ok(Event::Resize(_, _)) => AppEvent::Resize,
                Ok(_) => continue,
                Err(_) => return,
            },
            Ok(false) => AppEvent::Tick,
            Err(_) => return,
        };
        // Receiver gone means the UI has exited
        if tx.send(next).is_err() {
            return;
        }
    }
}
